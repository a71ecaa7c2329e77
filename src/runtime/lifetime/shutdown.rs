use std::sync::Arc;

use tokio::signal;
use tracing::warn;

use crate::services::ExamSessionRegistry;

/// 等待 Ctrl+C
///
/// 未提交的考试会话仅保存在内存中，退出时会丢失，这里记录数量便于排查。
pub async fn listen_for_shutdown(exam_sessions: Arc<ExamSessionRegistry>) {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        return std::future::pending().await;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");

    let active = exam_sessions.active_count();
    if active > 0 {
        warn!("{} exam session(s) still in progress will be dropped", active);
    }
}
