//! 进程级运行时：日志、启动准备与退出

pub mod lifetime;
pub mod logging;
