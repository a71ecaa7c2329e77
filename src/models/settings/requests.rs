use super::entities::SettingValueType;
use serde::Deserialize;
use ts_rs::TS;

/// 按键写入设置；新键未指定类型时按字符串保存
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/settings.ts")]
pub struct UpsertSettingRequest {
    pub value: String,
    pub value_type: Option<SettingValueType>,
    pub description: Option<String>,
}
