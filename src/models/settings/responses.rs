use std::collections::BTreeMap;

use super::entities::Setting;
use serde::Serialize;
use ts_rs::TS;

/// 公开设置，键值对形式
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/settings.ts")]
pub struct PublicSettingsResponse {
    pub settings: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/settings.ts")]
pub struct AdminSettingsListResponse {
    pub settings: Vec<Setting>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/settings.ts")]
pub struct SettingResponse {
    pub setting: Setting,
}
