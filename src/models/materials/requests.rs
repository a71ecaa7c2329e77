use super::entities::MaterialKind;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub struct CreateMaterialRequest {
    pub title: String,
    pub description: Option<String>,
    pub kind: MaterialKind,
    pub url: Option<String>,
    pub text_content: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub struct UpdateMaterialRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<MaterialKind>,
    pub url: Option<String>,
    pub text_content: Option<String>,
    pub cover_url: Option<String>,
}
