use super::entities::Mentor;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mentor.ts")]
pub struct MentorListResponse {
    pub items: Vec<Mentor>,
}
