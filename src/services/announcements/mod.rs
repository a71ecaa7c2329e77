use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::announcements::{
    entities::Announcement,
    requests::{CreateAnnouncementRequest, UpdateAnnouncementRequest},
    responses::AnnouncementListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, class_access, current_user, managed_class, not_found, storage_failure,
};
use crate::storage::Storage;
use crate::utils::validate::validate_required_text;

const TITLE_MAX: usize = 200;
const CONTENT_MAX: usize = 10_000;

super::define_service!(
    /// 班级公告
    AnnouncementService
);

async fn load_announcement(
    storage: &dyn Storage,
    class_id: i64,
    announcement_id: i64,
) -> ActixResult<Announcement> {
    storage
        .get_announcement_by_id(announcement_id)
        .await
        .map_err(storage_failure("Failed to get announcement"))?
        .filter(|a| a.class_id == class_id)
        .ok_or_else(|| not_found(ErrorCode::AnnouncementNotFound, "Announcement not found"))
}

fn check_text(field: &str, value: &mut String, max: usize) -> ActixResult<()> {
    *value = value.trim().to_string();
    validate_required_text(value, max)
        .map_err(|msg| bad_request(ErrorCode::BadRequest, format!("{field}: {msg}")))
}

impl AnnouncementService {
    pub async fn list_announcements(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = class_access(request)?;

        let items = storage
            .list_announcements(access.class.id)
            .await
            .map_err(storage_failure("Failed to list announcements"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            AnnouncementListResponse { items },
            "Announcements retrieved successfully",
        )))
    }

    pub async fn create_announcement(
        &self,
        request: &HttpRequest,
        mut body: CreateAnnouncementRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        let author = current_user(request)?;
        check_text("title", &mut body.title, TITLE_MAX)?;
        check_text("content", &mut body.content, CONTENT_MAX)?;

        let announcement = storage
            .create_announcement(access.class.id, author.id, body)
            .await
            .map_err(storage_failure("Announcement creation failed"))?;

        Ok(HttpResponse::Created().json(ApiResponse::success(
            announcement,
            "Announcement created successfully",
        )))
    }

    pub async fn update_announcement(
        &self,
        request: &HttpRequest,
        announcement_id: i64,
        mut body: UpdateAnnouncementRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        load_announcement(storage.as_ref(), access.class.id, announcement_id).await?;

        if let Some(title) = body.title.as_mut() {
            check_text("title", title, TITLE_MAX)?;
        }
        if let Some(content) = body.content.as_mut() {
            check_text("content", content, CONTENT_MAX)?;
        }

        let announcement = storage
            .update_announcement(announcement_id, body)
            .await
            .map_err(storage_failure("Announcement update failed"))?
            .ok_or_else(|| not_found(ErrorCode::AnnouncementNotFound, "Announcement not found"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            announcement,
            "Announcement updated successfully",
        )))
    }

    pub async fn delete_announcement(
        &self,
        request: &HttpRequest,
        announcement_id: i64,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        load_announcement(storage.as_ref(), access.class.id, announcement_id).await?;

        storage
            .delete_announcement(announcement_id)
            .await
            .map_err(storage_failure("Announcement deletion failed"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Announcement deleted successfully",
        )))
    }
}
