//! 首页导师，公开可读，仅管理员维护

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::mentors::{
    requests::{CreateMentorRequest, UpdateMentorRequest},
    responses::MentorListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, not_found, storage_failure};
use crate::utils::validate::{validate_required_text, validate_url};

const NAME_MAX: usize = 100;

super::define_service!(MentorService);

fn check_field(field: &str, value: &mut String) -> ActixResult<()> {
    *value = value.trim().to_string();
    validate_required_text(value, NAME_MAX)
        .map_err(|msg| bad_request(ErrorCode::BadRequest, format!("{field}: {msg}")))
}

fn check_photo(photo_url: Option<&str>) -> ActixResult<()> {
    match photo_url.filter(|u| !u.is_empty()) {
        Some(url) => validate_url(url).map_err(|msg| bad_request(ErrorCode::BadRequest, msg)),
        None => Ok(()),
    }
}

impl MentorService {
    pub async fn list_mentors(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let items = storage
            .list_mentors()
            .await
            .map_err(storage_failure("Failed to list mentors"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            MentorListResponse { items },
            "Mentors retrieved successfully",
        )))
    }

    pub async fn create_mentor(
        &self,
        request: &HttpRequest,
        mut body: CreateMentorRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        check_field("name", &mut body.name)?;
        check_field("title", &mut body.title)?;
        check_photo(body.photo_url.as_deref())?;

        let mentor = storage
            .create_mentor(body)
            .await
            .map_err(storage_failure("Mentor creation failed"))?;

        Ok(HttpResponse::Created().json(ApiResponse::success(
            mentor,
            "Mentor created successfully",
        )))
    }

    pub async fn update_mentor(
        &self,
        request: &HttpRequest,
        mentor_id: i64,
        mut body: UpdateMentorRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        if let Some(name) = body.name.as_mut() {
            check_field("name", name)?;
        }
        if let Some(title) = body.title.as_mut() {
            check_field("title", title)?;
        }
        check_photo(body.photo_url.as_deref())?;

        let mentor = storage
            .update_mentor(mentor_id, body)
            .await
            .map_err(storage_failure("Mentor update failed"))?
            .ok_or_else(|| not_found(ErrorCode::MentorNotFound, "Mentor not found"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            mentor,
            "Mentor updated successfully",
        )))
    }

    pub async fn delete_mentor(
        &self,
        request: &HttpRequest,
        mentor_id: i64,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let deleted = storage
            .delete_mentor(mentor_id)
            .await
            .map_err(storage_failure("Mentor deletion failed"))?;

        if !deleted {
            return Err(not_found(ErrorCode::MentorNotFound, "Mentor not found"));
        }
        Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Mentor deleted successfully")))
    }
}
