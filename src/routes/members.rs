use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::enrollments::requests::EnrollStudentRequest;
use crate::services::EnrollmentService;
use crate::utils::SafeStudentIdI64;

static ENROLLMENT_SERVICE: Lazy<EnrollmentService> = Lazy::new(EnrollmentService::new_lazy);

pub async fn list_members(req: HttpRequest) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.list_members(&req).await
}

pub async fn enroll_student(
    req: HttpRequest,
    body: web::Json<EnrollStudentRequest>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .enroll_student(&req, body.into_inner())
        .await
}

pub async fn remove_student(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.remove_student(&req, student_id.0).await
}

pub fn configure_member_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/members")
            .wrap(middlewares::RequireClassAccess::members())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_members))
                    .route(
                        web::post()
                            .to(enroll_student)
                            .wrap(middlewares::RequireClassAccess::managers()),
                    ),
            )
            .service(
                web::resource("/{student_id}")
                    .wrap(middlewares::RequireClassAccess::managers())
                    .route(web::delete().to(remove_student)),
            ),
    );
}
