use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendance::requests::{AttendanceDateQuery, RecordAttendanceRequest};
use crate::models::users::entities::UserRole;
use crate::services::AttendanceService;

static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn get_sheet(
    req: HttpRequest,
    query: web::Query<AttendanceDateQuery>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_sheet(&req, query.into_inner()).await
}

pub async fn record(
    req: HttpRequest,
    body: web::Json<RecordAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.record(&req, body.into_inner()).await
}

pub async fn my_history(req: HttpRequest) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.my_history(&req).await
}

pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/attendance")
            .wrap(middlewares::RequireClassAccess::members())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .wrap(middlewares::RequireClassAccess::managers())
                    .route(web::get().to(get_sheet))
                    .route(web::post().to(record)),
            )
            .service(
                web::resource("/me")
                    .wrap(middlewares::RequireRole::new(UserRole::Murid))
                    .route(web::get().to(my_history)),
            ),
    );
}
