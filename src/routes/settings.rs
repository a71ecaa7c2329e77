use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::settings::requests::UpsertSettingRequest;
use crate::models::users::entities::UserRole;
use crate::services::SettingService;
use crate::utils::SafeSettingKey;

static SETTING_SERVICE: Lazy<SettingService> = Lazy::new(SettingService::new_lazy);

pub async fn public_settings(req: HttpRequest) -> ActixResult<HttpResponse> {
    SETTING_SERVICE.public_settings(&req).await
}

pub async fn admin_settings(req: HttpRequest) -> ActixResult<HttpResponse> {
    SETTING_SERVICE.admin_settings(&req).await
}

pub async fn upsert_setting(
    req: HttpRequest,
    key: SafeSettingKey,
    body: web::Json<UpsertSettingRequest>,
) -> ActixResult<HttpResponse> {
    SETTING_SERVICE
        .upsert_setting(&req, key.0, body.into_inner())
        .await
}

pub fn configure_setting_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/settings")
            .wrap(middleware::Compress::default())
            .route("/public", web::get().to(public_settings))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .wrap(middlewares::RequireJWT)
                    .route("", web::get().to(admin_settings))
                    .route("/{key}", web::put().to(upsert_setting)),
            ),
    );
}
