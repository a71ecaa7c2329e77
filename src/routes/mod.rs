pub mod auth;

pub mod users;

pub mod classes;

pub mod members;

pub mod materials;

pub mod assignments;

pub mod exams;

pub mod attendance;

pub mod announcements;

pub mod files;

pub mod mentors;

pub mod settings;

pub mod dashboard;

pub mod frontend;

pub use announcements::configure_announcement_routes;
pub use assignments::configure_assignment_routes;
pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use dashboard::configure_dashboard_routes;
pub use exams::configure_exam_routes;
pub use files::configure_file_routes;
pub use frontend::configure_frontend_routes;
pub use materials::configure_material_routes;
pub use members::configure_member_routes;
pub use mentors::configure_mentor_routes;
pub use settings::configure_setting_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 注册全部 API 路由
///
/// 班级子资源的 scope 须先于 `/api/v1/classes` 注册，否则会被其前缀截获。
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_member_routes)
        .configure(configure_material_routes)
        .configure(configure_assignment_routes)
        .configure(configure_exam_routes)
        .configure(configure_attendance_routes)
        .configure(configure_announcement_routes)
        .configure(configure_classes_routes)
        .configure(configure_file_routes)
        .configure(configure_mentor_routes)
        .configure(configure_setting_routes)
        .configure(configure_dashboard_routes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use std::sync::Arc;

    use crate::cache::{ObjectCache, object_cache::moka::MokaObjectCache};
    use crate::config::AppConfig;
    use crate::models::users::entities::UserRole;
    use crate::services::ExamSessionRegistry;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{
        SeaOrmStorage,
        test_support::{seed_class, seed_user},
    };
    use crate::utils::jwt::JwtUtils;

    fn bearer(user_id: i64, role: UserRole) -> (&'static str, String) {
        let token = JwtUtils::generate_access_token(user_id, role.as_str()).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_class_scoped_routes_resolve_before_classes() {
        AppConfig::init().ok();
        let seaorm = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&seaorm, "pak_budi", UserRole::Guru).await;
        let murid = seed_user(&seaorm, "siti", UserRole::Murid).await;
        let outsider = seed_user(&seaorm, "joko", UserRole::Murid).await;
        let class_id = seed_class(&seaorm, guru).await;
        seaorm.enroll_student(class_id, murid).await.unwrap();

        let storage: Arc<dyn Storage> = Arc::new(seaorm);
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaObjectCache::with_capacity(100, 60));
        let registry = ExamSessionRegistry::new(storage.clone(), 2);

        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(storage))
                .app_data(actix_web::web::Data::new(cache))
                .app_data(actix_web::web::Data::new(registry))
                .configure(configure_api_routes),
        )
        .await;

        let uri = format!("/api/v1/classes/{class_id}/materials");

        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(guru, UserRole::Guru))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(outsider, UserRole::Murid))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        // 学生可读不可写
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(murid, UserRole::Murid))
            .set_json(serde_json::json!({
                "title": "Bab 1",
                "kind": "text",
                "text_content": "Pecahan",
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/classes/{class_id}"))
            .insert_header(bearer(murid, UserRole::Murid))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/classes/{class_id}/attendance"))
            .insert_header(bearer(murid, UserRole::Murid))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );
    }
}
