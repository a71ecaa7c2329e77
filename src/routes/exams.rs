use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::exams::requests::{
    CreateExamRequest, CreateQuestionRequest, EssayScoreRequest, SaveAnswerRequest,
    UpdateExamRequest, UpdateQuestionRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::ExamService;
use crate::utils::{SafeIDI64, SafeQuestionIdI64, SafeStudentIdI64};

// 懒加载的全局 ExamService 实例
static EXAM_SERVICE: Lazy<ExamService> = Lazy::new(ExamService::new_lazy);

pub async fn list_exams(req: HttpRequest) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_exams(&req).await
}

pub async fn create_exam(
    req: HttpRequest,
    body: web::Json<CreateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.create_exam(&req, body.into_inner()).await
}

pub async fn get_exam(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.get_exam(&req, id.0).await
}

pub async fn update_exam(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.update_exam(&req, id.0, body.into_inner()).await
}

pub async fn delete_exam(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.delete_exam(&req, id.0).await
}

pub async fn list_questions(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_questions(&req, id.0).await
}

pub async fn create_question(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<CreateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .create_question(&req, id.0, body.into_inner())
        .await
}

pub async fn update_question(
    req: HttpRequest,
    id: SafeIDI64,
    question_id: SafeQuestionIdI64,
    body: web::Json<UpdateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .update_question(&req, id.0, question_id.0, body.into_inner())
        .await
}

pub async fn delete_question(
    req: HttpRequest,
    id: SafeIDI64,
    question_id: SafeQuestionIdI64,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .delete_question(&req, id.0, question_id.0)
        .await
}

// 进入考试：返回倒计时与题目（不含答案）
pub async fn open_session(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.open_session(&req, id.0).await
}

pub async fn save_answer(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<SaveAnswerRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.save_answer(&req, id.0, body.into_inner()).await
}

pub async fn submit(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.submit(&req, id.0).await
}

pub async fn my_submission(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.my_submission(&req, id.0).await
}

pub async fn list_submissions(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_submissions(&req, id.0).await
}

pub async fn set_essay_score(
    req: HttpRequest,
    id: SafeIDI64,
    student_id: SafeStudentIdI64,
    body: web::Json<EssayScoreRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .set_essay_score(&req, id.0, student_id.0, body.into_inner())
        .await
}

pub fn configure_exam_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/exams")
            .wrap(middlewares::RequireClassAccess::members())
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_exams))
            .route("", web::post().to(create_exam))
            .route("/{id}", web::get().to(get_exam))
            .route("/{id}", web::put().to(update_exam))
            .route("/{id}", web::delete().to(delete_exam))
            // 题目管理
            .service(
                web::scope("/{id}/questions")
                    .wrap(middlewares::RequireClassAccess::managers())
                    .route("", web::get().to(list_questions))
                    .route("", web::post().to(create_question))
                    .route("/{question_id}", web::put().to(update_question))
                    .route("/{question_id}", web::delete().to(delete_question)),
            )
            // 答题会话，仅学生
            .service(
                web::scope("/{id}/session")
                    .wrap(middlewares::RequireRole::new(UserRole::Murid))
                    .route("", web::get().to(open_session))
                    .route("/answers", web::put().to(save_answer))
                    .route("/submit", web::post().to(submit)),
            )
            .service(
                web::resource("/{id}/my-submission")
                    .wrap(middlewares::RequireRole::new(UserRole::Murid))
                    .route(web::get().to(my_submission)),
            )
            .service(
                web::scope("/{id}/submissions")
                    .wrap(middlewares::RequireClassAccess::managers())
                    .route("", web::get().to(list_submissions))
                    .route("/{student_id}/essay-score", web::put().to(set_essay_score)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use actix_web::{App, http::StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;

    use crate::cache::{ObjectCache, object_cache::moka::MokaObjectCache};
    use crate::config::AppConfig;
    use crate::models::ErrorCode;
    use crate::models::exams::entities::QuestionType;
    use crate::services::ExamSessionRegistry;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{
        SeaOrmStorage,
        test_support::{seed_class, seed_user},
    };
    use crate::utils::jwt::JwtUtils;

    fn bearer(user_id: i64) -> (&'static str, String) {
        let token = JwtUtils::generate_access_token(user_id, UserRole::Murid.as_str()).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    fn exam(title: &str, exam_date: &str) -> CreateExamRequest {
        CreateExamRequest {
            title: title.into(),
            description: None,
            exam_date: exam_date.into(),
            start_time: "07:30".into(),
            duration_minutes: 60,
            question_file_url: None,
        }
    }

    #[actix_web::test]
    async fn test_exam_session_lifecycle() {
        AppConfig::init().ok();
        let seaorm = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&seaorm, "bu_ani", UserRole::Guru).await;
        let murid = seed_user(&seaorm, "dewi", UserRole::Murid).await;
        let class_id = seed_class(&seaorm, guru).await;
        seaorm.enroll_student(class_id, murid).await.unwrap();

        let upcoming = seaorm
            .create_exam(class_id, guru, exam("UAS", "2099-06-01"))
            .await
            .unwrap();
        let empty = seaorm
            .create_exam(class_id, guru, exam("Kuis Kosong", "2024-01-08"))
            .await
            .unwrap();
        let live = seaorm
            .create_exam(class_id, guru, exam("Ulangan Harian", "2024-01-08"))
            .await
            .unwrap();
        let question = seaorm
            .create_question(
                live.id,
                CreateQuestionRequest {
                    question_type: QuestionType::MultipleChoice,
                    question_text: "5 x 5 = ?".into(),
                    options: vec!["10".into(), "25".into()],
                    correct_option: Some("25".into()),
                },
            )
            .await
            .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(seaorm);
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaObjectCache::with_capacity(100, 60));
        let registry = ExamSessionRegistry::new(storage.clone(), 2);
        let app = init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache))
                .app_data(web::Data::new(registry))
                .configure(configure_exam_routes),
        )
        .await;
        let base = format!("/api/v1/classes/{class_id}/exams");

        // 未开考时交卷找不到会话
        let req = TestRequest::post()
            .uri(&format!("{base}/{}/session/submit", live.id))
            .insert_header(bearer(murid))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = TestRequest::get()
            .uri(&format!("{base}/{}/session", upcoming.id))
            .insert_header(bearer(murid))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["data"]["state"], "not_started");
        assert!(body["data"].get("questions").is_none());

        let req = TestRequest::get()
            .uri(&format!("{base}/{}/session", empty.id))
            .insert_header(bearer(murid))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ExamInvalid as i32);

        let req = TestRequest::get()
            .uri(&format!("{base}/{}/session", live.id))
            .insert_header(bearer(murid))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        assert_eq!(body["data"]["state"], "in_progress");
        assert_eq!(body["data"]["questions"].as_array().map(Vec::len), Some(1));
        assert!(body["data"]["questions"][0].get("correct_option").is_none());

        let req = TestRequest::put()
            .uri(&format!("{base}/{}/session/answers", live.id))
            .insert_header(bearer(murid))
            .set_json(json!({ "question_id": question.id, "answer": "25" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);

        let req = TestRequest::post()
            .uri(&format!("{base}/{}/session/submit", live.id))
            .insert_header(bearer(murid))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        assert_eq!(body["data"]["state"], "submitted");
        assert_eq!(body["data"]["submission"]["score"], 100);

        // 再次进入只看到提交结果，不再下发题目
        let req = TestRequest::get()
            .uri(&format!("{base}/{}/session", live.id))
            .insert_header(bearer(murid))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["data"]["state"], "submitted");
        assert!(body["data"].get("questions").is_none());

        let req = TestRequest::put()
            .uri(&format!("{base}/{}/session/answers", live.id))
            .insert_header(bearer(murid))
            .set_json(json!({ "question_id": question.id, "answer": "10" }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ExamAlreadySubmitted as i32);
    }
}
