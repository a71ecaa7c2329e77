use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::dashboard::DashboardStats;
use crate::models::users::entities::{User, UserRole};
use crate::services::{current_user, storage_failure};
use crate::storage::Storage;

super::define_service!(
    /// 按角色汇总的首页统计
    DashboardService
);

async fn collect_stats(storage: &dyn Storage, user: &User) -> Result<DashboardStats> {
    Ok(match user.role {
        UserRole::Admin => DashboardStats::Admin {
            admins: storage.count_users_by_role(UserRole::Admin).await?,
            gurus: storage.count_users_by_role(UserRole::Guru).await?,
            murids: storage.count_users_by_role(UserRole::Murid).await?,
            classes: storage.count_classes(None).await?,
            assignments: storage.count_assignments(None).await?,
            exams: storage.count_exams(None).await?,
        },
        UserRole::Guru => DashboardStats::Guru {
            classes: storage.count_classes(Some(user.id)).await?,
            students: storage.count_teacher_students(user.id).await?,
            assignments: storage.count_assignments(Some(user.id)).await?,
            exams: storage.count_exams(Some(user.id)).await?,
            ungraded_submissions: storage.count_ungraded_submissions(user.id).await?,
        },
        UserRole::Murid => DashboardStats::Murid {
            classes: storage.count_student_classes(user.id).await?,
            pending_assignments: storage.count_pending_assignments(user.id).await?,
            pending_exams: storage.count_pending_exams(user.id).await?,
        },
    })
}

impl DashboardService {
    pub async fn get_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let stats = collect_stats(storage.as_ref(), &user)
            .await
            .map_err(storage_failure("Failed to load dashboard"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(stats, "Dashboard retrieved")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::requests::CreateAssignmentRequest;
    use crate::storage::sea_orm_storage::{
        SeaOrmStorage,
        test_support::{seed_class, seed_user},
    };

    #[tokio::test]
    async fn test_stats_per_role() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru_id = seed_user(&storage, "pak_joko", UserRole::Guru).await;
        let murid_id = seed_user(&storage, "siti", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru_id).await;
        storage.enroll_student(class_id, murid_id).await.unwrap();
        storage
            .create_assignment(
                class_id,
                guru_id,
                CreateAssignmentRequest {
                    title: "Rangkuman Bab 1".into(),
                    description: None,
                    deadline: chrono::Utc::now() + chrono::Duration::days(3),
                    task_file_url: None,
                    video_url: None,
                    cover_url: None,
                },
            )
            .await
            .unwrap();

        let guru = storage.get_user_by_id(guru_id).await.unwrap().unwrap();
        match collect_stats(&storage, &guru).await.unwrap() {
            DashboardStats::Guru {
                classes,
                students,
                assignments,
                ungraded_submissions,
                ..
            } => {
                assert_eq!(classes, 1);
                assert_eq!(students, 1);
                assert_eq!(assignments, 1);
                assert_eq!(ungraded_submissions, 0);
            }
            other => panic!("unexpected stats: {other:?}"),
        }

        let murid = storage.get_user_by_id(murid_id).await.unwrap().unwrap();
        match collect_stats(&storage, &murid).await.unwrap() {
            DashboardStats::Murid {
                classes,
                pending_assignments,
                pending_exams,
            } => {
                assert_eq!(classes, 1);
                assert_eq!(pending_assignments, 1);
                assert_eq!(pending_exams, 0);
            }
            other => panic!("unexpected stats: {other:?}"),
        }
    }
}
