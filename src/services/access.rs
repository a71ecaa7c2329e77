//! 班级访问判定
//!
//! 管理员可访问任意班级，guru 仅能访问自己负责的班级，murid 仅能访问已选的班级。

use actix_web::http::StatusCode;

use crate::errors::LmsError;
use crate::models::ErrorCode;
use crate::models::classes::entities::{Class, ClassAccess, ClassRelation};
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

#[derive(Debug)]
pub enum AccessError {
    ClassNotFound,
    Denied,
    Storage(LmsError),
}

impl AccessError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccessError::ClassNotFound => StatusCode::NOT_FOUND,
            AccessError::Denied => StatusCode::FORBIDDEN,
            AccessError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AccessError::ClassNotFound => ErrorCode::ClassNotFound,
            AccessError::Denied => ErrorCode::ClassPermissionDenied,
            AccessError::Storage(_) => ErrorCode::InternalServerError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AccessError::ClassNotFound => "Class not found".to_string(),
            AccessError::Denied => "No permission for this class".to_string(),
            AccessError::Storage(e) => format!("Class access check failed: {}", e.message()),
        }
    }
}

/// 不涉及存储的关系判定
pub fn relation_for(user: &User, class: &Class, enrolled: bool) -> Option<ClassRelation> {
    match user.role {
        UserRole::Admin => Some(ClassRelation::Admin),
        UserRole::Guru if class.teacher_id == user.id => Some(ClassRelation::Owner),
        UserRole::Murid if enrolled => Some(ClassRelation::Member),
        _ => None,
    }
}

pub async fn resolve_class_access(
    storage: &dyn Storage,
    user: &User,
    class_id: i64,
) -> Result<ClassAccess, AccessError> {
    let class = storage
        .get_class_by_id(class_id)
        .await
        .map_err(AccessError::Storage)?
        .ok_or(AccessError::ClassNotFound)?;

    let enrolled = if user.role == UserRole::Murid {
        storage
            .get_enrollment(class_id, user.id)
            .await
            .map_err(AccessError::Storage)?
            .is_some()
    } else {
        false
    };

    relation_for(user, &class, enrolled)
        .map(|relation| ClassAccess { class, relation })
        .ok_or(AccessError::Denied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;
    use crate::storage::sea_orm_storage::{
        SeaOrmStorage,
        test_support::{seed_class, seed_user},
    };
    use chrono::Utc;

    fn user(id: i64, role: UserRole) -> User {
        User {
            id,
            username: format!("u{id}"),
            email: format!("u{id}@kelas.id"),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            display_name: None,
            avatar_url: None,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn class(teacher_id: i64) -> Class {
        Class {
            id: 1,
            name: "Matematika".into(),
            description: None,
            teacher_id,
            cover_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_relation_rules() {
        let c = class(2);
        assert_eq!(
            relation_for(&user(1, UserRole::Admin), &c, false),
            Some(ClassRelation::Admin)
        );
        assert_eq!(
            relation_for(&user(2, UserRole::Guru), &c, false),
            Some(ClassRelation::Owner)
        );
        assert_eq!(relation_for(&user(3, UserRole::Guru), &c, false), None);
        assert_eq!(
            relation_for(&user(4, UserRole::Murid), &c, true),
            Some(ClassRelation::Member)
        );
        assert_eq!(relation_for(&user(4, UserRole::Murid), &c, false), None);
    }

    #[tokio::test]
    async fn test_resolve_against_storage() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru_id = seed_user(&storage, "bu_sari", UserRole::Guru).await;
        let murid_id = seed_user(&storage, "andi", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru_id).await;

        let murid = storage.get_user_by_id(murid_id).await.unwrap().unwrap();
        let err = resolve_class_access(&storage, &murid, class_id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        storage.enroll_student(class_id, murid_id).await.unwrap();
        let access = resolve_class_access(&storage, &murid, class_id).await.unwrap();
        assert_eq!(access.relation, ClassRelation::Member);
        assert!(!access.relation.can_manage());

        let guru = storage.get_user_by_id(guru_id).await.unwrap().unwrap();
        let access = resolve_class_access(&storage, &guru, class_id).await.unwrap();
        assert!(access.relation.can_manage());

        let err = resolve_class_access(&storage, &guru, class_id + 100)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
