//! 文件存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::files::{ActiveModel, Entity as Files};
use crate::errors::Result;
use crate::models::files::entities::{File, NewFile};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    /// 保存上传记录，下载 token 在此生成
    pub async fn create_file_impl(&self, file: NewFile) -> Result<File> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            download_token: Set(uuid::Uuid::new_v4().simple().to_string()),
            original_name: Set(file.original_name),
            stored_path: Set(file.stored_path),
            remote_file_id: Set(file.remote_file_id),
            backend: Set(file.backend.to_string()),
            file_size: Set(file.file_size),
            file_type: Set(file.file_type),
            user_id: Set(file.user_id),
            created_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("保存文件记录失败"))?;

        Ok(result.into_file())
    }

    /// 通过 token 获取文件
    pub async fn get_file_by_token_impl(&self, token: &str) -> Result<Option<File>> {
        let result = Files::find_by_id(token.to_string())
            .one(&self.db)
            .await
            .map_err(db_error("查询文件失败"))?;

        Ok(result.map(|m| m.into_file()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadBackend;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::seed_user;

    #[tokio::test]
    async fn test_create_and_fetch_by_token() {
        let storage = SeaOrmStorage::in_memory().await;
        let user_id = seed_user(&storage, "guru", UserRole::Guru).await;

        let file = storage
            .create_file_impl(NewFile {
                original_name: "modul-1.pdf".to_string(),
                stored_path: "https://cdn.example/modul-1.pdf".to_string(),
                remote_file_id: Some("f-77".to_string()),
                backend: UploadBackend::Remote,
                file_size: 2048,
                file_type: "application/pdf".to_string(),
                user_id,
            })
            .await
            .unwrap();
        assert_eq!(file.download_token.len(), 32);

        let fetched = storage
            .get_file_by_token_impl(&file.download_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.backend, UploadBackend::Remote);
        assert_eq!(fetched.remote_file_id.as_deref(), Some("f-77"));
        assert!(storage.get_file_by_token_impl("missing").await.unwrap().is_none());
    }
}
