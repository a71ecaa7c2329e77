pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::classes::requests::{ClassQueryParams, CreateClassRequest, UpdateClassRequest};

super::define_service!(ClassService);

impl ClassService {
    // 获取班级列表
    pub async fn list_classes(
        &self,
        request: &HttpRequest,
        query: ClassQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_classes(self, request, query).await
    }

    pub async fn create_class(
        &self,
        req: &HttpRequest,
        class_data: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_class(self, req, class_data).await
    }

    // 班级详情，须在 RequireClassAccess 之后
    pub async fn get_class(&self, req: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_class(self, req).await
    }

    // 更新班级信息
    pub async fn update_class(
        &self,
        req: &HttpRequest,
        update_data: UpdateClassRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_class(self, req, update_data).await
    }

    pub async fn delete_class(&self, req: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_class(self, req).await
    }
}

/// 班级名称最长字符数
pub(crate) const CLASS_NAME_MAX: usize = 100;
