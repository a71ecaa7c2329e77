/*!
 * 班级访问控制中间件
 *
 * 必须在 RequireJWT 之后使用，路由路径中须包含 `{class_id}`。
 * 校验通过后将 `ClassAccess` 放入请求扩展。
 *
 * ```rust,ignore
 * web::scope("/api/v1/classes/{class_id}")
 *     .wrap(RequireClassAccess::members())
 *     .wrap(RequireJWT)
 *     .service(
 *         web::resource("/attendance")
 *             .wrap(RequireClassAccess::managers())
 *             .route(web::get().to(attendance_sheet)),
 *     )
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use crate::{
    models::{ErrorCode, classes::entities::ClassAccess, users::entities::User},
    services::access::{AccessError, resolve_class_access},
    storage::Storage,
};

use super::create_error_response;

#[derive(Clone, Copy)]
pub struct RequireClassAccess {
    manage: bool,
}

impl RequireClassAccess {
    /// 班级成员：负责教师、管理员与已选课学生
    pub fn members() -> Self {
        Self { manage: false }
    }

    /// 仅负责教师与管理员
    pub fn managers() -> Self {
        Self { manage: true }
    }

    /// 从请求扩展中取出已校验的班级访问上下文
    pub fn extract(req: &actix_web::HttpRequest) -> Option<ClassAccess> {
        req.extensions().get::<ClassAccess>().cloned()
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireClassAccess
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireClassAccessMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireClassAccessMiddleware {
            service: Rc::new(service),
            manage: self.manage,
        }))
    }
}

pub struct RequireClassAccessMiddleware<S> {
    service: Rc<S>,
    manage: bool,
}

async fn check_access(req: &ServiceRequest, manage: bool) -> Result<ClassAccess, AccessError> {
    // 外层已校验过时直接复用
    let existing = req.extensions().get::<ClassAccess>().cloned();
    let access = match existing {
        Some(access) => access,
        None => {
            let user = req
                .extensions()
                .get::<User>()
                .cloned()
                .ok_or(AccessError::Denied)?;
            let class_id = req
                .match_info()
                .get("class_id")
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|id| *id > 0)
                .ok_or(AccessError::ClassNotFound)?;
            let storage = req
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .map(|s| s.get_ref().clone())
                .ok_or_else(|| {
                    AccessError::Storage(crate::errors::LmsError::database_config(
                        "Storage not found in app data",
                    ))
                })?;
            resolve_class_access(storage.as_ref(), &user, class_id).await?
        }
    };

    if manage && !access.relation.can_manage() {
        return Err(AccessError::Denied);
    }
    Ok(access)
}

impl<S, B> Service<ServiceRequest> for RequireClassAccessMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let manage = self.manage;

        Box::pin(async move {
            if req.extensions().get::<User>().is_none() {
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Unauthorized: missing user",
                    )
                    .map_into_right_body(),
                ));
            }

            match check_access(&req, manage).await {
                Ok(access) => {
                    debug!(
                        "Class {} accessed as {:?}",
                        access.class.id, access.relation
                    );
                    req.extensions_mut().insert(access);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!("Class access denied for {}: {}", req.path(), err.message());
                    Ok(req.into_response(
                        create_error_response(err.status(), err.code(), &err.message())
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}
