/*!
 * JWT 认证中间件
 *
 * 验证 `Authorization: Bearer <JWT_TOKEN>`，通过后把 [`AuthUser`] 写入请求扩展。
 * 用户信息完全来自令牌 claims，不查询数据库。
 *
 * ```rust,ignore
 * web::scope("/api/v1/books")
 *     .wrap(RequireJWT::new())
 *     .route("", web::get().to(list_books))
 * ```
 *
 * 处理程序中通过 `RequireJWT::extract_user(&req)` 取得当前用户。
 */

use crate::models::ErrorCode;
use crate::models::auth::entities::AuthUser;
use crate::utils::jwt::{Claims, JwtUtils};
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone, Default)]
pub struct RequireJWT {
    // 为空时使用配置中的 jwt.secret
    secret: Option<Arc<str>>,
}

impl RequireJWT {
    pub fn new() -> Self {
        Self { secret: None }
    }

    pub fn with_secret(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    /// 从请求扩展中取出当前用户
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<AuthUser> {
        req.extensions().get::<AuthUser>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<String> {
        req.extensions().get::<AuthUser>().map(|user| user.id.clone())
    }
}

fn extract_and_validate_jwt(
    req: &ServiceRequest,
    secret: Option<&str>,
) -> Result<AuthUser, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let verified: Result<Claims, _> = match secret {
        Some(secret) => JwtUtils::verify_access_token_with(token, secret, 0),
        None => JwtUtils::verify_access_token(token),
    };
    let claims = verified.map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    Ok(claims.into_auth_user())
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
    secret: Option<Arc<str>>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        let secret = self.secret.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(
                    req.into_response(HttpResponse::NoContent().finish().map_into_right_body())
                );
            }

            match extract_and_validate_jwt(&req, secret.as_deref()) {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}
