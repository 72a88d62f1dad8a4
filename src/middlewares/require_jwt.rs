/*!
 * JWT 认证中间件
 *
 * 令牌由外部身份层签发，本服务只负责校验。校验通过后把 [`Identity`]
 * 放入请求扩展，处理程序通过 [`RequireJWT::extract_identity`] 取出。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * web::scope("/api/feedbacks")
 *     .wrap(RequireJWT)
 *     .route("", web::post().to(create_feedback))
 * ```
 *
 * ## 认证流程
 *
 * 1. 客户端在请求头中包含 `Authorization: Bearer <JWT_TOKEN>`
 * 2. 中间件使用 app data 中的 [`JwtConfig`] 校验令牌并解析 `{userId, role}`
 * 3. 令牌无效或缺失时返回 401
 */

use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info};

use crate::config::JwtConfig;
use crate::errors::{EvalSystemError, Result};
use crate::models::users::entities::Identity;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::jwt::JwtUtils;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

fn unauthorized(message: &str) -> HttpResponse {
    HttpResponse::build(StatusCode::UNAUTHORIZED).json(ApiResponse::<()>::error_empty(
        ErrorCode::Unauthorized,
        message,
    ))
}

// 提取并验证 JWT token
fn extract_identity_from_header(req: &ServiceRequest) -> Result<Identity> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| {
            EvalSystemError::authentication("Missing or invalid Authorization header")
        })?;

    let secret = req
        .app_data::<web::Data<JwtConfig>>()
        .map(|config| config.secret.as_str())
        .unwrap_or_default();

    JwtUtils::identity_from_token(token, secret)
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
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            match extract_identity_from_header(&req) {
                Ok(identity) => {
                    debug!("JWT authentication successful for ID: {}", identity.user_id);
                    req.extensions_mut().insert(identity);
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
                        unauthorized(&format!("Unauthorized: {}", err.message()))
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 从请求扩展中提取调用方身份
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_identity(req: &actix_web::HttpRequest) -> Result<Identity> {
        req.extensions()
            .get::<Identity>()
            .copied()
            .ok_or_else(|| EvalSystemError::authentication("Unauthorized: missing identity"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpRequest, test};

    const SECRET: &str = "middleware-secret";

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match RequireJWT::extract_identity(&req) {
            Ok(identity) => HttpResponse::Ok().json(identity),
            Err(_) => HttpResponse::InternalServerError().finish(),
        }
    }

    fn jwt_config() -> web::Data<JwtConfig> {
        web::Data::new(JwtConfig {
            secret: SECRET.into(),
            access_token_expiry: 15,
        })
    }

    #[actix_web::test]
    async fn test_valid_token_passes_identity() {
        let app = test::init_service(
            App::new().app_data(jwt_config()).service(
                web::scope("/me")
                    .wrap(RequireJWT)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let token =
            JwtUtils::generate_token(Identity::user(5), SECRET, chrono::Duration::minutes(5))
                .unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{token}")))
            .to_request();
        let identity: Identity = test::call_and_read_body_json(&app, req).await;
        assert_eq!(identity, Identity::user(5));
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test::init_service(
            App::new().app_data(jwt_config()).service(
                web::scope("/me")
                    .wrap(RequireJWT)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
