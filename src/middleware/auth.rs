use crate::error::AppError;
use crate::models::user::AuthenticatedUser;
use crate::utils::token::TokenService;
use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::warn;

/// Bearer-token gate for protected scopes.
///
/// Needs `web::Data<TokenService>` registered on the app. On success the
/// caller's identity is available to handlers as
/// `web::ReqData<AuthenticatedUser>`; on failure the request never reaches
/// the handler.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn reject<B>(
    req: ServiceRequest,
    err: AppError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B, BoxBody>>, Error>>
where
    B: 'static,
{
    let (req, _pl) = req.into_parts();
    let res = err.error_response();
    Box::pin(async move { Ok(ServiceResponse::new(req, res).map_into_right_body()) })
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match bearer_token(&req) {
            Some(t) => t,
            None => {
                return reject(
                    req,
                    AppError::Unauthorized("Authorization token required".to_string()),
                )
            }
        };

        let tokens = match req.app_data::<web::Data<TokenService>>().cloned() {
            Some(tokens) => tokens,
            None => {
                return reject(
                    req,
                    AppError::Internal("token service not configured".to_string()),
                )
            }
        };

        let user_id = match tokens.verify(&token) {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!(reason = %e, path = %req.path(), "Rejected bearer token");
                return reject(
                    req,
                    AppError::Unauthorized("Invalid or expired token".to_string()),
                );
            }
        };

        req.extensions_mut().insert(AuthenticatedUser { user_id });

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
