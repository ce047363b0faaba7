use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue, AUTHORIZATION},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::AuthenticatedUser;
use crate::auth::token::TokenIssuer;
use crate::error::AppError;

/// Response header carrying a replacement token when the presented one is close to expiry.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Outcome of a successful gate check.
#[derive(Debug, Clone)]
pub struct Authentication {
    pub user: AuthenticatedUser,
    /// Set when the presented token was within the refresh threshold.
    pub refreshed_token: Option<String>,
}

/// Validates an `Authorization` header value.
pub fn authenticate(
    issuer: &TokenIssuer,
    header: Option<&str>,
) -> Result<Authentication, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthorized("Authorization header is required".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let claims = issuer.verify(token)?;

    let refreshed_token = if issuer.needs_refresh(&claims) {
        match issuer.mint(&claims.email, claims.user_id) {
            Ok(token) => Some(token),
            Err(e) => {
                log::warn!("could not refresh token for user {}: {}", claims.user_id, e);
                None
            }
        }
    } else {
        None
    };

    Ok(Authentication {
        user: AuthenticatedUser {
            id: claims.user_id,
            email: claims.email,
        },
        refreshed_token,
    })
}

/// Guards a scope: requests without a valid bearer token are answered with
/// `401 Unauthorized` and never reach the handlers.
#[derive(Clone)]
pub struct AuthMiddleware {
    issuer: Arc<TokenIssuer>,
}

impl AuthMiddleware {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    issuer: Arc<TokenIssuer>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let authentication = match authenticate(&self.issuer, header) {
            Ok(authentication) => authentication,
            Err(app_err) => {
                let res = req.error_response(app_err).map_into_right_body();
                return Box::pin(async move { Ok(res) });
            }
        };

        req.extensions_mut().insert(authentication.user);
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            if let Some(token) = authentication.refreshed_token {
                if let Ok(value) = HeaderValue::from_str(&token) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REFRESH_TOKEN_HEADER), value);
                }
            }
            Ok(res.map_into_left_body())
        })
    }
}
