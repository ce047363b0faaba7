use crate::{
    error::AppError,
    models::{
        ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
        VerifyEmailQuery,
    },
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates an unverified account and mails a verification link. No token is
/// issued until the email is verified and the user logs in.
///
/// ## Responses:
/// - `201 Created`: `{message}`.
/// - `400 Bad Request`: Field validation failed.
/// - `409 Conflict`: The email is already registered.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let ack = state.identity.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(ack))
}

/// Login user
///
/// Authenticates a verified user and returns a session token plus the public
/// user projection.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = state.identity.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/verify-email")]
pub async fn verify_email(
    state: web::Data<AppState>,
    query: web::Query<VerifyEmailQuery>,
) -> Result<impl Responder, AppError> {
    let ack = state.identity.verify_email(&query.token).await?;
    Ok(HttpResponse::Ok().json(ack))
}

/// Answers identically whether or not the email belongs to an account.
#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<AppState>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<impl Responder, AppError> {
    let ack = state.identity.forgot_password(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ack))
}

#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    let ack = state.identity.reset_password(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ack))
}
