//! Registration, email verification, login and password reset.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::error::AppError;
use crate::mail::Mailer;
use crate::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, NewUser, PublicUser,
    RegisterRequest, ResetPasswordRequest,
};
use crate::store::{StoreError, UserStore};
use crate::validation::validate_payload;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const UNVERIFIED_ACCOUNT: &str = "Please verify your email first";
pub const INVALID_RESET_TOKEN: &str = "Invalid or expired token";
pub const INVALID_VERIFICATION_TOKEN: &str = "Invalid token";
pub const FORGOT_PASSWORD_ACK: &str = "If an account exists, a reset link has been sent";

pub struct IdentityService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<TokenIssuer>,
    frontend_url: String,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<TokenIssuer>,
        frontend_url: impl Into<String>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            mailer,
            tokens,
            frontend_url: frontend_url.into(),
            bcrypt_cost,
        }
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/auth/verify-email?token={}", self.frontend_url, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/auth/reset-password?token={}", self.frontend_url, token)
    }

    /// Creates an unverified account and mails its verification link.
    ///
    /// The email is sent in the background; a delivery failure is logged and
    /// does not affect the outcome.
    pub async fn register(&self, request: RegisterRequest) -> Result<MessageResponse, AppError> {
        validate_payload(&request)?;
        let (Some(name), Some(email), Some(password)) =
            (request.name, request.email, request.password)
        else {
            return Err(AppError::BadRequest("Invalid request data".into()));
        };

        match self.users.find_user_by_email(&email).await {
            Ok(_) => return Err(email_taken()),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = hash_password(&password, self.bcrypt_cost)?;
        let new_user = NewUser {
            name,
            email,
            password_hash,
            verification_token: Uuid::new_v4().to_string(),
        };

        let user = self.users.insert_user(new_user).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => email_taken(),
            other => other.into(),
        })?;
        log::info!("registered user {} <{}>", user.id, user.email);

        let link = self.verification_link(user.verification_token.as_deref().unwrap_or_default());
        let mailer = self.mailer.clone();
        let to = user.email.clone();
        tokio::spawn(async move {
            let body = format!(
                "Welcome! Confirm your email address by opening this link:\n\n{}\n",
                link
            );
            if let Err(e) = mailer.send(&to, "Verify your email", &body).await {
                log::warn!("could not send verification email to {}: {}", to, e);
            }
        });

        Ok(MessageResponse::new(
            "User registered successfully. Please verify your email.",
        ))
    }

    /// Marks the account owning `token` as verified and consumes the token.
    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::NotFound(INVALID_VERIFICATION_TOKEN.into()));
        }

        let user = self.users.mark_verified(token).await.map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound(INVALID_VERIFICATION_TOKEN.into()),
            other => other.into(),
        })?;

        Ok(MessageResponse::new(format!(
            "User with email {} verified successfully",
            user.email
        )))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = match self.users.find_user_by_email(&request.email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                log::debug!("login attempt for unknown email");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_verified {
            return Err(AppError::Forbidden(UNVERIFIED_ACCOUNT.into()));
        }

        if !verify_password(&request.password, &user.password_hash)? {
            log::debug!("wrong password for user {}", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let token = self.tokens.mint(&user.email, user.id)?;
        Ok(LoginResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Starts a password reset. The acknowledgment is the same whether or not
    /// the account exists; a delivery failure for an existing account is not hidden.
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        validate_payload(&request)?;
        let email = request.email.unwrap_or_default();

        let user = match self.users.find_user_by_email(&email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Ok(MessageResponse::new(FORGOT_PASSWORD_ACK)),
            Err(e) => return Err(e.into()),
        };

        let reset_token = Uuid::new_v4().to_string();
        let user = self.users.set_reset_token(user.id, &reset_token).await?;

        let body = format!(
            "A password reset was requested for your account. Choose a new password here:\n\n{}\n",
            self.reset_link(&reset_token)
        );
        if let Err(e) = self.mailer.send(&user.email, "Reset your password", &body).await {
            log::error!("could not send reset email to {}: {}", user.email, e);
            return Err(e.into());
        }

        Ok(MessageResponse::new(FORGOT_PASSWORD_ACK))
    }

    /// Replaces the password of the account owning the reset token and consumes it.
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        let token = request.token.trim();
        if token.is_empty() {
            return Err(AppError::InvalidToken(INVALID_RESET_TOKEN.into()));
        }

        self.users
            .find_user_by_reset_token(token)
            .await
            .map_err(reset_token_error)?;

        validate_payload(&request)?;
        let new_password = request.new_password.as_deref().unwrap_or_default();
        let password_hash = hash_password(new_password, self.bcrypt_cost)?;

        // A concurrent reset with the same token may have consumed it meanwhile.
        let user = self
            .users
            .consume_reset_token(token, &password_hash)
            .await
            .map_err(reset_token_error)?;
        log::info!("password reset for user {}", user.id);

        Ok(MessageResponse::new(format!(
            "Password successfully updated for {}",
            user.email
        )))
    }
}

fn reset_token_error(error: StoreError) -> AppError {
    match error {
        StoreError::NotFound => AppError::InvalidToken(INVALID_RESET_TOKEN.into()),
        other => other.into(),
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("User with that email already registered".into())
}
