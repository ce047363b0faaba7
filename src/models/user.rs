use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A stored account.
///
/// Deliberately not `Serialize`: the password hash and the one-time tokens must
/// never leave the service. Responses use [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Unique across all accounts, compared exactly as stored.
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    /// Pending email verification token. `None` once consumed.
    pub verification_token: Option<String>,
    /// Pending password reset token. `None` when no reset is in progress.
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row values for an account about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub verification_token: String,
}

/// The projection of a user returned at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
        }
    }
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "Name is required"),
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 8, message = "Password must be at least 8 characters"),
        custom = "crate::validation::validate_password_strength"
    )]
    pub password: Option<String>,
}

/// Represents the payload for a user login request.
///
/// Carries no field rules: any mismatch is reported as the same authentication failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response structure after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The JWT for session authentication.
    pub token: String,
    pub user: PublicUser,
}

/// Query string of the verification link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,

    #[validate(
        required(message = "Password is required"),
        length(min = 8, message = "Password must be at least 8 characters"),
        custom = "crate::validation::validate_password_strength"
    )]
    pub new_password: Option<String>,
}

/// Plain acknowledgment body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{field_messages, PASSWORD_STRENGTH_MESSAGE};
    use validator::Validate;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register("Ann", "ann@x.com", "Password*1").validate().is_ok());

        let fields = field_messages(&register("A", "ann", "password").validate().unwrap_err());
        assert_eq!(
            fields["name"],
            vec!["Name must be between 2 and 50 characters".to_string()]
        );
        assert_eq!(fields["email"], vec!["Invalid email format".to_string()]);
        assert_eq!(fields["password"], vec![PASSWORD_STRENGTH_MESSAGE.to_string()]);
    }

    #[test]
    fn test_email_longer_than_the_column_is_rejected() {
        let email = format!(
            "{}@{}.{}.{}.com",
            "a".repeat(64),
            "b".repeat(63),
            "c".repeat(63),
            "d".repeat(63)
        );
        assert!(email.len() > 255);

        let fields = field_messages(&register("Ann", &email, "Password*1").validate().unwrap_err());
        assert_eq!(
            fields["email"],
            vec!["Email must be at most 255 characters".to_string()]
        );

        let forgot = ForgotPasswordRequest { email: Some(email) };
        assert!(forgot.validate().is_err());
    }

    #[test]
    fn test_register_request_reports_missing_fields() {
        let fields = field_messages(&RegisterRequest::default().validate().unwrap_err());
        assert_eq!(fields["name"], vec!["Name is required".to_string()]);
        assert_eq!(fields["email"], vec!["Email is required".to_string()]);
        assert_eq!(fields["password"], vec!["Password is required".to_string()]);
    }

    #[test]
    fn test_reset_password_request_validation() {
        let weak = ResetPasswordRequest {
            token: "abc".to_string(),
            new_password: Some("short".to_string()),
        };
        let fields = field_messages(&weak.validate().unwrap_err());
        assert_eq!(fields["new_password"].len(), 2);

        let strong = ResetPasswordRequest {
            token: "abc".to_string(),
            new_password: Some("N3w-Password".to_string()),
        };
        assert!(strong.validate().is_ok());
    }

    #[test]
    fn test_public_user_hides_secrets() {
        let now = Utc::now();
        let user = User {
            id: 5,
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            is_verified: true,
            verification_token: None,
            reset_token: Some("reset".to_string()),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert_eq!(json["email"], "ann@x.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token").is_none());
    }
}
