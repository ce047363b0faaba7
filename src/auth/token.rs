use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Remaining lifetime below which the gate hands out a replacement token.
pub const REFRESH_THRESHOLD_SECONDS: i64 = 5 * 60;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm or malformed structure.
    Invalid(String),
    /// The `exp` claim is in the past.
    Expired,
    /// The token could not be encoded.
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Invalid(_) => write!(f, "Invalid token"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Signing(msg) => write!(f, "Failed to sign token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Mints and verifies HS256 session tokens with a fixed time-to-live.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Mints a token for the user, issued now.
    pub fn mint(&self, email: &str, user_id: i64) -> Result<String, TokenError> {
        self.mint_at(email, user_id, Utc::now())
    }

    /// Mints a token as if it had been issued at `issued_at`.
    pub fn mint_at(
        &self,
        email: &str,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry is out of range".into()))?;
        let claims = Claims {
            email: email.to_string(),
            user_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature, algorithm and expiry (no leeway) and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// True when the token behind `claims` expires within the refresh threshold.
    pub fn needs_refresh(&self, claims: &Claims) -> bool {
        claims.exp - Utc::now().timestamp() < REFRESH_THRESHOLD_SECONDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test_secret_for_gen_verify", 4320)
    }

    #[test]
    fn test_token_generation_and_verification() {
        let issuer = issuer();
        let token = issuer.mint("ann@x.com", 1).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.exp - claims.iat, 4320 * 60);
        assert!(!issuer.needs_refresh(&claims));
    }

    #[test]
    fn test_claims_use_camel_case_user_id() {
        let claims = Claims {
            email: "ann@x.com".into(),
            user_id: 9,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], 9);
    }

    #[test]
    fn test_token_expiration() {
        let issuer = issuer();
        let issued_at = Utc::now() - Duration::minutes(4320) - Duration::seconds(2);
        let expired = issuer.mint_at("ann@x.com", 2, issued_at).unwrap();

        assert_eq!(issuer.verify(&expired), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_close_to_expiry_needs_refresh() {
        let issuer = issuer();
        let issued_at = Utc::now() - Duration::minutes(4320) + Duration::minutes(2);
        let token = issuer.mint_at("ann@x.com", 3, issued_at).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert!(issuer.needs_refresh(&claims));
    }

    #[test]
    fn test_unrepresentable_expiry_is_a_signing_error() {
        let issuer = TokenIssuer::new("test_secret_for_gen_verify", 200_000_000_000);
        assert!(matches!(
            issuer.mint("ann@x.com", 6),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_invalid_token_signature() {
        let other = TokenIssuer::new("a_completely_different_secret", 60);
        let token = other.mint("ann@x.com", 4).unwrap();

        assert!(matches!(issuer().verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            issuer().verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(issuer().verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let claims = Claims {
            email: "ann@x.com".into(),
            user_id: 5,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret("test_secret_for_gen_verify".as_bytes()),
        )
        .unwrap();

        assert!(matches!(issuer().verify(&token), Err(TokenError::Invalid(_))));
    }
}
