//! Session tokens, password hashing and the request authentication gate.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

pub use extractors::AuthenticatedUser;
pub use middleware::{authenticate, AuthMiddleware, Authentication, REFRESH_TOKEN_HEADER};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenIssuer};
