#![doc = "The `tasklane` library crate."]
#![doc = ""]
#![doc = "Per-user task lists grouped by a fixed category catalog, behind an"]
#![doc = "email-verified account lifecycle and JWT sessions with sliding refresh."]
#![doc = "The binary (`main.rs`) builds the Postgres store and mailer from the"]
#![doc = "environment and serves `routes::config`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
