pub mod auth;
pub mod categories;
pub mod health;
pub mod tasks;

use std::sync::Arc;

use actix_web::web;

use crate::auth::{AuthMiddleware, TokenIssuer};
use crate::error::AppError;

/// Registers every route. Task and category routes sit behind `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig, issuer: Arc<TokenIssuer>) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login)
                        .service(auth::verify_email)
                        .service(auth::forgot_password)
                        .service(auth::reset_password),
                )
                .service(
                    web::scope("/tasks")
                        .wrap(AuthMiddleware::new(issuer.clone()))
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task)
                        .service(tasks::toggle_task),
                )
                .service(
                    web::scope("/categories")
                        .wrap(AuthMiddleware::new(issuer))
                        .service(categories::get_categories),
                ),
        );
}

/// Unreadable JSON bodies become `400 {"error": "Invalid request data"}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("rejected request body: {}", err);
        AppError::BadRequest("Invalid request data".into()).into()
    })
}

/// Non-numeric ids in the path become `400 {"error": "Invalid task ID"}`.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::BadRequest("Invalid task ID".into()).into())
}
