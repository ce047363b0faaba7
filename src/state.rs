use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::mail::Mailer;
use crate::services::{IdentityService, TaskService};
use crate::store::{CategoryStore, TaskStore, UserStore};

/// Shared application state handed to every handler through `web::Data`.
pub struct AppState {
    pub identity: IdentityService,
    pub tasks: TaskService,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Wires the services over one store that backs users, tasks and categories.
    pub fn new<S>(store: Arc<S>, mailer: Arc<dyn Mailer>, config: &Config) -> Self
    where
        S: UserStore + TaskStore + CategoryStore + 'static,
    {
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            config.jwt_expiration_minutes,
        ));

        Self {
            identity: IdentityService::new(
                store.clone(),
                mailer,
                tokens.clone(),
                config.frontend_url.clone(),
                config.bcrypt_cost,
            ),
            tasks: TaskService::new(store.clone(), store),
            tokens,
        }
    }
}
