#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use tasklane::mail::{Mailer, Outbox, SentMail};
use tasklane::routes;
use tasklane::store::{MemoryStore, UserStore};
use tasklane::{AppState, Config};

pub const PASSWORD: &str = "Password*1";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "integration_test_secret".to_string(),
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
        jwt_expiration_minutes: 60,
        bcrypt_cost: 4,
        frontend_url: "http://localhost:5173".to_string(),
        smtp: None,
    }
}

/// Everything a test needs to drive the API and inspect side effects.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<Outbox>,
    pub state: web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_outbox(Outbox::new())
    }

    pub fn with_outbox(outbox: Outbox) -> Self {
        let store = Arc::new(MemoryStore::with_catalog());
        let outbox = Arc::new(outbox);
        let mailer: Arc<dyn Mailer> = outbox.clone();
        let state = web::Data::new(AppState::new(store.clone(), mailer, &test_config()));
        Self {
            store,
            outbox,
            state,
        }
    }

    pub async fn app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
        let issuer = self.state.tokens.clone();
        test::init_service(
            App::new()
                .app_data(self.state.clone())
                .configure(|cfg| routes::config(cfg, issuer)),
        )
        .await
    }

    pub async fn verification_token(&self, email: &str) -> String {
        self.store
            .find_user_by_email(email)
            .await
            .expect("registered user")
            .verification_token
            .expect("pending verification token")
    }

    pub async fn reset_token(&self, email: &str) -> Option<String> {
        self.store
            .find_user_by_email(email)
            .await
            .expect("registered user")
            .reset_token
    }

    /// Waits for a background email to land in the outbox.
    pub async fn wait_for_mail(&self, to: &str) -> Option<SentMail> {
        for _ in 0..50 {
            if let Some(mail) = self.outbox.last_to(to) {
                return Some(mail);
            }
            actix_rt::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

/// Sends the request and returns status, headers-free JSON body (`Null` when empty).
pub async fn call_json<S>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if body.is_empty() {
        return (status, Value::Null);
    }
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "response body is not JSON: {:?}",
            String::from_utf8_lossy(&body)
        )
    });
    (status, json)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Registers, verifies and logs in a user. Returns the session token.
pub async fn signed_in_user<S>(ctx: &TestContext, app: &S, name: &str, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": PASSWORD }))
        .to_request();
    let (status, body) = call_json(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let token = ctx.verification_token(email).await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/auth/verify-email?token={}", token))
        .to_request();
    let (status, body) = call_json(app, req).await;
    assert_eq!(status, StatusCode::OK, "verify failed: {}", body);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let (status, body) = call_json(app, req).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    body["token"].as_str().expect("token in login response").to_string()
}
