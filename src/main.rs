use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use tasklane::auth::REFRESH_TOKEN_HEADER;
use tasklane::mail::{LogMailer, Mailer, SmtpMailer};
use tasklane::models::CATALOG;
use tasklane::routes;
use tasklane::store::{CategoryStore, PgStore};
use tasklane::{AppState, Config};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error("failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error("failed to run migrations", e))?;

    let store = Arc::new(PgStore::new(pool));
    store
        .seed_categories(&CATALOG)
        .await
        .map_err(|e| startup_error("failed to seed categories", e))?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(
            SmtpMailer::new(smtp).map_err(|e| startup_error("invalid SMTP settings", e))?,
        ),
        None => {
            log::warn!("SMTP is not configured, outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = web::Data::new(AppState::new(store, mailer, &config));
    let issuer = state.tokens.clone();

    log::info!("Starting tasklane server at {}", config.server_url());
    HttpServer::new(move || {
        let issuer = issuer.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .expose_headers(vec![REFRESH_TOKEN_HEADER])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(move |cfg| routes::config(cfg, issuer))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
