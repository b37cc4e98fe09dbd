mod app;
mod auth;
mod config;
mod error;
mod extract;
mod state;
mod users;


use crate::config::{AppConfig, AuthPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "devtinder=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    match config.auth_policy {
        AuthPolicy::Static if config.admin_token.is_none() => {
            tracing::warn!("AUTH_POLICY=static without ADMIN_TOKEN; admin routes will reject everything");
        }
        AuthPolicy::Static => {
            tracing::warn!("AUTH_POLICY=static guards admin routes with a shared secret; use signed-token outside development");
        }
        AuthPolicy::SignedToken => {}
    }
    if !config.cookie_secure {
        tracing::warn!("COOKIE_SECURE=false; session cookie will be sent over plain http");
    }

    let (host, port) = (config.host.clone(), config.port);
    let (app_state, db) = state::AppState::init(config).await?;

    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("migrations applied");

    app::serve(app::build_app(app_state), &host, port).await
}
