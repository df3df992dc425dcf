use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

mod assistant;
mod auth;
mod config;
mod cycle;
mod error;
mod mailer;
mod models;
mod routes;
mod state;
mod uploads;

use config::Config;
use mailer::Mailer;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("✅ Database connected, migrations applied");

    uploads::ensure_dirs(&config.upload_dir).await?;

    if !config.mail_configured() {
        tracing::warn!("⚠️ EMAIL_USER/EMAIL_PASS not set, password-reset links will only be logged");
    }

    let mailer = Mailer::from_config(&config);
    let port = config.port;
    let upload_dir = config.upload_dir.clone();
    let state = AppState::new(pool, config, mailer);

    let app = Router::new()
        .merge(routes::auth::routes(state.clone()))
        .merge(routes::period::routes(state.clone()))
        .merge(routes::diary::routes(state.clone()))
        .merge(routes::symptoms::routes(state.clone()))
        .merge(routes::appointments::routes(state.clone()))
        .merge(routes::medical::routes(state.clone()))
        .merge(routes::wellness::routes(state.clone()))
        .merge(routes::ai::routes(state.clone()))
        .merge(routes::resources::routes(state))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .route("/", get(|| async { "Backend is running with auth ✅" }))
        // room for a full diary upload (5 photos at 5 MB) plus form fields
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Server running on port {}", port);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
