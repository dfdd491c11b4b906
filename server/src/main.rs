use anyhow::Context;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use eventflow_server::auth::TokenCodec;
use eventflow_server::config::Config;
use eventflow_server::routes::create_routes;
use eventflow_server::store::PgStore;
use eventflow_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Migrations run successfully");

    let codec = TokenCodec::new(&config.jwt_secret);
    let state = AppState::new(PgStore::new(pool), codec);
    let app = create_routes(state, &config.http);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(production = config.http.production, "Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
