use std::sync::Arc;

use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod codes;
mod comments;
mod config;
mod customers;
mod error;
mod response;
mod routes;
mod staff;
#[cfg(test)]
mod testing;

use auth::{service::AccountService, store::PgAccountStore};
use comments::{pg::PgCommentStore, service::CommentService};
use config::settings::Settings;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medion_backend=info,tower_http=info")),
        )
        .init();

    let settings = Settings::new()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;

    info!("database connected");

    sqlx::migrate!().run(&pool).await?;

    let app_state = AppState {
        comments: CommentService::new(Arc::new(PgCommentStore::new(pool.clone()))),
        accounts: AccountService::new(Arc::new(PgAccountStore::new(pool)), settings.clone()),
        settings: settings.clone(),
    };

    let app = routes::app(app_state);

    info!("Server running on http://localhost:{}", settings.port);

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
