use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{
    AppState,
    config::AppConfig,
    create_router,
    repositories::{PgUserRepository, PgVideoRepository},
};
use auth::{JwtService, MandrillNotifier};
use common::{database, storage::S3Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Clipshare API service");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let pool = database::init_pool(&config.database).await?;
    if database::health_check(&pool).await {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    let storage = S3Storage::new(config.storage.clone()).await;

    if !config.mail.is_configured() {
        warn!("MANDRILL_API_KEY not set; registration emails will not be sent");
    }

    let app_state = AppState {
        user_repository: Arc::new(PgUserRepository::new(pool.clone())),
        video_repository: Arc::new(PgVideoRepository::new(pool)),
        storage: Arc::new(storage),
        notifier: Arc::new(MandrillNotifier::new(config.mail.clone())),
        jwt_service: JwtService::new(&config.jwt),
        login_url: config.login_url.clone(),
    };

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("API service listening on {}", config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
