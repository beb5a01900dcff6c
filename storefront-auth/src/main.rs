use std::net::SocketAddr;

use storefront_auth::{
    build_router,
    config::AuthConfig,
    db,
    error::AppError,
    observability::logging::init_tracing,
    services::{AuthService, Database, JwtService, SecurityLogger},
    AppState,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    // Initialize database connection
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let database = Database::new(pool);

    // Initialize JWT service
    let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;
    tracing::info!("JWT service initialized");

    let security_log = SecurityLogger::new(database.clone());

    // Self-registration needs a designated default role; a deployment
    // without one is misconfigured, so refuse to serve.
    let default_role = database
        .find_default_role()
        .await?
        .ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "No default role configured; seed a role with is_default = TRUE"
            ))
        })?;
    tracing::info!(role = %default_role.name, "Default self-registration role resolved");

    let auth_service = AuthService::new(
        database.clone(),
        jwt.clone(),
        security_log,
        default_role.id,
        config.security.bcrypt_cost,
    );

    // Create application state
    let state = AppState {
        config: config.clone(),
        db: database,
        jwt,
        auth_service,
    };

    // Build application router
    let app = build_router(state)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
