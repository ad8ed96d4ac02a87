mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use estate_api::auth::{AppState, AppStateInner};
use estate_api::uploads::Uploads;
use estate_chat::ChatResolver;
use estate_db::Database;
use estate_db::seed::seed_sample_data;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "estate=debug,estate_api=debug,estate_chat=debug,estate_db=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_dev_secret() {
        warn!("ESTATE_JWT_SECRET is unset; using the development secret. Do not deploy like this.");
    }

    // Init database and sample data
    let db = Arc::new(Database::open(&config.db_path)?);
    db.call(|db| seed_sample_data(db, |plain| Ok(estate_crypto::hash_password(plain)?)))
        .await?;

    let uploads = Uploads::new(&config.uploads_dir).await?;

    let completion = config.completion.build(reqwest::Client::new());
    if config.completion.api_key.is_none() {
        info!("No completion API key configured; general questions get the fallback reply");
    }
    let chat = ChatResolver::new(db.clone(), completion, config.completion.timeout);

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
        uploads,
        chat,
    });

    let app = estate_api::routes::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Estate server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
