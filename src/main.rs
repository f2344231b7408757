// DevConnect API server

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use devconnect::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("devconnect=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::load()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    let app = create_app(app_state);

    // Start server
    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("DevConnect API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
