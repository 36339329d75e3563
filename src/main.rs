use std::sync::Arc;

use carrier_scraper_service::web::{self, AppState};
use carrier_scraper_service::{AppConfig, ChromeLauncher, ExportPipeline, ExportService, SaferClient};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,carrier_scraper_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // APIキー未設定はここで終了
    let config = Arc::new(AppConfig::from_env()?);
    info!(
        "Configuration loaded (browser={:?}, headless={})",
        config.browser_path, config.headless
    );

    let registry = Arc::new(SaferClient::new(&config)?);
    let launcher = Arc::new(ChromeLauncher::new(&config));
    let pipeline = ExportPipeline::new(&config, launcher, registry);

    let app = web::router(AppState {
        config: config.clone(),
        service: ExportService::new(pipeline),
    });

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
