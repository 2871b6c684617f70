use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use scrape_gateway::{
    config::Config,
    api::routes::create_router,
    AppState,
};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(config.log_json);

    let server_addr = config.server_addr;
    tracing::info!(
        timeout_seconds = config.timeout_budget.seconds(),
        reader_endpoint = %config.reader_endpoint,
        pdf_max_bytes = config.pdf_max_bytes,
        "configured scrape settings"
    );

    let app = create_router(AppState::new(config));

    let listener = TcpListener::bind(server_addr).await?;
    tracing::info!(%server_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
