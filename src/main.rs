use std::sync::Arc;

use anyhow::Context;
use product_lens::config::Config;
use product_lens::controller::AppController;
use product_lens::gemini::GeminiClient;
use product_lens::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Invalid configuration")?;

    let client = GeminiClient::new(config.gemini.clone());
    if !client.config().has_credential() {
        log::warn!("GEMINI_API_KEY is not set; every analysis will fail until it is");
    }
    log::info!("Using model {} at {}", client.config().model, client.endpoint());

    let controller = Arc::new(AppController::new(client));
    let app = server::router(controller, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    log::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
