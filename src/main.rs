use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use coloring_book_api::{
    api,
    config::Config,
    document::PixelDecoder,
    gemini::{GeminiChatClient, ImagenClient},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    Config::dotenv_load();
    let config = Config::new();
    config.log_env_vars();

    let image_service = ImagenClient::from_config(&config)?;
    let chat_service = GeminiChatClient::from_config(&config)?;
    let state = Arc::new(api::AppState::new(
        Arc::new(image_service),
        Arc::new(chat_service),
        Arc::new(PixelDecoder),
    ));
    let app = api::router(state);

    // Run our application with safe parsing
    let ip: std::net::IpAddr = config.api_host.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", config.api_host);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = config.api_port.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 8190", config.api_port);
        8190
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
