use mock_server::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Page seeded at startup so the client examples have something to read.
const SAMPLE_PAGE_ID: Uuid = Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc);

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mock_server=info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let api_key = std::env::var("API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("API_KEY is not set; page routes will answer 500");
    }

    let state = AppState::new(api_key);
    state
        .insert_page(SAMPLE_PAGE_ID, "Sample Page", "# Sample Page\n\nSeeded by the mock server.\n")
        .await;

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener, state).await
}
