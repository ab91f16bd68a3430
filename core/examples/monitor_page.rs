//! Reads a page, logs its size, and appends a monitoring entry.
//!
//! ```sh
//! NOTION_MARKDOWN_API_KEY=... NOTION_PAGE_ID=... cargo run -p page-core --example monitor_page
//! ```

use chrono::Utc;
use page_core::format::{checklist, page_stats, table};
use page_core::{ClientConfig, ClientError, PageClient};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            std::process::exit(2);
        }
    };
    let Ok(page_id) = std::env::var("NOTION_PAGE_ID") else {
        error!("NOTION_PAGE_ID environment variable not set");
        std::process::exit(2);
    };

    let client = PageClient::new(config);
    if let Err(err) = monitor(&client, &page_id) {
        match err.api() {
            Some(api) => error!(status = api.status_code, details = ?api.details, "API error: {api}"),
            None => error!("{err}"),
        }
        std::process::exit(1);
    }
}

fn monitor(client: &PageClient, page_id: &str) -> Result<(), ClientError> {
    let health = client.health_check()?;
    info!(status = %health["status"], "API health");
    let api_info = client.get_api_info()?;
    info!(name = %api_info["name"], version = %api_info["version"], "connected");

    let page = client.get_page(page_id)?;
    let stats = page_stats(&page.markdown);
    info!(title = %page.title, ?stats, "page stats");

    let report = format!(
        "\n---\n**Monitoring Report** ({})\n\n{}\n\n{}\n",
        Utc::now().to_rfc3339(),
        table(
            &["characters", "lines", "words"],
            &[vec![
                stats.characters.to_string(),
                stats.lines.to_string(),
                stats.words.to_string(),
            ]],
        ),
        checklist(&[("Page reachable", true), ("Content verified", false)]),
    );
    let result = client.append_to_page(page_id, &report)?;
    info!(success = result.success, "monitoring report appended");
    Ok(())
}
