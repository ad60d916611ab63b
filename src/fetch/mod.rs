// src/fetch/mod.rs

use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::model::RawRecord;

pub mod cache;
pub mod payload;

pub use cache::DatasetCache;
pub use payload::{decode_latin1, parse_rows};

/// Build the HTTP client used for the dataset download.
pub fn build_client(cfg: &DashboardConfig) -> Result<Client> {
    Client::builder()
        .timeout(cfg.timeout())
        .gzip(true)
        .build()
        .map_err(|e| unavailable(&cfg.source_url, e))
}

/// GET `url` and return the raw body, retrying transport errors and
/// non-success statuses up to `max_retries` attempts in total.
#[tracing::instrument(level = "info", skip(client, url, retry_delay), fields(url = %url))]
pub async fn download_payload(
    client: &Client,
    url: &Url,
    max_retries: usize,
    retry_delay: Duration,
) -> Result<Vec<u8>> {
    let max_retries = max_retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let reason = match client.get(url.as_str()).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => return Ok(bytes.to_vec()),
                Err(e) => e.to_string(),
            },
            Ok(resp) => format!("HTTP error: {}", resp.status()),
            Err(e) => e.to_string(),
        };

        if attempt >= max_retries {
            return Err(unavailable(url.as_str(), reason));
        }
        warn!(attempt, max_retries, %reason, "download failed, retrying");
        sleep(retry_delay).await;
    }
}

/// Fetch the dataset at `url` and parse it into raw rows. Retry, delimiter
/// and column settings come from `cfg`; its `source_url` is not consulted.
pub async fn load_rows(client: &Client, url: String, cfg: &DashboardConfig) -> Result<Vec<RawRecord>> {
    let url = Url::parse(&url).map_err(|e| DashboardError::Config {
        path: "<inline>".into(),
        reason: format!("source_url `{}`: {}", url, e),
    })?;
    let start = Instant::now();

    let bytes = download_payload(client, &url, cfg.max_retries, cfg.retry_delay()).await?;
    info!(bytes = bytes.len(), elapsed = ?start.elapsed(), "downloaded");

    let text = decode_latin1(&bytes);
    drop(bytes);
    let rows = parse_rows(&text, cfg.delimiter_byte()?, &cfg.columns)?;
    info!(rows = rows.len(), elapsed = ?start.elapsed(), "parsed");
    Ok(rows)
}

fn unavailable(url: &str, reason: impl ToString) -> DashboardError {
    DashboardError::SourceUnavailable {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}
