use anyhow::{Context, Result};
use openmedic::{
    fetch::{self, DatasetCache},
    summarize, AggregationOptions, DashboardConfig, StaticLabels,
};
use std::{env, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Usage: `openmedic [CONFIG.yaml] [AGE_BRACKET]`
///
/// Prints the dashboard summaries as JSON on stdout; logs go to stderr. With
/// `arrow_dir` set in the config, the chart frames are also written there as
/// Arrow IPC files.
#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) configuration & static tables ────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    let mut cfg = match args.first() {
        Some(path) => DashboardConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => DashboardConfig::default(),
    };
    if let Some(bracket) = args.get(1) {
        cfg.selected_age_bracket = bracket.clone();
    }
    cfg.validate().context("invalid configuration")?;

    let labels = StaticLabels::from_config(&cfg).context("loading label tables")?;
    let opts = AggregationOptions::from_config(&cfg)?;

    // ─── 3) load the dataset once ────────────────────────────────────
    let start = Instant::now();
    let client = fetch::build_client(&cfg)?;
    let cache = DatasetCache::new(cfg.source_url.clone());
    let rows = cache
        .get_or_load(|url| fetch::load_rows(&client, url, &cfg))
        .await
        .with_context(|| format!("loading dataset from {}", cache.url()))?;
    info!(rows = rows.len(), elapsed = ?start.elapsed(), "dataset ready");

    // ─── 4) reduce off the async runtime ─────────────────────────────
    let summaries = tokio::task::spawn_blocking(move || summarize(&rows, &opts, &labels)).await?;

    // ─── 5) hand off to the chart layer ──────────────────────────────
    if let Some(dir) = &cfg.arrow_dir {
        let written = summaries
            .write_ipc_files(dir)
            .with_context(|| format!("writing chart frames to {}", dir.display()))?;
        info!(files = written.len(), "chart frames written");
    }
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}
