//! Item lookup binary.
//!
//! Usage:
//!   item-lookup <item_id> [accept-language]   # one invocation
//!   item-lookup < events.jsonl                # one invocation per line
//!
//! Each stdin line is `{"item_id": "...", "accept_language": "..."}`; one
//! response envelope is written per line. All invocations share one warm
//! handler, so repeated lookups are served from its caches.

use anyhow::{Context, Result};
use item_lookup::handler::serve_events;
use item_lookup::{Config, FsStore, Handler, ItemRequest};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries responses only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("item_lookup=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        data_prefix = %config.data_prefix.display(),
        i18n_prefix = %config.i18n_prefix.display(),
        default_lang = %config.default_lang,
        "Starting item lookup"
    );

    let store = Arc::new(FsStore::from_config(&config));
    let handler = Handler::new(&config, store)?;

    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(item_id) => {
            let request = ItemRequest {
                item_id,
                accept_language: args.next(),
            };
            let envelope = handler.handle(&request).await;
            println!("{}", envelope.to_json().context("Failed to encode response")?);
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            let served = serve_events(&handler, stdin, tokio::io::stdout()).await?;
            info!("Served {} invocations", served);
        }
    }

    for report in handler.cache_reports() {
        info!(
            cache = report.name,
            entries = report.entries,
            hits = report.hits,
            negative_hits = report.negative_hits,
            misses = report.misses,
            hit_rate = report.hit_rate,
            evictions = report.evictions,
            "Cache statistics"
        );
    }

    Ok(())
}
