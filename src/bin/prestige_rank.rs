//! Prestige ranking host
//!
//! Runs rating flows from the terminal against a JSON file of ranked items:
//! - Interactive binary insertion over stdin; the ranked-items file is
//!   rewritten with the new ordering after a successful commit
//! - Tier lookup for accumulated listening minutes
//! - Structured logs on stderr, results as JSON on stdout
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PRESTIGE_TIER_VARIANT`: `low` or `standard` (default: standard)
//! - `PRESTIGE_INITIAL_SCORE`: score of the first item in a category (default: 10.0)
//! - `PRESTIGE_SCORE_STEP`: offset when inserting at either end (default: 1.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin prestige_rank --features cli -- rate ranked.json <item_id> <kind> <category>
//! cargo run --bin prestige_rank --features cli -- tier <minutes> <kind>
//! ```

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prestige_ranking::{
    CategoryId, ComparisonOutcome, InMemoryRankingStore, ItemId, ItemKind, RankedItem,
    RankingConfig, RateRequest, RatingCoordinator, SessionStep,
};

const USAGE: &str = "usage:\n  prestige_rank rate <ranked.json> <item_id> <kind> <category>\n  prestige_rank tier <minutes> <kind>";

/// Initialize the tracing subscriber with JSON or pretty format, on stderr
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "prestige_rank=info,prestige_ranking=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn parse_answer(line: &str) -> Option<ComparisonOutcome> {
    match line.trim().to_ascii_lowercase().as_str() {
        "1" | "n" | "new" => Some(ComparisonOutcome::NewItemWins),
        "2" | "e" | "existing" => Some(ComparisonOutcome::ExistingItemWins),
        "s" | "skip" => Some(ComparisonOutcome::Skip),
        _ => None,
    }
}

async fn rate(config: RankingConfig, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let [path, item_id, kind, category] = args else {
        return Err(USAGE.into());
    };
    let kind: ItemKind = kind.parse()?;

    let raw = tokio::fs::read_to_string(path).await?;
    let items: Vec<RankedItem> = serde_json::from_str(&raw)?;
    info!(path = %path, items = items.len(), "Loaded ranked items");

    let store = Arc::new(InMemoryRankingStore::with_items(items)?);
    let coordinator = RatingCoordinator::new(store, config)?;
    let request = RateRequest::new(ItemId::new(item_id.as_str()), kind, CategoryId::new(category.as_str()));
    let mut rating = coordinator.begin(request).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();

    loop {
        let compare = match rating.step() {
            SessionStep::Complete { .. } => break,
            SessionStep::Compare(compare) => compare,
        };
        let prompt = format!(
            "[{}/{}] {} (1) or {} (2)? s to skip: ",
            compare.comparison_number,
            compare.max_comparisons,
            compare.new_item_id,
            compare.candidate.item_id,
        );
        stderr.write_all(prompt.as_bytes()).await?;
        stderr.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            warn!(session_id = %rating.id(), "Input closed, cancelling rating");
            rating.cancel();
            return Ok(());
        };

        match parse_answer(&line) {
            Some(outcome) => {
                rating.answer(outcome)?;
            }
            None => warn!(input = %line.trim(), "Unrecognized answer"),
        }
    }

    let write = coordinator.commit(&rating).await?;
    save_items(path, coordinator.store()).await?;
    println!("{}", serde_json::to_string_pretty(&write)?);
    Ok(())
}

/// Rewrite `path` with the store's items via a temp file and rename.
async fn save_items(path: &str, store: &InMemoryRankingStore) -> Result<(), Box<dyn std::error::Error>> {
    let items = store.all_items();
    let tmp = format!("{path}.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(&items)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    info!(path = %path, items = items.len(), "Saved ranked items");
    Ok(())
}

fn tier(config: RankingConfig, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let [minutes, kind] = args else {
        return Err(USAGE.into());
    };
    let minutes: u32 = minutes.parse()?;
    let kind: ItemKind = kind.parse()?;

    let coordinator = RatingCoordinator::new(Arc::new(InMemoryRankingStore::new()), config)?;
    let progress = coordinator.tier_progress(minutes, kind)?;
    println!("{}", serde_json::to_string_pretty(&progress)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match RankingConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        threshold_variant = ?config.threshold_variant,
        score_params = %config.score.params_hash(),
        "Starting Prestige ranking host"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((command, rest)) if command == "rate" => rate(config, rest).await,
        Some((command, rest)) if command == "tier" => tier(config, rest),
        _ => Err(USAGE.into()),
    }
}
