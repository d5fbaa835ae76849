//! # Trending News
//!
//! A batch generator of static news pages built from trending topics.
//!
//! ## Features
//!
//! - Picks fresh topics through a six-tier cascade (trends, news feeds, social
//!   listings, secondary feeds, a curated pool, date-stamped emergency topics)
//! - Never repeats a story on the same calendar day (daily topic ledger)
//! - Researches each topic with a web search and page extraction, falling
//!   back to category text when pages cannot be used
//! - Synthesizes a six-paragraph article and writes a plain HTML document
//! - Regenerates the site's latest-posts listing and prunes documents older
//!   than a day
//! - Maintains an on-this-day archive (`--fetch-all`, `--stats`)
//!
//! ## Usage
//!
//! ```sh
//! trending_news --posts-dir ./site/posts --site-index ./site/index.html
//! ```
//!
//! ## Architecture
//!
//! 1. **Selection**: walk the tier cascade until enough unseen topics are found
//! 2. **Research**: search, then extract up to three lines per result page
//! 3. **Synthesis**: fill six paragraph slots from extracted lines or templates
//! 4. **Output**: HTML document, posts index, listing refresh, pruning
//!
//! Everything runs strictly in sequence with politeness pauses between calls.

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod backfill;
mod category;
mod cli;
mod config;
mod error;
mod http;
mod ledger;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod research;
mod selector;
mod sources;
mod synth;
mod utils;

use backfill::{CALENDAR_DATES, DateArchive};
use cli::Cli;
use config::GeneratorConfig;
use http::HttpClient;
use ledger::DailyTopicLedger;
use pipeline::{Generator, SitePaths};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("trending_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = GeneratorConfig::load(args.config.as_deref())?;
    if let Some(n) = args.num_topics {
        config.num_topics = n;
    }

    if args.stats {
        report_stats(&args).await;
        return Ok(());
    }

    let client = HttpClient::new(&config.user_agent, config.timeouts.clone())?;

    if args.fetch_all {
        let mut archive = DateArchive::load(&args.archive).await;
        let report =
            backfill::fetch_all(&client, &mut archive, &config.delays, config.checkpoint_every)
                .await;
        for (key, e) in report.failed.iter().take(10) {
            error!(%key, error = %e, "Date still missing");
        }
        info!(elapsed_secs = start_time.elapsed().as_secs(), "Backfill finished");
        return Ok(());
    }

    // Early check: the posts directory must be writable
    if let Err(e) = ensure_writable_dir(&args.posts_dir).await {
        error!(
            path = %args.posts_dir.display(),
            error = %e,
            "Posts directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let seed = args
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64);
    let paths = SitePaths {
        posts_dir: args.posts_dir.clone(),
        site_index: args.site_index.clone(),
        ledger: args.ledger.clone(),
    };
    let generator = Generator {
        feeds: &client,
        search: &client,
        pages: &client,
        summaries: &client,
        config: &config,
    };
    let report = generator
        .run(&paths, config.num_topics, seed, Local::now())
        .await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        published = report.published.len(),
        exhausted = report.exhausted,
        "Execution complete"
    );
    Ok(())
}

/// Log the state of the daily ledger and the date archive.
async fn report_stats(args: &Cli) {
    let today = Local::now().date_naive();
    let ledger = DailyTopicLedger::load(&args.ledger, today).await;
    if ledger.is_empty() {
        info!(date = %ledger.date(), "No topics selected today");
    } else {
        info!(date = %ledger.date(), topics_today = ledger.len(), "Daily topic ledger");
    }

    let archive = DateArchive::load(&args.archive).await;
    if archive.is_empty() {
        info!("No archive data found");
        return;
    }
    let stats = archive.stats(Utc::now());
    info!(
        total = stats.total,
        of = CALENDAR_DATES,
        complete_pct = %format!("{:.1}", stats.completion_pct()),
        current_year = stats.current_year,
        previous_years = stats.previous_years,
        retried = stats.retried,
        remaining = stats.remaining(),
        "Archive statistics"
    );
    for (year, count) in stats.by_year.iter().rev() {
        info!(year, dates = count, "Archive dates by fetch year");
    }
}
