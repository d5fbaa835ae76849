//! Command-line interface definitions for the trending news generator.
//!
//! All path options can also be provided through environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Hourly generation with defaults
/// trending_news
///
/// # Three topics into a custom site directory
/// trending_news --posts-dir ./site/posts --site-index ./site/index.html -n 3
///
/// # Archive maintenance
/// trending_news --fetch-all
/// trending_news --stats
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory the article documents and posts index are written to
    #[arg(short, long, env = "TRENDING_POSTS_DIR", default_value = "posts")]
    pub posts_dir: PathBuf,

    /// Site index whose latest-posts section is regenerated
    #[arg(short = 'i', long, env = "TRENDING_SITE_INDEX", default_value = "index.html")]
    pub site_index: PathBuf,

    /// Daily topic ledger file
    #[arg(short, long, env = "TRENDING_LEDGER", default_value = "daily_topics.json")]
    pub ledger: PathBuf,

    /// On-this-day archive file used by --fetch-all and --stats
    #[arg(short, long, env = "TRENDING_ARCHIVE", default_value = "on_this_day_data.json")]
    pub archive: PathBuf,

    /// Optional path to a config.yaml file
    #[arg(short, long, env = "TRENDING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of topics to generate (overrides the config file)
    #[arg(short = 'n', long)]
    pub num_topics: Option<usize>,

    /// Seed for topic traffic estimates and paragraph fillers
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print ledger and archive statistics, then exit
    #[arg(long, conflicts_with = "fetch_all")]
    pub stats: bool,

    /// Backfill every calendar date of the archive, then exit
    #[arg(long)]
    pub fetch_all: bool,
}
