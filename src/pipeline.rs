//! The default run: select topics, research and write one article each,
//! then refresh the listing and prune old documents.

use crate::config::GeneratorConfig;
use crate::error::PipelineError;
use crate::ledger::DailyTopicLedger;
use crate::models::PostEntry;
use crate::outputs::{self, indexes, json};
use crate::research::{PageFetcher, ResearchGatherer, SearchProvider, SummaryProvider};
use crate::selector::TopicSelector;
use crate::sources::FeedFetcher;
use crate::synth::ContentSynthesizer;
use chrono::{DateTime, Duration, Local};
use std::path::PathBuf;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Where a run reads and writes.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub posts_dir: PathBuf,
    pub site_index: PathBuf,
    pub ledger: PathBuf,
}

impl SitePaths {
    pub fn posts_index(&self) -> PathBuf {
        self.posts_dir.join(json::INDEX_FILE)
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub published: Vec<PostEntry>,
    pub pruned: Vec<String>,
    /// No fresh topic was found anywhere in the cascade.
    pub exhausted: bool,
}

/// The collaborators of a run.
pub struct Generator<'a, F, S, P, W> {
    pub feeds: &'a F,
    pub search: &'a S,
    pub pages: &'a P,
    pub summaries: &'a W,
    pub config: &'a GeneratorConfig,
}

impl<'a, F, S, P, W> Generator<'a, F, S, P, W>
where
    F: FeedFetcher,
    S: SearchProvider,
    P: PageFetcher,
    W: SummaryProvider,
{
    #[instrument(level = "info", skip_all, fields(num_topics = num_topics, seed = seed))]
    pub async fn run(
        &self,
        paths: &SitePaths,
        num_topics: usize,
        seed: u64,
        now: DateTime<Local>,
    ) -> RunReport {
        let mut report = RunReport::default();
        let mut ledger = DailyTopicLedger::load(&paths.ledger, now.date_naive()).await;

        let mut selector = TopicSelector::new(self.feeds, self.config, seed);
        let topics = match selector.select(num_topics, &mut ledger, now.to_utc()).await {
            Ok(topics) => topics,
            Err(e @ PipelineError::Exhaustion { .. }) => {
                error!(error = %e, "No fresh topics; no articles this run");
                report.exhausted = true;
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Topic selection failed");
                Vec::new()
            }
        };

        let gatherer = ResearchGatherer::new(
            self.search,
            self.pages,
            self.summaries,
            self.config.search_results,
            self.config.delays.between_urls(),
        );
        let mut synth = ContentSynthesizer::with_seed(seed);
        let total = topics.len();

        for (i, topic) in topics.into_iter().enumerate() {
            let title = topic.title.clone();
            let bundle = gatherer.gather(topic).await;
            let article = synth.synthesize(&bundle);
            match outputs::publish_article(&paths.posts_dir, &article, now).await {
                Ok(entry) => {
                    info!(index = i + 1, total, file = %entry.filename, "Created article");
                    report.published.push(entry);
                }
                Err(e) => error!(%title, error = %e, "Failed to write article; skipping"),
            }
            if i + 1 < total && !self.config.delays.between_topics().is_zero() {
                sleep(self.config.delays.between_topics()).await;
            }
        }

        // The listing is refreshed even when nothing new was written.
        let posts_index = paths.posts_index();
        if let Err(e) = indexes::update_listing(
            &paths.site_index,
            &posts_index,
            self.config.listing_limit,
            now.to_utc(),
        )
        .await
        {
            warn!(error = %e, "Failed to update listing");
        }

        match indexes::prune_posts(
            &paths.posts_dir,
            &posts_index,
            Duration::hours(self.config.retention_hours),
            now.to_utc(),
        )
        .await
        {
            Ok(pruned) => report.pruned = pruned,
            Err(e) => warn!(error = %e, "Failed to prune old posts"),
        }

        info!(
            published = report.published.len(),
            pruned = report.pruned.len(),
            "Generation complete"
        );
        report
    }
}
