//! Multi-strategy post collection with dedup and recency windowing.
//!
//! One [`Collector`] run fetches each configured listing strategy in order,
//! normalizes the results, drops posts already seen in an earlier strategy
//! (first-seen wins), drops posts older than the recency window, and returns
//! a single flat list sorted ascending by `created_utc`.
//!
//! Per-strategy failures are values, not exceptions: a strategy that cannot
//! be fetched produces a [`StrategyOutcome::Failed`] that is logged and
//! contributes zero posts, and the run continues. A run as a whole only
//! fails on timeout or, when the caller requires posts, when every
//! strategy came back empty.

use crate::models::Post;
use crate::reddit::{ContentSource, Strategy, StrategySpec, TimeFilter};
use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Run-fatal collection failures. Everything else is recovered locally.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("no posts collected from r/{subreddit} across any strategy")]
    NoPosts { subreddit: String },

    #[error("collection run timed out after {0:?}")]
    Timeout(StdDuration),
}

/// Result of fetching one strategy.
#[derive(Debug)]
pub enum StrategyOutcome {
    Fetched {
        spec: StrategySpec,
        posts: Vec<Post>,
    },
    Failed {
        spec: StrategySpec,
        reason: String,
    },
}

/// Collection run configuration.
///
/// The strategy list is ordered configuration, not derived: dedup priority
/// between strategies is exactly their position in this list.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub strategies: Vec<StrategySpec>,
    /// Recency window; the cutoff is evaluated once at run start.
    pub window: Duration,
    pub get_comments: bool,
    /// Top comments kept per post when `get_comments` is set.
    pub comment_limit: usize,
    /// Fail the run when no strategy yields any posts.
    pub require_posts: bool,
    /// Whole-run timeout; on expiry the run fails and partial results are
    /// discarded.
    pub run_timeout: Option<StdDuration>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            window: Duration::days(30),
            get_comments: false,
            comment_limit: 3,
            require_posts: false,
            run_timeout: Some(StdDuration::from_secs(300)),
        }
    }
}

/// The historical strategy order: hot, new, top(month), rising,
/// controversial(month). Only the listings that support a time filter get one.
pub fn default_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec::new(Strategy::Hot),
        StrategySpec::new(Strategy::New),
        StrategySpec::with_time_filter(Strategy::Top, TimeFilter::Month),
        StrategySpec::new(Strategy::Rising),
        StrategySpec::with_time_filter(Strategy::Controversial, TimeFilter::Month),
    ]
}

/// Orchestrates one collection run against a [`ContentSource`].
///
/// The dedup set and the accumulating output list live entirely inside one
/// `collect` call; nothing is shared across runs.
pub struct Collector<S> {
    source: S,
    options: CollectorOptions,
}

impl<S: ContentSource> Collector<S> {
    pub fn new(source: S, options: CollectorOptions) -> Self {
        Self { source, options }
    }

    /// Collect recent posts from a subreddit.
    ///
    /// `count` is a per-strategy size hint; each strategy requests
    /// `count * 2` to compensate for cross-strategy overlap and recency
    /// filtering. The returned list is deduplicated and sorted ascending by
    /// `created_utc`.
    #[instrument(level = "info", skip(self))]
    pub async fn collect(&self, subreddit: &str, count: u32) -> Result<Vec<Post>, CollectError> {
        match self.options.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run(subreddit, count)).await {
                Ok(result) => result,
                Err(_) => {
                    error!(?limit, subreddit, "Collection run timed out; discarding partial results");
                    Err(CollectError::Timeout(limit))
                }
            },
            None => self.run(subreddit, count).await,
        }
    }

    async fn run(&self, subreddit: &str, count: u32) -> Result<Vec<Post>, CollectError> {
        // One cutoff per run keeps every comparison consistent.
        let cutoff = Utc::now() - self.options.window;
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut collected: Vec<Post> = Vec::new();

        info!(
            subreddit,
            cutoff = %cutoff,
            strategies = self.options.strategies.len(),
            "Collecting posts from the recency window"
        );

        // Over-fetch to compensate for cross-strategy overlap and recency
        // filtering; saturate so an absurd count hint cannot overflow.
        let limit = count.saturating_mul(2);

        for spec in &self.options.strategies {
            match self.fetch_strategy(subreddit, *spec, limit).await {
                StrategyOutcome::Fetched { spec, posts } => {
                    let fetched = posts.len();
                    let mut added = 0usize;
                    for post in posts {
                        if post.created_utc < cutoff {
                            debug!(post_id = %post.post_id, created = %post.created_utc, "Skipped post outside recency window");
                            continue;
                        }
                        if !seen_ids.insert(post.post_id.clone()) {
                            debug!(post_id = %post.post_id, "Skipped duplicate post");
                            continue;
                        }
                        collected.push(post);
                        added += 1;
                    }
                    info!(strategy = %spec.strategy, fetched, added, "Merged strategy results");
                }
                StrategyOutcome::Failed { spec, reason } => {
                    error!(
                        strategy = %spec.strategy,
                        reason,
                        "Strategy failed; continuing with remaining strategies"
                    );
                }
            }
        }

        if collected.is_empty() && self.options.require_posts {
            return Err(CollectError::NoPosts {
                subreddit: subreddit.to_string(),
            });
        }

        if self.options.get_comments {
            self.attach_comments(&mut collected).await;
        }

        // Callers and the block aggregator depend on ascending order.
        collected.sort_by_key(|p| p.created_utc);

        info!(count = collected.len(), subreddit, "Collected valid posts");
        Ok(collected)
    }

    async fn fetch_strategy(&self, subreddit: &str, spec: StrategySpec, limit: u32) -> StrategyOutcome {
        match self.source.fetch_listing(subreddit, spec, limit).await {
            Ok(posts) => StrategyOutcome::Fetched { spec, posts },
            Err(e) => StrategyOutcome::Failed {
                spec,
                reason: e.to_string(),
            },
        }
    }

    /// Fetch top comments for every accepted post, sequentially.
    ///
    /// A failed comment fetch leaves that post without comments; the post
    /// itself is kept.
    async fn attach_comments(&self, posts: &mut [Post]) {
        let limit = self.options.comment_limit;
        let results: Vec<_> = stream::iter(posts.iter().enumerate())
            .then(|(i, post)| async move {
                (i, self.source.fetch_top_comments(&post.post_id, limit).await)
            })
            .collect()
            .await;

        for (i, result) in results {
            match result {
                Ok(comments) => posts[i].comments = comments,
                Err(e) => warn!(
                    post_id = %posts[i].post_id,
                    error = %e,
                    "Comment fetch failed; keeping post without comments"
                ),
            }
        }
    }
}
