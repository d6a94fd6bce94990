//! # subsift
//!
//! A collection pipeline that pulls recent posts from a subreddit through
//! several listing strategies, deduplicates the overlap, keeps only the last
//! 30 days, and regroups the result into rolling day blocks for downstream
//! analysis.
//!
//! ## Usage
//!
//! ```sh
//! subsift stocks -c 25 --get-comments
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Collection**: fetch each configured listing strategy, normalize rows,
//!    dedup first-seen-wins, drop posts outside the recency window
//! 2. **Raw output**: persist the flat, chronologically sorted post list
//! 3. **Aggregation**: partition the list into rolling day blocks, cleaning
//!    titles and bodies per post
//! 4. **Processed output**: persist the block file the analysis step consumes
//!
//! With `--input`, step 1 is replaced by loading a previously written raw
//! file, so old corpora can be re-partitioned without touching the network.

use chrono::Duration;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod blocks;
mod cleaning;
mod cli;
mod collector;
mod models;
mod outputs;
mod reddit;
mod utils;

use cli::Cli;
use collector::{Collector, CollectorOptions};
use models::Post;
use reddit::RedditClient;
use utils::ensure_writable_dir;

#[tokio::main]
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
    info!("subsift starting up");

    let args = Cli::parse();
    debug!(?args.subreddit, ?args.input, ?args.count, "Parsed CLI arguments");

    // Early check: ensure the processed output dir is writable before any
    // network work happens.
    if let Err(e) = ensure_writable_dir(&args.processed_output_dir).await {
        error!(
            path = %args.processed_output_dir,
            error = %e,
            "Processed output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Collect or load posts ----
    let (posts, key) = if let Some(input) = &args.input {
        let path = Path::new(input);
        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("posts")
            .to_string();
        info!(%input, key, "Re-aggregating an existing raw file");
        let posts = outputs::json::read_posts(path).await?;
        (posts, key)
    } else {
        let subreddit = args
            .subreddit
            .clone()
            .expect("clap requires a subreddit when --input is absent");

        if let Err(e) = ensure_writable_dir(&args.raw_output_dir).await {
            error!(
                path = %args.raw_output_dir,
                error = %e,
                "Raw output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }

        let posts = collect_posts(&args, &subreddit).await?;
        let raw_path = outputs::json::write_posts(&posts, &args.raw_output_dir, &subreddit).await?;
        info!(path = %raw_path.display(), count = posts.len(), "Raw posts persisted");
        (posts, subreddit)
    };

    // ---- Partition into day blocks ----
    let day_blocks = blocks::partition(&posts);
    info!(
        posts = posts.len(),
        blocks = day_blocks.len(),
        "Aggregation complete"
    );

    let blocks_path =
        outputs::json::write_blocks(&day_blocks, &args.processed_output_dir, &key).await?;
    info!(path = %blocks_path.display(), "Day blocks persisted");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Run one collection against the live content source.
async fn collect_posts(args: &Cli, subreddit: &str) -> Result<Vec<Post>, Box<dyn Error>> {
    let client = match RedditClient::new(&args.user_agent) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to construct content source client");
            return Err(e);
        }
    };

    let options = CollectorOptions {
        window: Duration::days(args.window_days),
        get_comments: args.get_comments,
        require_posts: args.require_posts,
        run_timeout: (args.run_timeout_secs > 0)
            .then(|| StdDuration::from_secs(args.run_timeout_secs)),
        ..Default::default()
    };

    let collector = Collector::new(client, options);
    let posts = collector.collect(subreddit, args.count).await?;
    Ok(posts)
}
