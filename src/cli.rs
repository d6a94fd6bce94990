//! Command-line interface definitions for subsift.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Some options can also be provided via environment variables.

use clap::Parser;

/// Command-line arguments for the subsift collector.
///
/// # Examples
///
/// ```sh
/// # Collect the last 30 days of r/stocks and build day blocks
/// subsift stocks -c 25
///
/// # Also pull the top 3 comments per post
/// subsift stocks --get-comments
///
/// # Re-aggregate a previously saved raw file without touching the network
/// subsift --input data/raw/stocks.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Subreddit to collect posts from
    #[arg(required_unless_present = "input")]
    pub subreddit: Option<String>,

    /// Per-strategy fetch size hint; each strategy requests twice this many
    #[arg(short, long, default_value_t = 25)]
    pub count: u32,

    /// Fetch the top comments for each collected post
    #[arg(long)]
    pub get_comments: bool,

    /// Recency window in days
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(0..))]
    pub window_days: i64,

    /// Fail the run when no strategy yields any posts
    #[arg(long)]
    pub require_posts: bool,

    /// Output directory for the raw post list
    #[arg(short = 'r', long, default_value = "data/raw")]
    pub raw_output_dir: String,

    /// Output directory for the processed day blocks
    #[arg(short = 'p', long, default_value = "data/processed")]
    pub processed_output_dir: String,

    /// Re-aggregate an existing raw JSON file instead of collecting
    #[arg(long)]
    pub input: Option<String>,

    /// User agent sent to the content source
    #[arg(
        long,
        env = "REDDIT_USER_AGENT",
        default_value = "subsift/0.2 (discussion collector)"
    )]
    pub user_agent: String,

    /// Whole-run collection timeout in seconds (0 disables the timeout)
    #[arg(long, default_value_t = 300)]
    pub run_timeout_secs: u64,
}
