//! JSON persistence for raw posts and processed day blocks.
//!
//! The sink writes two kinds of files, mirroring the layout the downstream
//! analysis corpus expects:
//!
//! ```text
//! raw_output_dir/
//! └── {key}.json                         # flat list of posts
//!
//! processed_output_dir/
//! └── {key}_preprocessed/
//!     └── posts_by_blocks_of_days.json   # list of blocks (lists of posts)
//! ```
//!
//! `{key}` is the storage key the collector derives (the subreddit name, or
//! the input file stem when re-aggregating). Output is pretty-printed with
//! 2-space indentation; byte-exact formatting is not a compatibility
//! requirement, field presence and naming is.

use crate::models::{Block, Post};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Filename of the processed blocks file inside the `{key}_preprocessed` dir.
const BLOCKS_FILENAME: &str = "posts_by_blocks_of_days.json";

/// Write the flat, deduplicated post list to `{raw_output_dir}/{key}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(raw_output_dir = %raw_output_dir, key = %key))]
pub async fn write_posts(
    posts: &[Post],
    raw_output_dir: &str,
    key: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(posts)?;

    if let Err(e) = fs::create_dir_all(raw_output_dir).await {
        error!(%raw_output_dir, error = %e, "Failed to create raw output dir");
        return Err(e.into());
    }

    let path = Path::new(raw_output_dir).join(format!("{key}.json"));
    info!(path = %path.display(), count = posts.len(), "Writing raw posts JSON");
    fs::write(&path, json).await?;

    Ok(path)
}

/// Write the day blocks to
/// `{processed_output_dir}/{key}_preprocessed/posts_by_blocks_of_days.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(processed_output_dir = %processed_output_dir, key = %key))]
pub async fn write_blocks(
    blocks: &[Block],
    processed_output_dir: &str,
    key: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(blocks)?;

    let dir = Path::new(processed_output_dir).join(format!("{key}_preprocessed"));
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create processed output dir");
        return Err(e.into());
    }

    let path = dir.join(BLOCKS_FILENAME);
    info!(path = %path.display(), count = blocks.len(), "Writing day blocks JSON");
    fs::write(&path, json).await?;

    Ok(path)
}

/// Load a previously written raw posts file.
///
/// The loaded list is sorted ascending by `created_utc` before being
/// returned, so it satisfies the block aggregator's precondition even when
/// the file predates the sorted-output guarantee.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_posts(path: &Path) -> Result<Vec<Post>, Box<dyn Error>> {
    let content = fs::read_to_string(path).await?;
    let mut posts: Vec<Post> = serde_json::from_str(&content)?;
    posts.sort_by_key(|p| p.created_utc);

    info!(count = posts.len(), "Loaded raw posts JSON");
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_post(id: &str, hour: u32) -> Post {
        Post {
            title: format!("Post {id}"),
            author: "poster".to_string(),
            created_utc: Utc.with_ymd_and_hms(2025, 8, 10, hour, 0, 0).unwrap(),
            score: 3,
            num_comments: 1,
            awards: 0,
            body: "body".to_string(),
            url: String::new(),
            flair: None,
            post_id: id.to_string(),
            permalink: String::new(),
            comments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_write_and_read_posts_round_trip() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();

        let posts = vec![sample_post("a", 8), sample_post("b", 9)];
        let path = write_posts(&posts, dir, "stocks").await.unwrap();
        assert!(path.ends_with("stocks.json"));

        let loaded = read_posts(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].post_id, "a");
        assert_eq!(loaded[0].created_utc, posts[0].created_utc);
    }

    #[tokio::test]
    async fn test_read_posts_sorts_unsorted_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();

        // Files written by earlier tooling were in strategy order, not
        // chronological order.
        let posts = vec![sample_post("later", 12), sample_post("earlier", 6)];
        let path = write_posts(&posts, dir, "stocks").await.unwrap();

        let loaded = read_posts(&path).await.unwrap();
        let ids: Vec<&str> = loaded.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, vec!["earlier", "later"]);
    }

    #[tokio::test]
    async fn test_write_blocks_layout_and_shape() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();

        let blocks = vec![Block::default(), Block::default()];
        let path = write_blocks(&blocks, dir, "stocks").await.unwrap();

        assert!(path.ends_with("stocks_preprocessed/posts_by_blocks_of_days.json"));
        let content = fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 2);
        // Pretty-printed with 2-space indentation.
        assert!(content.contains("\n  "));
    }

    #[tokio::test]
    async fn test_read_posts_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = read_posts(&tmp.path().join("nope.json")).await;
        assert!(result.is_err());
    }
}
