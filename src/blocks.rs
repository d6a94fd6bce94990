//! Day-block aggregation of a time-ordered post list.
//!
//! [`partition`] re-partitions a flat, ascending-by-`created_utc` post list
//! into rolling day blocks. The windowing key is the day ordinal
//! `month * 31 + day`, with months treated as fixed 31-day units. That is not
//! calendar-accurate (Feb 28 and Mar 1 differ by 4 ordinal units), but the
//! historical corpus was built with this exact arithmetic, so it stays.
//!
//! A block's anchor is the ordinal of the first post that opened it and does
//! NOT advance while the block is open; a new block starts only when a post's
//! ordinal exceeds `anchor + 3`. Blocks can therefore span more than four
//! ordinal units when posts arrive in small increments.

use crate::cleaning::clean_text;
use crate::models::{Block, CleanComment, CleanPost, Post};
use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::{debug, info, instrument};

/// Maximum ordinal distance from the block anchor before a new block starts.
const ANCHOR_GAP: u32 = 3;

/// Day ordinal with fixed 31-day months. Keep this arithmetic as-is.
fn day_ordinal(ts: DateTime<Utc>) -> u32 {
    ts.month() * 31 + ts.day()
}

/// Split a timestamp into the `date` and `time` strings the projections carry.
fn split_date_time(ts: DateTime<Utc>) -> (String, String) {
    let date = ts.date_naive().to_string();
    let time = format!("{:02}:{:02}:{:02}", ts.hour(), ts.minute(), ts.second());
    (date, time)
}

/// Partition an ascending post list into rolling day blocks.
///
/// Precondition: `posts` is sorted ascending by `created_utc`, matching the
/// collector's output guarantee. A non-ascending sequence is a caller bug and
/// panics rather than being silently re-sorted.
///
/// Posts whose body is empty after trimming are excluded entirely: they join
/// no block and do not touch the windowing state. The final open block is
/// included in the output.
#[instrument(level = "info", skip_all, fields(posts = posts.len()))]
pub fn partition(posts: &[Post]) -> Vec<Block> {
    assert!(
        posts.windows(2).all(|w| w[0].created_utc <= w[1].created_utc),
        "partition() requires posts sorted ascending by created_utc"
    );

    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Vec<CleanPost> = Vec::new();
    let mut anchor: Option<u32> = None;

    for post in posts {
        if post.body.trim().is_empty() {
            debug!(post_id = %post.post_id, "Skipped post with empty body");
            continue;
        }

        let ordinal = day_ordinal(post.created_utc);
        match anchor {
            None => anchor = Some(ordinal),
            Some(a) if ordinal > a + ANCHOR_GAP => {
                blocks.push(Block {
                    posts: std::mem::take(&mut current),
                });
                anchor = Some(ordinal);
            }
            Some(_) => {} // anchor stays frozen while the block is open
        }

        current.push(project(post));
    }

    if !current.is_empty() {
        blocks.push(Block { posts: current });
    }

    info!(blocks = blocks.len(), "Partitioned posts into day blocks");
    blocks
}

/// Build the cleaned, field-reduced projection of one post.
///
/// Comment projections inherit the parent post's `date` and `time`; the
/// comment's own timestamp is intentionally not consulted (compatibility with
/// the historical corpus).
fn project(post: &Post) -> CleanPost {
    let (date, time) = split_date_time(post.created_utc);

    let comments = post
        .comments
        .iter()
        .map(|comment| CleanComment {
            comment_body: clean_text(&comment.body),
            comment_score: comment.score,
            date: date.clone(),
            time: time.clone(),
        })
        .collect();

    CleanPost {
        post_id: post.post_id.clone(),
        title: clean_text(&post.title),
        date,
        time,
        score: post.score,
        num_comments: post.num_comments,
        flair: post.flair.clone(),
        combined_text: clean_text(&format!("{} {}", post.title, post.body)),
        comments,
    }
}
