//! Data models for collected posts and their windowed projections.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Post`]: A normalized subreddit submission with its top comments
//! - [`Comment`]: A reply attached to a [`Post`]
//! - [`CleanPost`] / [`CleanComment`]: the reduced, text-cleaned projections
//!   emitted inside day blocks
//! - [`Block`]: one rolling day-block of cleaned posts
//!
//! Serialized field names are fixed: the raw and processed JSON files have to
//! stay readable by the downstream analysis corpus, so renaming a field here
//! is a breaking change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized subreddit submission.
///
/// This is the canonical record produced by the content source and consumed
/// by the collector and the block aggregator. `created_utc` is the source of
/// truth for ordering and windowing; `post_id` is the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Submission title.
    pub title: String,
    /// Author username, `"[deleted]"` when the account is gone.
    pub author: String,
    /// Creation time, UTC, second precision.
    pub created_utc: DateTime<Utc>,
    /// Net vote score; can go negative.
    pub score: i64,
    /// Comment count as reported by the listing.
    pub num_comments: u32,
    /// Total awards received.
    pub awards: u32,
    /// Selftext body; empty for link posts.
    pub body: String,
    /// Outbound or self URL.
    pub url: String,
    /// Optional flair label.
    pub flair: Option<String>,
    /// Source-assigned unique id; the dedup key.
    pub post_id: String,
    /// Absolute permalink to the thread.
    pub permalink: String,
    /// Top comments (bounded); empty when comment retrieval is disabled.
    pub comments: Vec<Comment>,
}

/// A reply to a [`Post`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: DateTime<Utc>,
}

/// A post projection as emitted inside a [`Block`].
///
/// The projection drops `author`, `url`, `permalink` and the raw timestamp;
/// `date` and `time` are split out of `created_utc`, and all free text has
/// been run through [`crate::cleaning::clean_text`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanPost {
    pub post_id: String,
    /// Cleaned title.
    pub title: String,
    /// Calendar date (`YYYY-MM-DD`) of the post's creation time.
    pub date: String,
    /// Time of day (`HH:MM:SS`) of the post's creation time.
    pub time: String,
    pub score: i64,
    pub num_comments: u32,
    pub flair: Option<String>,
    /// `clean(title + " " + body)`.
    pub combined_text: String,
    pub comments: Vec<CleanComment>,
}

/// A comment projection nested inside a [`CleanPost`].
///
/// `date` and `time` are inherited from the parent post, not taken from the
/// comment's own timestamp. Every revision of the historical preprocessor did
/// this, so downstream consumers depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanComment {
    pub comment_body: String,
    pub comment_score: i64,
    pub date: String,
    pub time: String,
}

/// One rolling day-block of cleaned posts.
///
/// A block stores no explicit bounds; membership is decided entirely by the
/// sequential windowing rule in [`crate::blocks::partition`]. Serializes as a
/// bare array so the processed file is a list of lists of posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub posts: Vec<CleanPost>,
}
