//! Reddit listing client: the content source for the collection pipeline.
//!
//! Talks to the public Reddit JSON endpoints (`/r/{sub}/{sort}.json` and
//! `/comments/{id}.json`) and normalizes raw listing rows into [`Post`] and
//! [`Comment`] records. Each retrieval strategy is a closed enum variant with
//! an explicit parameter shape (listings that support a time filter carry
//! one, the rest do not) instead of a stringly-typed sort name.
//!
//! Individual rows that fail normalization (missing id, title, or a broken
//! timestamp) are dropped with a warning; sibling rows in the same batch are
//! unaffected.

use crate::api::get_json_with_backoff;
use crate::models::{Comment, Post};
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Production endpoint; tests point the client elsewhere.
pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Sentinel for authors whose accounts no longer exist.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// A listing ordering offered by the content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Hot,
    New,
    Top,
    Rising,
    Controversial,
}

impl Strategy {
    /// The listing path segment, e.g. `/r/{sub}/top.json`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Strategy::Hot => "hot",
            Strategy::New => "new",
            Strategy::Top => "top",
            Strategy::Rising => "rising",
            Strategy::Controversial => "controversial",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Retrieval time filter for listings that support one (`top`, `controversial`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    /// Value for the `t` query parameter.
    pub fn query_value(self) -> &'static str {
        match self {
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

/// One configured retrieval strategy: which listing to pull and, where the
/// listing supports it, which time filter to request.
#[derive(Debug, Clone, Copy)]
pub struct StrategySpec {
    pub strategy: Strategy,
    pub time_filter: Option<TimeFilter>,
}

impl StrategySpec {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            time_filter: None,
        }
    }

    pub fn with_time_filter(strategy: Strategy, time_filter: TimeFilter) -> Self {
        Self {
            strategy,
            time_filter: Some(time_filter),
        }
    }
}

/// Capability the collector needs from a content source.
///
/// [`RedditClient`] is the production implementation; tests substitute
/// canned-response stubs.
pub trait ContentSource {
    /// Fetch up to `limit` posts from one listing strategy.
    async fn fetch_listing(
        &self,
        subreddit: &str,
        spec: StrategySpec,
        limit: u32,
    ) -> Result<Vec<Post>, Box<dyn Error>>;

    /// Fetch the top `limit` live comments for a post.
    async fn fetch_top_comments(
        &self,
        post_id: &str,
        limit: usize,
    ) -> Result<Vec<Comment>, Box<dyn Error>>;
}

/// HTTP client for the public Reddit JSON API.
///
/// The inner [`reqwest::Client`] carries a 30 second request timeout, so a
/// hanging listing surfaces as a per-strategy failure instead of stalling the
/// whole run. The handle is read-only from the collector's perspective and is
/// reused across strategies within a run.
#[derive(Debug)]
pub struct RedditClient {
    client: Client,
    base_url: Url,
}

impl RedditClient {
    /// Build a client with the given user agent.
    ///
    /// Reddit rejects default library user agents, so callers must supply a
    /// descriptive one.
    pub fn new(user_agent: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = Url::parse(DEFAULT_BASE_URL)?;
        info!(user_agent, "RedditClient initialized");
        Ok(Self { client, base_url })
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Box<dyn Error>> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    fn listing_url(&self, subreddit: &str, spec: StrategySpec, limit: u32) -> Result<Url, Box<dyn Error>> {
        let mut url = self
            .base_url
            .join(&format!("r/{}/{}.json", subreddit, spec.strategy.path_segment()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            query.append_pair("raw_json", "1");
            if let Some(tf) = spec.time_filter {
                query.append_pair("t", tf.query_value());
            }
        }
        Ok(url)
    }

    fn comments_url(&self, post_id: &str, limit: usize) -> Result<Url, Box<dyn Error>> {
        let mut url = self.base_url.join(&format!("comments/{post_id}.json"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("sort", "top");
            // Over-fetch to compensate for removed comments.
            query.append_pair("limit", &(limit * 2).to_string());
            query.append_pair("depth", "1");
            query.append_pair("raw_json", "1");
        }
        Ok(url)
    }
}

impl ContentSource for RedditClient {
    #[instrument(level = "info", skip_all, fields(subreddit, strategy = %spec.strategy, limit))]
    async fn fetch_listing(
        &self,
        subreddit: &str,
        spec: StrategySpec,
        limit: u32,
    ) -> Result<Vec<Post>, Box<dyn Error>> {
        let url = self.listing_url(subreddit, spec, limit)?;
        let value = get_json_with_backoff(&self.client, url.as_str()).await?;
        let listing: Listing = serde_json::from_value(value)?;

        let mut posts = Vec::new();
        for child in listing.data.children {
            if child.kind != "t3" {
                continue;
            }
            match serde_json::from_value::<RawPost>(child.data.clone()) {
                Ok(raw) => match normalize_post(raw) {
                    Some(post) => posts.push(post),
                    None => warn!(
                        row = %truncate_for_log(&child.data.to_string(), 200),
                        "Dropping listing row missing id, title, or timestamp"
                    ),
                },
                Err(e) => warn!(
                    error = %e,
                    row = %truncate_for_log(&child.data.to_string(), 200),
                    "Dropping undecodable listing row"
                ),
            }
        }

        info!(count = posts.len(), strategy = %spec.strategy, "Fetched listing");
        Ok(posts)
    }

    #[instrument(level = "info", skip_all, fields(post_id, limit))]
    async fn fetch_top_comments(
        &self,
        post_id: &str,
        limit: usize,
    ) -> Result<Vec<Comment>, Box<dyn Error>> {
        let url = self.comments_url(post_id, limit)?;
        let value = get_json_with_backoff(&self.client, url.as_str()).await?;

        // The endpoint answers with a two-element array: the post listing,
        // then the reply listing.
        let replies = value
            .get(1)
            .cloned()
            .ok_or("comment response missing reply listing")?;
        let listing: Listing = serde_json::from_value(replies)?;

        let mut comments = Vec::new();
        for child in listing.data.children {
            if comments.len() == limit {
                break;
            }
            // "more" stubs show up as kind != "t1"; skip them.
            if child.kind != "t1" {
                continue;
            }
            match serde_json::from_value::<RawComment>(child.data.clone()) {
                Ok(raw) => {
                    if let Some(comment) = normalize_comment(raw) {
                        comments.push(comment);
                    }
                }
                Err(e) => warn!(
                    error = %e,
                    row = %truncate_for_log(&child.data.to_string(), 200),
                    "Dropping undecodable comment row"
                ),
            }
        }

        debug!(count = comments.len(), post_id, "Fetched top comments");
        Ok(comments)
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

/// A raw listing row before normalization. Every field is optional; the
/// normalizer decides what is required.
#[derive(Debug, Deserialize)]
struct RawPost {
    id: Option<String>,
    title: Option<String>,
    author: Option<String>,
    created_utc: Option<f64>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    total_awards_received: u32,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    link_flair_text: Option<String>,
    permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    author: Option<String>,
    body: Option<String>,
    #[serde(default)]
    score: i64,
    created_utc: Option<f64>,
}

/// Normalize a raw listing row into a [`Post`].
///
/// Returns `None` when the row is missing its id, title, or a usable
/// timestamp. Timestamps are truncated to second precision.
fn normalize_post(raw: RawPost) -> Option<Post> {
    let post_id = raw.id?;
    let title = raw.title?;
    let created_utc = epoch_to_datetime(raw.created_utc?)?;

    Some(Post {
        title,
        author: raw.author.unwrap_or_else(|| DELETED_AUTHOR.to_string()),
        created_utc,
        score: raw.score,
        num_comments: raw.num_comments,
        awards: raw.total_awards_received,
        body: raw.selftext,
        url: raw.url,
        flair: raw.link_flair_text,
        post_id,
        permalink: raw
            .permalink
            .map(|p| format!("{DEFAULT_BASE_URL}{p}"))
            .unwrap_or_default(),
        comments: Vec::new(),
    })
}

/// Normalize a raw comment row. `"[removed]"` bodies are filtered out here so
/// the collector only ever sees live comments.
fn normalize_comment(raw: RawComment) -> Option<Comment> {
    let body = raw.body?;
    if body == "[removed]" {
        return None;
    }
    let created_utc = epoch_to_datetime(raw.created_utc?)?;

    Some(Comment {
        author: raw.author.unwrap_or_else(|| DELETED_AUTHOR.to_string()),
        body,
        score: raw.score,
        created_utc,
    })
}

fn epoch_to_datetime(epoch: f64) -> Option<DateTime<Utc>> {
    if !epoch.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp(epoch as i64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing_body(children: Vec<Value>) -> Value {
        json!({ "kind": "Listing", "data": { "children": children } })
    }

    fn post_row(id: &str, epoch: f64) -> Value {
        json!({
            "kind": "t3",
            "data": {
                "id": id,
                "title": format!("Post {id}"),
                "author": "poster",
                "created_utc": epoch,
                "score": 10,
                "num_comments": 2,
                "total_awards_received": 0,
                "selftext": "some body",
                "url": format!("https://www.reddit.com/r/test/comments/{id}/"),
                "link_flair_text": null,
                "permalink": format!("/r/test/comments/{id}/post/")
            }
        })
    }

    #[test]
    fn test_strategy_paths_and_filters() {
        assert_eq!(Strategy::Hot.path_segment(), "hot");
        assert_eq!(Strategy::Controversial.path_segment(), "controversial");
        assert_eq!(TimeFilter::Month.query_value(), "month");
        assert_eq!(Strategy::Top.to_string(), "top");
    }

    #[test]
    fn test_normalize_post_full_row() {
        let raw: RawPost = serde_json::from_value(post_row("abc123", 1755000000.0)["data"].clone()).unwrap();
        let post = normalize_post(raw).unwrap();
        assert_eq!(post.post_id, "abc123");
        assert_eq!(post.author, "poster");
        assert_eq!(post.permalink, "https://www.reddit.com/r/test/comments/abc123/post/");
        assert_eq!(post.created_utc.timestamp(), 1755000000);
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_normalize_post_missing_required_fields() {
        let no_id: RawPost =
            serde_json::from_value(json!({ "title": "t", "created_utc": 1.0 })).unwrap();
        assert!(normalize_post(no_id).is_none());

        let no_timestamp: RawPost =
            serde_json::from_value(json!({ "id": "x", "title": "t" })).unwrap();
        assert!(normalize_post(no_timestamp).is_none());
    }

    #[test]
    fn test_normalize_post_deleted_author_sentinel() {
        let raw: RawPost = serde_json::from_value(json!({
            "id": "x1", "title": "orphan", "created_utc": 1755000000.0
        }))
        .unwrap();
        let post = normalize_post(raw).unwrap();
        assert_eq!(post.author, DELETED_AUTHOR);
    }

    #[test]
    fn test_normalize_comment_filters_removed() {
        let removed: RawComment = serde_json::from_value(json!({
            "author": "x", "body": "[removed]", "created_utc": 1.0
        }))
        .unwrap();
        assert!(normalize_comment(removed).is_none());

        let live: RawComment = serde_json::from_value(json!({
            "body": "still here", "score": 4, "created_utc": 1755000000.0
        }))
        .unwrap();
        let comment = normalize_comment(live).unwrap();
        assert_eq!(comment.body, "still here");
        assert_eq!(comment.author, DELETED_AUTHOR);
    }

    #[tokio::test]
    async fn test_fetch_listing_parses_and_skips_bad_rows() {
        let server = MockServer::start().await;
        let body = listing_body(vec![
            post_row("aaa111", 1755000000.0),
            // Row with no id gets dropped; siblings are unaffected.
            json!({ "kind": "t3", "data": { "title": "broken", "created_utc": 1.0 } }),
            post_row("bbb222", 1755100000.0),
        ]);
        Mock::given(method("GET"))
            .and(path("/r/stocks/top.json"))
            .and(query_param("t", "month"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = RedditClient::new("subsift-test/0.1")
            .unwrap()
            .with_base_url(&server.uri())
            .unwrap();
        let posts = client
            .fetch_listing(
                "stocks",
                StrategySpec::with_time_filter(Strategy::Top, TimeFilter::Month),
                10,
            )
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].post_id, "aaa111");
        assert_eq!(posts[1].post_id, "bbb222");
    }

    #[tokio::test]
    async fn test_fetch_top_comments_limit_and_stub_skipping() {
        let server = MockServer::start().await;
        let comment = |body: &str, score: i64| {
            json!({
                "kind": "t1",
                "data": { "author": "c", "body": body, "score": score, "created_utc": 1755000000.0 }
            })
        };
        let body = json!([
            listing_body(vec![post_row("abc123", 1755000000.0)]),
            listing_body(vec![
                comment("first", 50),
                json!({ "kind": "more", "data": { "count": 12 } }),
                comment("[removed]", 40),
                comment("second", 30),
                comment("third", 20),
                comment("fourth", 10),
            ]),
        ]);
        Mock::given(method("GET"))
            .and(path("/comments/abc123.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = RedditClient::new("subsift-test/0.1")
            .unwrap()
            .with_base_url(&server.uri())
            .unwrap();
        let comments = client.fetch_top_comments("abc123", 3).await.unwrap();

        let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_fetch_listing_http_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/stocks/hot.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RedditClient::new("subsift-test/0.1")
            .unwrap()
            .with_base_url(&server.uri())
            .unwrap();
        let result = client
            .fetch_listing("stocks", StrategySpec::new(Strategy::Hot), 10)
            .await;
        assert!(result.is_err());
    }
}
