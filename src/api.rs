//! HTTP JSON fetching with exponential backoff retry logic.
//!
//! Every request the content source makes goes through this module. It
//! provides a thin trait over "GET a URL, parse the body as JSON" plus a
//! retry decorator, so transient listing failures (rate limiting, flaky
//! networking, 5xx blips) are absorbed here rather than leaking into the
//! collector. The collector itself never retries: if a strategy still fails
//! after the backoff schedule, that strategy simply yields zero posts.
//!
//! # Retry Strategy
//!
//! - Maximum 3 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{Rng, rng};
use reqwest::Client;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Trait for async JSON retrieval.
///
/// Implementors fetch a URL and return its body parsed as JSON. The
/// abstraction exists so decorators (like retry logic) can wrap any fetcher.
pub trait GetJson {
    /// Fetch `url` and parse the response body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, Box<dyn Error>>;
}

/// [`GetJson`] implementation backed by a shared [`reqwest::Client`].
///
/// Non-2xx statuses are surfaced as errors so the retry layer sees them;
/// Reddit answers rate-limited listing requests with 429s that usually clear
/// within a few seconds.
#[derive(Debug)]
pub struct HttpGet<'a> {
    pub client: &'a Client,
}

impl<'a> GetJson for HttpGet<'a> {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get_json(&self, url: &str) -> Result<Value, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let dt = t0.elapsed();
            warn!(status = %status, elapsed_ms = dt.as_millis() as u128, "Request returned non-success status");
            return Err(format!("{url} returned {status}").into());
        }

        let value = response.json::<Value>().await?;
        Ok(value)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`GetJson`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryGet<T> {
    /// The underlying fetcher to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryGet<T>
where
    T: GetJson,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryGet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryGet")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> GetJson for RetryGet<T>
where
    T: GetJson + fmt::Debug,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get_json(&self, url: &str) -> Result<Value, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.get_json(url).await {
                Ok(value) => {
                    return Ok(value);
                }
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "get_json() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "get_json() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Fetch a URL as JSON with the standard backoff schedule.
///
/// This is the entry point the content source uses for every listing and
/// comment request.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn get_json_with_backoff(client: &Client, url: &str) -> Result<Value, Box<dyn Error>> {
    let fetcher = HttpGet { client };
    let api = RetryGet::new(fetcher, 3, StdDuration::from_secs(1));
    api.get_json(url).await
}
