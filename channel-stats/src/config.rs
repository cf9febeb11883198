//! Pipeline configuration.

use crate::batcher::MAX_IDS_PER_BATCH;
use crate::youtube_api::{DEFAULT_API_BASE, MAX_RESULTS_PER_REQUEST};
use eyre::Context;
use std::str::FromStr;
use std::time::Duration;

/// Time a completed run stays cached.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Number of completed runs kept at once.
pub const DEFAULT_CACHE_CAPACITY: usize = 3;

/// What a run does when one detail batch fails normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchFailurePolicy {
    /// Record the failure in the result and keep fetching the other batches.
    #[default]
    Continue,
    /// Fail the whole run.
    Abort,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the YouTube Data API.
    pub api_base: String,
    /// Video ids requested per search page (1..=50).
    pub page_size: u32,
    /// Video ids per detail request (1..=50).
    pub batch_size: usize,
    /// Detail requests allowed in flight at once.
    pub max_concurrent_batches: usize,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Per-request timeout for the shared HTTP client.
    pub request_timeout: Duration,
    pub batch_failure_policy: BatchFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: MAX_RESULTS_PER_REQUEST,
            batch_size: MAX_IDS_PER_BATCH,
            max_concurrent_batches: 4,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            request_timeout: Duration::from_secs(30),
            batch_failure_policy: BatchFailurePolicy::Continue,
        }
    }
}

impl Config {
    /// Reads overrides from `YTSTATS_*` environment variables on top of [`Config::default`].
    ///
    /// | variable                          | field                    |
    /// |-----------------------------------|--------------------------|
    /// | `YTSTATS_API_BASE`                | `api_base`               |
    /// | `YTSTATS_MAX_CONCURRENT_BATCHES`  | `max_concurrent_batches` |
    /// | `YTSTATS_CACHE_TTL_SECS`          | `cache_ttl`              |
    /// | `YTSTATS_CACHE_CAPACITY`          | `cache_capacity`         |
    /// | `YTSTATS_REQUEST_TIMEOUT_SECS`    | `request_timeout`        |
    /// | `YTSTATS_ABORT_ON_BATCH_FAILURE`  | `batch_failure_policy`   |
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let mut config = Self::default();

        if let Some(api_base) = lookup("YTSTATS_API_BASE") {
            config.api_base = api_base;
        }
        if let Some(n) = parse_var(&lookup, "YTSTATS_MAX_CONCURRENT_BATCHES")? {
            config.max_concurrent_batches = n;
        }
        if let Some(secs) = parse_var(&lookup, "YTSTATS_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var(&lookup, "YTSTATS_CACHE_CAPACITY")? {
            config.cache_capacity = n;
        }
        if let Some(secs) = parse_var(&lookup, "YTSTATS_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(abort) = parse_var::<bool>(&lookup, "YTSTATS_ABORT_ON_BATCH_FAILURE")? {
            config.batch_failure_policy = if abort {
                BatchFailurePolicy::Abort
            } else {
                BatchFailurePolicy::Continue
            };
        }

        Ok(config.normalized())
    }

    /// Points the pipeline at a different API host (e.g. a local mock server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_batch_failure_policy(mut self, policy: BatchFailurePolicy) -> Self {
        self.batch_failure_policy = policy;
        self
    }

    /// Clamps sizes to what the remote service accepts and counts to at least one.
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.clamp(1, MAX_RESULTS_PER_REQUEST);
        self.batch_size = self.batch_size.clamp(1, MAX_IDS_PER_BATCH);
        self.max_concurrent_batches = self.max_concurrent_batches.max(1);
        self.cache_capacity = self.cache_capacity.max(1);
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> eyre::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("parse {name}={value:?}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
        assert_eq!(config.cache_capacity, 3);
        assert_eq!(config.batch_failure_policy, BatchFailurePolicy::Continue);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("YTSTATS_API_BASE", "http://localhost:1234"),
            ("YTSTATS_MAX_CONCURRENT_BATCHES", "8"),
            ("YTSTATS_CACHE_TTL_SECS", "60"),
            ("YTSTATS_CACHE_CAPACITY", "0"),
            ("YTSTATS_ABORT_ON_BATCH_FAILURE", "true"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:1234");
        assert_eq!(config.max_concurrent_batches, 8);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        // clamped
        assert_eq!(config.cache_capacity, 1);
        assert_eq!(config.batch_failure_policy, BatchFailurePolicy::Abort);
    }

    #[test]
    fn test_bad_value_names_the_variable() {
        let result = Config::from_lookup(lookup(&[("YTSTATS_CACHE_CAPACITY", "lots")]));
        assert!(result.is_err());
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("YTSTATS_CACHE_CAPACITY"), "{err}");
    }

    #[test]
    fn test_normalized_clamps_sizes() {
        let config = Config {
            page_size: 500,
            batch_size: 0,
            max_concurrent_batches: 0,
            ..Config::default()
        }
        .normalized();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_concurrent_batches, 1);
    }
}
