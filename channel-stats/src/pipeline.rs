//! The aggregation pipeline: resolve → walk → batch-fetch → assemble, behind the cache.

use crate::batcher::{self, BatchChunker};
use crate::cache::{AggregationCache, CacheKey};
use crate::config::{BatchFailurePolicy, Config};
use crate::error::{Error, Result};
use crate::model::{AggregationResult, BatchFailure, ChannelRef, Credential, VideoIdRef, VideoRecord};
use crate::resolver;
use crate::walker;
use crate::youtube_api::YouTubeClient;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinError, JoinHandle, JoinSet};
use tokio_stream::StreamExt;
use tracing::instrument;

type BatchOutcome = (usize, Result<Vec<VideoRecord>>);

/// Runs aggregations for one process, sharing an HTTP session and a result cache.
///
/// Cloning is cheap; clones share the session and the cache.
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// Shared HTTP client, so every run reuses the same connection pool
    http: reqwest::Client,
    config: Arc<Config>,
    cache: AggregationCache,
}

/// Videos collected by walking and batch-fetching a channel.
#[derive(Debug, Default)]
struct Collected {
    records: Vec<VideoRecord>,
    failed_batches: Vec<BatchFailure>,
}

impl Aggregator {
    pub fn new(config: Config) -> Result<Self> {
        let config = config.normalized();
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(Error::transport)?;
        Ok(Self::with_http_client(config, http))
    }

    /// Like [`Aggregator::new`], but with a caller-provided HTTP client.
    pub fn with_http_client(config: Config, http: reqwest::Client) -> Self {
        let config = config.normalized();
        let cache = AggregationCache::new(config.cache_ttl, config.cache_capacity);
        Self {
            http,
            config: Arc::new(config),
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &AggregationCache {
        &self.cache
    }

    /// A client for `credential` on the shared session.
    pub fn client(&self, credential: Credential) -> YouTubeClient {
        YouTubeClient::new(credential, self.config.api_base.as_str(), self.http.clone())
    }

    /// Aggregates a channel's summary and full video list.
    ///
    /// Results are cached per (channel name, credential). Concurrent calls for
    /// the same pair share one run. Failed runs are not cached.
    #[instrument(skip(self, credential))]
    pub async fn aggregate(
        &self,
        channel_name: &str,
        credential: &Credential,
    ) -> Result<AggregationResult> {
        let key = CacheKey::new(channel_name, credential.clone());
        self.cache
            .get_or_compute(key, || self.run(channel_name, credential))
            .await
    }

    /// Starts [`Aggregator::aggregate`] on a background task that can be cancelled.
    pub fn spawn_aggregate(
        &self,
        channel_name: impl Into<String>,
        credential: Credential,
    ) -> PendingAggregation {
        let this = self.clone();
        let channel_name = channel_name.into();
        let handle =
            tokio::spawn(async move { this.aggregate(&channel_name, &credential).await });
        PendingAggregation { handle }
    }

    /// Runs the pipeline once, bypassing the cache.
    #[instrument(skip(self, credential))]
    pub async fn run(
        &self,
        channel_name: &str,
        credential: &Credential,
    ) -> Result<AggregationResult> {
        let client = self.client(credential.clone());

        let channel_id = resolver::resolve_channel_id(&client, channel_name).await?;

        // The summary does not depend on video discovery.
        let (summary, collected) = tokio::try_join!(
            resolver::fetch_summary(&client, &channel_id),
            self.collect_videos(&client, &channel_id),
        )?;

        tracing::info!(
            %channel_id,
            videos = collected.records.len(),
            declared_videos = summary.declared_video_count,
            failed_batches = collected.failed_batches.len(),
            "aggregated channel"
        );

        Ok(AggregationResult {
            channel: ChannelRef {
                name: channel_name.to_string(),
                id: Some(channel_id),
            },
            summary,
            records: collected.records,
            failed_batches: collected.failed_batches,
        })
    }

    /// Walks every page of the channel and fetches details for each batch of ids.
    ///
    /// Pages are fetched one after another; detail batches run concurrently
    /// (bounded by `max_concurrent_batches`) and are put back in discovery
    /// order before being returned. Returning early drops the [`JoinSet`],
    /// which aborts any batch still running.
    async fn collect_videos(&self, client: &YouTubeClient, channel_id: &str) -> Result<Collected> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_batches));
        let mut tasks: JoinSet<BatchOutcome> = JoinSet::new();
        let mut chunker = BatchChunker::new(self.config.batch_size);
        let mut batches = Batches::default();

        let pages = walker::walk(client, channel_id, self.config.page_size);
        let mut pages = std::pin::pin!(pages);
        let mut page_number = 0;
        while let Some(page) = pages.next().await {
            let page = page?;
            page_number += 1;
            tracing::debug!(
                page = page_number,
                ids = page.items.len(),
                "discovered video ids"
            );

            for batch in chunker.push(page.items) {
                batches.spawn(&mut tasks, client, &permits, batch);
            }

            // Surface a fatal batch error without waiting for the walk to finish.
            while let Some(joined) = tasks.try_join_next() {
                batches.settle(joined, self.config.batch_failure_policy)?;
            }
        }
        if let Some(batch) = chunker.finish() {
            batches.spawn(&mut tasks, client, &permits, batch);
        }

        while let Some(joined) = tasks.join_next().await {
            batches.settle(joined, self.config.batch_failure_policy)?;
        }

        Ok(batches.assemble())
    }
}

/// Bookkeeping for detail batches, indexed by discovery order.
#[derive(Debug, Default)]
struct Batches {
    ids: Vec<Vec<String>>,
    results: Vec<Option<Vec<VideoRecord>>>,
    failures: Vec<BatchFailure>,
}

impl Batches {
    fn spawn(
        &mut self,
        tasks: &mut JoinSet<BatchOutcome>,
        client: &YouTubeClient,
        permits: &Arc<Semaphore>,
        batch: Vec<VideoIdRef>,
    ) {
        let index = self.ids.len();
        self.ids
            .push(batch.iter().map(|id| id.video_id.clone()).collect());
        self.results.push(None);

        let client = client.clone();
        let permits = Arc::clone(permits);
        tasks.spawn(async move {
            // the semaphore is never closed
            let _permit = permits.acquire_owned().await;
            tracing::trace!(batch = index, ids = batch.len(), "fetching detail batch");
            (index, batcher::fetch_details(&client, &batch).await)
        });
    }

    fn settle(
        &mut self,
        joined: std::result::Result<BatchOutcome, JoinError>,
        policy: BatchFailurePolicy,
    ) -> Result<()> {
        let (index, outcome) = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => return Err(Error::Cancelled),
        };

        match outcome {
            Ok(records) => {
                self.results[index] = Some(records);
                Ok(())
            }
            Err(error) if error.is_batch_scoped() && policy == BatchFailurePolicy::Continue => {
                tracing::warn!(batch = index, %error, "skipping failed detail batch");
                self.failures.push(BatchFailure {
                    index,
                    video_ids: self.ids[index].clone(),
                    error,
                });
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn assemble(mut self) -> Collected {
        self.failures.sort_by_key(|failure| failure.index);
        Collected {
            records: self.results.into_iter().flatten().flatten().collect(),
            failed_batches: self.failures,
        }
    }
}

/// An aggregation running on its own task.
///
/// Dropping this does not stop the run; call [`PendingAggregation::cancel`].
#[derive(Debug)]
pub struct PendingAggregation {
    handle: JoinHandle<Result<AggregationResult>>,
}

impl PendingAggregation {
    /// Abandons the run. In-flight requests are dropped and nothing is cached.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// A handle that cancels the run without consuming `self`.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run; a cancelled run yields [`Error::Cancelled`].
    pub async fn join(self) -> Result<AggregationResult> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(Error::Cancelled),
        }
    }
}
