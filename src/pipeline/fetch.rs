use std::collections::HashSet;
use std::time::Instant;

use futures_util::future::{join_all, try_join_all};
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, error, info, warn};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::error::PipelineError;
use crate::models::{DataSettings, User};
use crate::pipeline::cache::{ExpiringCache, USERS_CACHE_KEY};
use crate::pipeline::metrics::PipelineMetrics;

/// Records requested per page
pub const PAGE_SIZE: u32 = 10;

/// HTTP client for the user data endpoints
#[derive(Clone)]
pub struct UserApiClient {
    client: Client,
    base_url: String,
}

impl UserApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, PipelineError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("userfeed/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PipelineError::network(format!("failed to create HTTP client: {}", e), None)
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PipelineError> {
        let config = AppConfig {
            base_url: base_url.into(),
            ..AppConfig::default()
        };
        Self::new(&config)
    }

    /// Fetch one page of users. A non-success status is a network error.
    pub async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<User>, PipelineError> {
        let url = format!(
            "{}/api/users?page={}&limit={}",
            self.base_url, page, limit
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string(), Some(url.clone())))?;

        if !response.status().is_success() {
            return Err(PipelineError::network(
                format!("HTTP error: {}", response.status()),
                Some(url),
            ));
        }

        let users = response
            .json::<Vec<User>>()
            .await
            .map_err(|e| PipelineError::parsing(format!("invalid page body: {}", e)))?;

        debug!("fetched page {} with {} records", page, users.len());
        Ok(users)
    }

    /// Open the newline-delimited streaming endpoint.
    pub async fn open_stream(&self) -> Result<Response, PipelineError> {
        let url = format!("{}/api/users-stream", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string(), Some(url.clone())))?;

        if !response.status().is_success() {
            return Err(PipelineError::network(
                format!("HTTP error: {}", response.status()),
                Some(url),
            ));
        }

        Ok(response)
    }
}

/// Result of a parallel load
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub users: Vec<User>,
    pub from_cache: bool,
}

/// Issues the same page set through two aggregation strategies and merges
/// the results.
pub struct ParallelFetchCoordinator {
    client: UserApiClient,
    cache: ExpiringCache,
}

impl ParallelFetchCoordinator {
    pub fn new(client: UserApiClient, cache: ExpiringCache) -> Self {
        Self { client, cache }
    }

    /// Fail-fast aggregation: any single page failure aborts the whole group.
    /// No retry, no fallback.
    pub async fn fetch_fail_fast(&self, pages: u32) -> Result<Vec<User>, PipelineError> {
        let requests = (1..=pages).map(|page| self.client.fetch_page(page, PAGE_SIZE));
        let batches = try_join_all(requests).await?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Partial-success aggregation: each page outcome is collected
    /// independently; failed pages are logged and skipped.
    pub async fn fetch_settled(&self, pages: u32) -> Vec<User> {
        let requests = (1..=pages).map(|page| self.client.fetch_page(page, PAGE_SIZE));
        let mut users = Vec::new();

        for (index, result) in join_all(requests).await.into_iter().enumerate() {
            match result {
                Ok(batch) => users.extend(batch),
                Err(e) => warn!("page {} failed in settled run: {}", index + 1, e),
            }
        }

        users
    }

    /// Run both strategies over the same page set, merge and deduplicate,
    /// and cache the result under the `"users"` key.
    ///
    /// A fresh cache entry short-circuits the whole operation unless
    /// `force_refresh` invalidates it first. If the fail-fast run fails the
    /// error is surfaced as-is; the settled run is not used as a fallback.
    pub async fn load_users(
        &self,
        settings: &DataSettings,
        force_refresh: bool,
        metrics: &mut PipelineMetrics,
    ) -> Result<FetchOutcome, PipelineError> {
        settings.validate()?;

        if force_refresh {
            self.cache.invalidate(USERS_CACHE_KEY).await;
        } else if let Some(users) = self.cache.get(USERS_CACHE_KEY).await {
            debug!("serving {} users from cache", users.len());
            return Ok(FetchOutcome {
                users,
                from_cache: true,
            });
        }

        let pages = settings.pages_to_fetch;

        let start = Instant::now();
        let fail_fast = match self.fetch_fail_fast(pages).await {
            Ok(users) => {
                metrics.parallel_all = start.elapsed();
                users
            }
            Err(e) => {
                error!("fail-fast fetch aborted: {}", e);
                return Err(e);
            }
        };

        let start = Instant::now();
        let settled = self.fetch_settled(pages).await;
        metrics.parallel_settled = start.elapsed();

        let mut merged = fail_fast;
        merged.extend(settled);
        let users = dedup_by_id(merged);

        info!(
            "loaded {} unique users across {} pages (all: {:.1?}, settled: {:.1?})",
            users.len(),
            pages,
            metrics.parallel_all,
            metrics.parallel_settled
        );

        self.cache.put(USERS_CACHE_KEY, users.clone()).await;

        Ok(FetchOutcome {
            users,
            from_cache: false,
        })
    }
}

/// Deduplicate by id, preserving first occurrence order.
pub fn dedup_by_id(users: Vec<User>) -> Vec<User> {
    let mut seen = HashSet::new();
    users
        .into_iter()
        .filter(|user| seen.insert(user.id))
        .collect()
}
