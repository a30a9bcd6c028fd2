use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::infrastructure::error::PipelineError;
use crate::models::User;
use crate::pipeline::metrics::PipelineMetrics;

/// Sort key for processed output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Case-insensitive lexicographic order
    Name,
    /// Numeric ascending order
    Age,
}

/// Where the transform runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Inline,
    Offloaded,
}

/// Worker boundary request. Field names match the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub users: Vec<User>,
    #[serde(rename = "minAge")]
    pub min_age: u32,
    #[serde(rename = "sortBy")]
    pub sort_by: SortKey,
}

/// Worker boundary response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub users: Vec<User>,
    #[serde(rename = "processingTime")]
    pub processing_time_ms: f64,
}

impl ProcessResponse {
    pub fn processing_time(&self) -> Duration {
        Duration::from_secs_f64(self.processing_time_ms / 1000.0)
    }
}

/// Keep users strictly older than `min_age`, then stable-sort by the given
/// key. Both execution modes share this exact transform so their outputs are
/// identical for identical inputs.
pub fn filter_and_sort(users: &[User], min_age: u32, sort_by: SortKey) -> Vec<User> {
    let mut out: Vec<User> = users.iter().filter(|u| u.age > min_age).cloned().collect();

    match sort_by {
        SortKey::Name => out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        SortKey::Age => out.sort_by(|a, b| a.age.cmp(&b.age)),
    }

    out
}

fn execute(request: ProcessRequest) -> ProcessResponse {
    let start = Instant::now();
    let users = filter_and_sort(&request.users, request.min_age, request.sort_by);

    ProcessResponse {
        users,
        processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Runs the filter+sort transform either on the caller's context or on an
/// offloaded worker, recording the elapsed time for whichever path is used.
#[derive(Debug, Default)]
pub struct ProcessingDispatcher;

impl ProcessingDispatcher {
    /// Run the transform synchronously, measuring the duration locally.
    pub fn run_inline(&self, request: ProcessRequest) -> ProcessResponse {
        execute(request)
    }

    /// Hand the request to an isolated worker context. Input is moved, not
    /// shared; the worker measures its own duration and serves exactly one
    /// request before being torn down.
    pub async fn run_offloaded(
        &self,
        request: ProcessRequest,
    ) -> Result<ProcessResponse, PipelineError> {
        let handle = tokio::task::spawn_blocking(move || execute(request));

        handle
            .await
            .map_err(|e| PipelineError::worker(format!("worker task failed: {}", e)))
    }

    /// Dispatch to the chosen mode and record its metric. On worker failure
    /// the error is logged and surfaced so the caller can keep its prior
    /// record set unchanged.
    pub async fn dispatch(
        &self,
        request: ProcessRequest,
        mode: DispatchMode,
        metrics: &mut PipelineMetrics,
    ) -> Result<Vec<User>, PipelineError> {
        match mode {
            DispatchMode::Offloaded => match self.run_offloaded(request).await {
                Ok(response) => {
                    metrics.worker_time = response.processing_time();
                    debug!("worker processed in {:.1?}", metrics.worker_time);
                    Ok(response.users)
                }
                Err(e) => {
                    error!("offloaded processing failed: {}", e);
                    Err(e)
                }
            },
            DispatchMode::Inline => {
                let response = self.run_inline(request);
                metrics.main_thread_time = response.processing_time();
                debug!("processed inline in {:.1?}", metrics.main_thread_time);
                Ok(response.users)
            }
        }
    }
}
