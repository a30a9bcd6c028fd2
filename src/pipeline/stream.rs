use std::collections::HashSet;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::infrastructure::error::PipelineError;
use crate::models::{parse_stream_record, User};
use crate::pipeline::fetch::UserApiClient;

/// Result of one streaming ingestion run
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    /// Accepted records, in arrival order
    pub users: Vec<User>,
    /// Lines rejected by parsing or validation
    pub skipped: usize,
}

/// Splits an incoming byte stream into complete lines, retaining the
/// trailing unterminated segment across reads.
struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append a chunk and return every line completed by it.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned());
        }
        lines
    }

    /// Hand back whatever remains once the stream ends.
    fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buffer).into_owned())
        }
    }
}

/// Consumes the newline-delimited streaming endpoint incrementally,
/// validating and deduplicating records as they arrive.
pub struct StreamingIngestor {
    client: UserApiClient,
}

impl StreamingIngestor {
    pub fn new(client: UserApiClient) -> Self {
        Self { client }
    }

    pub async fn ingest(&self, limit: usize) -> Result<StreamOutcome, PipelineError> {
        self.ingest_with(limit, |_| {}).await
    }

    /// Ingest until `limit` records are accepted or the stream ends.
    ///
    /// `on_record` fires for each accepted record so callers can observe
    /// incremental growth. Reading stops as soon as the limit is reached;
    /// the response body is dropped, releasing the underlying connection
    /// even if the source has more data. Rejected lines are logged and
    /// skipped without aborting the run.
    pub async fn ingest_with<F>(
        &self,
        limit: usize,
        mut on_record: F,
    ) -> Result<StreamOutcome, PipelineError>
    where
        F: FnMut(&User),
    {
        if limit == 0 {
            return Ok(StreamOutcome {
                users: Vec::new(),
                skipped: 0,
            });
        }

        let response = self.client.open_stream().await?;
        let mut stream = response.bytes_stream();

        let mut assembler = LineAssembler::new();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut accepted: Vec<User> = Vec::new();
        let mut skipped = 0usize;

        'read: while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| PipelineError::network(format!("stream read failed: {}", e), None))?;

            for line in assembler.push(&chunk) {
                accept_line(&line, &mut seen, &mut accepted, &mut skipped, &mut on_record);
                if accepted.len() >= limit {
                    break 'read;
                }
            }
        }

        // Early termination: releases the connection without draining the
        // source.
        drop(stream);

        if accepted.len() < limit {
            if let Some(rest) = assembler.finish() {
                accept_line(&rest, &mut seen, &mut accepted, &mut skipped, &mut on_record);
            }
        }

        debug!(
            "stream ingestion finished: {} accepted, {} skipped",
            accepted.len(),
            skipped
        );

        Ok(StreamOutcome {
            users: accepted,
            skipped,
        })
    }
}

fn accept_line<F>(
    line: &str,
    seen: &mut HashSet<u64>,
    accepted: &mut Vec<User>,
    skipped: &mut usize,
    on_record: &mut F,
) where
    F: FnMut(&User),
{
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match parse_stream_record(line) {
        Ok(user) => {
            if !seen.insert(user.id) {
                debug!("dropping duplicate stream record id {}", user.id);
                return;
            }
            on_record(&user);
            accepted.push(user);
        }
        Err(reason) => {
            warn!("skipping stream record: {}", reason);
            *skipped += 1;
        }
    }
}
