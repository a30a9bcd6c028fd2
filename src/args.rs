use clap::Parser;

use crate::pipeline::dispatch::SortKey;

#[derive(Parser, Debug)]
#[command(
    name = "userfeed",
    version,
    about = "Fetch, stream and process synthetic users with competing concurrency strategies"
)]
pub struct Args {
    /// Base URL of the user data server (overrides USERFEED_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Number of pages to fetch in parallel (1-5)
    #[arg(long, default_value_t = 3)]
    pub pages: u32,

    /// Load via the streaming endpoint instead of paginated parallel fetch
    #[arg(long, default_value_t = false)]
    pub stream: bool,

    /// Maximum records to accept from the stream before releasing it
    #[arg(long, default_value_t = 10)]
    pub stream_limit: usize,

    /// Keep only users strictly older than this
    #[arg(long, default_value_t = 0)]
    pub min_age: u32,

    /// Sort key for the processed output
    #[arg(long, value_enum, default_value = "name")]
    pub sort_by: SortKey,

    /// Offload filtering and sorting to a worker task
    #[arg(long, default_value_t = false)]
    pub worker: bool,

    /// Invalidate the cached user set before fetching
    #[arg(long, default_value_t = false)]
    pub refresh: bool,

    /// Print the processed records as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
