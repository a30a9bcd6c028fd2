pub mod cache;
pub mod dispatch;
pub mod fetch;
pub mod metrics;
pub mod stream;

pub use cache::{ExpiringCache, USERS_CACHE_KEY};
pub use dispatch::{DispatchMode, ProcessingDispatcher, SortKey};
pub use fetch::{ParallelFetchCoordinator, UserApiClient};
pub use metrics::PipelineMetrics;
pub use stream::StreamingIngestor;
