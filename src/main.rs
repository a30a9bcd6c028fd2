use clap::Parser;
use tracing::{debug, error, info, warn};

use userfeed::args::Args;
use userfeed::infrastructure::config::AppConfig;
use userfeed::infrastructure::logging::{setup_logging, LoggingConfig};
use userfeed::models::{DataSettings, User};
use userfeed::pipeline::dispatch::{DispatchMode, ProcessRequest, ProcessingDispatcher};
use userfeed::pipeline::{
    ExpiringCache, ParallelFetchCoordinator, PipelineMetrics, StreamingIngestor, UserApiClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(LoggingConfig::default())?;

    let mut config = AppConfig::from_env();
    if let Some(url) = &args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    let settings = DataSettings {
        pages_to_fetch: args.pages,
        stream_limit: args.stream_limit,
    };
    settings.validate()?;

    let client = UserApiClient::new(&config)?;
    let cache = ExpiringCache::new(config.cache_ttl);
    let mut metrics = PipelineMetrics::default();

    info!("loading users from {}", config.base_url);

    let load_result = if args.stream {
        let ingestor = StreamingIngestor::new(client.clone());
        ingestor
            .ingest_with(settings.stream_limit, |user| {
                debug!("accepted stream record {} ({})", user.id, user.name);
            })
            .await
            .map(|outcome| {
                info!(
                    "stream accepted {} records, skipped {}",
                    outcome.users.len(),
                    outcome.skipped
                );
                outcome.users
            })
    } else {
        let coordinator = ParallelFetchCoordinator::new(client.clone(), cache.clone());
        coordinator
            .load_users(&settings, args.refresh, &mut metrics)
            .await
            .map(|outcome| {
                if outcome.from_cache {
                    info!("served {} users from cache", outcome.users.len());
                }
                outcome.users
            })
    };

    // Loading always completes; a failed load leaves an empty set rather
    // than a stuck pipeline.
    let mut users = match load_result {
        Ok(users) => users,
        Err(e) => {
            error!("load failed: {}", e);
            Vec::new()
        }
    };
    info!("loading finished");

    if !users.is_empty() {
        let dispatcher = ProcessingDispatcher;
        let request = ProcessRequest {
            users: users.clone(),
            min_age: args.min_age,
            sort_by: args.sort_by,
        };
        let mode = if args.worker {
            DispatchMode::Offloaded
        } else {
            DispatchMode::Inline
        };

        match dispatcher.dispatch(request, mode, &mut metrics).await {
            Ok(processed) => users = processed,
            Err(e) => warn!("processing failed, keeping unprocessed records: {}", e),
        }
    }

    print_users(&users, args.json)?;

    let report = metrics.report();
    println!(
        "\ntimings: parallel-all {:.2}ms | parallel-settled {:.2}ms | worker {:.2}ms | main-thread {:.2}ms",
        report.parallel_all_ms,
        report.parallel_settled_ms,
        report.worker_time_ms,
        report.main_thread_time_ms
    );

    Ok(())
}

fn print_users(users: &[User], as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(users)?);
        return Ok(());
    }

    println!("{} users:", users.len());
    for user in users {
        println!("  #{:<4} {:<10} age {:<3} {}", user.id, user.name, user.age, user.email);
    }
    Ok(())
}
