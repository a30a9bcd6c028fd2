use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use userfeed::models::{DataSettings, User};
use userfeed::pipeline::{
    ExpiringCache, ParallelFetchCoordinator, PipelineMetrics, StreamingIngestor, UserApiClient,
};

/// Build a page of users with the given ids.
fn page(ids: std::ops::RangeInclusive<u64>) -> Vec<User> {
    ids.map(|id| User {
        id,
        name: format!("User{}", id),
        age: 18 + (id % 50) as u32,
        email: format!("user{}@example.com", id),
    })
    .collect()
}

fn ndjson(users: &[User]) -> String {
    users
        .iter()
        .map(|u| serde_json::to_string(u).unwrap() + "\n")
        .collect()
}

async fn mount_page(server: &MockServer, page_no: u32, body: &[User], delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", page_no.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

fn coordinator(server: &MockServer) -> ParallelFetchCoordinator {
    let client = UserApiClient::with_base_url(server.uri()).unwrap();
    ParallelFetchCoordinator::new(client, ExpiringCache::with_default_ttl())
}

#[tokio::test]
async fn test_two_pages_merge_into_twenty_unique_records() {
    let server = MockServer::start().await;
    // the real server delays responses; model that on one page
    mount_page(&server, 1, &page(1..=10), Duration::from_millis(20)).await;
    mount_page(&server, 2, &page(11..=20), Duration::ZERO).await;

    let coordinator = coordinator(&server);
    let settings = DataSettings {
        pages_to_fetch: 2,
        ..Default::default()
    };
    let mut metrics = PipelineMetrics::default();

    let outcome = coordinator
        .load_users(&settings, false, &mut metrics)
        .await
        .unwrap();

    assert!(!outcome.from_cache);
    assert_eq!(outcome.users.len(), 20);
    let mut ids: Vec<u64> = outcome.users.iter().map(|u| u.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    // both strategies ran and were timed independently
    assert!(metrics.parallel_all >= Duration::from_millis(20));
    assert!(metrics.parallel_settled >= Duration::from_millis(20));
}

#[tokio::test]
async fn test_second_load_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &page(1..=10), Duration::ZERO).await;

    let coordinator = coordinator(&server);
    let settings = DataSettings {
        pages_to_fetch: 1,
        ..Default::default()
    };
    let mut metrics = PipelineMetrics::default();

    let first = coordinator
        .load_users(&settings, false, &mut metrics)
        .await
        .unwrap();
    let second = coordinator
        .load_users(&settings, false, &mut metrics)
        .await
        .unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.users, second.users);
}

#[tokio::test]
async fn test_refresh_invalidates_the_cache() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &page(1..=10), Duration::ZERO).await;

    let coordinator = coordinator(&server);
    let settings = DataSettings {
        pages_to_fetch: 1,
        ..Default::default()
    };
    let mut metrics = PipelineMetrics::default();

    coordinator
        .load_users(&settings, false, &mut metrics)
        .await
        .unwrap();
    let refreshed = coordinator
        .load_users(&settings, true, &mut metrics)
        .await
        .unwrap();

    assert!(!refreshed.from_cache);
}

#[tokio::test]
async fn test_fail_fast_errors_while_settled_keeps_good_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &page(1..=10), Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);

    let fail_fast = coordinator.fetch_fail_fast(2).await;
    assert!(fail_fast.is_err());

    let settled = coordinator.fetch_settled(2).await;
    assert_eq!(settled.len(), 10);
    assert!(settled.iter().all(|u| u.id <= 10));

    // the combined operation surfaces the fail-fast error, no fallback
    let settings = DataSettings {
        pages_to_fetch: 2,
        ..Default::default()
    };
    let mut metrics = PipelineMetrics::default();
    assert!(coordinator
        .load_users(&settings, false, &mut metrics)
        .await
        .is_err());
}

#[tokio::test]
async fn test_stream_limit_accepts_exactly_five_of_fifty() {
    let server = MockServer::start().await;
    let body = ndjson(&page(1..=50));
    Mock::given(method("GET"))
        .and(path("/api/users-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let client = UserApiClient::with_base_url(server.uri()).unwrap();
    let ingestor = StreamingIngestor::new(client);

    let mut observed = Vec::new();
    let outcome = ingestor
        .ingest_with(5, |user| observed.push(user.id))
        .await
        .unwrap();

    assert_eq!(outcome.users.len(), 5);
    assert_eq!(outcome.skipped, 0);
    // arrival order preserved, and the caller saw each record as it landed
    assert_eq!(observed, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_stream_skips_malformed_line_and_keeps_neighbours() {
    let server = MockServer::start().await;
    let users = page(1..=3);
    let body = format!(
        "{}{{bad json\n{}{}",
        serde_json::to_string(&users[0]).unwrap() + "\n",
        serde_json::to_string(&users[1]).unwrap() + "\n",
        serde_json::to_string(&users[2]).unwrap() + "\n",
    );
    Mock::given(method("GET"))
        .and(path("/api/users-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let client = UserApiClient::with_base_url(server.uri()).unwrap();
    let outcome = StreamingIngestor::new(client).ingest(10).await.unwrap();

    assert_eq!(outcome.skipped, 1);
    let ids: Vec<u64> = outcome.users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_stream_dedups_and_flushes_trailing_record() {
    let server = MockServer::start().await;
    let users = page(1..=2);
    // duplicate of id 1 in the middle, final record unterminated
    let body = format!(
        "{}\n{}\n{}",
        serde_json::to_string(&users[0]).unwrap(),
        serde_json::to_string(&users[0]).unwrap(),
        serde_json::to_string(&users[1]).unwrap(),
    );
    Mock::given(method("GET"))
        .and(path("/api/users-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let client = UserApiClient::with_base_url(server.uri()).unwrap();
    let outcome = StreamingIngestor::new(client).ingest(10).await.unwrap();

    let ids: Vec<u64> = outcome.users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn test_stream_transport_failure_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users-stream"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = UserApiClient::with_base_url(server.uri()).unwrap();
    assert!(StreamingIngestor::new(client).ingest(10).await.is_err());
}
