//! Synthetic user generator backing the mock data endpoints.
//!
//! Identifiers come from a process-wide counter that starts at 1 and is never
//! reset; callers must not assume ids are stable across process restarts.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::User;

/// Records emitted by the streaming endpoint before it terminates
pub const STREAM_RECORD_COUNT: usize = 50;

static NEXT_USER_ID: AtomicU64 = AtomicU64::new(1);

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Ivy", "Jack", "Karen",
    "Liam", "Mia", "Noah", "Olivia", "Peter",
];

/// Generate one user with the next monotonic id and random display data.
pub fn next_user() -> User {
    let id = NEXT_USER_ID.fetch_add(1, Ordering::Relaxed);
    let mut rng = rand::thread_rng();
    let name = FIRST_NAMES
        .choose(&mut rng)
        .copied()
        .unwrap_or("Alice")
        .to_string();
    let email = format!("{}{}@example.com", name.to_lowercase(), id);

    User {
        id,
        name,
        age: rng.gen_range(18..80),
        email,
    }
}

/// Generate a page of `count` users, ids assigned in order.
pub fn user_page(count: usize) -> Vec<User> {
    (0..count).map(|_| next_user()).collect()
}

/// Render `count` users as a newline-delimited JSON stream body.
pub fn ndjson_body(count: usize) -> String {
    user_page(count)
        .iter()
        .map(|user| serde_json::to_string(user).unwrap_or_default())
        .fold(String::new(), |mut body, line| {
            body.push_str(&line);
            body.push('\n');
            body
        })
}
