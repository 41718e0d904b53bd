//! Loads a user dashboard from three flaky endpoints.
//!
//! Run with: cargo run --example dashboard

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tributary::{load_all, BoxedOperation, RetryPolicy};

/// Simulates a remote endpoint that answers after `latency`, failing with
/// the given messages on its first calls.
fn endpoint(
    name: &'static str,
    latency: Duration,
    failures: Vec<&'static str>,
) -> BoxedOperation<String, String> {
    let calls = Arc::new(AtomicU32::new(0));
    let failures = Arc::new(failures);
    BoxedOperation::new(move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
        let failure = failures.get(n).copied();
        async move {
            tokio::time::sleep(latency).await;
            match failure {
                Some(message) => {
                    tracing::info!(endpoint = name, attempt = n, "{}", message);
                    Err(message.to_string())
                }
                None => Ok(format!("{} payload", name)),
            }
        }
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::info!("--- Starting Dashboard Load ---");
    tracing::debug!(policy = ?RetryPolicy::default(), "per-endpoint retry policy");

    let result = load_all(vec![
        (
            "profile",
            endpoint(
                "profile",
                Duration::from_millis(120),
                vec!["500 Internal Server Error"],
            ),
        ),
        (
            "orders",
            endpoint(
                "orders",
                Duration::from_millis(80),
                vec!["429 Too Many Requests", "429 Too Many Requests"],
            ),
        ),
        (
            "notifications",
            endpoint("notifications", Duration::from_millis(60), vec![]),
        ),
    ])
    .await;

    match result {
        Ok(dashboard) => {
            let mut slots: Vec<_> = dashboard.data.iter().collect();
            slots.sort();
            for (name, value) in slots {
                tracing::info!("{}: {}", name, value);
            }
            tracing::info!("Dashboard loaded in {:?}", dashboard.time_taken);
        }
        Err(error) => tracing::error!("Dashboard crashed: {}", error),
    }
}
