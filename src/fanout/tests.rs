//! Fan-out tests on tokio's paused clock.

use super::*;
use crate::operation::{BoxedOperation, OperationExt};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Op = BoxedOperation<&'static str, String>;

// ==================== Test Helpers ====================

/// Creates an operation that replays `outcomes` after `delay`; the last
/// outcome repeats. Returns the operation and its call counter.
fn scripted(delay: Duration, outcomes: Vec<Result<&'static str, String>>) -> (Op, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let outcomes = Arc::new(outcomes);
    let op = {
        let calls = calls.clone();
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let outcome = outcomes[n.min(outcomes.len() - 1)].clone();
            async move {
                tokio::time::sleep(delay).await;
                outcome
            }
        }
    };
    (op.boxed(), calls)
}

fn ok(value: &'static str) -> (Op, Arc<AtomicU32>) {
    scripted(Duration::ZERO, vec![Ok(value)])
}

/// Creates an operation that records its start and end in `log`.
fn logged(name: &'static str, delay: Duration, log: Arc<Mutex<Vec<String>>>) -> Op {
    (move || {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{}-start", name));
            tokio::time::sleep(delay).await;
            log.lock().unwrap().push(format!("{}-end", name));
            Ok(name)
        }
    })
    .boxed()
}

// ==================== Fanout Tests ====================

#[tokio::test(start_paused = true)]
async fn test_all_succeed_returns_every_slot() {
    let (profile, _) = ok("user-1");
    let (orders, _) = ok("orders");
    let (notifications, _) = ok("5 unread");

    let result = Fanout::new()
        .add("profile", profile)
        .add("orders", orders)
        .add("notifications", notifications)
        .run()
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.data.len(), 3);
    assert_eq!(result.get("profile"), Some(&"user-1"));
    assert_eq!(result.get("orders"), Some(&"orders"));
    assert_eq!(result.get("notifications"), Some(&"5 unread"));
}

#[tokio::test(start_paused = true)]
async fn test_all_start_before_any_finish() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let delay = Duration::from_millis(50);

    Fanout::new()
        .add("profile", logged("profile", delay, log.clone()))
        .add("orders", logged("orders", delay, log.clone()))
        .add("notifications", logged("notifications", delay, log.clone()))
        .run()
        .await
        .unwrap();

    let log = log.lock().unwrap();
    let last_start = log.iter().rposition(|e| e.ends_with("-start")).unwrap();
    let first_end = log.iter().position(|e| e.ends_with("-end")).unwrap();
    assert!(last_start < first_end, "sequential execution: {:?}", *log);
}

#[tokio::test(start_paused = true)]
async fn test_time_taken_is_max_not_sum() {
    let delay = Duration::from_millis(100);
    let (a, _) = scripted(delay, vec![Ok("a")]);
    let (b, _) = scripted(delay, vec![Ok("b")]);
    let (c, _) = scripted(delay, vec![Ok("c")]);

    let result = load_all(vec![("a", a), ("b", b), ("c", c)]).await.unwrap();

    assert!(result.time_taken >= delay);
    assert!(result.time_taken < delay * 2);
}

#[tokio::test(start_paused = true)]
async fn test_500_is_retried_within_fanout() {
    let (profile, profile_calls) = scripted(
        Duration::ZERO,
        vec![Err("500 Internal Server Error".to_string()), Ok("profile")],
    );
    let (orders, _) = ok("orders");
    let (notifications, _) = ok("notifications");

    let result = load_all(vec![
        ("profile", profile),
        ("orders", orders),
        ("notifications", notifications),
    ])
    .await
    .unwrap();

    assert!(result.success);
    assert_eq!(result.get("profile"), Some(&"profile"));
    assert_eq!(profile_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_429_is_retried_within_fanout() {
    let (profile, _) = ok("profile");
    let (orders, orders_calls) = scripted(
        Duration::ZERO,
        vec![Err("429 Too Many Requests".to_string()), Ok("orders")],
    );
    let (notifications, _) = ok("notifications");

    let result = load_all(vec![
        ("profile", profile),
        ("orders", orders),
        ("notifications", notifications),
    ])
    .await
    .unwrap();

    assert!(result.success);
    assert_eq!(orders_calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.time_taken, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_operation_fails_the_fanout() {
    let (profile, profile_calls) = ok("profile");
    let (orders, orders_calls) =
        scripted(Duration::ZERO, vec![Err("500 Persistent Error".to_string())]);
    let (notifications, _) = ok("notifications");

    let result = load_all(vec![
        ("profile", profile),
        ("orders", orders),
        ("notifications", notifications),
    ])
    .await;

    assert_eq!(result, Err("500 Persistent Error".to_string()));
    assert_eq!(orders_calls.load(Ordering::SeqCst), 4); // 1 initial + 3 retries
    assert_eq!(profile_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_siblings_run_to_completion_after_failure() {
    let finished = Arc::new(AtomicBool::new(false));
    let slow: Op = {
        let finished = finished.clone();
        (move || {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                finished.store(true, Ordering::SeqCst);
                Ok("slow")
            }
        })
        .boxed()
    };
    let (failing, _) = scripted(Duration::ZERO, vec![Err("500 boom".to_string())]);

    let result = Fanout::new()
        .add("slow", slow)
        .add("failing", failing)
        .run()
        .await;

    assert!(result.is_err());
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_first_registered_failure_wins() {
    // "second" fails long before "first" does; registration order decides.
    let (first, _) = scripted(
        Duration::from_millis(50),
        vec![Err("500 first".to_string())],
    );
    let (second, _) = scripted(Duration::ZERO, vec![Err("500 second".to_string())]);

    let result = Fanout::new()
        .add("first", first)
        .add("second", second)
        .run()
        .await;

    assert_eq!(result, Err("500 first".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_policy() {
    let (failing, calls) = scripted(Duration::ZERO, vec![Err("500 boom".to_string())]);

    let fanout = Fanout::new()
        .with_policy(RetryPolicy::default().with_max_retries(0))
        .add("failing", failing);
    let result = fanout.run().await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(fanout.policy().max_retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_fanout_succeeds() {
    let fanout: Fanout<Op> = Fanout::new();
    assert!(fanout.is_empty());

    let result = fanout.run().await.unwrap();

    assert!(result.success);
    assert!(result.data.is_empty());
    assert_eq!(result.time_taken, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_name_keeps_later_slot() {
    let (a, a_calls) = ok("first");
    let (b, b_calls) = ok("second");

    let result = load_all(vec![("profile", a), ("profile", b)]).await.unwrap();

    assert_eq!(result.data.len(), 1);
    assert_eq!(result.get("profile"), Some(&"second"));
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_collect_and_extend_keep_order() {
    let mut fanout: Fanout<Op> = vec![("a", ok("a").0), ("b", ok("b").0)]
        .into_iter()
        .collect();
    fanout.extend(vec![("c".to_string(), ok("c").0)]);

    assert_eq!(fanout.len(), 3);
    assert_eq!(fanout.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

// ==================== load3 Tests ====================

#[tokio::test(start_paused = true)]
async fn test_load3_heterogeneous_outputs() {
    let delay = Duration::from_millis(100);
    let result = load3(
        move || async move {
            tokio::time::sleep(delay).await;
            Ok::<_, String>("user-1")
        },
        move || async move {
            tokio::time::sleep(delay).await;
            Ok::<_, String>(vec![101u32, 102])
        },
        move || async move {
            tokio::time::sleep(delay).await;
            Ok::<_, String>(5usize)
        },
    )
    .await
    .unwrap();

    assert_eq!(result.data, ("user-1", vec![101, 102], 5));
    assert_eq!(result.time_taken, delay);
}

#[tokio::test(start_paused = true)]
async fn test_load3_propagates_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let failing = {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>("500 Persistent Error".to_string()) }
        }
    };

    let result = load3_with_policy(
        || async { Ok::<_, String>("profile") },
        || async { Ok::<_, String>(7u8) },
        failing,
        &RetryPolicy::default().with_max_retries(2),
    )
    .await;

    assert_eq!(result, Err("500 Persistent Error".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[cfg(feature = "tracing")]
mod logging {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_logs_failing_slot() {
        let (orders, _) = scripted(Duration::ZERO, vec![Err("500 boom".to_string())]);

        let _ = Fanout::new()
            .with_policy(RetryPolicy::default().with_max_retries(0))
            .add("orders", orders)
            .run()
            .await;

        assert!(logs_contain("fanout failed"));
        assert!(logs_contain("orders"));
    }
}
