use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use readnext_http::RequestQueue;

#[tokio::test]
async fn concurrency_never_exceeds_the_bound() {
    let queue = RequestQueue::new(5, Duration::from_millis(5));
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let running = running.clone();
        let peak = peak.clone();
        handles.push(queue.submit(async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(40)).await;
            running.fetch_sub(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.await.expect("operation should run");
    }

    assert_eq!(peak.load(Ordering::SeqCst), 5);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn admission_follows_submission_order() {
    let queue = RequestQueue::new(1, Duration::from_millis(1));
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..10u32 {
        let order = order.clone();
        handles.push(queue.submit(async move {
            order.lock().unwrap().push(i);
        }));
    }

    for handle in handles {
        handle.await.expect("operation should run");
    }

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn one_failure_does_not_block_the_rest() {
    let queue = RequestQueue::new(2, Duration::from_millis(1));

    let failing = queue.submit(async { Err::<u32, String>("boom".to_string()) });
    let succeeding = queue.submit(async { Ok::<u32, String>(42) });

    assert_eq!(
        failing.await.expect("handle resolves"),
        Err("boom".to_string())
    );
    assert_eq!(succeeding.await.expect("handle resolves"), Ok(42));
}

#[tokio::test]
async fn results_come_back_untouched() {
    let queue = RequestQueue::default();
    let handle = queue.submit(async { "payload".to_string() });
    assert_eq!(handle.await.expect("handle resolves"), "payload");
}

#[tokio::test]
async fn slot_reuse_waits_for_the_inter_operation_delay() {
    let queue = RequestQueue::new(1, Duration::from_millis(50));
    let started = std::time::Instant::now();

    let first = queue.submit(async {});
    let second = queue.submit(async {});
    first.await.expect("first runs");
    second.await.expect("second runs");

    // The second operation cannot start before the first one's slot was
    // held through the delay.
    assert!(started.elapsed() >= Duration::from_millis(50));
}
