use funnel_http::{CacheConfig, ManualClock, ResponseCache};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

type Cache = ResponseCache<u64, String>;

fn cache_with_clock() -> (Cache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    (ResponseCache::with_clock(clock.clone()), clock)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

#[tokio::test]
async fn concurrent_gets_share_one_producer_call() {
    let cache: Cache = ResponseCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let (release, gate) = oneshot::channel::<u64>();
    let config = CacheConfig::new();

    let counter = Arc::clone(&calls);
    let first = cache.get(
        "events",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { gate.await.map_err(|e| e.to_string()) }
        },
        &config,
    );

    let counter = Arc::clone(&calls);
    let second = cache.get(
        "events",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(0) }
        },
        &config,
    );

    assert!(first.same_source(&second));
    assert!(!first.is_settled());

    release.send(42).expect("receiver alive");
    let (a, b) = futures_util::future::join(first, second).await;

    assert_eq!(a, Ok(42));
    assert_eq!(b, Ok(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn late_subscriber_receives_replayed_value() {
    let cache: Cache = ResponseCache::new();
    let config = CacheConfig::new();

    let first = cache.get("k", || async { Ok(9) }, &config);
    assert_eq!(first.await, Ok(9));

    let late = cache.get("k", || async { Ok(10) }, &config);
    assert!(late.is_settled());
    assert_eq!(late.await, Ok(9));
}

#[tokio::test]
async fn invalidate_forces_new_producer_call() {
    let cache: Cache = ResponseCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let config = CacheConfig::new();

    for expected in 1..=2 {
        let counter = Arc::clone(&calls);
        let value = cache
            .get(
                "k",
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst) as u64 + 1;
                    async move { Ok(n) }
                },
                &config,
            )
            .await;
        assert_eq!(value, Ok(expected));
        cache.invalidate("k");
        assert!(!cache.has("k"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

proptest! {
    #[test]
    fn ttl_serves_cache_only_while_younger_than_max_age(
        max_age_ms in 1u64..10_000,
        elapsed_ms in 0u64..20_000,
    ) {
        let (cache, clock) = cache_with_clock();
        let config = CacheConfig::new().with_max_age(Duration::from_millis(max_age_ms));

        let first = block_on(cache.get("k", || async { Ok(1) }, &config));
        prop_assert_eq!(first, Ok(1));

        clock.advance(Duration::from_millis(elapsed_ms));
        let second = block_on(cache.get("k", || async { Ok(2) }, &config));

        if elapsed_ms < max_age_ms {
            prop_assert_eq!(second, Ok(1));
        } else {
            prop_assert_eq!(second, Ok(2));
        }
    }

    #[test]
    fn size_never_exceeds_bound_and_oldest_goes_first(
        max_size in 1usize..6,
        inserts in 1usize..20,
    ) {
        let (cache, clock) = cache_with_clock();
        let config = CacheConfig::new().with_max_size(max_size);

        for i in 0..inserts {
            let _ = cache.get(&format!("k{i}"), || async { Ok(0) }, &config);
            clock.advance(Duration::from_millis(1));
            prop_assert!(cache.size() <= max_size);
        }

        let kept = inserts.min(max_size);
        let expected: Vec<String> = (inserts - kept..inserts).map(|i| format!("k{i}")).collect();
        prop_assert_eq!(cache.keys(), expected);
    }
}
