//! End-to-end pagination behaviour against real pools.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use iotstore_core::ManualClock;
use iotstore_events::{ConnectionConfig, ConnectionManager, EventStore, ReadQuery};

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
}

async fn memory_store(clock: Arc<ManualClock>) -> EventStore {
    let store = EventStore::new(ConnectionManager::new(
        "sqlite::memory:",
        ConnectionConfig::default(),
    ))
    .with_clock(clock);
    store.start().await.unwrap();
    store
}

/// Page through everything, returning ids in the order served and the
/// number of requests it took.
async fn drain(store: &EventStore, key: &str, page_size: u32) -> (Vec<i64>, usize) {
    let cancel = CancellationToken::new();
    let mut ids = Vec::new();
    let mut cursor = None;
    let mut requests = 0;
    loop {
        requests += 1;
        let page = store
            .read_events(
                &cancel,
                &ReadQuery {
                    partition_key: key.into(),
                    page_size,
                    start_time: t(0),
                    end_time: None,
                    cursor: cursor.take(),
                },
            )
            .await
            .unwrap();
        ids.extend(page.events.iter().map(|e| e.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return (ids, requests),
        }
    }
}

#[tokio::test]
async fn four_events_page_size_three() {
    let clock = Arc::new(ManualClock::new(t(1)));
    let store = memory_store(clock.clone()).await;
    let cancel = CancellationToken::new();

    for payload in ["a", "b", "c", "d"] {
        let _ = store
            .write_event(&cancel, "policy", payload.as_bytes(), "device")
            .await
            .unwrap();
        clock.advance(Duration::seconds(1));
    }

    let window = ReadQuery {
        partition_key: "policy".into(),
        page_size: 3,
        start_time: t(1),
        end_time: Some(t(100)),
        cursor: None,
    };
    let first = store.read_events(&cancel, &window).await.unwrap();
    assert_eq!(
        first.events.iter().map(|e| e.data.clone()).collect::<Vec<_>>(),
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
    );
    let cursor = first.next_cursor.expect("full page must carry a cursor");

    let second = store
        .read_events(&cancel, &ReadQuery { cursor: Some(cursor), ..window })
        .await
        .unwrap();
    assert_eq!(second.events.len(), 1);
    assert_eq!(second.events[0].data, b"d");
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn start_time_is_inclusive_end_time_exclusive() {
    let clock = Arc::new(ManualClock::new(t(1)));
    let store = memory_store(clock.clone()).await;
    let cancel = CancellationToken::new();
    for _ in 0..5 {
        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
        clock.advance(Duration::seconds(1));
    }

    let page = store
        .read_events(
            &cancel,
            &ReadQuery {
                partition_key: "k".into(),
                page_size: 0,
                start_time: t(2),
                end_time: Some(t(4)),
                cursor: None,
            },
        )
        .await
        .unwrap();
    let times: Vec<_> = page.events.iter().map(|e| e.recorded_at).collect();
    assert_eq!(times, vec![t(2), t(3)]);
}

#[tokio::test]
async fn page_size_zero_uses_default_of_500() {
    let clock = Arc::new(ManualClock::new(t(1)));
    let store = memory_store(clock).await;
    let cancel = CancellationToken::new();
    for _ in 0..501 {
        let _ = store.write_event(&cancel, "k", b"x", "d").await.unwrap();
    }

    let (ids, requests) = drain(&store, "k", 0).await;
    assert_eq!(ids.len(), 501);
    assert_eq!(requests, 2);
}

#[tokio::test]
async fn concurrent_writers_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("events.db").display());
    let store = Arc::new(EventStore::new(ConnectionManager::new(
        url,
        ConnectionConfig {
            pool_size: 4,
            ..Default::default()
        },
    )));
    store.start().await.unwrap();

    let mut handles = Vec::new();
    for writer in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            for n in 0..10 {
                let payload = format!("{writer}-{n}");
                let _ = store
                    .write_event(&cancel, "shared", payload.as_bytes(), "device")
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let (ids, _) = drain(&store, "shared", 7).await;
    assert_eq!(ids.len(), 80);
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must ascend: {ids:?}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Events grouped under identical timestamps are each served exactly
    /// once, in id order, whatever the page size.
    #[test]
    fn duplicate_timestamps_page_exactly_once(
        groups in prop::collection::vec(1usize..8, 1..5),
        page_size in 1u32..6,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let clock = Arc::new(ManualClock::new(t(1)));
            let store = memory_store(clock.clone()).await;
            let cancel = CancellationToken::new();

            let mut written = Vec::new();
            for size in &groups {
                for _ in 0..*size {
                    written.push(store.write_event(&cancel, "k", b"x", "d").await.unwrap());
                }
                clock.advance(Duration::milliseconds(1));
            }

            let (served, requests) = drain(&store, "k", page_size).await;
            let unique: HashSet<_> = served.iter().collect();

            assert_eq!(unique.len(), served.len(), "no event served twice");
            assert_eq!(served, written);

            let total = written.len();
            let page = page_size as usize;
            let expected_requests = total / page + 1;
            assert_eq!(requests, expected_requests);
        });
    }
}
