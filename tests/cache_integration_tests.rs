//! Integration Tests for the Cache Facade
//!
//! Runs the same behaviour suite against both eviction strategies.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use shard_cache::{Cache, CacheError, Connection, EvictionMode};

const MODES: [EvictionMode; 2] = [EvictionMode::PriorityQueue, EvictionMode::Sweep];

// == Helper Functions ==

async fn open(mode: EvictionMode, default_ttl: Duration, gc_interval: Duration) -> Connection {
    Cache::new(default_ttl, gc_interval)
        .with_eviction(mode)
        .open("test")
        .await
        .unwrap()
}

fn key_count(conn: &Connection) -> usize {
    conn.stats().unwrap().key_count
}

// == Basic Operations ==

#[tokio::test]
async fn test_never_expire_default_round_trip() {
    for mode in MODES {
        let conn = open(mode, Duration::ZERO, Duration::from_secs(1)).await;

        conn.write("abc", vec![1u8, 2, 3]).unwrap();
        assert_eq!(conn.read("abc").unwrap(), vec![1u8, 2, 3]);

        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_read_before_write_is_not_found() {
    for mode in MODES {
        let conn = open(mode, Duration::from_secs(1), Duration::from_secs(1)).await;

        let err = conn.read("my-key").unwrap_err();
        assert!(err.is_not_found());

        conn.write("my-key", vec![1u8, 2]).unwrap();
        assert_eq!(conn.read("my-key").unwrap(), vec![1u8, 2]);

        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_empty_and_symbol_keys() {
    let conn = open(EvictionMode::PriorityQueue, Duration::ZERO, Duration::from_secs(1)).await;

    conn.write("", "empty").unwrap();
    conn.write("#tag", "symbol").unwrap();
    conn.write([0xffu8, 0x01], "binary").unwrap();

    assert_eq!(conn.read("").unwrap(), Bytes::from("empty"));
    assert_eq!(conn.read("#tag").unwrap(), Bytes::from("symbol"));
    assert_eq!(conn.read([0xffu8, 0x01]).unwrap(), Bytes::from("binary"));
    assert_eq!(key_count(&conn), 3);

    conn.close().await.unwrap();
}

// == Expiration ==

#[tokio::test]
async fn test_expired_key_is_hidden_before_reclaim() {
    for mode in MODES {
        // Reclaim loop effectively never runs during the test.
        let conn = open(mode, Duration::ZERO, Duration::from_secs(3600)).await;

        conn.write_ttl("set", vec![1u8, 2, 3], Duration::from_millis(50)).unwrap();
        assert!(conn.read("set").is_ok());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(conn.read("set").unwrap_err().is_not_found());
        assert_eq!(conn.stats().unwrap().lazy_evictions, 1);

        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_default_ttl_applies_to_write() {
    let conn = open(
        EvictionMode::PriorityQueue,
        Duration::from_millis(50),
        Duration::from_secs(3600),
    )
    .await;

    conn.write("set", "v").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(conn.read("set").is_err());
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_never_expire_survives_reclaim() {
    for mode in MODES {
        let conn = open(mode, Duration::ZERO, Duration::from_millis(10)).await;

        conn.write_ttl("forever", "v", Duration::ZERO).unwrap();
        assert_eq!(conn.stats().unwrap().tracked_keys, 0);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(conn.read("forever").unwrap(), Bytes::from("v"));
        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_reclaim_removes_only_expired_keys() {
    for mode in MODES {
        let conn = open(mode, Duration::ZERO, Duration::from_millis(20)).await;

        conn.write_ttl("short", "v", Duration::from_millis(40)).unwrap();
        conn.write_ttl("long", "v", Duration::from_secs(30)).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        let stats = conn.stats().unwrap();
        assert_eq!(stats.key_count, 1, "{:?}", mode);
        assert_eq!(stats.reclaimed, 1, "{:?}", mode);
        assert!(conn.read("long").is_ok());

        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_rewrite_extends_ttl() {
    for mode in MODES {
        let conn = open(mode, Duration::ZERO, Duration::from_millis(20)).await;

        conn.write_ttl("k", "old", Duration::from_millis(40)).unwrap();
        conn.write_ttl("k", "new", Duration::from_secs(30)).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(conn.read("k").unwrap(), Bytes::from("new"));
        assert_eq!(key_count(&conn), 1);
        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_garbage_collection_scenario() {
    for mode in MODES {
        let conn = open(mode, Duration::from_millis(500), Duration::from_millis(100)).await;

        let v = vec![1u8, 2];
        conn.write("my-key", v.clone()).unwrap();
        conn.write("my-key2", v.clone()).unwrap();
        conn.write("my-key2", v.clone()).unwrap();
        // The following should not be garbage collected
        conn.write_ttl("my-key4", v.clone(), Duration::from_secs(30)).unwrap();
        conn.write_ttl("my-key3", v.clone(), Duration::ZERO).unwrap();

        assert_eq!(key_count(&conn), 4);

        tokio::time::sleep(Duration::from_millis(650)).await;

        assert_eq!(key_count(&conn), 2, "{:?}", mode);
        assert!(conn.read("my-key4").is_ok());
        assert!(conn.read("my-key3").is_ok());

        conn.close().await.unwrap();
    }
}

// == Concurrency ==

#[tokio::test]
async fn test_concurrent_writers_lose_nothing() {
    const WRITERS: usize = 8;
    const KEYS_PER_WRITER: usize = 500;

    for mode in MODES {
        let conn = Arc::new(open(mode, Duration::from_secs(60), Duration::from_millis(10)).await);

        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let conn = conn.clone();
                thread::spawn(move || {
                    for i in 0..KEYS_PER_WRITER {
                        let first = char::from(b'a' + (i % 26) as u8);
                        let key = format!("{first}-{writer}-{i}");
                        conn.write(key.as_bytes(), key.clone().into_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(key_count(&conn), WRITERS * KEYS_PER_WRITER);
        for writer in 0..WRITERS {
            for i in 0..KEYS_PER_WRITER {
                let first = char::from(b'a' + (i % 26) as u8);
                let key = format!("{first}-{writer}-{i}");
                assert_eq!(conn.read(&key).unwrap(), key.as_bytes());
            }
        }

        conn.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_concurrent_overwrites_are_whole() {
    let conn = Arc::new(
        open(EvictionMode::PriorityQueue, Duration::ZERO, Duration::from_millis(5)).await,
    );

    let writers: Vec<_> = (0..4u8)
        .map(|writer| {
            let conn = conn.clone();
            thread::spawn(move || {
                for _ in 0..2_000 {
                    // Each writer's value encodes its own TTL class.
                    let ttl = if writer % 2 == 0 {
                        Duration::ZERO
                    } else {
                        Duration::from_secs(60)
                    };
                    conn.write_ttl("shared", vec![writer; 16], ttl).unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let conn = conn.clone();
        thread::spawn(move || {
            for _ in 0..5_000 {
                if let Ok(value) = conn.read("shared") {
                    assert_eq!(value.len(), 16);
                    assert!(value.iter().all(|b| *b == value[0]), "torn value");
                }
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(key_count(&conn), 1);
    assert!(conn.stats().unwrap().tracked_keys <= 1);
    conn.close().await.unwrap();
}

// == Lifecycle ==

#[tokio::test]
async fn test_close_rejects_further_access() {
    for mode in MODES {
        let conn = open(mode, Duration::ZERO, Duration::from_millis(10)).await;
        conn.write("k", "v").unwrap();

        conn.close().await.unwrap();

        assert!(matches!(conn.read("k"), Err(CacheError::Closed)));
        assert!(matches!(conn.write("k", "v"), Err(CacheError::Closed)));
        assert!(matches!(conn.delete("k"), Err(CacheError::Closed)));
        assert!(matches!(conn.close().await, Err(CacheError::Closed)));
    }
}

#[tokio::test]
async fn test_close_from_shared_handle() {
    let conn = Arc::new(open(EvictionMode::Sweep, Duration::ZERO, Duration::from_millis(10)).await);
    let other = conn.clone();

    tokio::time::timeout(Duration::from_secs(1), other.close())
        .await
        .expect("close should not hang")
        .unwrap();

    assert!(conn.is_closed());
}
