// tests/integration/stream_commands_test.rs

//! Integration tests for stream commands: XADD, XRANGE, XREAD.

use super::test_helpers::TestContext;
use bytes::Bytes;
use spineldb::core::{RespValue, SpinelDBError};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_xadd_auto_id_then_xrange() {
    let ctx = TestContext::new().await;

    let result = ctx
        .xadd("mystream", "*", &[("field1", "value1")])
        .await
        .unwrap();
    let RespValue::BulkString(id) = result else {
        panic!("expected a bulk string ID from XADD");
    };
    assert!(String::from_utf8_lossy(&id).contains('-'));

    let result = ctx.xrange("mystream", "-", "+").await.unwrap();
    match result {
        RespValue::Array(entries) => {
            assert_eq!(entries.len(), 1);
            match &entries[0] {
                RespValue::Array(entry) => {
                    assert_eq!(entry[0], RespValue::BulkString(id));
                    assert_eq!(
                        entry[1],
                        RespValue::Array(vec![
                            RespValue::BulkString(Bytes::from("field1")),
                            RespValue::BulkString(Bytes::from("value1")),
                        ])
                    );
                }
                other => panic!("expected an entry array, got {other:?}"),
            }
        }
        other => panic!("expected an array response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_xadd_explicit_id() {
    let ctx = TestContext::new().await;

    let result = ctx
        .xadd("mystream", "5-1", &[("k", "v")])
        .await
        .unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from("5-1")));
}

#[tokio::test]
async fn test_xadd_explicit_id_must_increase() {
    let ctx = TestContext::new().await;

    ctx.xadd("mystream", "5-1", &[("k", "v")]).await.unwrap();
    let err = ctx
        .xadd("mystream", "5-1", &[("k", "v2")])
        .await
        .unwrap_err();
    assert!(matches!(err, SpinelDBError::InvalidState(_)));

    let err = ctx
        .xadd("mystream", "4-0", &[("k", "v2")])
        .await
        .unwrap_err();
    assert!(matches!(err, SpinelDBError::InvalidState(_)));
}

#[tokio::test]
async fn test_xadd_partial_seq_id() {
    let ctx = TestContext::new().await;

    let result = ctx.xadd("mystream", "100-*", &[("k", "v")]).await.unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from("100-0")));

    let result = ctx.xadd("mystream", "100-*", &[("k", "v2")]).await.unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from("100-1")));
}

#[tokio::test]
async fn test_xadd_wrong_type_errors() {
    let ctx = TestContext::new().await;

    ctx.set("mystring", "value").await.unwrap();

    let err = ctx
        .xadd("mystring", "*", &[("k", "v")])
        .await
        .unwrap_err();
    assert!(matches!(err, SpinelDBError::WrongType));
}

#[tokio::test]
async fn test_xrange_on_missing_stream_returns_empty() {
    let ctx = TestContext::new().await;

    let result = ctx.xrange("nonexistent", "-", "+").await.unwrap();
    assert_eq!(result, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_xrange_wrong_type_errors() {
    let ctx = TestContext::new().await;

    ctx.set("mystring", "value").await.unwrap();

    let err = ctx.xrange("mystring", "-", "+").await.unwrap_err();
    assert!(matches!(err, SpinelDBError::WrongType));
}

#[tokio::test]
async fn test_xrange_bounded_by_id() {
    let ctx = TestContext::new().await;

    ctx.xadd("mystream", "1-0", &[("k", "v1")]).await.unwrap();
    ctx.xadd("mystream", "2-0", &[("k", "v2")]).await.unwrap();
    ctx.xadd("mystream", "3-0", &[("k", "v3")]).await.unwrap();

    let result = ctx.xrange("mystream", "2", "2").await.unwrap();
    match result {
        RespValue::Array(entries) => assert_eq!(entries.len(), 1),
        other => panic!("expected an array response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_xread_returns_entries_after_given_id() {
    let ctx = TestContext::new().await;

    ctx.xadd("mystream", "1-0", &[("k", "v1")]).await.unwrap();
    ctx.xadd("mystream", "2-0", &[("k", "v2")]).await.unwrap();

    let result = ctx.xread("mystream", "1-0").await.unwrap();
    match result {
        RespValue::Array(streams) => {
            assert_eq!(streams.len(), 1);
            match &streams[0] {
                RespValue::Array(stream_entry) => {
                    assert_eq!(stream_entry[0], RespValue::BulkString(Bytes::from("mystream")));
                    match &stream_entry[1] {
                        RespValue::Array(entries) => assert_eq!(entries.len(), 1),
                        other => panic!("expected an array of entries, got {other:?}"),
                    }
                }
                other => panic!("expected a per-stream array, got {other:?}"),
            }
        }
        other => panic!("expected an array response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_xread_block_with_dollar_id_wakes_with_the_new_entry() {
    let ctx = TestContext::new().await;

    ctx.xadd("mystream", "1-0", &[("k", "v1")]).await.unwrap();

    let state = ctx.state.clone();
    let db = ctx.db.clone();
    let reader = tokio::spawn(async move {
        let ctx_clone = TestContext { state, db };
        // `$` resolves to the stream's tip (1-0) at call time; the woken
        // read must use that resolved ID, not re-resolve `$` against the
        // tip *after* the XADD below (which would be the new entry itself).
        ctx_clone.xread_block("mystream", "$", 5000).await
    });

    sleep(Duration::from_millis(50)).await;
    ctx.xadd("mystream", "2-0", &[("k", "v2")]).await.unwrap();

    let result = reader.await.unwrap().unwrap();
    match result {
        RespValue::Array(streams) => {
            assert_eq!(streams.len(), 1);
            match &streams[0] {
                RespValue::Array(stream_entry) => {
                    assert_eq!(stream_entry[0], RespValue::BulkString(Bytes::from("mystream")));
                    match &stream_entry[1] {
                        RespValue::Array(entries) => {
                            assert_eq!(entries.len(), 1);
                            match &entries[0] {
                                RespValue::Array(entry) => {
                                    assert_eq!(entry[0], RespValue::BulkString(Bytes::from("2-0")));
                                }
                                other => panic!("expected an entry array, got {other:?}"),
                            }
                        }
                        other => panic!("expected an array of entries, got {other:?}"),
                    }
                }
                other => panic!("expected a per-stream array, got {other:?}"),
            }
        }
        other => panic!("expected an array response, got {other:?}"),
    }
}
