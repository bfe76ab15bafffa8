// tests/integration/blocking_test.rs

//! Integration tests for the blocking list operation: BLPOP.

use super::test_helpers::TestContext;
use bytes::Bytes;
use spineldb::core::RespValue;
use std::time::{Duration, Instant};
use tokio::time::sleep;

#[tokio::test]
async fn test_blpop_immediate_success() {
    let ctx = TestContext::new().await;

    ctx.lpush("mylist", &["value1", "value2"]).await.unwrap();

    // With data already present, BLPOP behaves like a plain LPOP and returns
    // immediately without blocking.
    let result = ctx.blpop(&["mylist"], 1.0).await.unwrap();

    match result {
        RespValue::Array(arr) => {
            assert_eq!(arr.len(), 2);
            assert_eq!(arr[0], RespValue::BulkString(Bytes::from("mylist")));
            assert_eq!(arr[1], RespValue::BulkString(Bytes::from("value2")));
        }
        other => panic!("expected an array response from BLPOP, got {other:?}"),
    }

    let result = ctx.lrange("mylist", 0, -1).await.unwrap();
    match result {
        RespValue::Array(arr) => {
            assert_eq!(arr.len(), 1);
            assert_eq!(arr[0], RespValue::BulkString(Bytes::from("value1")));
        }
        other => panic!("expected an array from LRANGE, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blpop_timeout() {
    let ctx = TestContext::new().await;

    let start = Instant::now();
    let result = ctx.blpop(&["mylist"], 0.1).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result, RespValue::NullArray);
    assert!(elapsed >= Duration::from_millis(90));
    assert!(elapsed < Duration::from_millis(500));
}

#[tokio::test]
async fn test_blpop_wakeup_on_push() {
    let ctx = TestContext::new().await;

    let state = ctx.state.clone();
    let db = ctx.db.clone();
    let blpop_task = tokio::spawn(async move {
        let ctx_clone = TestContext { state, db };
        ctx_clone.blpop(&["mylist"], 5.0).await
    });

    // Give the blocking task time to register as a waiter.
    sleep(Duration::from_millis(50)).await;

    ctx.lpush("mylist", &["wakeup_value"]).await.unwrap();

    let result = blpop_task.await.unwrap().unwrap();
    match result {
        RespValue::Array(arr) => {
            assert_eq!(arr.len(), 2);
            assert_eq!(arr[0], RespValue::BulkString(Bytes::from("mylist")));
            assert_eq!(arr[1], RespValue::BulkString(Bytes::from("wakeup_value")));
        }
        other => panic!("expected an array response from BLPOP, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blpop_wakeup_on_key_that_never_existed() {
    let ctx = TestContext::new().await;

    let state = ctx.state.clone();
    let db = ctx.db.clone();
    let blpop_task = tokio::spawn(async move {
        let ctx_clone = TestContext { state, db };
        ctx_clone.blpop(&["newlist"], 5.0).await
    });

    sleep(Duration::from_millis(50)).await;

    ctx.lpush("newlist", &["newvalue"]).await.unwrap();

    let result = blpop_task.await.unwrap().unwrap();
    match result {
        RespValue::Array(arr) => {
            assert_eq!(arr.len(), 2);
            assert_eq!(arr[1], RespValue::BulkString(Bytes::from("newvalue")));
        }
        other => panic!("expected an array response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blpop_zero_timeout_blocks_until_woken() {
    let ctx = TestContext::new().await;

    let state = ctx.state.clone();
    let db = ctx.db.clone();
    let blpop_task = tokio::spawn(async move {
        let ctx_clone = TestContext { state, db };
        // A timeout of 0 means "block forever".
        ctx_clone.blpop(&["mylist"], 0.0).await
    });

    sleep(Duration::from_millis(50)).await;

    ctx.lpush("mylist", &["value"]).await.unwrap();

    let result = blpop_task.await.unwrap().unwrap();
    match result {
        RespValue::Array(arr) => {
            assert_eq!(arr.len(), 2);
            assert_eq!(arr[1], RespValue::BulkString(Bytes::from("value")));
        }
        other => panic!("expected an array response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blpop_wrong_type_errors() {
    let ctx = TestContext::new().await;

    ctx.set("mylist", "not a list").await.unwrap();

    let result = ctx.blpop(&["mylist"], 0.1).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_rpush_wakes_multiple_waiters_fifo_and_stores_the_rest() {
    let ctx = TestContext::new().await;

    let first_waiter = {
        let state = ctx.state.clone();
        let db = ctx.db.clone();
        tokio::spawn(async move {
            let ctx_clone = TestContext { state, db };
            ctx_clone.blpop(&["mylist"], 5.0).await
        })
    };
    // Give the first waiter time to register before the second queues up
    // behind it, so the wakeup order below is deterministic.
    sleep(Duration::from_millis(30)).await;

    let second_waiter = {
        let state = ctx.state.clone();
        let db = ctx.db.clone();
        tokio::spawn(async move {
            let ctx_clone = TestContext { state, db };
            ctx_clone.blpop(&["mylist"], 5.0).await
        })
    };
    sleep(Duration::from_millis(30)).await;

    // Three values pushed at once: the two queued waiters should each get
    // exactly one, FIFO by registration order, and the third value should
    // land in the list rather than being discarded.
    ctx.rpush("mylist", &["v1", "v2", "v3"]).await.unwrap();

    let first_result = first_waiter.await.unwrap().unwrap();
    let second_result = second_waiter.await.unwrap().unwrap();

    match first_result {
        RespValue::Array(arr) => assert_eq!(arr[1], RespValue::BulkString(Bytes::from("v1"))),
        other => panic!("expected an array response from BLPOP, got {other:?}"),
    }
    match second_result {
        RespValue::Array(arr) => assert_eq!(arr[1], RespValue::BulkString(Bytes::from("v2"))),
        other => panic!("expected an array response from BLPOP, got {other:?}"),
    }

    let remaining = ctx.lrange("mylist", 0, -1).await.unwrap();
    match remaining {
        RespValue::Array(arr) => {
            assert_eq!(arr.len(), 1);
            assert_eq!(arr[0], RespValue::BulkString(Bytes::from("v3")));
        }
        other => panic!("expected an array from LRANGE, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blpop_checks_keys_in_order() {
    let ctx = TestContext::new().await;

    // Only the second key has data; BLPOP must fall through to it.
    ctx.rpush("second", &["only_value"]).await.unwrap();

    let result = ctx.blpop(&["first", "second"], 1.0).await.unwrap();
    match result {
        RespValue::Array(arr) => {
            assert_eq!(arr[0], RespValue::BulkString(Bytes::from("second")));
            assert_eq!(arr[1], RespValue::BulkString(Bytes::from("only_value")));
        }
        other => panic!("expected an array response, got {other:?}"),
    }
}
