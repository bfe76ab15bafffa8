// tests/integration/transaction_test.rs

//! Integration tests for transaction control: MULTI, queuing, EXEC, DISCARD.

use super::fixtures::*;
use super::test_helpers::TestContext;
use spineldb::core::Command;
use spineldb::core::RespValue;
use spineldb::core::SpinelDBError;

fn set_cmd(key: &str, value: &str) -> Command {
    Command::parse(
        "SET",
        &[
            spineldb::core::protocol::RespFrame::BulkString(bytes::Bytes::copy_from_slice(
                key.as_bytes(),
            )),
            spineldb::core::protocol::RespFrame::BulkString(bytes::Bytes::copy_from_slice(
                value.as_bytes(),
            )),
        ],
    )
    .unwrap()
}

fn get_cmd(key: &str) -> Command {
    Command::parse(
        "GET",
        &[spineldb::core::protocol::RespFrame::BulkString(
            bytes::Bytes::copy_from_slice(key.as_bytes()),
        )],
    )
    .unwrap()
}

#[tokio::test]
async fn test_multi_then_exec_runs_queued_commands() {
    let ctx = TestContext::new().await;

    let result = ctx.multi().unwrap();
    assert_eq!(result, RespValue::SimpleString("OK".into()));

    let queued = ctx.queue(set_cmd(TEST_KEY1, TEST_VALUE1)).unwrap();
    assert_eq!(queued, RespValue::SimpleString("QUEUED".into()));

    let queued = ctx.queue(get_cmd(TEST_KEY1)).unwrap();
    assert_eq!(queued, RespValue::SimpleString("QUEUED".into()));

    let result = ctx.exec().await.unwrap();
    match result {
        RespValue::Array(responses) => {
            assert_eq!(responses.len(), 2);
            assert_eq!(responses[0], RespValue::SimpleString("OK".into()));
            assert_eq!(
                responses[1],
                RespValue::BulkString(TEST_VALUE1.as_bytes().to_vec().into())
            );
        }
        other => panic!("expected an array reply, got {other:?}"),
    }

    // The transaction was consumed; the key must reflect the queued write.
    let result = ctx.get(TEST_KEY1).await.unwrap();
    assert_eq!(
        result,
        RespValue::BulkString(TEST_VALUE1.as_bytes().to_vec().into())
    );
}

#[tokio::test]
async fn test_exec_without_multi_errors() {
    let ctx = TestContext::new().await;

    let err = ctx.exec().await.unwrap_err();
    assert!(matches!(err, SpinelDBError::InvalidState(_)));
}

#[tokio::test]
async fn test_discard_without_multi_errors() {
    let ctx = TestContext::new().await;

    let err = ctx.discard().unwrap_err();
    assert!(matches!(err, SpinelDBError::InvalidState(_)));
}

#[tokio::test]
async fn test_discard_clears_queued_commands() {
    let ctx = TestContext::new().await;

    ctx.multi().unwrap();
    ctx.queue(set_cmd(TEST_KEY1, TEST_VALUE1)).unwrap();

    let result = ctx.discard().unwrap();
    assert_eq!(result, RespValue::SimpleString("OK".into()));

    // Nothing was ever executed.
    let result = ctx.get(TEST_KEY1).await.unwrap();
    assert_eq!(result, RespValue::Null);

    // And a subsequent EXEC has nothing to do with the discarded queue.
    let err = ctx.exec().await.unwrap_err();
    assert!(matches!(err, SpinelDBError::InvalidState(_)));
}

#[tokio::test]
async fn test_queueing_a_transaction_command_is_rejected() {
    let ctx = TestContext::new().await;

    ctx.multi().unwrap();
    let result = ctx.queue(Command::Multi).unwrap();
    match result {
        RespValue::Error(msg) => assert!(msg.contains("MULTI")),
        other => panic!("expected an error reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_nested_multi_through_router_is_rejected_with_nesting_error() {
    use spineldb::connection::SessionState;
    use spineldb::core::handler::command_router::{Router, RouteResponse};

    let ctx = TestContext::new().await;
    let mut session = SessionState::default();
    let addr = "127.0.0.1:0".parse().unwrap();

    let RouteResponse::Single(first) = Router::new(ctx.state.clone(), 1, addr, &mut session)
        .route(Command::Multi)
        .await
        .unwrap();
    assert_eq!(first, RespValue::SimpleString("OK".into()));
    assert!(session.is_in_transaction);

    // A second MULTI, routed through the real command router (not queued
    // directly), must surface the nesting error rather than the generic
    // "cannot be used in a transaction" message.
    let RouteResponse::Single(second) = Router::new(ctx.state.clone(), 1, addr, &mut session)
        .route(Command::Multi)
        .await
        .unwrap();
    match second {
        RespValue::Error(msg) => assert!(msg.contains("cannot be nested")),
        other => panic!("expected a nesting error reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exec_with_empty_queue_returns_empty_array() {
    let ctx = TestContext::new().await;

    ctx.multi().unwrap();
    let result = ctx.exec().await.unwrap();
    assert_eq!(result, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_exec_reports_individual_command_errors_inline() {
    let ctx = TestContext::new().await;

    ctx.lpush("alist", &["a"]).await.unwrap();

    ctx.multi().unwrap();
    ctx.queue(get_cmd("alist")).unwrap();
    ctx.queue(set_cmd(TEST_KEY2, TEST_VALUE2)).unwrap();

    let result = ctx.exec().await.unwrap();
    match result {
        RespValue::Array(responses) => {
            assert_eq!(responses.len(), 2);
            assert!(matches!(responses[0], RespValue::Error(_)));
            assert_eq!(responses[1], RespValue::SimpleString("OK".into()));
        }
        other => panic!("expected an array reply, got {other:?}"),
    }
}
