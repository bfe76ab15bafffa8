// tests/integration/string_commands_test.rs

//! Integration tests for string commands: SET, GET, DEL, TYPE, INCR.

use super::fixtures::constants;
use super::fixtures::*;
use super::test_helpers::TestContext;
use bytes::Bytes;
use spineldb::core::RespValue;
use spineldb::core::SpinelDBError;

// ===== Basic SET/GET Tests =====

#[tokio::test]
async fn test_set_get_basic() {
    let ctx = TestContext::new().await;

    let result = ctx.set("mykey", "myvalue").await.unwrap();
    assert_eq!(result, RespValue::SimpleString("OK".into()));

    let result = ctx.get("mykey").await.unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from("myvalue")));
}

#[tokio::test]
async fn test_get_nonexistent_key() {
    let ctx = TestContext::new().await;

    let result = ctx.get("nonexistent").await.unwrap();
    assert_eq!(result, RespValue::Null);
}

#[tokio::test]
async fn test_set_overwrite() {
    let ctx = TestContext::new().await;

    ctx.set(TEST_KEY1, TEST_VALUE1).await.unwrap();
    ctx.set(TEST_KEY1, TEST_VALUE2).await.unwrap();

    let result = ctx.get(TEST_KEY1).await.unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from(TEST_VALUE2)));
}

#[tokio::test]
async fn test_set_get_empty_string() {
    let ctx = TestContext::new().await;

    ctx.set("empty_key", patterns::EMPTY_STR).await.unwrap();
    let result = ctx.get("empty_key").await.unwrap();
    assert_eq!(
        result,
        RespValue::BulkString(Bytes::from(patterns::EMPTY_STR))
    );
}

#[tokio::test]
async fn test_set_get_unicode() {
    let ctx = TestContext::new().await;

    let unicode_value = patterns::UNICODE_STR;
    ctx.set("unicode_key", unicode_value).await.unwrap();

    let result = ctx.get("unicode_key").await.unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from(unicode_value)));
}

#[tokio::test]
async fn test_set_get_large_value() {
    let ctx = TestContext::new().await;

    let large = patterns::large_text_1kb();
    ctx.set("large_key", &large).await.unwrap();

    let result = ctx.get("large_key").await.unwrap();
    assert_eq!(result, RespValue::BulkString(Bytes::from(large)));
}

// ===== DEL Tests =====

#[tokio::test]
async fn test_del_single_key() {
    let ctx = TestContext::new().await;

    ctx.set(TEST_KEY1, TEST_VALUE1).await.unwrap();

    let result = ctx.del(&[TEST_KEY1]).await.unwrap();
    assert_eq!(result, RespValue::Integer(1));

    let result = ctx.get(TEST_KEY1).await.unwrap();
    assert_eq!(result, RespValue::Null);
}

#[tokio::test]
async fn test_del_multiple_keys() {
    let ctx = TestContext::new().await;

    ctx.set(TEST_KEY1, TEST_VALUE1).await.unwrap();
    ctx.set(TEST_KEY2, TEST_VALUE2).await.unwrap();

    let result = ctx.del(&[TEST_KEY1, TEST_KEY2, TEST_KEY3]).await.unwrap();
    assert_eq!(result, RespValue::Integer(2));
}

#[tokio::test]
async fn test_del_nonexistent_key() {
    let ctx = TestContext::new().await;

    let result = ctx.del(&["does_not_exist"]).await.unwrap();
    assert_eq!(result, RespValue::Integer(0));
}

// ===== TYPE Tests =====

#[tokio::test]
async fn test_type_string() {
    let ctx = TestContext::new().await;

    ctx.set(TEST_KEY1, TEST_VALUE1).await.unwrap();
    let result = ctx.key_type(TEST_KEY1).await.unwrap();
    assert_eq!(result, RespValue::SimpleString("string".into()));
}

#[tokio::test]
async fn test_type_none_for_missing_key() {
    let ctx = TestContext::new().await;

    let result = ctx.key_type("missing").await.unwrap();
    assert_eq!(result, RespValue::SimpleString("none".into()));
}

#[tokio::test]
async fn test_type_list() {
    let ctx = TestContext::new().await;

    ctx.lpush("mylist", &["a"]).await.unwrap();
    let result = ctx.key_type("mylist").await.unwrap();
    assert_eq!(result, RespValue::SimpleString("list".into()));
}

// ===== INCR Tests =====

#[tokio::test]
async fn test_incr_on_missing_key() {
    let ctx = TestContext::new().await;

    let result = ctx.incr("counter").await.unwrap();
    assert_eq!(result, RespValue::Integer(1));
}

#[tokio::test]
async fn test_incr_existing_numeric_value() {
    let ctx = TestContext::new().await;

    ctx.set("counter", "10").await.unwrap();
    let result = ctx.incr("counter").await.unwrap();
    assert_eq!(result, RespValue::Integer(11));
}

#[tokio::test]
async fn test_incr_non_numeric_value_errors() {
    let ctx = TestContext::new().await;

    ctx.set("notanumber", "abc").await.unwrap();
    let err = ctx.incr("notanumber").await.unwrap_err();
    assert!(matches!(err, SpinelDBError::NotAnInteger));
}

#[tokio::test]
async fn test_incr_overflow_errors() {
    let ctx = TestContext::new().await;

    ctx.set("maxed", constants::I64_MAX_STR).await.unwrap();
    let err = ctx.incr("maxed").await.unwrap_err();
    assert!(matches!(err, SpinelDBError::Overflow));
}

#[tokio::test]
async fn test_incr_wrong_type_errors() {
    let ctx = TestContext::new().await;

    ctx.lpush("alist", &["a"]).await.unwrap();
    let err = ctx.incr("alist").await.unwrap_err();
    assert!(matches!(err, SpinelDBError::WrongType));
}

// ===== GET on wrong type =====

#[tokio::test]
async fn test_get_wrong_type_errors() {
    let ctx = TestContext::new().await;

    ctx.lpush("alist", &["a"]).await.unwrap();
    let err = ctx.get("alist").await.unwrap_err();
    assert!(matches!(err, SpinelDBError::WrongType));
}
