// tests/property/serialization_test.rs

//! Property-based tests for serialization/deserialization
//! Tests that data can be serialized and deserialized correctly

use crate::test_helpers::TestContext;
use proptest::prelude::*;
use spineldb::core::RespValue;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 30, // Fewer cases for serialization tests as they may be slower
        max_shrink_iters: 300,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_string_serialization_roundtrip(
        key in "[a-zA-Z0-9_]{1,100}",
        value in ".{0,1000}"
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;

            ctx.set(&key, &value).await.unwrap();

            let get_result = ctx.get(&key).await.unwrap();
            match get_result {
                RespValue::BulkString(bs) => {
                    assert_eq!(String::from_utf8_lossy(&bs), value);
                }
                _ => panic!("GET should return BulkString"),
            }
        });
    }

    #[test]
    fn test_numeric_serialization_consistency(
        key in "[a-zA-Z0-9_]{1,100}",
        numbers in prop::collection::vec(-10000i64..=10000i64, 1..=20)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;

            // SET each number and verify it can be retrieved correctly
            for num in &numbers {
                let num_str = num.to_string();
                ctx.set(&key, &num_str).await.unwrap();

                let get_result = ctx.get(&key).await.unwrap();
                match get_result {
                    RespValue::BulkString(bs) => {
                        let retrieved: i64 = String::from_utf8_lossy(&bs).parse().unwrap();
                        assert_eq!(retrieved, *num);
                    }
                    _ => panic!("GET should return BulkString"),
                }
            }
        });
    }

    #[test]
    fn test_stream_entry_ordering_is_preserved(
        key in "[a-zA-Z0-9_]{1,100}",
        timestamps in prop::collection::btree_set(1u64..100_000, 1..=20)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;

            // Add entries with explicit, strictly increasing millisecond IDs.
            for ts in &timestamps {
                let id = format!("{ts}-0");
                ctx.xadd(&key, &id, &[("ts", &ts.to_string())]).await.unwrap();
            }

            let result = ctx.xrange(&key, "-", "+").await.unwrap();
            match result {
                RespValue::Array(arr) => {
                    assert_eq!(arr.len(), timestamps.len());
                    // XRANGE must return entries in ascending ID order.
                    for (entry, expected_ts) in arr.iter().zip(timestamps.iter()) {
                        match entry {
                            RespValue::Array(pair) => {
                                let RespValue::BulkString(id) = &pair[0] else {
                                    panic!("expected a bulk string ID");
                                };
                                assert_eq!(
                                    String::from_utf8_lossy(id),
                                    format!("{expected_ts}-0")
                                );
                            }
                            other => panic!("expected an entry array, got {other:?}"),
                        }
                    }
                }
                other => panic!("XRANGE should return Array, got {other:?}"),
            }
        });
    }
}
