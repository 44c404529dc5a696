//! Property tests: arbitrary keys and values survive a round trip exactly

use proptest::prelude::*;
use proptest::test_runner::{Config, TestCaseError, TestRunner};
use std::collections::HashMap;
use typekv::prelude::*;

fn open_store() -> (tempfile::TempDir, Store) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(temp_dir.path()).with_sync_mode(SyncMode::NoSync);
    let store = Store::open_with_config(config).unwrap();
    (temp_dir, store)
}

fn fail(e: StoreError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

#[test]
fn test_string_round_trip() {
    let (_temp, store) = open_store();
    let r = store.bind::<String, String>("fuzz_strings").unwrap();

    // At most 120 chars keeps the encoded key under LMDB's limit
    let mut runner = TestRunner::new(Config {
        cases: 512,
        ..Config::default()
    });
    runner
        .run(&("(?s).{1,120}", "(?s).{1,2000}"), |(key, value)| {
            r.put(&key, &value).map_err(fail)?;
            prop_assert_eq!(r.get(&key).map_err(fail)?, value);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_empty_string_is_stored_exactly() {
    let (_temp, store) = open_store();
    let r = store.bind::<String, String>("empty").unwrap();

    r.put(&String::new(), &String::new()).unwrap();
    assert_eq!(r.get(&String::new()).unwrap(), "");
    assert!(r.get(&"\0".to_string()).unwrap_err().is_not_found());
}

#[test]
fn test_last_write_wins_against_model() {
    let (_temp, store) = open_store();
    let r = store.bind::<u16, Vec<u8>>("model").unwrap();

    let ops = prop::collection::vec(
        (0u16..32, prop::option::of(prop::collection::vec(any::<u8>(), 0..256))),
        1..64,
    );

    let mut runner = TestRunner::new(Config {
        cases: 64,
        ..Config::default()
    });
    runner
        .run(&ops, |ops| {
            let mut model: HashMap<u16, Vec<u8>> = HashMap::new();
            for key in 0..32u16 {
                r.delete(&key).map_err(fail)?;
            }

            for (key, value) in ops {
                match value {
                    Some(value) => {
                        r.put(&key, &value).map_err(fail)?;
                        model.insert(key, value);
                    }
                    None => {
                        let existed = r.delete(&key).map_err(fail)?;
                        prop_assert_eq!(existed, model.remove(&key).is_some());
                    }
                }
            }

            for key in 0..32u16 {
                prop_assert_eq!(r.try_get(&key).map_err(fail)?, model.get(&key).cloned());
            }
            Ok(())
        })
        .unwrap();
}
