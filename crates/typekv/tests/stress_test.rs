//! Stress tests for high write volume and large values

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;
use typekv::prelude::*;

const VALUE_SIZE: usize = 1024;

fn value_for(key: u64) -> Vec<u8> {
    vec![(key % 256) as u8; VALUE_SIZE]
}

/// 100 threads, 1000 puts and gets each, 1 KiB values
#[test]
fn test_high_volume_put_get() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(temp_dir.path())
        .with_max_readers(126)
        .with_sync_mode(SyncMode::NoSync);
    let store = Store::open_with_config(config).unwrap();
    let r = Arc::new(store.bind::<u64, Vec<u8>>("stress").unwrap());

    let num_threads = 100u64;
    let ops_per_thread = 1000u64;
    let barrier = Arc::new(Barrier::new(num_threads as usize));
    let start = Instant::now();

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let r = Arc::clone(&r);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..ops_per_thread {
                    let key = t * ops_per_thread + i;
                    let value = value_for(key);
                    r.put(&key, &value).unwrap();
                    assert_eq!(r.get(&key).unwrap(), value);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let elapsed = start.elapsed();
    let total = num_threads * ops_per_thread;
    println!("High volume put/get:");
    println!("   Operations: {} puts + {} gets", total, total);
    println!("   Time: {:?}", elapsed);
    println!(
        "   Throughput: {:.0} ops/sec",
        (2 * total) as f64 / elapsed.as_secs_f64()
    );

    // Spot check across the whole key range
    for key in (0..total).step_by(997) {
        assert_eq!(r.get(&key).unwrap(), value_for(key));
    }
    assert_eq!(store.available_reader_slots(), 126);
}

/// Repeated overwrites and deletes of a small key set keep the last write
#[test]
fn test_overwrite_and_delete_churn() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(temp_dir.path()).with_sync_mode(SyncMode::NoSync);
    let store = Store::open_with_config(config).unwrap();
    let r = Arc::new(store.bind::<String, Vec<u8>>("churn").unwrap());

    let handles: Vec<_> = (0..10u64)
        .map(|t| {
            let r = Arc::clone(&r);
            thread::spawn(move || {
                let key = format!("slot-{}", t);
                for round in 0..500u64 {
                    r.put(&key, &value_for(round)).unwrap();
                    if round % 3 == 0 {
                        assert!(r.delete(&key).unwrap());
                        assert!(!r.contains(&key).unwrap());
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Round 499 is not a multiple of 3, so every slot holds its last value
    for t in 0..10u64 {
        assert_eq!(r.get(&format!("slot-{}", t)).unwrap(), value_for(499));
    }
}
