//! LMDB reader-slot pool
//!
//! LMDB fails `mdb_txn_begin` with `MDB_READERS_FULL` once every reader slot
//! is taken. This pool holds one permit per slot and makes callers wait for a
//! permit before opening a read transaction, so slot exhaustion turns into
//! waiting instead of errors.

use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};
use typekv_core::{observe, Result, StoreError};

const MAX_BACKOFF_MS: u64 = 32;

/// Permits for LMDB reader slots
///
/// # Example
///
/// ```ignore
/// let pool = ReadSlotPool::new(4, None);
/// let permit = pool.acquire_blocking()?;
/// let txn = env.begin_ro_txn()?;
/// // Slot is returned when `permit` is dropped
/// ```
pub struct ReadSlotPool {
    semaphore: Semaphore,
    size: usize,
    acquire_timeout: Option<Duration>,
}

impl ReadSlotPool {
    /// `acquire_timeout` of `None` means wait as long as it takes
    pub fn new(size: usize, acquire_timeout: Option<Duration>) -> Self {
        Self {
            semaphore: Semaphore::new(size),
            size,
            acquire_timeout,
        }
    }

    /// Acquire a reader slot, blocking the current thread
    ///
    /// Polls with exponential backoff (1ms, 2ms, 4ms, ... capped at 32ms).
    /// Fails with `StoreError::ReaderLimit` only when a timeout is configured
    /// and it elapses first.
    ///
    /// Waiters are not queued. A slot freed while a waiter sleeps can go to a
    /// reader that just arrived, so under sustained saturation one caller may
    /// keep losing; set an acquire timeout to bound that.
    pub fn acquire_blocking(&self) -> Result<SemaphorePermit<'_>> {
        if let Ok(permit) = self.semaphore.try_acquire() {
            return Ok(permit);
        }

        let started = Instant::now();
        let mut backoff_ms = 1u64;

        loop {
            match self.semaphore.try_acquire() {
                Ok(permit) => {
                    observe::record_reader_wait(started.elapsed());
                    return Ok(permit);
                }
                Err(_) => {
                    if let Some(timeout) = self.acquire_timeout {
                        if started.elapsed() >= timeout {
                            return Err(StoreError::ReaderLimit(timeout));
                        }
                    }
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                }
            }
        }
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        self.semaphore.try_acquire().ok()
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_release() {
        let pool = ReadSlotPool::new(2, None);
        assert_eq!(pool.available_permits(), 2);

        {
            let _permit = pool.acquire_blocking().unwrap();
            assert_eq!(pool.available_permits(), 1);
        }
        assert_eq!(pool.available_permits(), 2);
    }

    #[test]
    fn test_try_acquire() {
        let pool = ReadSlotPool::new(1, None);

        let permit = pool.try_acquire();
        assert!(permit.is_some());
        assert!(pool.try_acquire().is_none());

        drop(permit);
        assert!(pool.try_acquire().is_some());
    }

    #[test]
    fn test_timeout_when_exhausted() {
        let pool = ReadSlotPool::new(1, Some(Duration::from_millis(20)));
        let _held = pool.acquire_blocking().unwrap();

        let err = pool.acquire_blocking().unwrap_err();
        assert!(matches!(err, StoreError::ReaderLimit(_)));
    }

    #[test]
    fn test_waits_for_slot_without_timeout() {
        let pool = Arc::new(ReadSlotPool::new(1, None));
        let held = pool.acquire_blocking().unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let _permit = pool.acquire_blocking().unwrap();
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!waiter.is_finished());

        drop(held);
        waiter.join().unwrap();
        assert_eq!(pool.available_permits(), 1);
    }
}
