//! Optional metrics instrumentation for typekv.
//!
//! When the `observe` feature is enabled, store operations emit counters and
//! histograms via the [`metrics`] crate. A downstream application must install
//! a metrics recorder to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record a put.
///
/// - `typekv.put.total` – counter with `outcome` label
/// - `typekv.put.duration_seconds` – histogram
#[inline]
pub fn record_put(duration: std::time::Duration, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("typekv.put.total", "outcome" => outcome).increment(1);
        metrics::histogram!("typekv.put.duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, success);
    }
}

/// Record a get.
///
/// - `typekv.get.total` – counter with `result` label (`hit` / `miss` / `fail`)
/// - `typekv.get.duration_seconds` – histogram
#[inline]
pub fn record_get(duration: std::time::Duration, result: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("typekv.get.total", "result" => result).increment(1);
        metrics::histogram!("typekv.get.duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, result);
    }
}

/// Record how long a read waited for a reader slot.
///
/// - `typekv.reader_slot.wait_duration_seconds` – histogram
#[inline]
pub fn record_reader_wait(duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::histogram!("typekv.reader_slot.wait_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = duration;
    }
}
