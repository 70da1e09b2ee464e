//! Millisecond time base

/// Monotonic millisecond clock with cooperative suspension.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Suspend the calling task until `deadline_ms` (no-op if already past).
    fn sleep_until(&self, deadline_ms: u64);
}
