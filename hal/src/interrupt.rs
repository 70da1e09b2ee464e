//! Interrupt-context entry point

use alloc::sync::Arc;

use crate::gpio::{Level, PinId};

/// Receiver for raw pin transitions.
///
/// Called from interrupt context. Implementations must only record the edge
/// (no blocking, no allocation, no callbacks into application code).
pub trait EdgeSink: Send + Sync {
    fn on_edge(&self, pin: PinId, level: Level, timestamp_ms: u64);
}

/// Shared sink handed to the hardware when an interrupt is enabled.
pub type EdgeSinkRef = Arc<dyn EdgeSink>;
