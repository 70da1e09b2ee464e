//! Sizing and limits for the registry and dispatcher.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration shared by [`PinRegistry`](crate::PinRegistry) and
/// [`TriggerDispatcher`](crate::TriggerDispatcher).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioConfig {
    /// Maximum number of simultaneously claimed pins.
    pub max_handles: usize,
    /// Capacity of the notification queue between the debounce timer and
    /// the dispatch context.
    pub dispatch_queue_depth: usize,
    /// Upper bound accepted for a trigger's debounce interval.
    pub max_debounce_ms: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            max_handles: 32,
            dispatch_queue_depth: 16,
            max_debounce_ms: 10_000,
        }
    }
}

impl GpioConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GpioConfigBuilder {
        GpioConfigBuilder::default()
    }
}

/// Builder for ergonomic configuration construction.
#[derive(Debug, Clone, Default)]
pub struct GpioConfigBuilder {
    config: GpioConfig,
}

impl GpioConfigBuilder {
    /// Sets the maximum number of claimed pins.
    pub fn max_handles(mut self, max: usize) -> Self {
        self.config.max_handles = max;
        self
    }

    /// Sets the notification queue capacity (at least one slot is kept).
    pub fn dispatch_queue_depth(mut self, depth: usize) -> Self {
        self.config.dispatch_queue_depth = depth.max(1);
        self
    }

    /// Sets the longest debounce interval a trigger may request.
    pub fn max_debounce_ms(mut self, max: u32) -> Self {
        self.config.max_debounce_ms = max;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> GpioConfig {
        self.config
    }
}
