//! Runtime configuration.

use gpio_core::GpioConfig;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Serial device carrying the diagnostic console.
    pub stdio_port: String,
    /// Longest time `sleep` stays suspended without servicing events.
    pub tick_ms: u32,
    /// Capacity of the URC queue between producers and the cooperative loop.
    pub urc_queue_depth: usize,
    pub gpio: GpioConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stdio_port: String::from("/dev/ttyS0"),
            tick_ms: 10,
            urc_queue_depth: 16,
            gpio: GpioConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.stdio_port.trim().is_empty() {
            return Err(RuntimeError::InvalidPort(self.stdio_port.clone()));
        }
        if self.tick_ms == 0 {
            return Err(RuntimeError::InvalidTick);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    pub fn stdio_port(mut self, port: impl Into<String>) -> Self {
        self.config.stdio_port = port.into();
        self
    }

    pub fn tick_ms(mut self, tick: u32) -> Self {
        self.config.tick_ms = tick;
        self
    }

    pub fn urc_queue_depth(mut self, depth: usize) -> Self {
        self.config.urc_queue_depth = depth;
        self
    }

    pub fn gpio(mut self, gpio: GpioConfig) -> Self {
        self.config.gpio = gpio;
        self
    }

    pub fn build(self) -> RuntimeConfig {
        self.config
    }
}
