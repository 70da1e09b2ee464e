//! # gpio-core
//!
//! GPIO management and event-notification core for modem firmware
//! applications. Two cooperating components sit on top of an injected
//! hardware context ([`gpio_hal::GpioHardware`]):
//!
//! - [`registry`]   – maps pins to opaque handles and owns their configuration.
//! - [`dispatcher`] – debounces raw edges of input handles and delivers
//!   notifications to application callbacks outside interrupt context.
//!
//! Raw edges enter through [`edge_queue::EdgeQueue`], the only object the
//! interrupt path touches. [`TriggerDispatcher::poll`] is the debounce timer
//! service and [`TriggerDispatcher::run_until_idle`] the cooperative dispatch
//! point where callbacks run.

pub mod config;
pub mod debounce;
pub mod dispatcher;
pub mod edge_queue;
pub mod error;
pub mod flags;
pub mod registry;
mod sync;

pub use config::{GpioConfig, GpioConfigBuilder};
pub use debounce::{DebounceState, Debouncer, Transition};
pub use dispatcher::{DispatchStats, Notification, TriggerCallback, TriggerDispatcher};
pub use edge_queue::{EdgeQueue, RawEdge, EDGE_QUEUE_DEPTH};
pub use error::{ErrorKind, GpioError, GpioResult};
pub use flags::PinFlags;
pub use gpio_hal::{Direction, Edge, GpioHardware, Level, PinConfig, PinId, Pull};
pub use registry::{PinHandle, PinRegistry};

#[cfg(test)]
mod tests;
