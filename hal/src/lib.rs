//! Hardware context for the GPIO core
//!
//! This crate defines the vendor-agnostic seam between the pin registry /
//! trigger dispatcher and whatever owns the real pins. Everything the core
//! needs from the platform is reachable through one injected context:
//!
//! - [`gpio::GpioHardware`] - pin configuration, level access and interrupt wiring
//! - [`interrupt::EdgeSink`] - the only entry point the interrupt path calls
//! - [`clock::Clock`] - millisecond time base and cooperative suspension
//!
//! With the `sim` feature, [`sim::SimBoard`] provides a virtual-time board that
//! implements all of the above for hosted tests.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod clock;
pub mod error;
pub mod gpio;
pub mod interrupt;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export commonly used types
pub use clock::Clock;
pub use error::{HalError, HalResult};
pub use gpio::{Direction, Edge, GpioHardware, Level, PinConfig, PinId, Pull};
pub use interrupt::{EdgeSink, EdgeSinkRef};
