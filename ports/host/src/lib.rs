//! Hosted runtime for GPIO core applications.
//!
//! Plays the part of the vendor runtime an application is written against:
//! [`Runtime::init`] performs the one-time setup and registers the handler
//! for unsolicited result codes (URCs), and [`Runtime::sleep`] is the
//! cooperative suspension point during which debounced GPIO notifications
//! and queued URCs are delivered.

pub mod clock;
pub mod config;
pub mod error;
pub mod runtime;
pub mod urc;

pub use clock::SystemClock;
pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use error::RuntimeError;
pub use runtime::Runtime;
pub use urc::{log_urc, CallState, FotaStatus, SimState, SystemState, UrcEvent, UrcSender};
