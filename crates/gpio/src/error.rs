//! Error types shared by the registry and the dispatcher.

use gpio_hal::{Direction, HalError, PinId};
use thiserror::Error;

use crate::registry::PinHandle;

/// Coarse classification of [`GpioError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Pin unsupported, already claimed, or hardware could not allocate it.
    ResourceUnavailable,
    /// Zero, released, unknown or wrong-direction handle.
    InvalidHandle,
    /// Second trigger on a handle without an intervening disable.
    DuplicateRegistration,
    /// Malformed request arguments.
    InvalidArgument,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpioError {
    #[error("{0} is not supported by the hardware")]
    UnsupportedPin(PinId),
    #[error("{pin} is already claimed by handle {holder}")]
    PinClaimed { pin: PinId, holder: PinHandle },
    #[error("handle table full ({0} handles)")]
    TableFull(usize),
    #[error("invalid pin flags {bits:#x}: {reason}")]
    InvalidFlags { bits: u32, reason: &'static str },
    #[error("handle {0} is not valid")]
    InvalidHandle(PinHandle),
    #[error("handle {handle} is configured as {actual:?}")]
    WrongDirection { handle: PinHandle, actual: Direction },
    #[error("handle {0} already has a trigger registered")]
    DuplicateRegistration(PinHandle),
    #[error("handle {0} has no trigger registered")]
    NotRegistered(PinHandle),
    #[error("debounce interval {requested} ms exceeds the {limit} ms limit")]
    DebounceTooLong { requested: u32, limit: u32 },
    #[error("hardware error: {0}")]
    Hardware(#[from] HalError),
}

impl GpioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedPin(_) | Self::PinClaimed { .. } | Self::TableFull(_) => {
                ErrorKind::ResourceUnavailable
            }
            Self::Hardware(_) => ErrorKind::ResourceUnavailable,
            Self::InvalidHandle(_) | Self::WrongDirection { .. } | Self::NotRegistered(_) => {
                ErrorKind::InvalidHandle
            }
            Self::DuplicateRegistration(_) => ErrorKind::DuplicateRegistration,
            Self::InvalidFlags { .. } | Self::DebounceTooLong { .. } => ErrorKind::InvalidArgument,
        }
    }
}

/// Result type for registry and dispatcher operations
pub type GpioResult<T> = Result<T, GpioError>;
