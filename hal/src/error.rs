//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Invalid parameter provided
    InvalidParameter,
    /// Operation not supported by this implementation
    NotSupported,
    /// Peripheral is busy or could not be allocated
    Busy,
    /// Pin was not configured before use
    ConfigurationError,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Busy => write!(f, "resource busy"),
            Self::ConfigurationError => write!(f, "configuration error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_names_each_failure() {
        assert_eq!(HalError::InvalidParameter.to_string(), "invalid parameter");
        assert_eq!(HalError::NotSupported.to_string(), "operation not supported");
        assert_eq!(HalError::Busy.to_string(), "resource busy");
        assert_eq!(HalError::ConfigurationError.to_string(), "configuration error");
    }
}
