use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("invalid stdio port {0:?}")]
    InvalidPort(String),
    #[error("tick interval must be non-zero")]
    InvalidTick,
    #[error("URC queue full ({0} events)")]
    UrcQueueFull(usize),
}
