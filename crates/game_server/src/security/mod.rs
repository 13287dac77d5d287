//! Security module for validating client frames before they reach the world.
//!
//! Every text frame a client sends is checked against the configured
//! [`SecurityConfig`](crate::config::SecurityConfig) limits. A frame that
//! fails validation closes the connection with the error's message as the
//! close reason.

pub mod input_validation;

pub use input_validation::validate_frame;

/// Security-related errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SecurityError {
    /// The frame is larger than the configured limit
    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),

    /// The frame is not JSON at all
    #[error("Received message was not valid JSON.")]
    InvalidJson,

    /// The frame is JSON but not a message array
    #[error("Received message was not a JSON array.")]
    NotAnArray,

    /// The frame breaks a size or depth limit
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// The frame carries control characters
    #[error("Malicious content detected")]
    MaliciousContent,
}
