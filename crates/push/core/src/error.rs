//! Error types for admission and transport.

use thiserror::Error;

/// A request was refused before any work was queued for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("request has no device tokens")]
    NoDevices,
    #[error("request contains an empty device token")]
    EmptyToken,
    #[error("cannot encode payload: {0}")]
    Encode(String),
    #[error("payload is {size} bytes, provider limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("service is shut down")]
    Closed,
}

/// A whole work unit could not be handed to the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),
    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("provider unavailable after {attempts} attempts: {reason}")]
    Unavailable { attempts: u32, reason: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
