//! Provider traits.

use push_core::{AdmissionError, DeviceOutcome, ReasonKind, Request, TransportError};

/// Turns a request into the provider's wire message.
pub trait Provider: Send + Sync + 'static {
    /// Encoded message, shared by every batch of one request.
    type Message: Send + Sync + 'static;

    /// Encode the request's payload and headers. Runs once per request, on
    /// the caller's task.
    fn encode(&self, request: &Request) -> Result<Self::Message, AdmissionError>;
}

/// Provider that delivers to each device separately and reports per-device
/// outcomes.
#[trait_variant::make(Send)]
pub trait BatchProvider: Provider {
    /// Per-device delivery error.
    type Error: Send + Sync + std::fmt::Debug + 'static;

    /// Deliver one message to a batch of devices.
    ///
    /// Returns one outcome per token, or a transport error when the batch
    /// could not be attempted at all.
    async fn send_batch(
        &self,
        tokens: &[String],
        message: &Self::Message,
    ) -> Result<Vec<DeviceOutcome<Self::Error>>, TransportError>;

    /// Default classification of a per-device error.
    fn classify(error: &Self::Error) -> ReasonKind;
}

/// Provider whose API takes a whole request in one call.
#[trait_variant::make(Send)]
pub trait DirectProvider: Provider {
    /// Raw provider response, forwarded to the caller unmodified.
    type Response: Send + 'static;

    /// Send the message to every device it addresses.
    async fn send(&self, message: &Self::Message) -> Result<Self::Response, TransportError>;
}
