//! Per-device APNs errors and their classification.

use push_core::ReasonKind;

/// Why APNs did not accept a notification for one device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApnsError {
    /// The token is unregistered or was issued for another topic.
    #[error("invalid token, status {status}: {reason}")]
    InvalidToken { status: u16, reason: String },
    /// APNs answered with any other error status and reason.
    #[error("rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("invalid notification: {0}")]
    Payload(String),
}

impl From<a2::Error> for ApnsError {
    fn from(error: a2::Error) -> Self {
        let response = match error {
            a2::Error::ResponseError(response) => response,
            other => return Self::Connection(other.to_string()),
        };

        let status = response.code;
        match response.error.map(|body| body.reason) {
            Some(
                reason @ (a2::ErrorReason::Unregistered | a2::ErrorReason::DeviceTokenNotForTopic),
            ) => Self::InvalidToken {
                status,
                reason: format!("{reason:?}"),
            },
            Some(reason) => Self::Rejected {
                status,
                reason: format!("{reason:?}"),
            },
            None => Self::Rejected {
                status,
                reason: "Unknown".to_string(),
            },
        }
    }
}

/// Map an APNs error to a histogram key.
///
/// Invalid tokens are permanent. Everything else keeps its APNs reason.
pub fn classify(error: &ApnsError) -> ReasonKind {
    match error {
        ApnsError::InvalidToken { .. } => ReasonKind::PermanentlyInvalidToken,
        ApnsError::Rejected { reason, .. } => ReasonKind::Other(reason.clone()),
        ApnsError::Connection(message) => ReasonKind::Other(message.clone()),
        ApnsError::Payload(message) => ReasonKind::Other(message.clone()),
    }
}
