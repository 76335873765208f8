//! Delivery outcome and result types.

use std::collections::HashMap;
use std::fmt;

use crate::RequestId;

/// Result of attempting delivery to a single device token.
#[derive(Debug, Clone)]
pub struct DeviceOutcome<E> {
    pub token: String,
    pub result: Result<(), E>,
}

impl<E> DeviceOutcome<E> {
    /// Create a successful outcome.
    pub fn success(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            result: Ok(()),
        }
    }

    /// Create a failed outcome.
    pub fn failure(token: impl Into<String>, error: E) -> Self {
        Self {
            token: token.into(),
            result: Err(error),
        }
    }

    /// Check if delivery was successful.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Classified failure reason; the key of the failure histogram.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReasonKind {
    /// The token is unregistered or belongs to another app. Callers should
    /// stop sending to it.
    PermanentlyInvalidToken,
    /// Any other provider error, keyed by its identity.
    Other(String),
}

impl ReasonKind {
    pub fn other(reason: impl fmt::Display) -> Self {
        Self::Other(reason.to_string())
    }
}

impl fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermanentlyInvalidToken => f.write_str("PermanentlyInvalidToken"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

// Serialized as a plain string so it can key a JSON object.
impl serde::Serialize for ReasonKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The single summarized outcome of one request.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AggregatedResult {
    pub request_id: RequestId,
    /// Number of outcomes expected (the request's token count).
    pub total: usize,
    /// Number of outcomes actually observed.
    pub received: usize,
    pub success: usize,
    pub failure: usize,
    /// Failure count per reason. Values sum to `failure`.
    pub reasons: HashMap<ReasonKind, usize>,
    /// Tokens the provider reported as no longer valid, in arrival order.
    pub invalid_tokens: Vec<String>,
    pub extra: serde_json::Value,
    /// Published before every expected outcome arrived.
    pub partial: bool,
}

impl AggregatedResult {
    /// Create an empty result expecting `total` outcomes.
    pub fn new(request_id: RequestId, total: usize, extra: serde_json::Value) -> Self {
        Self {
            request_id,
            total,
            received: 0,
            success: 0,
            failure: 0,
            reasons: HashMap::new(),
            invalid_tokens: Vec::new(),
            extra,
            partial: false,
        }
    }

    /// Whether every expected outcome has been counted.
    pub fn is_complete(&self) -> bool {
        self.received == self.total
    }

    /// Outcomes that never arrived.
    pub fn missing(&self) -> usize {
        self.total.saturating_sub(self.received)
    }

    /// Occurrences of a given reason.
    pub fn reason_count(&self, reason: &ReasonKind) -> usize {
        self.reasons.get(reason).copied().unwrap_or(0)
    }
}

/// Raw provider response for a request sent without fan-out.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DirectResult<R> {
    pub request_id: RequestId,
    pub response: R,
    pub extra: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_kind_serializes_as_map_key() {
        let mut result = AggregatedResult::new(RequestId::nil(), 2, serde_json::Value::Null);
        result.received = 2;
        result.failure = 2;
        result.reasons.insert(ReasonKind::PermanentlyInvalidToken, 1);
        result.reasons.insert(ReasonKind::other("BadDeviceToken"), 1);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["reasons"]["PermanentlyInvalidToken"], 1);
        assert_eq!(json["reasons"]["BadDeviceToken"], 1);
        assert_eq!(json["partial"], false);
    }

    #[test]
    fn test_missing_outcomes() {
        let mut result = AggregatedResult::new(RequestId::nil(), 4, serde_json::Value::Null);
        result.received = 2;
        assert!(!result.is_complete());
        assert_eq!(result.missing(), 2);
        assert_eq!(result.reason_count(&ReasonKind::PermanentlyInvalidToken), 0);
    }
}
