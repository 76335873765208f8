//! Notification request types.

use crate::AdmissionError;

/// Identifier assigned to a request when it is admitted.
pub type RequestId = uuid::Uuid;

/// Delivery priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Deliver immediately.
    #[default]
    High,
    /// Provider may delay delivery to save power.
    Normal,
}

/// Which provider environment a service talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[default]
    Production,
    /// APNs development endpoint, FCM dry run.
    Sandbox,
}

impl DeliveryMode {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Provider-neutral notification content.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Alert text shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    /// Messages sharing a collapse key replace each other on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    /// Custom key/value pairs merged into the provider payload.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// One logical push addressed to a set of device tokens.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Request {
    /// Device tokens, delivered in this order within each batch.
    pub devices: Vec<String>,
    #[serde(default)]
    pub notification: Notification,
    #[serde(default)]
    pub priority: Priority,
    /// Seconds from admission after which the provider may discard the push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
    /// Opaque value handed back unchanged with the result.
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl Request {
    /// Create a request for the given devices with default options.
    pub fn new(devices: Vec<String>, notification: Notification) -> Self {
        Self {
            devices,
            notification,
            priority: Priority::default(),
            expiration: None,
            extra: serde_json::Value::Null,
        }
    }

    /// Set the correlation value returned with the result.
    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_expiration(mut self, seconds: u64) -> Self {
        self.expiration = Some(seconds);
        self
    }

    /// Check the provider-independent admission rules.
    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.devices.is_empty() {
            return Err(AdmissionError::NoDevices);
        }
        if self.devices.iter().any(|d| d.trim().is_empty()) {
            return Err(AdmissionError::EmptyToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_device_list() {
        let req = Request::new(vec![], Notification::default());
        assert!(matches!(req.validate(), Err(AdmissionError::NoDevices)));
    }

    #[test]
    fn test_validate_rejects_blank_token() {
        let req = Request::new(vec!["abc".into(), " ".into()], Notification::default());
        assert!(matches!(req.validate(), Err(AdmissionError::EmptyToken)));
    }

    #[test]
    fn test_request_from_json_uses_defaults() {
        let req: Request = serde_json::from_str(
            r#"{"devices":["a","b"],"notification":{"body":"hi"},"extra":{"id":7}}"#,
        )
        .unwrap();

        assert_eq!(req.devices, vec!["a", "b"]);
        assert_eq!(req.notification.body.as_deref(), Some("hi"));
        assert_eq!(req.priority, Priority::High);
        assert!(req.expiration.is_none());
        assert_eq!(req.extra["id"], 7);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_delivery_mode_parses_lowercase() {
        let mode: DeliveryMode = serde_json::from_str(r#""sandbox""#).unwrap();
        assert_eq!(mode, DeliveryMode::Sandbox);
        assert!(!mode.is_production());
    }
}
