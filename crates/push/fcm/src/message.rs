//! FCM request and response bodies.

use push_core::{AdmissionError, DeliveryMode, Priority, Request};

/// Maximum registration ids in one multicast request.
pub const MAX_REGISTRATION_IDS: usize = 1000;

/// Maximum `time_to_live`, four weeks.
pub const MAX_TIME_TO_LIVE: u64 = 2_419_200;

/// Maximum size of the data payload.
pub const MAX_DATA_SIZE: usize = 4096;

/// Display part of an FCM message.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FcmNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// Multicast message body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FcmMessage {
    pub registration_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u64>,
    /// Validate without delivering. Set from the service's delivery mode.
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<FcmNotification>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty", default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl FcmMessage {
    /// Encode a request. The caller's request is left untouched; the
    /// delivery mode only affects the encoded copy.
    pub fn encode(request: &Request, mode: DeliveryMode) -> Result<Self, AdmissionError> {
        if request.devices.len() > MAX_REGISTRATION_IDS {
            return Err(AdmissionError::Encode(format!(
                "{} devices exceed the limit of {MAX_REGISTRATION_IDS} per request",
                request.devices.len()
            )));
        }

        let n = &request.notification;
        let data_size = serde_json::to_vec(&n.data)
            .map_err(|e| AdmissionError::Encode(e.to_string()))?
            .len();
        if data_size > MAX_DATA_SIZE {
            return Err(AdmissionError::PayloadTooLarge {
                size: data_size,
                limit: MAX_DATA_SIZE,
            });
        }

        let notification = FcmNotification {
            title: n.title.clone(),
            body: n.body.clone(),
            sound: n.sound.clone(),
            badge: n.badge.map(|b| b.to_string()),
        };
        let has_display = notification != FcmNotification::default();

        Ok(Self {
            registration_ids: request.devices.clone(),
            collapse_key: n.collapse_key.clone(),
            priority: match request.priority {
                Priority::High => "high",
                Priority::Normal => "normal",
            }
            .to_string(),
            time_to_live: request.expiration.map(|ttl| ttl.min(MAX_TIME_TO_LIVE)),
            dry_run: !mode.is_production(),
            notification: has_display.then_some(notification),
            data: n.data.clone(),
        })
    }

    /// The same message addressed to a subset of devices.
    pub fn with_devices(&self, registration_ids: Vec<String>) -> Self {
        Self {
            registration_ids,
            ..self.clone()
        }
    }
}

/// Result for one registration id, in request order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FcmResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Canonical id to replace the sent token with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FcmResult {
    /// Temporary failure worth retrying.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.error.as_deref(),
            Some("Unavailable" | "InternalServerError")
        )
    }

    /// The token is no longer registered for this app.
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self.error.as_deref(),
            Some("NotRegistered" | "InvalidRegistration" | "MismatchSenderId")
        )
    }
}

/// Multicast response body.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FcmResponse {
    #[serde(default)]
    pub multicast_id: i64,
    #[serde(default)]
    pub success: u32,
    #[serde(default)]
    pub failure: u32,
    #[serde(default)]
    pub canonical_ids: u32,
    #[serde(default)]
    pub results: Vec<FcmResult>,
}

impl FcmResponse {
    /// Build a response from per-device results, recounting the totals.
    pub fn from_results(multicast_id: i64, results: Vec<FcmResult>) -> Self {
        let count = |f: fn(&FcmResult) -> bool| results.iter().filter(|r| f(r)).count() as u32;

        Self {
            multicast_id,
            success: count(|r| r.error.is_none()),
            failure: count(|r| r.error.is_some()),
            canonical_ids: count(|r| r.registration_id.is_some()),
            results,
        }
    }
}

/// FCM response paired with the devices it answers for, in the same order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FcmReport {
    pub registration_ids: Vec<String>,
    pub response: FcmResponse,
}

impl FcmReport {
    /// Tokens FCM no longer accepts, with the reported error.
    pub fn invalid_tokens(&self) -> Vec<(&str, &str)> {
        self.registration_ids
            .iter()
            .zip(&self.response.results)
            .filter(|(_, result)| result.is_invalid_token())
            .filter_map(|(token, result)| Some((token.as_str(), result.error.as_deref()?)))
            .collect()
    }

    /// Tokens FCM asks to replace, with their canonical replacement.
    pub fn canonical_updates(&self) -> Vec<(&str, &str)> {
        self.registration_ids
            .iter()
            .zip(&self.response.results)
            .filter_map(|(token, result)| Some((token.as_str(), result.registration_id.as_deref()?)))
            .collect()
    }
}
