//! APNs message encoding.

use a2::NotificationBuilder as _;
use a2::request::payload::PayloadLike as _;
use push_core::{AdmissionError, Notification, Priority, Request};

/// Maximum APNs payload size for regular remote notifications.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Maximum length of an `apns-collapse-id` header.
pub const MAX_COLLAPSE_ID_SIZE: usize = 64;

/// A request encoded for APNs, shared by every batch of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApnsMessage {
    pub notification: Notification,
    /// `apns-topic`, the app bundle id.
    pub topic: String,
    /// `apns-expiration` as a UNIX timestamp.
    pub expiration: Option<u64>,
    pub priority: Priority,
    /// The JSON body a2 sends for each device.
    pub body: Vec<u8>,
}

impl ApnsMessage {
    /// Encode a request for `topic`. `now` is the current UNIX time in
    /// seconds, used to turn the relative expiration into a timestamp.
    pub fn encode(request: &Request, topic: &str, now: u64) -> Result<Self, AdmissionError> {
        let notification = &request.notification;

        if notification.data.contains_key("aps") {
            return Err(AdmissionError::Encode(
                "custom data may not use the reserved key \"aps\"".to_string(),
            ));
        }
        if let Some(key) = &notification.collapse_key {
            if key.len() > MAX_COLLAPSE_ID_SIZE {
                return Err(AdmissionError::Encode(format!(
                    "collapse key exceeds {MAX_COLLAPSE_ID_SIZE} bytes"
                )));
            }
        }

        let mut message = Self {
            notification: notification.clone(),
            topic: topic.to_string(),
            expiration: request.expiration.map(|secs| now.saturating_add(secs)),
            priority: request.priority,
            body: Vec::new(),
        };

        // The device token is a request header, not part of the body.
        let body = message
            .payload("")
            .and_then(|p| p.to_json_string())
            .map_err(|e| AdmissionError::Encode(e.to_string()))?;
        if body.len() > MAX_PAYLOAD_SIZE {
            return Err(AdmissionError::PayloadTooLarge {
                size: body.len(),
                limit: MAX_PAYLOAD_SIZE,
            });
        }

        message.body = body.into_bytes();
        Ok(message)
    }

    pub fn apns_priority(&self) -> a2::Priority {
        match self.priority {
            Priority::High => a2::Priority::High,
            Priority::Normal => a2::Priority::Normal,
        }
    }

    /// Build the a2 payload addressed to `token`.
    pub fn payload<'a>(
        &'a self,
        token: &'a str,
    ) -> Result<a2::request::payload::Payload<'a>, a2::Error> {
        let notification = &self.notification;

        let mut builder = a2::DefaultNotificationBuilder::new();
        if let Some(title) = &notification.title {
            builder = builder.set_title(title);
        }
        if let Some(body) = &notification.body {
            builder = builder.set_body(body);
        }
        if let Some(sound) = &notification.sound {
            builder = builder.set_sound(sound);
        }
        if let Some(badge) = notification.badge {
            builder = builder.set_badge(badge);
        }

        let collapse_id = notification
            .collapse_key
            .as_deref()
            .map(a2::CollapseId::new)
            .transpose()?;

        let mut payload = builder.build(
            token,
            a2::NotificationOptions {
                apns_topic: Some(&self.topic),
                apns_expiration: self.expiration,
                apns_priority: Some(self.apns_priority()),
                apns_collapse_id: collapse_id,
                ..Default::default()
            },
        );

        for (key, value) in &notification.data {
            payload.add_custom_data(key, value)?;
        }

        Ok(payload)
    }
}
