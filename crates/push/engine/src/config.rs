//! Engine tuning.

use std::time::Duration;

/// Queue sizes, pool size and aggregation limits.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Number of concurrent senders.
    #[serde(default = "default_senders")]
    pub senders: usize,
    /// Admission queue capacity, in work units.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Result sink capacity.
    #[serde(default = "default_result_capacity")]
    pub result_capacity: usize,
    /// Maximum requests being aggregated at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Per-request response channel capacity.
    #[serde(default = "default_response_buffer")]
    pub response_buffer: usize,
    /// Seconds before an incomplete request is published as partial. 0 disables.
    #[serde(default = "default_aggregation_timeout")]
    pub aggregation_timeout_secs: u64,
}

fn default_senders() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    100_000
}

fn default_result_capacity() -> usize {
    100_000
}

fn default_max_in_flight() -> usize {
    10_000
}

fn default_response_buffer() -> usize {
    1_000
}

fn default_aggregation_timeout() -> u64 {
    60
}

impl EngineConfig {
    pub fn aggregation_timeout(&self) -> Option<Duration> {
        match self.aggregation_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn with_senders(mut self, senders: usize) -> Self {
        self.senders = senders;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            senders: default_senders(),
            queue_capacity: default_queue_capacity(),
            result_capacity: default_result_capacity(),
            max_in_flight: default_max_in_flight(),
            response_buffer: default_response_buffer(),
            aggregation_timeout_secs: default_aggregation_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = EngineConfig {
            aggregation_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.aggregation_timeout(), None);
        assert_eq!(
            EngineConfig::default().aggregation_timeout(),
            Some(Duration::from_secs(60))
        );
    }
}
