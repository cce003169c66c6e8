//! Telemetry abstraction for grasp missions
//!
//! Provides a trait-based interface for publishing mission state transitions
//! to any transport mechanism (Zenoh, MQTT, HTTP, etc.)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mission::MissionState;
use crate::perception::Direction;

/// One state transition of a running mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionEvent {
    pub from: MissionState,
    pub to: MissionState,
    pub iteration: u64,
    pub attempt: u32,
    pub depth: f64,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

/// Trait for publishing mission telemetry
///
/// Failures are reported back to the mission, which logs them and carries on.
#[async_trait]
pub trait TelemetryPublisher: Send + Sync {
    async fn publish_event(&self, event: &MissionEvent) -> anyhow::Result<()>;
}

/// Discards all telemetry
#[derive(Debug, Clone)]
pub struct NoOpTelemetry;

#[async_trait]
impl TelemetryPublisher for NoOpTelemetry {
    async fn publish_event(&self, _event: &MissionEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Prints telemetry to stdout as JSON
#[derive(Debug, Clone)]
pub struct ConsoleTelemetry {
    pub pretty_print: bool,
}

impl ConsoleTelemetry {
    pub fn new() -> Self {
        Self { pretty_print: false }
    }

    pub fn pretty() -> Self {
        Self { pretty_print: true }
    }

    fn render(&self, data: &MissionEvent) -> anyhow::Result<String> {
        Ok(if self.pretty_print {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        })
    }
}

impl Default for ConsoleTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryPublisher for ConsoleTelemetry {
    async fn publish_event(&self, event: &MissionEvent) -> anyhow::Result<()> {
        println!("[MISSION] {}", self.render(event)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = MissionEvent {
            from: MissionState::Approaching,
            to: MissionState::PrecisionApproach,
            iteration: 12,
            attempt: 1,
            depth: 0.28,
            direction: Direction::Front,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"to\":\"PRECISION_APPROACH\""));
        assert!(json.contains("\"direction\":\"front\""));

        let parsed: MissionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[tokio::test]
    async fn test_console_publisher_accepts_events() {
        let event = MissionEvent {
            from: MissionState::Searching,
            to: MissionState::Approaching,
            iteration: 1,
            attempt: 0,
            depth: 100.0,
            direction: Direction::None,
            timestamp: Utc::now(),
        };
        assert!(ConsoleTelemetry::pretty().publish_event(&event).await.is_ok());
        assert!(NoOpTelemetry.publish_event(&event).await.is_ok());
    }
}
