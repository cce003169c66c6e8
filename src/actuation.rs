//! Actuation boundary
//!
//! Provides the trait-based interface through which the controller commands
//! joint angles and base locomotion, independent of the transport used to
//! reach the actuators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pose::ArmPose;

/// Named locomotion actions understood by the mobile base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobotAction {
    Stop,
    ForwardSlow,
    BackwardSlow,
    ClockwiseRotationSlow,
    CounterclockwiseRotationSlow,
    ClockwiseRotationMedian,
    CounterclockwiseRotationMedian,
}

impl RobotAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotAction::Stop => "STOP",
            RobotAction::ForwardSlow => "FORWARD_SLOW",
            RobotAction::BackwardSlow => "BACKWARD_SLOW",
            RobotAction::ClockwiseRotationSlow => "CLOCKWISE_ROTATION_SLOW",
            RobotAction::CounterclockwiseRotationSlow => "COUNTERCLOCKWISE_ROTATION_SLOW",
            RobotAction::ClockwiseRotationMedian => "CLOCKWISE_ROTATION_MEDIAN",
            RobotAction::CounterclockwiseRotationMedian => "COUNTERCLOCKWISE_ROTATION_MEDIAN",
        }
    }
}

impl fmt::Display for RobotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for applying arm and locomotion commands
///
/// Entries equal to [`crate::pose::UNCHANGED`] in a published pose leave the
/// corresponding joint where it is.
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn publish_arm(&self, pose: &ArmPose) -> anyhow::Result<()>;

    /// `pid_control` selects closed-loop execution on the base
    async fn publish_to_robot(&self, action: RobotAction, pid_control: bool) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!(RobotAction::Stop.to_string(), "STOP");
        assert_eq!(
            RobotAction::CounterclockwiseRotationMedian.as_str(),
            "COUNTERCLOCKWISE_ROTATION_MEDIAN"
        );
        let json = serde_json::to_string(&RobotAction::ForwardSlow).unwrap();
        assert_eq!(json, "\"FORWARD_SLOW\"");
    }
}
