//! Configuration loading for grasp missions
//!
//! Every threshold, gain, settle time and reference pose the controller uses
//! lives here with its tuned default, so a YAML file (or a test) only has to
//! name the values it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use crate::{GraspError, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GraspConfig {
    pub mission: MissionConfig,
    pub thresholds: ThresholdConfig,
    pub timing: TimingConfig,
    pub poses: PoseConfig,
    pub adjuster: AdjusterConfig,
    pub interpolation: InterpolationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Tag identifier broadcast to perception while searching
    pub tag_name: String,
    /// Number of joint slots in every commanded pose
    pub joint_count: usize,
    /// Visible iterations after which a lost tag triggers STOP instead of a scan
    pub search_stop_after_seen: u32,
    /// Failed grasps tolerated before giving up; unbounded when absent
    pub max_grasp_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Depth (m) at or below which coarse approach stops
    pub depth_approach: f64,
    /// Depth (m) below which the grasp is triggered
    pub depth_precision: f64,
    /// Depth (m) below which a still-visible tag counts as grasped
    pub depth_complete: f64,
    /// Sentinel depth meaning "no target seen"
    pub unknown_depth: f64,
    /// Elbow angle (deg) above which the arm is considered extended
    pub elbow_extended_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_period_ms: u64,
    pub adjust_settle_ms: u64,
    /// Pause after each scan or stop command while the tag is missing
    pub search_settle_ms: u64,
    pub initial_settle_ms: u64,
    pub extend_settle_ms: u64,
    pub gripper_settle_ms: u64,
    pub retract_settle_ms: u64,
    pub extended_close_settle_ms: u64,
    pub completion_settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoseConfig {
    pub initial_pose_deg: Vec<f64>,
    pub retract_pose_deg: Vec<f64>,
    pub gripper_close_deg: f64,
    pub extend_elbow_deg: f64,
    pub extend_wrist_deg: f64,
}

/// Visual-servo gains, all in degrees
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdjusterConfig {
    pub yaw_step_deg: f64,
    pub pitch_step_deg: f64,
    pub wrist_ceiling_deg: f64,
    pub wrist_compensation_deg: f64,
    pub elbow_compensation_deg: f64,
    pub elbow_ceiling_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InterpolationConfig {
    pub steps: usize,
    /// Angles (deg) forced on joints 3 and 4 during transit
    pub fixed_joint_deg: [f64; 2],
    /// Return to the initial pose through the interpolated midpoint after a failed grasp
    pub smooth_reset: bool,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            tag_name: "target".to_string(),
            joint_count: 8,
            search_stop_after_seen: 2,
            max_grasp_attempts: None,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            depth_approach: 0.3,
            depth_precision: 0.25,
            depth_complete: 0.3,
            unknown_depth: 100.0,
            elbow_extended_deg: 120.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 100,
            adjust_settle_ms: 300,
            search_settle_ms: 100,
            initial_settle_ms: 1000,
            extend_settle_ms: 2000,
            gripper_settle_ms: 2000,
            retract_settle_ms: 1000,
            extended_close_settle_ms: 1000,
            completion_settle_ms: 2000,
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            initial_pose_deg: vec![90.0, 40.0, 160.0, 180.0, 110.0],
            retract_pose_deg: vec![90.0, 30.0, 160.0, 180.0, 10.0],
            gripper_close_deg: 5.0,
            extend_elbow_deg: 50.0,
            extend_wrist_deg: 60.5,
        }
    }
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            yaw_step_deg: 2.0,
            pitch_step_deg: 3.0,
            wrist_ceiling_deg: 160.0,
            wrist_compensation_deg: 5.0,
            elbow_compensation_deg: 2.0,
            elbow_ceiling_deg: 180.0,
        }
    }
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            fixed_joint_deg: [180.0, 110.0],
            smooth_reset: false,
        }
    }
}

impl GraspConfig {
    /// Load configuration from a YAML file
    pub fn load_from_path(config_path: &str) -> Result<Self> {
        let contents = fs::read_to_string(config_path)
            .map_err(|e| GraspError::Config(format!("Failed to read {}: {}", config_path, e)))?;

        Self::load_from_str(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: GraspConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot operate with
    pub fn validate(&self) -> Result<()> {
        let joints = self.mission.joint_count;
        if joints < 5 {
            return Err(GraspError::Config(format!(
                "joint_count must be at least 5 (got {})", joints
            )));
        }
        for (name, pose) in [
            ("initial_pose_deg", &self.poses.initial_pose_deg),
            ("retract_pose_deg", &self.poses.retract_pose_deg),
        ] {
            if pose.len() > joints {
                return Err(GraspError::Config(format!(
                    "{} has {} entries but joint_count is {}", name, pose.len(), joints
                )));
            }
        }
        if self.thresholds.depth_precision > self.thresholds.depth_approach {
            return Err(GraspError::Config(
                "depth_precision must not exceed depth_approach".to_string(),
            ));
        }
        if self.timing.poll_period_ms == 0 {
            return Err(GraspError::Config("poll_period_ms must be positive".to_string()));
        }
        if self.mission.max_grasp_attempts == Some(0) {
            return Err(GraspError::Config("max_grasp_attempts must be positive".to_string()));
        }
        Ok(())
    }
}

impl TimingConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn adjust_settle(&self) -> Duration {
        Duration::from_millis(self.adjust_settle_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn extend_settle(&self) -> Duration {
        Duration::from_millis(self.extend_settle_ms)
    }

    pub fn gripper_settle(&self) -> Duration {
        Duration::from_millis(self.gripper_settle_ms)
    }

    pub fn retract_settle(&self) -> Duration {
        Duration::from_millis(self.retract_settle_ms)
    }

    pub fn extended_close_settle(&self) -> Duration {
        Duration::from_millis(self.extended_close_settle_ms)
    }

    pub fn completion_settle(&self) -> Duration {
        Duration::from_millis(self.completion_settle_ms)
    }
}
