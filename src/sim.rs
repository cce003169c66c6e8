//! Simulated rig
//!
//! A small kinematic stand-in for the perception and actuation collaborators:
//! a target sits at some distance and bearing from a mobile base carrying the
//! arm. Locomotion commands move the base, arm commands change how far the
//! camera reaches, and closing the gripper near the target picks it up.
//! Used by the `grasp_sim` binary and by the mission tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::{
    actuation::{CommandSink, RobotAction},
    perception::{Direction, Perception, TagSignal},
    pose::{ArmPose, BASE_YAW, ELBOW, GRIPPER, UNCHANGED},
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    pub tag_name: String,
    /// Initial base-to-target distance (m)
    pub distance: f64,
    /// Initial target bearing (deg, positive is to the left)
    pub bearing_deg: f64,
    /// Half field of view (deg) inside which the tag is detected
    pub field_of_view_deg: f64,
    /// Bearing (deg) inside which the target reads as "front"
    pub centered_deg: f64,
    pub forward_step: f64,
    pub slow_turn_deg: f64,
    pub median_turn_deg: f64,
    /// Camera reach gained per degree of elbow flexion (m)
    pub reach_per_elbow_deg: f64,
    pub reference_elbow_deg: f64,
    /// Depth (m) at which a closing gripper catches the target
    pub grasp_tolerance: f64,
    /// Gripper angle (deg) below which it counts as closed
    pub gripper_closed_deg: f64,
    /// Number of grasps that miss regardless of geometry
    pub missed_grasps: u32,
    /// Report no depth or direction at all
    pub blind: bool,
    /// Fail every actuation command after this many have succeeded
    pub fail_actuation_after: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tag_name: "target".to_string(),
            distance: 1.0,
            bearing_deg: 60.0,
            field_of_view_deg: 30.0,
            centered_deg: 5.0,
            forward_step: 0.05,
            slow_turn_deg: 2.0,
            median_turn_deg: 10.0,
            reach_per_elbow_deg: 0.004,
            reference_elbow_deg: 40.0,
            grasp_tolerance: 0.1,
            gripper_closed_deg: 20.0,
            missed_grasps: 0,
            blind: false,
            fail_actuation_after: None,
        }
    }
}

/// Every command the rig received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    Arm(ArmPose),
    Robot { action: RobotAction, pid_control: bool },
    TagName(String),
}

#[derive(Debug)]
struct SimState {
    distance: f64,
    heading_deg: f64,
    /// Last commanded joint angles (deg)
    joints_deg: Vec<f64>,
    tracked_tag: Option<String>,
    holding: bool,
    missed_remaining: u32,
    actuations: usize,
    depth_queries: u64,
    log: Vec<SimCommand>,
}

pub struct SimulatedRig {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl SimulatedRig {
    pub fn new(config: SimConfig) -> Self {
        let state = SimState {
            distance: config.distance,
            heading_deg: 0.0,
            joints_deg: vec![90.0, config.reference_elbow_deg, 160.0, 180.0, 110.0],
            tracked_tag: None,
            holding: false,
            missed_remaining: config.missed_grasps,
            actuations: 0,
            depth_queries: 0,
            log: Vec::new(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commands(&self) -> Vec<SimCommand> {
        self.state().log.clone()
    }

    pub fn arm_commands(&self) -> Vec<ArmPose> {
        self.state()
            .log
            .iter()
            .filter_map(|c| match c {
                SimCommand::Arm(pose) => Some(pose.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn robot_actions(&self) -> Vec<RobotAction> {
        self.state()
            .log
            .iter()
            .filter_map(|c| match c {
                SimCommand::Robot { action, .. } => Some(*action),
                _ => None,
            })
            .collect()
    }

    /// How many times perception was asked for depth
    pub fn depth_queries(&self) -> u64 {
        self.state().depth_queries
    }

    pub fn is_holding(&self) -> bool {
        self.state().holding
    }

    /// Target bearing relative to where the camera points (deg)
    fn relative_bearing(&self, state: &SimState) -> f64 {
        let yaw = state.joints_deg.get(BASE_YAW).copied().unwrap_or(90.0);
        self.config.bearing_deg - state.heading_deg - (yaw - 90.0)
    }

    fn camera_depth(&self, state: &SimState) -> f64 {
        let elbow = state
            .joints_deg
            .get(ELBOW)
            .copied()
            .unwrap_or(self.config.reference_elbow_deg);
        let reach = (elbow - self.config.reference_elbow_deg) * self.config.reach_per_elbow_deg;
        (state.distance - reach).max(0.0)
    }

    fn target_in_view(&self, state: &SimState) -> bool {
        !state.holding && self.relative_bearing(state).abs() <= self.config.field_of_view_deg
    }

    fn tracking(&self, state: &SimState) -> bool {
        state.tracked_tag.as_deref() == Some(self.config.tag_name.as_str())
    }

    fn check_actuation(&self, state: &mut SimState) -> anyhow::Result<()> {
        if let Some(limit) = self.config.fail_actuation_after {
            if state.actuations >= limit {
                return Err(anyhow::anyhow!("actuator bus offline"));
            }
        }
        state.actuations += 1;
        Ok(())
    }
}

impl Perception for SimulatedRig {
    fn object_depth(&self) -> anyhow::Result<Option<f64>> {
        let mut state = self.state();
        state.depth_queries += 1;
        if self.config.blind || !self.target_in_view(&state) {
            return Ok(None);
        }
        Ok(Some(self.camera_depth(&state)))
    }

    fn object_direction(&self) -> anyhow::Result<Option<Direction>> {
        let state = self.state();
        if self.config.blind || !self.target_in_view(&state) {
            return Ok(None);
        }
        let bearing = self.relative_bearing(&state);
        let direction = if bearing > self.config.centered_deg {
            Direction::Left
        } else if bearing < -self.config.centered_deg {
            Direction::Right
        } else {
            Direction::Front
        };
        Ok(Some(direction))
    }

    fn tag_exist_signal(&self) -> anyhow::Result<TagSignal> {
        let state = self.state();
        if self.tracking(&state) && self.target_in_view(&state) {
            Ok(TagSignal::Visible(self.config.tag_name.clone()))
        } else {
            Ok(TagSignal::Absent)
        }
    }

    fn target_position(&self) -> anyhow::Result<Option<[f64; 3]>> {
        let state = self.state();
        if !self.target_in_view(&state) {
            return Ok(None);
        }
        let bearing = self.relative_bearing(&state).to_radians();
        let depth = self.camera_depth(&state);
        Ok(Some([depth * bearing.cos(), depth * bearing.sin(), 0.0]))
    }

    fn publish_tag_name(&self, name: &str) -> anyhow::Result<()> {
        let mut state = self.state();
        state.tracked_tag = Some(name.to_string());
        // Repeated broadcasts of the same name carry no information for tests
        if state.log.last() != Some(&SimCommand::TagName(name.to_string())) {
            state.log.push(SimCommand::TagName(name.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandSink for SimulatedRig {
    async fn publish_arm(&self, pose: &ArmPose) -> anyhow::Result<()> {
        let mut state = self.state();
        self.check_actuation(&mut state)?;
        state.log.push(SimCommand::Arm(pose.clone()));

        let commanded = pose.to_degrees();
        if state.joints_deg.len() < commanded.len() {
            state.joints_deg.resize(commanded.len(), 0.0);
        }
        for (slot, value) in state.joints_deg.iter_mut().zip(commanded) {
            if value != UNCHANGED {
                *slot = value;
            }
        }

        let gripper = state.joints_deg.get(GRIPPER).copied().unwrap_or(0.0);
        if gripper < self.config.gripper_closed_deg && !state.holding {
            let depth = self.camera_depth(&state);
            if depth <= self.config.grasp_tolerance && self.target_in_view(&state) {
                if state.missed_remaining > 0 {
                    state.missed_remaining -= 1;
                    debug!("Simulated grasp missed at {:.3}m", depth);
                } else {
                    state.holding = true;
                    debug!("Simulated grasp succeeded at {:.3}m", depth);
                }
            }
        }
        Ok(())
    }

    async fn publish_to_robot(&self, action: RobotAction, pid_control: bool) -> anyhow::Result<()> {
        let mut state = self.state();
        self.check_actuation(&mut state)?;
        state.log.push(SimCommand::Robot { action, pid_control });

        match action {
            RobotAction::Stop => {}
            RobotAction::ForwardSlow => {
                state.distance = (state.distance - self.config.forward_step).max(0.0);
            }
            RobotAction::BackwardSlow => state.distance += self.config.forward_step,
            RobotAction::CounterclockwiseRotationSlow => {
                state.heading_deg += self.config.slow_turn_deg
            }
            RobotAction::ClockwiseRotationSlow => state.heading_deg -= self.config.slow_turn_deg,
            RobotAction::CounterclockwiseRotationMedian => {
                state.heading_deg += self.config.median_turn_deg
            }
            RobotAction::ClockwiseRotationMedian => {
                state.heading_deg -= self.config.median_turn_deg
            }
        }
        Ok(())
    }
}
