//! Arm pose bookkeeping
//!
//! A pose is the commanded joint-angle vector in radians. Its length is fixed
//! for the lifetime of a mission; shorter reference poses are padded with
//! zeros for the reserved slots.

use serde::{Deserialize, Serialize};

/// Sentinel meaning "leave this joint unchanged" when sent to the actuator
pub const UNCHANGED: f64 = -1.0;

/// Logical joint indices
pub const BASE_YAW: usize = 0;
pub const ELBOW: usize = 1;
pub const WRIST_PITCH: usize = 2;
pub const WRIST_ROLL: usize = 3;
pub const GRIPPER: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmPose {
    joints: Vec<f64>,
}

impl ArmPose {
    pub fn new(joints: Vec<f64>) -> Self {
        Self { joints }
    }

    /// Build a pose from degrees, zero-padded to `joint_count` slots
    pub fn from_degrees(degrees: &[f64], joint_count: usize) -> Self {
        let joints = degrees.iter().map(|d| d.to_radians()).collect();
        Self::new(joints).padded(joint_count)
    }

    /// A command touching a single joint; every other slot carries `UNCHANGED`
    pub fn single_joint(joint_count: usize, index: usize, radians: f64) -> Self {
        let mut joints = vec![UNCHANGED; joint_count];
        if let Some(slot) = joints.get_mut(index) {
            *slot = radians;
        }
        Self::new(joints)
    }

    /// Pad with zeros up to `len` entries (never truncates)
    pub fn padded(mut self, len: usize) -> Self {
        if self.joints.len() < len {
            self.joints.resize(len, 0.0);
        }
        self
    }

    /// Apply a command on top of this pose, honoring the `UNCHANGED` sentinel
    pub fn merged(&self, command: &ArmPose) -> ArmPose {
        let joints = self
            .joints
            .iter()
            .enumerate()
            .map(|(i, &current)| match command.joints.get(i) {
                Some(&value) if value != UNCHANGED => value,
                _ => current,
            })
            .collect();
        ArmPose::new(joints)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joint(&self, index: usize) -> f64 {
        self.joints.get(index).copied().unwrap_or(0.0)
    }

    pub fn joint_degrees(&self, index: usize) -> f64 {
        self.joint(index).to_degrees()
    }

    /// Set a joint in place; indices past the end are ignored
    pub fn set_joint(&mut self, index: usize, radians: f64) {
        if let Some(slot) = self.joints.get_mut(index) {
            *slot = radians;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.joints
    }

    pub fn to_degrees(&self) -> Vec<f64> {
        self.joints
            .iter()
            .map(|&j| if j == UNCHANGED { UNCHANGED } else { j.to_degrees() })
            .collect()
    }
}

impl From<Vec<f64>> for ArmPose {
    fn from(joints: Vec<f64>) -> Self {
        Self::new(joints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_degrees_pads_reserved_slots() {
        let pose = ArmPose::from_degrees(&[90.0, 40.0, 160.0, 180.0, 110.0], 8);
        assert_eq!(pose.len(), 8);
        assert!((pose.joint_degrees(ELBOW) - 40.0).abs() < 1e-9);
        assert_eq!(&pose.as_slice()[5..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_joint_command_and_merge() {
        let pose = ArmPose::from_degrees(&[90.0, 40.0, 160.0, 180.0, 110.0], 8);
        let close = ArmPose::single_joint(8, GRIPPER, 5f64.to_radians());
        assert_eq!(close.joint(BASE_YAW), UNCHANGED);

        let merged = pose.merged(&close);
        assert_eq!(merged.len(), 8);
        assert!((merged.joint_degrees(GRIPPER) - 5.0).abs() < 1e-9);
        assert_eq!(merged.joint(ELBOW), pose.joint(ELBOW));
    }

    #[test]
    fn test_padded_never_truncates() {
        let pose = ArmPose::new(vec![1.0; 6]).padded(4);
        assert_eq!(pose.len(), 6);
    }
}
