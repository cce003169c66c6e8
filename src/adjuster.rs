//! Direction-driven joint adjustment
//!
//! Maps the latest direction reading onto an incremental pose change. The
//! gains are empirically tuned visual-servo steps; clamping keeps each joint
//! inside its mechanical range while the coupled joint keeps making progress.

use crate::config::AdjusterConfig;
use crate::perception::Direction;
use crate::pose::{ArmPose, BASE_YAW, ELBOW, WRIST_PITCH};

#[derive(Debug, Clone)]
pub struct AngleAdjuster {
    yaw_step: f64,
    pitch_step: f64,
    wrist_ceiling: f64,
    wrist_compensation: f64,
    elbow_compensation: f64,
    elbow_ceiling: f64,
}

impl AngleAdjuster {
    pub fn new(config: &AdjusterConfig) -> Self {
        Self {
            yaw_step: config.yaw_step_deg.to_radians(),
            pitch_step: config.pitch_step_deg.to_radians(),
            wrist_ceiling: config.wrist_ceiling_deg.to_radians(),
            wrist_compensation: config.wrist_compensation_deg.to_radians(),
            elbow_compensation: config.elbow_compensation_deg.to_radians(),
            elbow_ceiling: config.elbow_ceiling_deg.to_radians(),
        }
    }

    /// Return the pose after one adjustment step toward `direction`
    pub fn adjust(&self, pose: &ArmPose, direction: Direction) -> ArmPose {
        let mut next = pose.clone();
        let elbow = pose.joint(ELBOW);
        let wrist = pose.joint(WRIST_PITCH);

        match direction {
            Direction::Left => next.set_joint(BASE_YAW, pose.joint(BASE_YAW) + self.yaw_step),
            Direction::Right => next.set_joint(BASE_YAW, pose.joint(BASE_YAW) - self.yaw_step),
            Direction::Up => next.set_joint(WRIST_PITCH, (wrist - self.pitch_step).max(0.0)),
            Direction::Down => {
                let lowered = wrist + self.pitch_step;
                if lowered > self.wrist_ceiling {
                    // Back off the wrist and let the elbow carry the motion
                    let backed_off = (lowered - self.wrist_compensation).min(self.wrist_ceiling);
                    next.set_joint(WRIST_PITCH, backed_off);
                    let raised = (elbow + self.elbow_compensation).min(self.elbow_ceiling);
                    next.set_joint(ELBOW, raised);
                } else {
                    next.set_joint(WRIST_PITCH, lowered);
                }
            }
            Direction::Front => {
                next.set_joint(ELBOW, (elbow + self.pitch_step).min(self.elbow_ceiling));
                next.set_joint(WRIST_PITCH, (wrist - self.pitch_step).max(0.0));
            }
            Direction::None => {}
        }

        next
    }
}

impl Default for AngleAdjuster {
    fn default() -> Self {
        Self::new(&AdjusterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn pose(degrees: &[f64]) -> ArmPose {
        ArmPose::from_degrees(degrees, 8)
    }

    fn assert_deg(pose: &ArmPose, index: usize, expected: f64) {
        let actual = pose.joint_degrees(index);
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "joint {} mismatch: actual={}, expected={}", index, actual, expected
        );
    }

    fn changed_joints(before: &ArmPose, after: &ArmPose) -> Vec<usize> {
        before
            .as_slice()
            .iter()
            .zip(after.as_slice())
            .enumerate()
            .filter(|(_, (a, b))| (*a - *b).abs() > TOLERANCE)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_lateral_directions_only_touch_base() {
        let adjuster = AngleAdjuster::default();
        let start = pose(&[90.0, 40.0, 160.0, 180.0, 110.0]);

        let left = adjuster.adjust(&start, Direction::Left);
        assert_deg(&left, BASE_YAW, 92.0);
        assert_eq!(changed_joints(&start, &left), vec![BASE_YAW]);

        let right = adjuster.adjust(&start, Direction::Right);
        assert_deg(&right, BASE_YAW, 88.0);
        assert_eq!(changed_joints(&start, &right), vec![BASE_YAW]);
    }

    #[test]
    fn test_up_clamps_wrist_at_zero() {
        let adjuster = AngleAdjuster::default();
        let up = adjuster.adjust(&pose(&[90.0, 40.0, 10.0]), Direction::Up);
        assert_deg(&up, WRIST_PITCH, 7.0);

        let floored = adjuster.adjust(&pose(&[90.0, 40.0, 1.0]), Direction::Up);
        assert_deg(&floored, WRIST_PITCH, 0.0);
    }

    #[test]
    fn test_down_below_ceiling() {
        let adjuster = AngleAdjuster::default();
        let down = adjuster.adjust(&pose(&[90.0, 40.0, 100.0]), Direction::Down);
        assert_deg(&down, WRIST_PITCH, 103.0);
        assert_deg(&down, ELBOW, 40.0);
    }

    #[test]
    fn test_down_at_ceiling_compensates_with_elbow() {
        let adjuster = AngleAdjuster::default();
        let down = adjuster.adjust(&pose(&[90.0, 40.0, 160.0]), Direction::Down);
        assert_deg(&down, WRIST_PITCH, 158.0);
        assert_deg(&down, ELBOW, 42.0);

        let capped = adjuster.adjust(&pose(&[90.0, 179.0, 159.0]), Direction::Down);
        assert_deg(&capped, WRIST_PITCH, 157.0);
        assert_deg(&capped, ELBOW, 180.0);
    }

    #[test]
    fn test_front_moves_elbow_and_wrist_with_clamps() {
        let adjuster = AngleAdjuster::default();
        let front = adjuster.adjust(&pose(&[90.0, 40.0, 160.0]), Direction::Front);
        assert_deg(&front, ELBOW, 43.0);
        assert_deg(&front, WRIST_PITCH, 157.0);

        let clamped = adjuster.adjust(&pose(&[90.0, 179.0, 2.0]), Direction::Front);
        assert_deg(&clamped, ELBOW, 180.0);
        assert_deg(&clamped, WRIST_PITCH, 0.0);
    }

    #[test]
    fn test_none_is_noop() {
        let adjuster = AngleAdjuster::default();
        let start = pose(&[90.0, 40.0, 160.0, 180.0, 110.0]);
        assert_eq!(adjuster.adjust(&start, Direction::None), start);
    }

    #[test]
    fn test_repeated_adjustments_respect_limits() {
        let adjuster = AngleAdjuster::default();
        let directions = [
            Direction::Down,
            Direction::Front,
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Down,
            Direction::Front,
            Direction::Right,
        ];
        let mut current = pose(&[90.0, 40.0, 160.0, 180.0, 110.0]);
        for step in 0..400 {
            let next = adjuster.adjust(&current, directions[step % directions.len()]);
            assert_eq!(next.len(), current.len());
            assert!(next.joint_degrees(WRIST_PITCH) <= 160.0 + TOLERANCE);
            assert!(next.joint_degrees(WRIST_PITCH) >= -TOLERANCE);
            assert!(next.joint_degrees(ELBOW) <= 180.0 + TOLERANCE);
            assert_eq!(&next.as_slice()[3..], &current.as_slice()[3..]);
            current = next;
        }
    }
}
