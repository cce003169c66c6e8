//! Linear pose interpolation
//!
//! Only the midpoint of the uniformly spaced path is commanded. The two
//! gripper-adjacent joints are pinned during transit.

use crate::pose::{ArmPose, GRIPPER, WRIST_ROLL};

/// Fraction of the way from `current` to `target` at waypoint `index` of `steps`
fn waypoint_fraction(index: usize, steps: usize) -> f64 {
    if steps < 2 {
        0.0
    } else {
        index as f64 / (steps - 1) as f64
    }
}

/// Midpoint waypoint between `current` and `target`.
///
/// `target` is zero-padded when shorter than `current`. Joints 3 and 4 are
/// forced to `fixed` (radians) regardless of the path.
pub fn interpolate(current: &ArmPose, target: &ArmPose, steps: usize, fixed: [f64; 2]) -> ArmPose {
    let target = target.clone().padded(current.len());
    let t = waypoint_fraction(steps / 2, steps);

    let mut midpoint: ArmPose = current
        .as_slice()
        .iter()
        .zip(target.as_slice())
        .map(|(&from, &to)| from + (to - from) * t)
        .collect::<Vec<f64>>()
        .into();
    midpoint.set_joint(WRIST_ROLL, fixed[0]);
    midpoint.set_joint(GRIPPER, fixed[1]);
    midpoint
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> [f64; 2] {
        [180f64.to_radians(), 110f64.to_radians()]
    }

    #[test]
    fn test_identical_poses_only_pin_fixed_joints() {
        let pose = ArmPose::from_degrees(&[90.0, 40.0, 160.0, 30.0, 70.0, 0.0, 0.0, 0.0], 8);
        let mid = interpolate(&pose, &pose, 10, fixed());
        assert_eq!(mid.len(), 8);
        for i in [0, 1, 2, 5, 6, 7] {
            assert!((mid.joint(i) - pose.joint(i)).abs() < 1e-12);
        }
        assert!((mid.joint_degrees(3) - 180.0).abs() < 1e-9);
        assert!((mid.joint_degrees(4) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_law_for_ten_steps() {
        let current = ArmPose::new(vec![0.0, 1.0, 2.0, 0.0, 0.0, 0.5, 0.0, 0.0]);
        let target = ArmPose::new(vec![0.9, 0.1, 2.9, 3.0, 3.0, 1.4, -0.9, 0.0]);
        let mid = interpolate(&current, &target, 10, fixed());

        let t = 5.0 / 9.0;
        for i in [0, 1, 2, 5, 6, 7] {
            let expected = current.joint(i) + (target.joint(i) - current.joint(i)) * t;
            assert!(
                (mid.joint(i) - expected).abs() < 1e-12,
                "joint {}: {} != {}", i, mid.joint(i), expected
            );
        }
    }

    #[test]
    fn test_short_target_is_zero_padded() {
        let current = ArmPose::new(vec![1.0; 8]);
        let target = ArmPose::new(vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        let mid = interpolate(&current, &target, 10, fixed());
        assert_eq!(mid.len(), 8);
        assert!((mid.joint(0) - 1.0).abs() < 1e-12);
        assert!((mid.joint(6) - (1.0 - 5.0 / 9.0)).abs() < 1e-12);
    }

    #[test]
    fn test_single_step_stays_at_current() {
        let current = ArmPose::new(vec![0.5; 8]);
        let target = ArmPose::new(vec![1.5; 8]);
        let mid = interpolate(&current, &target, 1, fixed());
        assert!((mid.joint(0) - 0.5).abs() < 1e-12);
    }
}
