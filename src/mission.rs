//! Grasp mission state machine
//!
//! Drives the arm and mobile base through search, approach, precision
//! approach and grasp. Each state has its own transition function so every
//! branch can be exercised one iteration at a time through [`GraspMission::step`];
//! [`GraspMission::run`] strings them together for a complete attempt.
//!
//! The mission owns its sensor feeds. They are started on entry and always
//! joined before the mission returns, on success and on error alike.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::{
    actuation::{CommandSink, RobotAction},
    adjuster::AngleAdjuster,
    config::GraspConfig,
    feed::{SensorFeed, SensorSlots},
    interpolator::interpolate,
    perception::{Direction, Perception, TagSignal},
    pose::{ArmPose, ELBOW, GRIPPER, WRIST_PITCH},
    telemetry::{MissionEvent, NoOpTelemetry, TelemetryPublisher},
    GraspError, Result,
};

/// Tag name broadcast on entry to clear any previous target
const CLEARED_TAG_NAME: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionState {
    Searching,
    Approaching,
    PrecisionApproach,
    Grasping,
    Done,
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissionState::Searching => "SEARCHING",
            MissionState::Approaching => "APPROACHING",
            MissionState::PrecisionApproach => "PRECISION_APPROACH",
            MissionState::Grasping => "GRASPING",
            MissionState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Summary of a finished mission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionReport {
    pub iterations: u64,
    pub attempts: u32,
    pub final_pose: ArmPose,
    pub final_depth: f64,
}

pub struct GraspMission {
    config: GraspConfig,
    perception: Arc<dyn Perception>,
    sink: Arc<dyn CommandSink>,
    telemetry: Arc<dyn TelemetryPublisher>,
    adjuster: AngleAdjuster,
    slots: Arc<SensorSlots>,
    feeds: Vec<SensorFeed>,
    pose: ArmPose,
    state: MissionState,
    /// Iterations with the tag visible since the last miss-triggered STOP
    seen_recently: u32,
    attempts: u32,
    iterations: u64,
}

impl GraspMission {
    pub fn new(
        config: GraspConfig,
        perception: Arc<dyn Perception>,
        sink: Arc<dyn CommandSink>,
    ) -> Result<Self> {
        config.validate()?;

        let joint_count = config.mission.joint_count;
        let pose = ArmPose::from_degrees(&config.poses.initial_pose_deg, joint_count);

        Ok(Self {
            adjuster: AngleAdjuster::new(&config.adjuster),
            slots: Arc::new(SensorSlots::new(config.thresholds.unknown_depth)),
            feeds: Vec::new(),
            telemetry: Arc::new(NoOpTelemetry),
            perception,
            sink,
            pose,
            state: MissionState::Searching,
            seen_recently: 0,
            attempts: 0,
            iterations: 0,
            config,
        })
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryPublisher>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn pose(&self) -> &ArmPose {
        &self.pose
    }

    pub fn slots(&self) -> &Arc<SensorSlots> {
        &self.slots
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn feeds_running(&self) -> bool {
        self.feeds.iter().any(SensorFeed::is_running)
    }

    /// Run a complete mission: enter, iterate until DONE, tear down.
    ///
    /// The mission is consumed; any failure still stops the feeds and the
    /// base before the error is returned.
    pub async fn run(mut self) -> Result<MissionReport> {
        info!("Starting grasp mission for tag '{}'", self.config.mission.tag_name);

        let outcome = self.drive_to_completion().await;
        if let Err(e) = &outcome {
            error!("Grasp mission aborted: {}", e);
            if let Err(stop_err) = self.stop_feeds().await {
                error!("Failed to stop sensor feeds: {}", stop_err);
            }
            if let Err(stop_err) = self.drive(RobotAction::Stop).await {
                warn!("Final STOP after abort failed: {}", stop_err);
            }
        }
        outcome?;

        self.finish().await?;
        let report = MissionReport {
            iterations: self.iterations,
            attempts: self.attempts,
            final_pose: self.pose.clone(),
            final_depth: self.slots.depth(),
        };
        info!(
            "Grasp mission complete after {} iterations ({} grasp attempts)",
            report.iterations, report.attempts
        );
        Ok(report)
    }

    async fn drive_to_completion(&mut self) -> Result<()> {
        self.begin().await?;
        while self.state != MissionState::Done {
            self.step().await?;
        }
        Ok(())
    }

    /// Entry actions followed by starting both feeds
    pub async fn begin(&mut self) -> Result<()> {
        self.initialize().await?;
        self.start_feeds();
        Ok(())
    }

    /// Move to the initial pose and clear any previously tracked tag
    pub async fn initialize(&mut self) -> Result<()> {
        self.initial_action().await?;
        self.broadcast_tag(CLEARED_TAG_NAME)?;
        self.state = MissionState::Searching;
        self.seen_recently = 0;
        Ok(())
    }

    pub fn start_feeds(&mut self) {
        if !self.feeds.is_empty() {
            return;
        }
        let period = self.config.timing.poll_period();
        self.feeds.push(SensorFeed::start_depth(
            Arc::clone(&self.perception),
            Arc::clone(&self.slots),
            period,
            self.config.thresholds.unknown_depth,
        ));
        self.feeds.push(SensorFeed::start_direction(
            Arc::clone(&self.perception),
            Arc::clone(&self.slots),
            period,
        ));
    }

    /// Stop every feed and wait for each task to exit
    pub async fn stop_feeds(&mut self) -> Result<()> {
        let mut first_error = None;
        for mut feed in self.feeds.drain(..) {
            if let Err(e) = feed.stop().await {
                error!("Failed to join {} feed: {}", feed.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// DONE actions: join feeds, then a final STOP.
    ///
    /// The STOP is sent even when a feed failed to join; the first error wins.
    pub async fn finish(&mut self) -> Result<()> {
        let joined = self.stop_feeds().await;
        let stopped = self.drive(RobotAction::Stop).await;
        joined.and(stopped)
    }

    /// Execute one control iteration and return the resulting state
    pub async fn step(&mut self) -> Result<MissionState> {
        self.iterations += 1;
        let from = self.state;

        let to = match from {
            MissionState::Searching => self.search_step().await?,
            MissionState::Approaching => self.approach_step().await?,
            MissionState::PrecisionApproach => self.precision_step().await?,
            MissionState::Grasping => self.completion_step().await?,
            MissionState::Done => MissionState::Done,
        };

        if to != from {
            info!("Mission state {} -> {}", from, to);
            self.publish_transition(from, to).await;
        }
        self.state = to;
        Ok(to)
    }

    async fn search_step(&mut self) -> Result<MissionState> {
        if self.query_tag()?.is_visible() {
            self.note_tag_seen();
            return Ok(MissionState::Approaching);
        }
        self.handle_missing_tag().await?;
        Ok(MissionState::Searching)
    }

    async fn approach_step(&mut self) -> Result<MissionState> {
        if !self.query_tag()?.is_visible() {
            self.handle_missing_tag().await?;
            return Ok(MissionState::Searching);
        }
        self.note_tag_seen();

        let depth = self.slots.depth();
        if depth > self.config.thresholds.depth_approach {
            self.position_adjustment().await?;
            self.apply_adjustment().await?;
            Ok(MissionState::Approaching)
        } else {
            debug!("Depth {:.3}m within approach threshold", depth);
            self.drive(RobotAction::Stop).await?;
            Ok(MissionState::PrecisionApproach)
        }
    }

    async fn precision_step(&mut self) -> Result<MissionState> {
        // Hold the base still while the arm lines up
        self.drive(RobotAction::Stop).await?;

        let depth = self.slots.depth();
        let direction = self.slots.direction();
        if depth < self.config.thresholds.depth_precision && direction == Direction::Front {
            info!("Target aligned at {:.3}m, grasping", depth);
            self.grasp_sequence().await?;
            Ok(MissionState::Grasping)
        } else {
            self.apply_adjustment().await?;
            Ok(MissionState::PrecisionApproach)
        }
    }

    async fn completion_step(&mut self) -> Result<MissionState> {
        tokio::time::sleep(self.config.timing.completion_settle()).await;

        let tag = self.query_tag()?;
        let depth = self.slots.depth();
        let thresholds = &self.config.thresholds;
        let unknown = depth >= thresholds.unknown_depth;
        info!("Grasp check: tag visible={}, depth={:.3}m", tag.is_visible(), depth);

        if !tag.is_visible() || depth < thresholds.depth_complete || unknown {
            return Ok(MissionState::Done);
        }

        warn!("Grasp attempt {} failed, target still at {:.3}m", self.attempts, depth);
        if let Some(limit) = self.config.mission.max_grasp_attempts {
            if self.attempts >= limit {
                return Err(GraspError::AttemptsExhausted(self.attempts));
            }
        }

        if self.config.interpolation.smooth_reset {
            let initial = self.initial_pose();
            self.interpolate_to(&initial).await?;
        } else {
            self.initial_action().await?;
        }
        Ok(MissionState::Approaching)
    }

    /// Extend, close the gripper and partially retract.
    ///
    /// An arm whose elbow is already past the extension threshold only
    /// closes the gripper.
    pub async fn grasp_sequence(&mut self) -> Result<()> {
        self.attempts += 1;
        let timing = self.config.timing.clone();
        let extended_limit = self.config.thresholds.elbow_extended_deg.to_radians();
        let extended = self.pose.joint(ELBOW) > extended_limit;

        if extended {
            info!("Arm already extended, closing gripper");
            self.close_gripper().await?;
            tokio::time::sleep(timing.extended_close_settle()).await;
            return Ok(());
        }

        let poses = &self.config.poses;
        let elbow = self.pose.joint(ELBOW) + poses.extend_elbow_deg.to_radians();
        let wrist = self.pose.joint(WRIST_PITCH) - poses.extend_wrist_deg.to_radians();
        let mut reach = self.pose.clone();
        reach.set_joint(ELBOW, elbow);
        reach.set_joint(WRIST_PITCH, wrist);
        let joint_count = self.config.mission.joint_count;
        let retract = ArmPose::from_degrees(&poses.retract_pose_deg, joint_count);

        self.command_arm(&reach).await?;
        tokio::time::sleep(timing.extend_settle()).await;

        self.close_gripper().await?;
        tokio::time::sleep(timing.gripper_settle()).await;

        self.command_arm(&retract).await?;
        tokio::time::sleep(timing.retract_settle()).await;
        Ok(())
    }

    /// Command the interpolated midpoint toward `target` and adopt `target`
    /// as the tracked pose. Targets longer than the tracked pose are rejected.
    pub async fn interpolate_to(&mut self, target: &ArmPose) -> Result<()> {
        if target.len() > self.pose.len() {
            return Err(GraspError::Pose(format!(
                "target has {} joints, mission tracks {}",
                target.len(),
                self.pose.len()
            )));
        }
        let interpolation = &self.config.interpolation;
        let fixed = [
            interpolation.fixed_joint_deg[0].to_radians(),
            interpolation.fixed_joint_deg[1].to_radians(),
        ];
        let midpoint = interpolate(&self.pose, target, interpolation.steps, fixed);

        debug!("Interpolated midpoint: {:?}", midpoint.to_degrees());
        self.sink
            .publish_arm(&midpoint)
            .await
            .map_err(|e| GraspError::Actuation(format!("Failed to publish arm pose: {}", e)))?;
        self.pose = target.clone().padded(self.pose.len());
        tokio::time::sleep(self.config.timing.initial_settle()).await;
        Ok(())
    }

    async fn initial_action(&mut self) -> Result<()> {
        info!("Moving arm to initial pose");
        let initial = self.initial_pose();
        self.command_arm(&initial).await?;
        tokio::time::sleep(self.config.timing.initial_settle()).await;
        Ok(())
    }

    fn initial_pose(&self) -> ArmPose {
        ArmPose::from_degrees(&self.config.poses.initial_pose_deg, self.config.mission.joint_count)
    }

    async fn close_gripper(&mut self) -> Result<()> {
        let close = ArmPose::single_joint(
            self.config.mission.joint_count,
            GRIPPER,
            self.config.poses.gripper_close_deg.to_radians(),
        );
        self.command_arm(&close).await
    }

    /// Rotate toward the target, or creep forward once it is centered
    async fn position_adjustment(&mut self) -> Result<()> {
        let action = match self.slots.direction() {
            Direction::Left => RobotAction::CounterclockwiseRotationSlow,
            Direction::Right => RobotAction::ClockwiseRotationSlow,
            _ => RobotAction::ForwardSlow,
        };
        self.drive(action).await
    }

    async fn apply_adjustment(&mut self) -> Result<()> {
        let direction = self.slots.direction();
        let next = self.adjuster.adjust(&self.pose, direction);
        debug!("Adjusting toward {}: {:?}", direction, next.to_degrees());
        self.command_arm(&next).await?;
        tokio::time::sleep(self.config.timing.adjust_settle()).await;
        Ok(())
    }

    async fn handle_missing_tag(&mut self) -> Result<()> {
        if self.seen_recently > self.config.mission.search_stop_after_seen {
            debug!("Tag lost after {} sightings, stopping", self.seen_recently);
            self.seen_recently = 0;
            self.drive(RobotAction::Stop).await?;
        } else {
            self.drive(RobotAction::CounterclockwiseRotationMedian).await?;
        }
        tokio::time::sleep(self.config.timing.search_settle()).await;
        Ok(())
    }

    fn note_tag_seen(&mut self) {
        self.seen_recently += 1;
        match self.perception.target_position() {
            Ok(Some(position)) => debug!("Target position: {:?}", position),
            Ok(None) => debug!("Target position unavailable"),
            Err(e) => debug!("Target position query failed: {}", e),
        }
    }

    /// Broadcast the tracked tag and read its visibility.
    ///
    /// A failed visibility query counts as "not visible".
    fn query_tag(&self) -> Result<TagSignal> {
        self.broadcast_tag(&self.config.mission.tag_name)?;
        match self.perception.tag_exist_signal() {
            Ok(signal) => Ok(signal),
            Err(e) => {
                warn!("Tag signal query failed, treating tag as absent: {}", e);
                Ok(TagSignal::Absent)
            }
        }
    }

    fn broadcast_tag(&self, name: &str) -> Result<()> {
        self.perception
            .publish_tag_name(name)
            .map_err(|e| GraspError::Actuation(format!("Failed to publish tag name: {}", e)))
    }

    async fn command_arm(&mut self, pose: &ArmPose) -> Result<()> {
        self.sink
            .publish_arm(pose)
            .await
            .map_err(|e| GraspError::Actuation(format!("Failed to publish arm pose: {}", e)))?;
        self.pose = self.pose.merged(pose);
        Ok(())
    }

    async fn drive(&self, action: RobotAction) -> Result<()> {
        self.sink
            .publish_to_robot(action, false)
            .await
            .map_err(|e| GraspError::Actuation(format!("Failed to send {}: {}", action, e)))
    }

    async fn publish_transition(&self, from: MissionState, to: MissionState) {
        let event = MissionEvent {
            from,
            to,
            iteration: self.iterations,
            attempt: self.attempts,
            depth: self.slots.depth(),
            direction: self.slots.direction(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.telemetry.publish_event(&event).await {
            debug!("Failed to publish mission event: {}", e);
        }
    }
}
