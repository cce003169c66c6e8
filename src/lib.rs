//! Grasp Servo - closed-loop visual-servo grasping for a mobile arm
//!
//! This library turns continuously updated depth and direction estimates
//! into joint-angle and locomotion commands, walking the robot through
//! search, approach, precision approach and grasp. Perception and actuation
//! stay behind traits so the controller can be embedded with any transport
//! (ROS bridge, serial, Zenoh, a simulator).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use grasp_servo::{GraspConfig, GraspMission, SimConfig, SimulatedRig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rig = Arc::new(SimulatedRig::new(SimConfig::default()));
//!     let mission = GraspMission::new(GraspConfig::default(), rig.clone(), rig.clone())?;
//!
//!     let report = mission.run().await?;
//!     println!("Grasped after {} iterations", report.iterations);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **GraspMission**: explicit state machine owning the pose and the feeds
//! - **SensorFeed**: background pollers writing last-value slots
//! - **AngleAdjuster**: direction-to-joint-delta policy
//! - **interpolate**: midpoint transit between poses
//! - **Perception / CommandSink**: collaborator boundaries
//! - **TelemetryPublisher**: transport-agnostic mission events

pub mod actuation;
pub mod adjuster;
pub mod config;
pub mod error;
pub mod feed;
pub mod interpolator;
pub mod mission;
pub mod perception;
pub mod pose;
pub mod sim;
pub mod telemetry;

pub use actuation::{CommandSink, RobotAction};
pub use adjuster::AngleAdjuster;
pub use config::{
    AdjusterConfig, GraspConfig, InterpolationConfig, MissionConfig, PoseConfig, ThresholdConfig,
    TimingConfig,
};
pub use error::{GraspError, Result};
pub use feed::{SensorFeed, SensorSlots};
pub use interpolator::interpolate;
pub use mission::{GraspMission, MissionReport, MissionState};
pub use perception::{Direction, Perception, TagSignal};
pub use pose::{ArmPose, UNCHANGED};
pub use sim::{SimCommand, SimConfig, SimulatedRig};
pub use telemetry::{ConsoleTelemetry, MissionEvent, NoOpTelemetry, TelemetryPublisher};
