//! Grasp Simulator
//!
//! Runs one complete grasp mission against the simulated rig:
//! - Loads the controller configuration
//! - Places a target at the requested distance and bearing
//! - Drives search, approach and grasp to completion
//! - Prints the mission report as JSON

use grasp_servo::{ConsoleTelemetry, GraspConfig, GraspMission, SimConfig, SimulatedRig};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grasp_sim")]
#[command(about = "Visual-servo grasp controller - simulated mission runner")]
#[command(version)]
struct Args {
    /// Path to the controller configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Tag to search for (overrides the configuration)
    #[arg(short, long)]
    tag: Option<String>,

    /// Initial distance to the target in meters
    #[arg(long, default_value_t = 1.0)]
    distance: f64,

    /// Initial target bearing in degrees (positive is left)
    #[arg(long, default_value_t = 60.0)]
    bearing: f64,

    /// Number of grasps the simulator lets miss
    #[arg(long, default_value_t = 0)]
    missed_grasps: u32,

    /// Give up after this many failed grasps
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Print mission transitions as JSON on stdout
    #[arg(long)]
    telemetry: bool,
}

impl Args {
    fn get_config_path(&self) -> Option<String> {
        self.config
            .clone()
            .or_else(|| std::env::var("GRASP_CONFIG_PATH").ok())
    }

    fn load_config(&self) -> Result<GraspConfig> {
        let mut config = match self.get_config_path() {
            Some(path) => {
                info!("Using config: {}", path);
                GraspConfig::load_from_path(&path).context("Failed to load configuration")?
            }
            None => {
                info!("Using built-in configuration defaults");
                GraspConfig::default()
            }
        };

        if let Some(tag) = &self.tag {
            config.mission.tag_name = tag.clone();
        }
        if self.max_attempts.is_some() {
            config.mission.max_grasp_attempts = self.max_attempts;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    info!("Visual-Servo Grasp Simulator");
    info!("{}", "=".repeat(50));

    let config = args.load_config()?;

    let rig = Arc::new(SimulatedRig::new(SimConfig {
        tag_name: config.mission.tag_name.clone(),
        distance: args.distance,
        bearing_deg: args.bearing,
        missed_grasps: args.missed_grasps,
        ..SimConfig::default()
    }));

    let mut mission = GraspMission::new(config, rig.clone(), rig.clone())
        .context("Failed to create grasp mission")?;
    if args.telemetry {
        mission = mission.with_telemetry(Arc::new(ConsoleTelemetry::new()));
    }

    match mission.run().await {
        Ok(report) => {
            info!("Target held: {}", rig.is_holding());
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("Mission failed: {}", e);
            Err(e.into())
        }
    }
}
