//! Error types for grasp missions

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraspError>;

#[derive(Error, Debug)]
pub enum GraspError {
    #[error("Actuation failed: {0}")]
    Actuation(String),

    #[error("Invalid pose: {0}")]
    Pose(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Grasp attempts exhausted after {0} tries")]
    AttemptsExhausted(u32),

    #[error("Tokio task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
