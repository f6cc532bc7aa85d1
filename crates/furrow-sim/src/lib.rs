//! Furrow Simulation Library
//!
//! Drives a kinematic vehicle along a route, synthesizes the receiver and IMU
//! snapshots it would produce, and scores the positioning engine against the
//! ground truth.

use thiserror::Error;

pub mod params;
pub mod replay;
pub mod sensor;
pub mod sim;

// Re-export main types
pub use params::*;
pub use replay::{evaluate, run_engine, run_scenario, ReplayResult, ReplayStats, ScenarioConfig, ScenarioRun};
pub use sensor::{generate_sensor_data, SensorConfig, SensorData};
pub use sim::{simulate_drive, DriveParams, Segment, SimResult};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown parameter: {0}")]
    UnknownParam(String),
    #[error("{name} = {value} is outside its allowed range")]
    OutOfRange { name: String, value: f64 },
    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),
}
