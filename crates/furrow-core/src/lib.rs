//! # Furrow Core
//!
//! Per-tick positioning pipeline for ground vehicles, designed for `no_std`
//! targets. Each measurement tick the [`PositioningEngine`] turns a
//! [`SensorInputs`] snapshot into a [`PositioningOutputs`] pose:
//! - Heading fusion across fix-to-fix, VTG, IMU and dual-antenna sources
//! - Forward/reverse motion classification
//! - Antenna lever-arm and roll correction to the ground reference point
//! - Local-plane projection and the corrected-position wire frame
//!
//! # Features
//! - `std`: Enable standard library support
//! - `serde`: Serialize/deserialize snapshots, outputs and configuration
//! - Default: `no_std` with no allocations

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod angle;
pub mod config;
pub mod correction;
pub mod distance;
pub mod engine;
pub mod error;
pub mod frame;
pub mod geo;
pub mod heading;
pub mod inputs;
pub mod outputs;
pub mod reverse;

// Re-export core types
pub use config::{HeadingConfig, LeverArm, PositioningConfig, RollConfig};
pub use engine::{EnginePhase, PositioningEngine};
pub use error::{InputFault, PositioningError};
pub use frame::{CorrectedPositionFrame, FrameError};
pub use geo::{GeoCoord, LocalPlane, Wgs84};
pub use heading::HeadingOrigin;
pub use inputs::{FixQuality, GnssQuality, HeadingSource, SensorInputs};
pub use outputs::{PositioningOutputs, ReverseStatus, TickDiagnostics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
