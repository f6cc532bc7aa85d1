//! Parameter definitions for scenario runs and sweeps.

/// Parameter specification with bounds and step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Human-readable label.
    pub label: &'static str,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Default sweep increment.
    pub step: f64,
}

impl ParamSpec {
    /// Create a new parameter specification.
    pub const fn new(label: &'static str, min: f64, max: f64, step: f64) -> Self {
        Self {
            label,
            min,
            max,
            step,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Antenna mount and IMU roll settings of the estimator.
pub mod vehicle {
    use super::ParamSpec;

    pub const ANTENNA_FORWARD: ParamSpec = ParamSpec::new("Antenna Forward (m)", -5.0, 5.0, 0.05);
    pub const ANTENNA_RIGHT: ParamSpec = ParamSpec::new("Antenna Right (m)", -3.0, 3.0, 0.05);
    pub const ANTENNA_HEIGHT: ParamSpec = ParamSpec::new("Antenna Height (m)", 0.0, 6.0, 0.05);
    pub const ROLL_ZERO: ParamSpec = ParamSpec::new("Roll Zero (°)", -10.0, 10.0, 0.1);
    pub const ROLL_FILTER: ParamSpec = ParamSpec::new("Roll Filter", 0.0, 0.99, 0.01);
}

/// Heading fusion settings.
pub mod heading {
    use super::ParamSpec;

    pub const MIN_STEP: ParamSpec = ParamSpec::new("Min Step (m)", 0.0, 2.0, 0.01);
    pub const DUAL_OFFSET: ParamSpec = ParamSpec::new("Dual Offset (°)", -180.0, 180.0, 0.5);
    pub const YAW_RATE_TOLERANCE: ParamSpec = ParamSpec::new("Yaw Rate Tol. (°/s)", 0.5, 90.0, 0.5);
    pub const YAW_RATE_BLEND: ParamSpec = ParamSpec::new("Yaw Rate Blend", 0.0, 1.0, 0.05);
    pub const MAX_TICK_PERIODS: ParamSpec = ParamSpec::new("Max Tick Periods", 1.0, 50.0, 1.0);
}

/// Simulated receiver and IMU.
pub mod sensors {
    use super::ParamSpec;

    pub const GPS_HZ: ParamSpec = ParamSpec::new("GPS Hz", 1.0, 20.0, 1.0);
    pub const GPS_NOISE: ParamSpec = ParamSpec::new("GPS Noise (m)", 0.0, 2.0, 0.005);
    pub const HEADING_NOISE: ParamSpec = ParamSpec::new("Heading Noise (°)", 0.0, 10.0, 0.1);
    pub const ROLL_NOISE: ParamSpec = ParamSpec::new("Roll Noise (°)", 0.0, 5.0, 0.1);
    pub const DROPOUT: ParamSpec = ParamSpec::new("Dropout Prob.", 0.0, 1.0, 0.05);
    pub const NOISE_SCALE: ParamSpec = ParamSpec::new("Noise Scale", 0.0, 10.0, 0.1);
}

/// Every parameter a sweep can vary, by the name used on the command line.
pub const SWEEP_PARAMS: [(&str, ParamSpec); 16] = [
    ("antenna_forward", vehicle::ANTENNA_FORWARD),
    ("antenna_right", vehicle::ANTENNA_RIGHT),
    ("antenna_height", vehicle::ANTENNA_HEIGHT),
    ("roll_zero", vehicle::ROLL_ZERO),
    ("roll_filter", vehicle::ROLL_FILTER),
    ("min_step", heading::MIN_STEP),
    ("dual_offset", heading::DUAL_OFFSET),
    ("yaw_rate_tolerance", heading::YAW_RATE_TOLERANCE),
    ("yaw_rate_blend", heading::YAW_RATE_BLEND),
    ("max_tick_periods", heading::MAX_TICK_PERIODS),
    ("gps_hz", sensors::GPS_HZ),
    ("gps_noise", sensors::GPS_NOISE),
    ("heading_noise", sensors::HEADING_NOISE),
    ("roll_noise", sensors::ROLL_NOISE),
    ("dropout", sensors::DROPOUT),
    ("noise_scale", sensors::NOISE_SCALE),
];

/// Look up a sweepable parameter by name.
pub fn param_spec(name: &str) -> Option<ParamSpec> {
    SWEEP_PARAMS
        .iter()
        .find(|(param, _)| *param == name)
        .map(|(_, spec)| *spec)
}
