// ---------------------------------------------------------------------------
// Positioning configuration
// ---------------------------------------------------------------------------
//
// Constructor-time parameters owned by the settings layer. `Default` gives a
// vehicle with no antenna geometry, so corrections are the identity until the
// caller supplies real measurements.

/// Antenna mount relative to the vehicle's ground reference point (pivot).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LeverArm {
    /// Meters the antenna sits ahead of the reference point (negative = behind).
    pub forward_m: f64,
    /// Meters the antenna sits right of the centerline (negative = left).
    pub right_m: f64,
}

impl LeverArm {
    pub const fn new(forward_m: f64, right_m: f64) -> Self {
        Self { forward_m, right_m }
    }

    pub fn is_zero(&self) -> bool {
        self.forward_m == 0.0 && self.right_m == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RollConfig {
    /// Antenna height above ground (m); the lever for tilt compensation.
    pub antenna_height_m: f64,
    /// Roll reading when the vehicle stands level (deg).
    pub roll_zero_deg: f64,
    /// Flip the sign of the IMU roll (IMU mounted backwards).
    pub invert: bool,
    /// Smoothing weight on the previous roll, 0.0 (none) to just below 1.0.
    pub filter: f64,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            antenna_height_m: 0.0,
            roll_zero_deg: 0.0,
            invert: false,
            filter: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeadingConfig {
    /// Minimum fix-to-fix travel (m) before a bearing is trusted.
    pub min_step_distance_m: f64,
    /// Flip the fix-to-fix bearing when the vehicle backs up.
    pub reverse_detection: bool,
    /// Added to the dual-antenna heading (deg).
    pub dual_heading_offset_deg: f64,
    /// Allowed mismatch between implied and measured yaw rate (deg/s).
    /// `None` disables yaw-rate blending.
    pub yaw_rate_tolerance_deg_per_sec: Option<f64>,
    /// Fraction of the way toward the yaw-rate prediction, 0.0..=1.0.
    pub yaw_rate_blend_weight: f64,
    /// Upper bound on dt used for integration, in nominal GNSS periods.
    pub max_tick_periods: f64,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            min_step_distance_m: 0.05,
            reverse_detection: true,
            dual_heading_offset_deg: 0.0,
            yaw_rate_tolerance_deg_per_sec: None,
            yaw_rate_blend_weight: 0.5,
            max_tick_periods: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PositioningConfig {
    pub lever_arm: LeverArm,
    pub roll: RollConfig,
    pub heading: HeadingConfig,
    /// Travel (m) below which motion direction is not observable.
    pub min_motion_distance_m: f64,
    /// Ticks a classified direction is kept while the travel since the last
    /// classification is still below `min_motion_distance_m`. After that the
    /// vehicle counts as stopped.
    pub motion_hold_ticks: u32,
    /// Raw fix jump (m) that raises an alarm. `None` disables the check.
    pub jump_alarm_distance_m: Option<f64>,
    /// Differential age (s) above which the correction stream is considered stale.
    pub age_alarm_seconds: f64,
}

impl Default for PositioningConfig {
    fn default() -> Self {
        Self {
            lever_arm: LeverArm::default(),
            roll: RollConfig::default(),
            heading: HeadingConfig::default(),
            min_motion_distance_m: 0.05,
            motion_hold_ticks: 10,
            jump_alarm_distance_m: None,
            age_alarm_seconds: 20.0,
        }
    }
}
