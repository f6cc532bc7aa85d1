//! Per-tick sensor snapshot.
//!
//! Distances are meters on the local plane; angles are degrees unless the
//! field name says otherwise. Every optional field that is `None` (or holds a
//! non-finite value) means "unavailable this tick" and is never read as zero.

use crate::geo::GeoCoord;

// ---------------------------------------------------------------------------
// Heading source selection
// ---------------------------------------------------------------------------

/// Preferred heading fusion strategy for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum HeadingSource {
    /// Bearing between consecutive fixes.
    #[default]
    Fix2Fix = 0,
    /// Course over ground, or IMU heading when one is fitted.
    Vtg = 1,
    /// Dual-antenna heading.
    Dual = 2,
}

impl HeadingSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fix2Fix => "Fix2Fix",
            Self::Vtg => "VTG",
            Self::Dual => "Dual",
        }
    }

    /// Parses the names used by settings files ("Fix", "VTG", "Dual").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Fix" | "Fix2Fix" | "fix" | "fix2fix" => Some(Self::Fix2Fix),
            "VTG" | "Vtg" | "vtg" => Some(Self::Vtg),
            "Dual" | "dual" => Some(Self::Dual),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GNSS quality (advisory)
// ---------------------------------------------------------------------------

/// GGA fix quality indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixQuality {
    Invalid,
    Gps,
    Differential,
    Pps,
    RtkFixed,
    RtkFloat,
    DeadReckoning,
    Other(u8),
}

impl FixQuality {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Invalid,
            1 => Self::Gps,
            2 => Self::Differential,
            3 => Self::Pps,
            4 => Self::RtkFixed,
            5 => Self::RtkFloat,
            6 => Self::DeadReckoning,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Invalid => 0,
            Self::Gps => 1,
            Self::Differential => 2,
            Self::Pps => 3,
            Self::RtkFixed => 4,
            Self::RtkFloat => 5,
            Self::DeadReckoning => 6,
            Self::Other(code) => code,
        }
    }

    pub fn is_rtk(self) -> bool {
        matches!(self, Self::RtkFixed | Self::RtkFloat)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Gps => "GPS",
            Self::Differential => "DGPS",
            Self::Pps => "PPS",
            Self::RtkFixed => "RTK fix",
            Self::RtkFloat => "RTK float",
            Self::DeadReckoning => "Dead reckoning",
            Self::Other(_) => "Unknown",
        }
    }
}

/// Advisory GNSS context. Surfaced for diagnostics; never gates fusion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GnssQuality {
    pub altitude_meters: Option<f64>,
    pub satellites_tracked: Option<u16>,
    pub fix_quality: Option<FixQuality>,
    pub hdop: Option<f64>,
    pub age_seconds: Option<f64>,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything known about the vehicle from external sensors for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorInputs {
    /// Antenna position before any correction.
    pub raw_fix_local: GeoCoord,
    pub speed_kmh: Option<f64>,
    /// VTG/RMC course over ground, 0..360.
    pub heading_true_deg: Option<f64>,
    /// Dual-antenna heading, 0..360.
    pub heading_dual_deg: Option<f64>,
    /// IMU heading, 0..360.
    pub imu_heading_deg: Option<f64>,
    /// Positive when the right side is down.
    pub imu_roll_deg: Option<f64>,
    /// Positive when heading increases (clockwise seen from above).
    pub imu_yaw_rate_deg_per_sec: Option<f64>,
    pub altitude_meters: Option<f64>,
    pub satellites_tracked: Option<u16>,
    pub fix_quality: Option<u8>,
    pub hdop: Option<f64>,
    pub age_seconds: Option<f64>,
    pub heading_source: HeadingSource,
    /// Elapsed time since the previous tick.
    pub delta_time_seconds: f64,
    /// Nominal GNSS update rate.
    pub gps_hz: f64,
}

impl SensorInputs {
    /// Snapshot with only the mandatory fields populated.
    pub fn new(raw_fix_local: GeoCoord, heading_source: HeadingSource) -> Self {
        Self {
            raw_fix_local,
            speed_kmh: None,
            heading_true_deg: None,
            heading_dual_deg: None,
            imu_heading_deg: None,
            imu_roll_deg: None,
            imu_yaw_rate_deg_per_sec: None,
            altitude_meters: None,
            satellites_tracked: None,
            fix_quality: None,
            hdop: None,
            age_seconds: None,
            heading_source,
            delta_time_seconds: 0.0,
            gps_hz: 0.0,
        }
    }

    pub fn with_timing(mut self, delta_time_seconds: f64, gps_hz: f64) -> Self {
        self.delta_time_seconds = delta_time_seconds;
        self.gps_hz = gps_hz;
        self
    }

    pub fn with_speed_kmh(mut self, speed: f64) -> Self {
        self.speed_kmh = Some(speed);
        self
    }

    pub fn with_heading_true_deg(mut self, deg: f64) -> Self {
        self.heading_true_deg = Some(deg);
        self
    }

    pub fn with_heading_dual_deg(mut self, deg: f64) -> Self {
        self.heading_dual_deg = Some(deg);
        self
    }

    pub fn with_imu_heading_deg(mut self, deg: f64) -> Self {
        self.imu_heading_deg = Some(deg);
        self
    }

    pub fn with_imu_roll_deg(mut self, deg: f64) -> Self {
        self.imu_roll_deg = Some(deg);
        self
    }

    pub fn with_imu_yaw_rate_deg_per_sec(mut self, rate: f64) -> Self {
        self.imu_yaw_rate_deg_per_sec = Some(rate);
        self
    }

    pub fn with_gnss(mut self, quality: GnssQuality) -> Self {
        self.altitude_meters = quality.altitude_meters;
        self.satellites_tracked = quality.satellites_tracked;
        self.fix_quality = quality.fix_quality.map(FixQuality::code);
        self.hdop = quality.hdop;
        self.age_seconds = quality.age_seconds;
        self
    }

    // Accessors below drop non-finite values so NaN never leaks into fusion.

    pub fn speed(&self) -> Option<f64> {
        finite(self.speed_kmh)
    }

    pub fn heading_true(&self) -> Option<f64> {
        finite(self.heading_true_deg)
    }

    pub fn heading_dual(&self) -> Option<f64> {
        finite(self.heading_dual_deg)
    }

    pub fn imu_heading(&self) -> Option<f64> {
        finite(self.imu_heading_deg)
    }

    pub fn imu_roll(&self) -> Option<f64> {
        finite(self.imu_roll_deg)
    }

    pub fn imu_yaw_rate(&self) -> Option<f64> {
        finite(self.imu_yaw_rate_deg_per_sec)
    }

    /// True when the tick carries a usable time step.
    pub fn has_valid_dt(&self) -> bool {
        self.delta_time_seconds > 0.0
    }

    pub fn gnss_quality(&self) -> GnssQuality {
        GnssQuality {
            altitude_meters: finite(self.altitude_meters),
            satellites_tracked: self.satellites_tracked,
            fix_quality: self.fix_quality.map(FixQuality::from_code),
            hdop: finite(self.hdop),
            age_seconds: finite(self.age_seconds),
        }
    }
}

#[inline]
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_optionals() {
        let inputs = SensorInputs::new(GeoCoord::new(1.0, 2.0), HeadingSource::Dual);
        assert!(inputs.speed().is_none());
        assert!(inputs.heading_true().is_none());
        assert!(inputs.heading_dual().is_none());
        assert!(inputs.imu_heading().is_none());
        assert!(inputs.imu_roll().is_none());
        assert!(inputs.imu_yaw_rate().is_none());
        assert_eq!(inputs.gnss_quality(), GnssQuality::default());
        assert!(!inputs.has_valid_dt());
    }

    #[test]
    fn test_zero_is_a_real_value() {
        let inputs = SensorInputs::new(GeoCoord::default(), HeadingSource::Vtg)
            .with_imu_roll_deg(0.0)
            .with_heading_true_deg(0.0);
        assert_eq!(inputs.imu_roll(), Some(0.0));
        assert_eq!(inputs.heading_true(), Some(0.0));
    }

    #[test]
    fn test_non_finite_optionals_read_as_absent() {
        let inputs = SensorInputs::new(GeoCoord::default(), HeadingSource::Vtg)
            .with_heading_true_deg(f64::NAN)
            .with_imu_roll_deg(f64::INFINITY)
            .with_speed_kmh(12.0);
        assert!(inputs.heading_true().is_none());
        assert!(inputs.imu_roll().is_none());
        assert_eq!(inputs.speed(), Some(12.0));
    }

    #[test]
    fn test_gnss_quality_roundtrip() {
        let quality = GnssQuality {
            altitude_meters: Some(650.0),
            satellites_tracked: Some(14),
            fix_quality: Some(FixQuality::RtkFixed),
            hdop: Some(0.7),
            age_seconds: Some(1.2),
        };
        let inputs = SensorInputs::new(GeoCoord::default(), HeadingSource::Fix2Fix).with_gnss(quality);
        assert_eq!(inputs.fix_quality, Some(4));
        assert_eq!(inputs.gnss_quality(), quality);
    }

    #[test]
    fn test_fix_quality_codes() {
        assert_eq!(FixQuality::from_code(4), FixQuality::RtkFixed);
        assert!(FixQuality::from_code(5).is_rtk());
        assert!(!FixQuality::from_code(2).is_rtk());
        assert_eq!(FixQuality::from_code(9), FixQuality::Other(9));
        assert_eq!(FixQuality::from_code(9).label(), "Unknown");
    }

    #[test]
    fn test_heading_source_names() {
        assert_eq!(HeadingSource::from_name("Fix"), Some(HeadingSource::Fix2Fix));
        assert_eq!(HeadingSource::from_name("VTG"), Some(HeadingSource::Vtg));
        assert_eq!(HeadingSource::from_name("Dual"), Some(HeadingSource::Dual));
        assert_eq!(HeadingSource::from_name("compass"), None);
        assert_eq!(HeadingSource::default(), HeadingSource::Fix2Fix);
        assert_eq!(HeadingSource::Vtg.label(), "VTG");
    }
}
