use crate::geo::GeoCoord;
use crate::heading::HeadingOrigin;
use crate::inputs::GnssQuality;

/// Motion direction relative to the fused heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ReverseStatus {
    #[default]
    Unknown = 0,
    Forward = 1,
    Reverse = 2,
}

impl ReverseStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Forward => "Forward",
            Self::Reverse => "Reverse",
        }
    }
}

/// What happened inside a tick. Informational only; steering reads the pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickDiagnostics {
    pub heading_origin: HeadingOrigin,
    /// Yaw-rate consistency check pulled the heading toward the IMU prediction.
    pub yaw_rate_blended: bool,
    /// dt <= 0: previous outputs were repeated.
    pub degenerate_tick: bool,
    /// Raw fix moved farther than the configured jump alarm distance.
    pub fix_jump: bool,
    /// Speed implied by fix-to-fix travel (km/h), when dt allows it.
    pub fix2fix_speed_kmh: Option<f64>,
    pub gnss: GnssQuality,
    /// Differential age exceeded the configured alarm threshold.
    pub age_alarm: bool,
}

/// Pose handed to steering once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositioningOutputs {
    /// Ground reference point after antenna and roll correction.
    pub corrected_fix_local: GeoCoord,
    /// Vehicle heading in `[0, 2π)`.
    pub fix_heading_rad: f64,
    pub reverse_status: ReverseStatus,
    pub diagnostics: TickDiagnostics,
}

impl PositioningOutputs {
    pub fn fix_heading_deg(&self) -> f64 {
        crate::angle::to_degrees(self.fix_heading_rad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_status_default_and_labels() {
        assert_eq!(ReverseStatus::default(), ReverseStatus::Unknown);
        assert_eq!(ReverseStatus::Forward.label(), "Forward");
        assert_eq!(ReverseStatus::Reverse as u8, 2);
    }

    #[test]
    fn test_outputs_default() {
        let out = PositioningOutputs::default();
        assert_eq!(out.corrected_fix_local, GeoCoord::new(0.0, 0.0));
        assert_eq!(out.fix_heading_rad, 0.0);
        assert_eq!(out.reverse_status, ReverseStatus::Unknown);
        assert_eq!(out.diagnostics.heading_origin, HeadingOrigin::Unavailable);
        assert!(!out.diagnostics.degenerate_tick);
    }

    #[test]
    fn test_heading_degrees() {
        let out = PositioningOutputs {
            fix_heading_rad: core::f64::consts::PI,
            ..Default::default()
        };
        assert!((out.fix_heading_deg() - 180.0).abs() < 1e-9);
    }
}
