use crate::angle::{angle_diff, PI_BY_2};
use crate::geo::GeoCoord;
use crate::outputs::ReverseStatus;

/// Last fix a direction was classified from, carried between ticks.
///
/// Travel is measured from here rather than from the previous tick, so a
/// slow vehicle whose per-tick step is below the motion threshold still
/// accumulates enough displacement to be classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionAnchor {
    pub fix: GeoCoord,
    /// Status classified at `fix`.
    pub status: ReverseStatus,
    /// Ticks since `fix` was taken.
    pub ticks_held: u32,
}

impl MotionAnchor {
    pub fn new(fix: GeoCoord, status: ReverseStatus) -> Self {
        Self {
            fix,
            status,
            ticks_held: 0,
        }
    }
}

/// Classifies motion direction by comparing the fused heading against the
/// direction the antenna actually travelled.
#[derive(Debug, Clone, Copy)]
pub struct ReverseClassifier {
    min_motion_distance_m: f64,
    hold_ticks: u32,
}

impl ReverseClassifier {
    pub fn new(min_motion_distance_m: f64, hold_ticks: u32) -> Self {
        Self {
            min_motion_distance_m: min_motion_distance_m.max(0.0),
            hold_ticks,
        }
    }

    /// Returns this tick's status and the anchor for the next tick.
    pub fn classify(
        &self,
        heading: Option<f64>,
        anchor: Option<MotionAnchor>,
        current_fix: GeoCoord,
    ) -> (ReverseStatus, MotionAnchor) {
        let Some(anchor) = anchor else {
            return (ReverseStatus::Unknown, MotionAnchor::new(current_fix, ReverseStatus::Unknown));
        };

        let travel = anchor
            .fix
            .bearing_to(current_fix)
            .filter(|_| anchor.fix.distance(current_fix) >= self.min_motion_distance_m);
        let Some(travel) = travel else {
            // still inside the threshold: keep the last direction for a while
            let held = MotionAnchor {
                ticks_held: anchor.ticks_held.saturating_add(1),
                ..anchor
            };
            let status = if held.ticks_held <= self.hold_ticks {
                anchor.status
            } else {
                ReverseStatus::Unknown
            };
            return (status, held);
        };

        let status = match heading {
            None => ReverseStatus::Unknown,
            Some(heading) if angle_diff(heading, travel) <= PI_BY_2 => ReverseStatus::Forward,
            Some(_) => ReverseStatus::Reverse,
        };
        (status, MotionAnchor::new(current_fix, status))
    }
}

impl Default for ReverseClassifier {
    fn default() -> Self {
        Self::new(0.05, 10)
    }
}
