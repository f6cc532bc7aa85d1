//! Antenna-to-ground correction.
//!
//! The antenna sits above and possibly ahead of / beside the point that
//! steering cares about. [`PositionCorrector`] removes the lever arm in the
//! heading frame and then the lateral displacement caused by the vehicle
//! leaning. [`RollConditioner`] turns the raw IMU roll into the value used for
//! that second step.

use nalgebra::{Rotation2, Vector2};

use crate::angle::to_radians;
use crate::config::{LeverArm, RollConfig};
use crate::geo::GeoCoord;

// ---------------------------------------------------------------------------
// Roll conditioning
// ---------------------------------------------------------------------------

/// Highest smoothing weight accepted; 1.0 would freeze the roll forever.
const MAX_ROLL_FILTER: f64 = 0.999;

#[derive(Debug, Clone, Copy)]
pub struct RollConditioner {
    invert: bool,
    roll_zero_deg: f64,
    filter: f64,
}

impl RollConditioner {
    pub fn new(config: &RollConfig) -> Self {
        Self {
            invert: config.invert,
            roll_zero_deg: config.roll_zero_deg,
            filter: config.filter.clamp(0.0, MAX_ROLL_FILTER),
        }
    }

    /// Conditioned roll (deg) for this tick, or `None` when the IMU gave none.
    ///
    /// `previous` is the last conditioned value; it seeds the smoothing and is
    /// otherwise untouched, so a dropout does not reset the filter.
    pub fn condition(&self, previous: Option<f64>, raw_deg: Option<f64>) -> Option<f64> {
        let raw = raw_deg?;
        let mut roll = if self.invert { -raw } else { raw };
        roll -= self.roll_zero_deg;

        Some(match previous {
            Some(prev) if self.filter > 0.0 => prev * self.filter + roll * (1.0 - self.filter),
            _ => roll,
        })
    }
}

// ---------------------------------------------------------------------------
// Lever arm + roll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct PositionCorrector {
    lever_arm: LeverArm,
    antenna_height_m: f64,
}

impl PositionCorrector {
    pub fn new(lever_arm: LeverArm, antenna_height_m: f64) -> Self {
        Self {
            lever_arm,
            antenna_height_m,
        }
    }

    /// Moves the antenna fix to the ground reference point.
    ///
    /// Without a heading neither correction can be oriented and the fix is
    /// returned as-is. Without roll only the lever arm is removed.
    pub fn correct(&self, antenna: GeoCoord, heading: Option<f64>, roll_deg: Option<f64>) -> GeoCoord {
        let Some(heading) = heading else {
            return antenna;
        };

        // Body frame: x = right, y = forward. Compass heading turns clockwise.
        let body_to_local = Rotation2::new(-heading);

        let mut body = Vector2::new(self.lever_arm.right_m, self.lever_arm.forward_m);
        if let Some(roll) = roll_deg {
            // right side down leans the antenna to the right
            body.x += libm::sin(to_radians(roll)) * self.antenna_height_m;
        }

        GeoCoord::from_vector(antenna.to_vector() - body_to_local * body)
    }
}
