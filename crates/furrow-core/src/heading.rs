//! Heading resolver.
//!
//! Picks one heading per tick from the selected [`HeadingSource`]. Sensor
//! sources that are missing this tick fall back to the fix-to-fix bearing,
//! and the fix-to-fix bearing itself falls back to holding the previous
//! heading when the vehicle has not moved far enough (or dt is unusable).

use core::f64::consts::PI;

use crate::angle::{angle_diff, normalize_positive, shortest_delta, to_degrees, to_radians, PI_BY_2};
use crate::config::HeadingConfig;
use crate::geo::GeoCoord;
use crate::inputs::{HeadingSource, SensorInputs};

/// Where the tick's heading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeadingOrigin {
    /// No heading established yet (reported as 0 rad).
    #[default]
    Unavailable,
    FixToFix,
    GnssCourse,
    Imu,
    DualAntenna,
    /// Previous heading carried over.
    Held,
}

impl HeadingOrigin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unavailable => "Unavailable",
            Self::FixToFix => "Fix2Fix",
            Self::GnssCourse => "VTG",
            Self::Imu => "IMU",
            Self::DualAntenna => "Dual",
            Self::Held => "Held",
        }
    }
}

/// What the resolver knows about the previous tick.
#[derive(Debug, Clone, Copy)]
pub struct HeadingRequest<'a> {
    pub inputs: &'a SensorInputs,
    /// Antenna fix of the previous tick.
    pub anchor_fix: Option<GeoCoord>,
    /// Fused heading of the previous tick, once established.
    pub previous_heading: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedHeading {
    /// Fused heading in `[0, 2π)`, `None` until one can be established.
    pub heading: Option<f64>,
    pub origin: HeadingOrigin,
    pub yaw_rate_blended: bool,
}

impl ResolvedHeading {
    fn held(previous: Option<f64>) -> Self {
        Self {
            heading: previous,
            origin: if previous.is_some() {
                HeadingOrigin::Held
            } else {
                HeadingOrigin::Unavailable
            },
            yaw_rate_blended: false,
        }
    }

    fn measured(heading: f64, origin: HeadingOrigin) -> Self {
        Self {
            heading: Some(normalize_positive(heading)),
            origin,
            yaw_rate_blended: false,
        }
    }

    /// Heading as reported downstream: 0 rad while none is established.
    pub fn heading_or_zero(&self) -> f64 {
        self.heading.unwrap_or(0.0)
    }
}

pub struct HeadingResolver {
    config: HeadingConfig,
}

impl HeadingResolver {
    pub fn new(config: HeadingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeadingConfig {
        &self.config
    }

    pub fn resolve(&self, request: &HeadingRequest<'_>) -> ResolvedHeading {
        let inputs = request.inputs;

        let candidate = match inputs.heading_source {
            HeadingSource::Fix2Fix => self.fix_to_fix(request),
            HeadingSource::Vtg => {
                let sensor = inputs
                    .imu_heading()
                    .map(|deg| (deg, HeadingOrigin::Imu))
                    .or_else(|| inputs.heading_true().map(|deg| (deg, HeadingOrigin::GnssCourse)));
                match sensor {
                    Some((deg, origin)) => ResolvedHeading::measured(to_radians(deg), origin),
                    None => {
                        tracing::trace!("no VTG or IMU heading, falling back to fix-to-fix");
                        self.fix_to_fix(request)
                    }
                }
            }
            HeadingSource::Dual => match inputs.heading_dual() {
                Some(deg) => ResolvedHeading::measured(
                    to_radians(deg + self.config.dual_heading_offset_deg),
                    HeadingOrigin::DualAntenna,
                ),
                None => {
                    tracing::trace!("no dual-antenna heading, falling back to fix-to-fix");
                    self.fix_to_fix(request)
                }
            },
        };

        self.check_yaw_rate(candidate, request)
    }

    fn fix_to_fix(&self, request: &HeadingRequest<'_>) -> ResolvedHeading {
        let inputs = request.inputs;

        // zero or negative dt: displacement says nothing about direction
        if !inputs.has_valid_dt() {
            return ResolvedHeading::held(request.previous_heading);
        }

        let Some(anchor) = request.anchor_fix else {
            return ResolvedHeading::held(None);
        };

        let current = inputs.raw_fix_local;
        if !self.step_reached(anchor, current) {
            return ResolvedHeading::held(request.previous_heading);
        }

        let Some(bearing) = anchor.bearing_to(current) else {
            return ResolvedHeading::held(request.previous_heading);
        };

        match request.previous_heading {
            Some(previous) if self.config.reverse_detection && angle_diff(bearing, previous) > PI_BY_2 => {
                // Travelling against the body heading: the vehicle is backing up.
                ResolvedHeading::measured(bearing + PI, HeadingOrigin::FixToFix)
            }
            _ => ResolvedHeading::measured(bearing, HeadingOrigin::FixToFix),
        }
    }

    /// Anchor for the next tick. It moves to the current fix only once the
    /// travel from it reaches `min_step_distance_m`, so slow steps accumulate
    /// instead of being discarded one tick at a time.
    pub fn next_anchor(&self, anchor: Option<GeoCoord>, inputs: &SensorInputs) -> GeoCoord {
        let current = inputs.raw_fix_local;
        match anchor {
            Some(anchor) if !inputs.has_valid_dt() || !self.step_reached(anchor, current) => anchor,
            _ => current,
        }
    }

    fn step_reached(&self, anchor: GeoCoord, current: GeoCoord) -> bool {
        anchor.distance(current) >= self.config.min_step_distance_m
    }

    fn check_yaw_rate(&self, candidate: ResolvedHeading, request: &HeadingRequest<'_>) -> ResolvedHeading {
        let Some(tolerance) = self.config.yaw_rate_tolerance_deg_per_sec else {
            return candidate;
        };
        if candidate.origin == HeadingOrigin::Held {
            return candidate;
        }

        let inputs = request.inputs;
        let (Some(heading), Some(previous), Some(yaw_rate)) =
            (candidate.heading, request.previous_heading, inputs.imu_yaw_rate())
        else {
            return candidate;
        };
        let Some(dt) = self.bounded_dt(inputs) else {
            return candidate;
        };

        let implied = shortest_delta(previous, heading) / dt;
        let measured = to_radians(yaw_rate);
        if libm::fabs(implied - measured) <= to_radians(tolerance) {
            return candidate;
        }

        let predicted = previous + measured * dt;
        let weight = self.config.yaw_rate_blend_weight.clamp(0.0, 1.0);
        let blended = normalize_positive(heading + weight * shortest_delta(heading, predicted));
        tracing::debug!(
            implied_dps = to_degrees(implied),
            measured_dps = yaw_rate,
            "heading rate disagrees with IMU yaw rate, blending"
        );

        ResolvedHeading {
            heading: Some(blended),
            origin: candidate.origin,
            yaw_rate_blended: true,
        }
    }

    /// dt capped at `max_tick_periods` nominal GNSS periods.
    fn bounded_dt(&self, inputs: &SensorInputs) -> Option<f64> {
        if !inputs.has_valid_dt() {
            return None;
        }
        let dt = inputs.delta_time_seconds;
        if inputs.gps_hz > 0.0 && self.config.max_tick_periods > 0.0 {
            Some(dt.min(self.config.max_tick_periods / inputs.gps_hz))
        } else {
            Some(dt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn resolver() -> HeadingResolver {
        HeadingResolver::new(HeadingConfig::default())
    }

    fn tick(e: f64, n: f64, source: HeadingSource) -> SensorInputs {
        SensorInputs::new(GeoCoord::new(e, n), source).with_timing(0.1, 10.0)
    }

    #[test]
    fn test_first_fix_has_no_heading() {
        let inputs = tick(10.0, 20.0, HeadingSource::Fix2Fix);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: None,
            previous_heading: None,
        });
        assert!(resolved.heading.is_none());
        assert_eq!(resolved.origin, HeadingOrigin::Unavailable);
        assert_eq!(resolved.heading_or_zero(), 0.0);
    }

    #[test]
    fn test_fix_to_fix_bearing_east() {
        let inputs = tick(1.0, 0.0, HeadingSource::Fix2Fix);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: None,
        });
        assert_eq!(resolved.origin, HeadingOrigin::FixToFix);
        assert_abs_diff_eq!(resolved.heading.unwrap(), PI_BY_2, epsilon = 1e-12);
    }

    #[test]
    fn test_small_step_holds_previous() {
        let inputs = tick(0.01, 0.0, HeadingSource::Fix2Fix);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: Some(1.0),
        });
        assert_eq!(resolved.origin, HeadingOrigin::Held);
        assert_eq!(resolved.heading, Some(1.0));
    }

    #[test]
    fn test_anchor_waits_for_minimum_step() {
        let resolver = resolver();
        let origin = GeoCoord::new(0.0, 0.0);

        let short = tick(0.03, 0.0, HeadingSource::Fix2Fix);
        assert_eq!(resolver.next_anchor(Some(origin), &short), origin);

        let long = tick(0.06, 0.0, HeadingSource::Fix2Fix);
        assert_eq!(resolver.next_anchor(Some(origin), &long), GeoCoord::new(0.06, 0.0));
        assert_eq!(resolver.next_anchor(None, &short), GeoCoord::new(0.03, 0.0));

        // a degenerate tick never moves the anchor
        let stalled = long.with_timing(0.0, 10.0);
        assert_eq!(resolver.next_anchor(Some(origin), &stalled), origin);
    }

    #[test]
    fn test_slow_steps_accumulate_into_a_bearing() {
        // 3 km/h at 20 Hz: about 4 cm per tick, below the 5 cm minimum step
        let resolver = resolver();
        let step = 3.0 / 3.6 / 20.0;
        let mut anchor = None;
        let mut heading = None;
        for k in 0..20 {
            let inputs = SensorInputs::new(GeoCoord::new(k as f64 * step, 0.0), HeadingSource::Fix2Fix)
                .with_timing(0.05, 20.0);
            let resolved = resolver.resolve(&HeadingRequest {
                inputs: &inputs,
                anchor_fix: anchor,
                previous_heading: heading,
            });
            if k >= 2 {
                assert_abs_diff_eq!(resolved.heading.unwrap(), PI_BY_2, epsilon = 1e-9);
            }
            heading = resolved.heading;
            anchor = Some(resolver.next_anchor(anchor, &inputs));
        }
    }

    #[test]
    fn test_non_positive_dt_holds_previous() {
        let inputs = SensorInputs::new(GeoCoord::new(5.0, 5.0), HeadingSource::Fix2Fix).with_timing(0.0, 10.0);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: Some(2.0),
        });
        assert_eq!(resolved.heading, Some(2.0));
        assert_eq!(resolved.origin, HeadingOrigin::Held);

        let inputs = inputs.with_timing(-0.1, 10.0);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: None,
        });
        assert!(resolved.heading.is_none());
    }

    #[test]
    fn test_backing_up_flips_bearing() {
        // heading north, but moved south
        let inputs = tick(0.0, -1.0, HeadingSource::Fix2Fix);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: Some(0.0),
        });
        assert_abs_diff_eq!(resolved.heading.unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reverse_detection_disabled_follows_bearing() {
        let resolver = HeadingResolver::new(HeadingConfig {
            reverse_detection: false,
            ..HeadingConfig::default()
        });
        let inputs = tick(0.0, -1.0, HeadingSource::Fix2Fix);
        let resolved = resolver.resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: Some(0.0),
        });
        assert_abs_diff_eq!(resolved.heading.unwrap(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_vtg_prefers_imu_then_course() {
        let inputs = tick(0.0, 0.0, HeadingSource::Vtg)
            .with_imu_heading_deg(90.0)
            .with_heading_true_deg(180.0);
        let request = HeadingRequest {
            inputs: &inputs,
            anchor_fix: None,
            previous_heading: None,
        };
        let resolved = resolver().resolve(&request);
        assert_eq!(resolved.origin, HeadingOrigin::Imu);
        assert_abs_diff_eq!(to_degrees(resolved.heading.unwrap()), 90.0, epsilon = 1e-9);

        let inputs = tick(0.0, 0.0, HeadingSource::Vtg).with_heading_true_deg(180.0);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            ..request
        });
        assert_eq!(resolved.origin, HeadingOrigin::GnssCourse);
        assert_abs_diff_eq!(resolved.heading.unwrap(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_vtg_falls_back_to_fix_to_fix() {
        let inputs = tick(0.0, 2.0, HeadingSource::Vtg);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: None,
        });
        assert_eq!(resolved.origin, HeadingOrigin::FixToFix);
        assert_abs_diff_eq!(resolved.heading.unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dual_heading_with_offset_wraps() {
        let resolver = HeadingResolver::new(HeadingConfig {
            dual_heading_offset_deg: 20.0,
            ..HeadingConfig::default()
        });
        let inputs = tick(0.0, 0.0, HeadingSource::Dual).with_heading_dual_deg(350.0);
        let resolved = resolver.resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: None,
            previous_heading: None,
        });
        assert_eq!(resolved.origin, HeadingOrigin::DualAntenna);
        assert_abs_diff_eq!(to_degrees(resolved.heading.unwrap()), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dual_falls_back_to_fix_to_fix() {
        let inputs = tick(-3.0, 0.0, HeadingSource::Dual);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: Some(GeoCoord::new(0.0, 0.0)),
            previous_heading: None,
        });
        assert_eq!(resolved.origin, HeadingOrigin::FixToFix);
        assert_abs_diff_eq!(to_degrees(resolved.heading.unwrap()), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_rate_blending_disabled_by_default() {
        let inputs = tick(0.0, 0.0, HeadingSource::Dual)
            .with_heading_dual_deg(45.0)
            .with_imu_yaw_rate_deg_per_sec(0.0);
        let resolved = resolver().resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: None,
            previous_heading: Some(0.0),
        });
        assert!(!resolved.yaw_rate_blended);
        assert_abs_diff_eq!(to_degrees(resolved.heading.unwrap()), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_rate_blending_pulls_toward_prediction() {
        let resolver = HeadingResolver::new(HeadingConfig {
            yaw_rate_tolerance_deg_per_sec: Some(10.0),
            yaw_rate_blend_weight: 0.5,
            ..HeadingConfig::default()
        });
        // 20° jump in 0.1 s implies 200°/s; IMU says the vehicle is not turning
        let inputs = tick(0.0, 0.0, HeadingSource::Dual)
            .with_heading_dual_deg(20.0)
            .with_imu_yaw_rate_deg_per_sec(0.0);
        let resolved = resolver.resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: None,
            previous_heading: Some(0.0),
        });
        assert!(resolved.yaw_rate_blended);
        assert_abs_diff_eq!(to_degrees(resolved.heading.unwrap()), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_rate_within_tolerance_is_untouched() {
        let resolver = HeadingResolver::new(HeadingConfig {
            yaw_rate_tolerance_deg_per_sec: Some(10.0),
            ..HeadingConfig::default()
        });
        // 2° in 0.1 s = 20°/s, IMU agrees
        let inputs = tick(0.0, 0.0, HeadingSource::Dual)
            .with_heading_dual_deg(2.0)
            .with_imu_yaw_rate_deg_per_sec(20.0);
        let resolved = resolver.resolve(&HeadingRequest {
            inputs: &inputs,
            anchor_fix: None,
            previous_heading: Some(0.0),
        });
        assert!(!resolved.yaw_rate_blended);
        assert_abs_diff_eq!(to_degrees(resolved.heading.unwrap()), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_long_gap_dt_is_bounded() {
        let resolver = HeadingResolver::new(HeadingConfig::default());
        let inputs = SensorInputs::new(GeoCoord::default(), HeadingSource::Fix2Fix).with_timing(3.0, 10.0);
        assert_abs_diff_eq!(resolver.bounded_dt(&inputs).unwrap(), 0.5, epsilon = 1e-12);

        let inputs = inputs.with_timing(3.0, 0.0);
        assert_abs_diff_eq!(resolver.bounded_dt(&inputs).unwrap(), 3.0, epsilon = 1e-12);
    }
}
