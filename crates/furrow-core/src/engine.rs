// ---------------------------------------------------------------------------
// Positioning engine
// ---------------------------------------------------------------------------
//
// Owns everything carried between ticks. A tick runs
// resolve heading -> classify motion -> condition roll -> correct position
// on a copy of the carried state, which replaces the old one only once the
// tick has produced its outputs.

use crate::config::PositioningConfig;
use crate::correction::{PositionCorrector, RollConditioner};
use crate::error::{InputFault, PositioningError};
use crate::geo::GeoCoord;
use crate::heading::{HeadingRequest, HeadingResolver};
use crate::inputs::{GnssQuality, SensorInputs};
use crate::outputs::{PositioningOutputs, ReverseStatus, TickDiagnostics};
use crate::reverse::{MotionAnchor, ReverseClassifier};

/// m/s -> km/h
const MPS_TO_KMH: f64 = 3.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EnginePhase {
    /// No tick processed since construction or the last reset.
    #[default]
    Uninitialized = 0,
    Running = 1,
}

impl EnginePhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Running => "Running",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CarriedState {
    raw_fix: GeoCoord,
    /// Last raw fix a fix-to-fix bearing was taken from.
    heading_anchor: GeoCoord,
    motion: MotionAnchor,
    corrected_fix: GeoCoord,
    /// Absent until a heading source has produced one.
    heading: Option<f64>,
    reverse_status: ReverseStatus,
    outputs: PositioningOutputs,
    /// Conditioned roll (deg), seeds the next tick's smoothing.
    roll_deg: Option<f64>,
}

pub struct PositioningEngine {
    config: PositioningConfig,
    resolver: HeadingResolver,
    classifier: ReverseClassifier,
    corrector: PositionCorrector,
    roll: RollConditioner,

    state: Option<CarriedState>,
    tick_count: u64,
}

impl Default for PositioningEngine {
    fn default() -> Self {
        Self::new(PositioningConfig::default())
    }
}

impl PositioningEngine {
    pub fn new(config: PositioningConfig) -> Self {
        Self {
            resolver: HeadingResolver::new(config.heading),
            classifier: ReverseClassifier::new(config.min_motion_distance_m, config.motion_hold_ticks),
            corrector: PositionCorrector::new(config.lever_arm, config.roll.antenna_height_m),
            roll: RollConditioner::new(&config.roll),
            config,
            state: None,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &PositioningConfig {
        &self.config
    }

    pub fn phase(&self) -> EnginePhase {
        if self.state.is_some() {
            EnginePhase::Running
        } else {
            EnginePhase::Uninitialized
        }
    }

    /// Ticks accepted since construction or the last reset, degenerate ones included.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Forgets all carried state; the next tick is treated as the first.
    pub fn reset(&mut self) {
        self.state = None;
        self.tick_count = 0;
        tracing::debug!("positioning engine reset");
    }

    /// Like [`step`](Self::step) but for producers that may have no snapshot
    /// this tick.
    pub fn step_snapshot(&mut self, inputs: Option<&SensorInputs>) -> Result<PositioningOutputs, PositioningError> {
        match inputs {
            Some(inputs) => self.step(inputs),
            None => Err(InputFault::MissingSnapshot.into()),
        }
    }

    /// Processes one measurement tick.
    ///
    /// Fails only when the mandatory fields are unusable, in which case the
    /// engine is left exactly as it was. Missing optional signals never fail.
    pub fn step(&mut self, inputs: &SensorInputs) -> Result<PositioningOutputs, PositioningError> {
        if !inputs.raw_fix_local.is_finite() {
            return Err(InputFault::NonFiniteFix.into());
        }
        if !inputs.delta_time_seconds.is_finite() {
            return Err(InputFault::NonFiniteDeltaTime.into());
        }

        self.tick_count += 1;

        if let Some(state) = &self.state {
            if !inputs.has_valid_dt() {
                tracing::debug!(
                    tick = self.tick_count,
                    dt = inputs.delta_time_seconds,
                    "degenerate time step, repeating previous pose"
                );
                // pose repeats; advisory GNSS fields describe this tick
                let mut outputs = state.outputs;
                let gnss = inputs.gnss_quality();
                outputs.diagnostics = TickDiagnostics {
                    degenerate_tick: true,
                    fix_jump: false,
                    fix2fix_speed_kmh: None,
                    age_alarm: self.age_alarm(&gnss),
                    gnss,
                    ..outputs.diagnostics
                };
                return Ok(outputs);
            }
        }

        let (outputs, next) = self.compute(inputs);
        self.state = Some(next);
        Ok(outputs)
    }

    fn compute(&self, inputs: &SensorInputs) -> (PositioningOutputs, CarriedState) {
        let previous = self.state.as_ref();
        let previous_fix = previous.map(|s| s.raw_fix);
        let heading_anchor = previous.map(|s| s.heading_anchor);
        let raw_fix = inputs.raw_fix_local;

        let resolved = self.resolver.resolve(&HeadingRequest {
            inputs,
            anchor_fix: heading_anchor,
            previous_heading: previous.and_then(|s| s.heading),
        });

        let (reverse_status, motion) = self
            .classifier
            .classify(resolved.heading, previous.map(|s| s.motion), raw_fix);

        let roll_deg = self.roll.condition(previous.and_then(|s| s.roll_deg), inputs.imu_roll());
        let corrected_fix = self.corrector.correct(raw_fix, resolved.heading, roll_deg);

        let step_distance = previous_fix.map(|fix| fix.distance(raw_fix));
        let fix_jump = match (step_distance, self.config.jump_alarm_distance_m) {
            (Some(step), Some(limit)) if step > limit => {
                tracing::warn!(
                    tick = self.tick_count,
                    step_m = step,
                    limit_m = limit,
                    "raw fix jumped farther than the alarm distance"
                );
                true
            }
            _ => false,
        };

        let fix2fix_speed_kmh = step_distance
            .filter(|_| inputs.has_valid_dt())
            .map(|step| step / inputs.delta_time_seconds * MPS_TO_KMH);

        let gnss = inputs.gnss_quality();
        let age_alarm = self.age_alarm(&gnss);

        let outputs = PositioningOutputs {
            corrected_fix_local: corrected_fix,
            fix_heading_rad: resolved.heading_or_zero(),
            reverse_status,
            diagnostics: TickDiagnostics {
                heading_origin: resolved.origin,
                yaw_rate_blended: resolved.yaw_rate_blended,
                degenerate_tick: false,
                fix_jump,
                fix2fix_speed_kmh,
                gnss,
                age_alarm,
            },
        };

        tracing::trace!(
            tick = self.tick_count,
            easting = corrected_fix.easting,
            northing = corrected_fix.northing,
            heading_deg = outputs.fix_heading_deg(),
            origin = resolved.origin.label(),
            reverse = reverse_status.label(),
            "tick"
        );

        let next = CarriedState {
            raw_fix,
            heading_anchor: self.resolver.next_anchor(heading_anchor, inputs),
            motion,
            corrected_fix,
            heading: resolved.heading,
            reverse_status,
            outputs,
            roll_deg: roll_deg.or(previous.and_then(|s| s.roll_deg)),
        };
        (outputs, next)
    }

    fn age_alarm(&self, gnss: &GnssQuality) -> bool {
        gnss.age_seconds.is_some_and(|age| age > self.config.age_alarm_seconds)
    }

    /// Corrected fix of the last processed tick.
    pub fn previous_corrected_fix(&self) -> Option<GeoCoord> {
        self.state.map(|s| s.corrected_fix)
    }

    pub fn previous_reverse_status(&self) -> ReverseStatus {
        self.state.map(|s| s.reverse_status).unwrap_or_default()
    }
}
