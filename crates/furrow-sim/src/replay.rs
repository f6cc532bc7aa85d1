use crate::params::{self, param_spec};
use crate::sensor::{generate_sensor_data, SensorConfig, SensorData};
use crate::sim::{simulate_drive, DriveParams, SimResult};
use crate::SimError;
use furrow_core::angle::{angle_diff, to_degrees, to_radians};
use furrow_core::{HeadingOrigin, PositioningConfig, PositioningEngine, PositioningOutputs, ReverseStatus};
use serde::{Deserialize, Serialize};

/// Output of the engine over a tick sequence.
#[derive(Clone, Debug, Default)]
pub struct ReplayResult {
    pub time: Vec<f64>,
    pub outputs: Vec<PositioningOutputs>,
    /// Sensor tick each output belongs to.
    pub tick_index: Vec<usize>,
    /// Ticks the engine refused.
    pub rejected: usize,
}

/// Drive, sensors and the estimator configuration under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub drive: DriveParams,
    pub sensor: SensorConfig,
    pub positioning: PositioningConfig,
}

impl Default for ScenarioConfig {
    /// Estimator geometry matched to the simulated vehicle.
    fn default() -> Self {
        let drive = DriveParams::default();
        let sensor = SensorConfig::default();
        let mut positioning = PositioningConfig::default();
        positioning.lever_arm = drive.antenna;
        positioning.roll.antenna_height_m = drive.antenna_height;
        positioning.roll.roll_zero_deg = sensor.roll_bias;
        Self {
            drive,
            sensor,
            positioning,
        }
    }
}

impl ScenarioConfig {
    pub fn get_param(&self, name: &str) -> Result<f64, SimError> {
        let p = &self.positioning;
        let s = &self.sensor;
        Ok(match name {
            "antenna_forward" => p.lever_arm.forward_m,
            "antenna_right" => p.lever_arm.right_m,
            "antenna_height" => p.roll.antenna_height_m,
            "roll_zero" => p.roll.roll_zero_deg,
            "roll_filter" => p.roll.filter,
            "min_step" => p.heading.min_step_distance_m,
            "dual_offset" => p.heading.dual_heading_offset_deg,
            "yaw_rate_tolerance" => p.heading.yaw_rate_tolerance_deg_per_sec.unwrap_or(f64::NAN),
            "yaw_rate_blend" => p.heading.yaw_rate_blend_weight,
            "max_tick_periods" => p.heading.max_tick_periods,
            "gps_hz" => s.gps_hz,
            "gps_noise" => s.gps_pos_noise_std,
            "heading_noise" => s.heading_noise_std,
            "roll_noise" => s.roll_noise_std,
            "dropout" => s.dropout_probability,
            "noise_scale" => s.noise_scale,
            _ => return Err(SimError::UnknownParam(name.to_string())),
        })
    }

    /// Sets a sweepable parameter after checking it against its [`params::ParamSpec`].
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        let spec = param_spec(name).ok_or_else(|| SimError::UnknownParam(name.to_string()))?;
        if !spec.contains(value) {
            return Err(SimError::OutOfRange {
                name: name.to_string(),
                value,
            });
        }

        let p = &mut self.positioning;
        let s = &mut self.sensor;
        match name {
            "antenna_forward" => p.lever_arm.forward_m = value,
            "antenna_right" => p.lever_arm.right_m = value,
            "antenna_height" => p.roll.antenna_height_m = value,
            "roll_zero" => p.roll.roll_zero_deg = value,
            "roll_filter" => p.roll.filter = value,
            "min_step" => p.heading.min_step_distance_m = value,
            "dual_offset" => p.heading.dual_heading_offset_deg = value,
            "yaw_rate_tolerance" => p.heading.yaw_rate_tolerance_deg_per_sec = Some(value),
            "yaw_rate_blend" => p.heading.yaw_rate_blend_weight = value,
            "max_tick_periods" => p.heading.max_tick_periods = value,
            "gps_hz" => s.gps_hz = value,
            "gps_noise" => s.gps_pos_noise_std = value,
            "heading_noise" => s.heading_noise_std = value,
            "roll_noise" => s.roll_noise_std = value,
            "dropout" => s.dropout_probability = value,
            "noise_scale" => s.noise_scale = value,
            _ => return Err(SimError::UnknownParam(name.to_string())),
        }
        Ok(())
    }

    /// Checks every sweepable parameter that is set against its bounds.
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, spec) in params::SWEEP_PARAMS {
            let value = self.get_param(name)?;
            if value.is_nan() && name == "yaw_rate_tolerance" {
                continue;
            }
            if !spec.contains(value) {
                return Err(SimError::OutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "drive": self.drive,
            "sensor": self.sensor,
            "positioning": self.positioning,
        })
    }
}

/// Feeds every tick to a fresh engine. Refused ticks are logged and skipped.
pub fn run_engine(sensor_data: &SensorData, config: &PositioningConfig) -> ReplayResult {
    let mut engine = PositioningEngine::new(*config);
    let mut result = ReplayResult::default();

    for (k, inputs) in sensor_data.inputs.iter().enumerate() {
        match engine.step(inputs) {
            Ok(outputs) => {
                result.time.push(sensor_data.time.get(k).copied().unwrap_or(f64::NAN));
                result.outputs.push(outputs);
                result.tick_index.push(k);
            }
            Err(err) => {
                tracing::warn!(tick = k, %err, "tick rejected");
                result.rejected += 1;
            }
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Scoring against ground truth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ReplayStats {
    pub ticks: usize,
    pub rejected: usize,
    pub degenerate: usize,
    pub position_rmse_m: f64,
    pub max_position_error_m: f64,
    pub heading_rmse_deg: f64,
    /// Share of classified ticks (Forward/Reverse) that match the truth.
    pub reverse_accuracy: f64,
    /// Ticks where the vehicle was truly backing up and was reported as such.
    pub reverse_detected: usize,
}

pub fn evaluate(sim: &SimResult, sensor_data: &SensorData, result: &ReplayResult) -> ReplayStats {
    let mut stats = ReplayStats {
        ticks: result.outputs.len(),
        rejected: result.rejected,
        ..ReplayStats::default()
    };

    let mut pos_sq = 0.0;
    let mut heading_sq = 0.0;
    let mut heading_n = 0usize;
    let mut classified = 0usize;
    let mut correct = 0usize;

    for (out, &k) in result.outputs.iter().zip(&result.tick_index) {
        if out.diagnostics.degenerate_tick {
            stats.degenerate += 1;
        }
        let Some(&i) = sensor_data.truth_index.get(k) else {
            continue;
        };

        let truth = sim.pivot[i];
        let err = ((out.corrected_fix_local.easting - truth.x).powi(2)
            + (out.corrected_fix_local.northing - truth.y).powi(2))
        .sqrt();
        pos_sq += err * err;
        stats.max_position_error_m = stats.max_position_error_m.max(err);

        if out.diagnostics.heading_origin != HeadingOrigin::Unavailable {
            let d = to_degrees(angle_diff(out.fix_heading_rad, to_radians(sim.heading_deg[i])));
            heading_sq += d * d;
            heading_n += 1;
        }

        let truly_reversing = sim.reversing(i);
        match out.reverse_status {
            ReverseStatus::Unknown => {}
            status => {
                classified += 1;
                let reported_reverse = status == ReverseStatus::Reverse;
                if reported_reverse == truly_reversing {
                    correct += 1;
                }
                if reported_reverse && truly_reversing {
                    stats.reverse_detected += 1;
                }
            }
        }
    }

    if stats.ticks > 0 {
        stats.position_rmse_m = (pos_sq / stats.ticks as f64).sqrt();
    }
    if heading_n > 0 {
        stats.heading_rmse_deg = (heading_sq / heading_n as f64).sqrt();
    }
    if classified > 0 {
        stats.reverse_accuracy = correct as f64 / classified as f64;
    }
    stats
}

/// One complete scenario: truth, sensors, engine output and its score.
pub struct ScenarioRun {
    pub sim: SimResult,
    pub sensor_data: SensorData,
    pub result: ReplayResult,
    pub stats: ReplayStats,
}

pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioRun, SimError> {
    let sim = simulate_drive(&config.drive);
    let sensor_data = generate_sensor_data(&sim, &config.sensor)?;
    let result = run_engine(&sensor_data, &config.positioning);
    let stats = evaluate(&sim, &sensor_data, &result);

    tracing::info!(
        ticks = stats.ticks,
        position_rmse_m = stats.position_rmse_m,
        heading_rmse_deg = stats.heading_rmse_deg,
        reverse_accuracy = stats.reverse_accuracy,
        "scenario complete"
    );

    Ok(ScenarioRun {
        sim,
        sensor_data,
        result,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use furrow_core::{GeoCoord, HeadingSource, SensorInputs};

    fn noiseless() -> ScenarioConfig {
        let mut cfg = ScenarioConfig::default();
        cfg.sensor.noise_scale = 0.0;
        cfg
    }

    #[test]
    fn test_noiseless_dual_tracks_pivot() {
        let mut cfg = noiseless();
        cfg.sensor.dual_antenna = true;
        cfg.sensor.heading_source = HeadingSource::Dual;
        let run = run_scenario(&cfg).unwrap();

        // exact heading + matched geometry: the corrector undoes the mount exactly
        assert!(run.stats.position_rmse_m < 1e-6, "{:?}", run.stats);
        assert!(run.stats.heading_rmse_deg < 1e-6);
        assert_eq!(run.stats.rejected, 0);
    }

    #[test]
    fn test_fix_to_fix_detects_back_up() {
        let run = run_scenario(&noiseless()).unwrap();
        assert!(run.stats.reverse_detected > 50, "{:?}", run.stats);
        assert!(run.stats.reverse_accuracy > 0.95, "{:?}", run.stats);
        assert!(run.stats.heading_rmse_deg < 5.0, "{:?}", run.stats);
    }

    #[test]
    fn test_uncorrected_mount_is_worse() {
        let mut wrong = noiseless();
        wrong.positioning.roll.antenna_height_m = 0.0;
        let matched = run_scenario(&noiseless()).unwrap().stats;
        let unmatched = run_scenario(&wrong).unwrap().stats;
        assert!(unmatched.position_rmse_m > matched.position_rmse_m);
    }

    #[test]
    fn test_degenerate_ticks_are_absorbed() {
        let mut cfg = ScenarioConfig::default();
        cfg.sensor.degenerate_probability = 0.1;
        cfg.sensor.dropout_probability = 0.2;
        let run = run_scenario(&cfg).unwrap();
        assert!(run.stats.degenerate > 0);
        assert_eq!(run.stats.rejected, 0);
        assert_eq!(run.result.outputs.len(), run.sensor_data.len());
    }

    #[test]
    fn test_rejected_ticks_are_counted() {
        let data = SensorData {
            time: vec![0.0, 0.1, 0.2],
            inputs: vec![
                SensorInputs::new(GeoCoord::new(0.0, 0.0), HeadingSource::Fix2Fix).with_timing(0.1, 10.0),
                SensorInputs::new(GeoCoord::new(f64::NAN, 0.0), HeadingSource::Fix2Fix).with_timing(0.1, 10.0),
                SensorInputs::new(GeoCoord::new(0.0, 1.0), HeadingSource::Fix2Fix).with_timing(0.1, 10.0),
            ],
            truth_index: Vec::new(),
        };
        let result = run_engine(&data, &PositioningConfig::default());
        assert_eq!(result.rejected, 1);
        assert_eq!(result.tick_index, vec![0, 2]);
        assert!(result.outputs[1].fix_heading_rad.abs() < 1e-12);
    }

    #[test]
    fn test_params_roundtrip_and_validation() {
        let mut cfg = ScenarioConfig::default();
        cfg.set_param("antenna_height", 2.5).unwrap();
        assert_eq!(cfg.get_param("antenna_height").unwrap(), 2.5);
        cfg.set_param("yaw_rate_tolerance", 15.0).unwrap();
        assert_eq!(cfg.positioning.heading.yaw_rate_tolerance_deg_per_sec, Some(15.0));

        assert!(matches!(cfg.set_param("antenna_height", 60.0), Err(SimError::OutOfRange { .. })));
        assert!(matches!(cfg.set_param("warp_drive", 1.0), Err(SimError::UnknownParam(_))));
        assert!(cfg.validate().is_ok());

        cfg.sensor.dropout_probability = 2.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_to_json_has_sections() {
        let json = ScenarioConfig::default().to_json();
        assert_eq!(json["drive"]["antenna_height"], 3.0);
        assert_eq!(json["positioning"]["roll"]["antenna_height_m"], 3.0);
        assert_eq!(json["sensor"]["gps_hz"], 10.0);
    }
}
