use crate::sim::{SimResult, DT};
use crate::SimError;
use furrow_core::{FixQuality, GeoCoord, GnssQuality, HeadingSource, SensorInputs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Below this ground speed a receiver stops reporting course over ground (m/s).
const COURSE_MIN_SPEED: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub noise_scale: f64,
    pub gps_hz: f64,
    pub gps_pos_noise_std: f64,     // m
    pub speed_noise_std: f64,       // km/h
    pub heading_noise_std: f64,     // °
    pub roll_noise_std: f64,        // °
    pub yaw_rate_noise_std: f64,    // °/s
    pub roll_bias: f64,             // °, what the IMU reads when level
    pub dropout_probability: f64,   // per optional signal per tick
    pub degenerate_probability: f64, // chance of a repeated timestamp

    // Fitted hardware
    pub heading_source: HeadingSource,
    pub imu_fitted: bool,
    pub dual_antenna: bool,

    pub seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            noise_scale: 1.0,
            gps_hz: 10.0,
            gps_pos_noise_std: 0.01,
            speed_noise_std: 0.05,
            heading_noise_std: 0.3,
            roll_noise_std: 0.2,
            yaw_rate_noise_std: 0.5,
            roll_bias: 0.0,
            dropout_probability: 0.0,
            degenerate_probability: 0.0,
            heading_source: HeadingSource::Fix2Fix,
            imu_fitted: true,
            dual_antenna: false,
            seed: 42,
        }
    }
}

pub struct SensorData {
    pub time: Vec<f64>,
    pub inputs: Vec<SensorInputs>,
    /// Index into the [`SimResult`] each tick was sampled from.
    pub truth_index: Vec<usize>,
}

impl SensorData {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Samples the drive at the GNSS rate and turns each sample into the snapshot
/// a receiver + IMU would hand the positioning engine.
pub fn generate_sensor_data(sim: &SimResult, cfg: &SensorConfig) -> Result<SensorData, SimError> {
    if cfg.gps_hz.is_nan() || cfg.gps_hz <= 0.0 {
        return Err(SimError::OutOfRange {
            name: "gps_hz".to_string(),
            value: cfg.gps_hz,
        });
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let stride = ((1.0 / cfg.gps_hz) / DT).round().max(1.0) as usize;
    let n = sim.len().div_ceil(stride);

    let mut data = SensorData {
        time: Vec::with_capacity(n),
        inputs: Vec::with_capacity(n),
        truth_index: Vec::with_capacity(n),
    };

    // Distributions
    let scale = cfg.noise_scale.max(0.0);
    let d_pos = Normal::new(0.0, scale * cfg.gps_pos_noise_std)?;
    let d_speed = Normal::new(0.0, scale * cfg.speed_noise_std)?;
    let d_heading = Normal::new(0.0, scale * cfg.heading_noise_std)?;
    let d_roll = Normal::new(0.0, scale * cfg.roll_noise_std)?;
    let d_yaw_rate = Normal::new(0.0, scale * cfg.yaw_rate_noise_std)?;

    let dropout = cfg.dropout_probability.clamp(0.0, 1.0);
    let degenerate = cfg.degenerate_probability.clamp(0.0, 1.0);
    let available = |rng: &mut StdRng| !rng.gen_bool(dropout);

    let mut prev_time: Option<f64> = None;

    for i in (0..sim.len()).step_by(stride) {
        let t = sim.time[i];
        let heading = sim.heading_deg[i];

        // 1. Timing
        let mut dt = prev_time.map_or(1.0 / cfg.gps_hz, |prev| t - prev);
        if prev_time.is_some() && rng.gen_bool(degenerate) {
            dt = 0.0;
        }
        prev_time = Some(t);

        // 2. Position
        let antenna = sim.antenna[i];
        let fix = GeoCoord::new(antenna.x + d_pos.sample(&mut rng), antenna.y + d_pos.sample(&mut rng));
        let mut inputs = SensorInputs::new(fix, cfg.heading_source).with_timing(dt, cfg.gps_hz);

        // 3. VTG: speed and course over ground (direction of travel)
        let speed = sim.speed[i];
        if available(&mut rng) {
            inputs = inputs.with_speed_kmh((speed.abs() * 3.6 + d_speed.sample(&mut rng)).max(0.0));
        }
        if speed.abs() >= COURSE_MIN_SPEED && available(&mut rng) {
            let course = if speed < 0.0 { heading + 180.0 } else { heading };
            inputs = inputs.with_heading_true_deg(wrap_deg(course + d_heading.sample(&mut rng)));
        }

        // 4. Dual antenna
        if cfg.dual_antenna && available(&mut rng) {
            inputs = inputs.with_heading_dual_deg(wrap_deg(heading + d_heading.sample(&mut rng)));
        }

        // 5. IMU
        if cfg.imu_fitted {
            if available(&mut rng) {
                inputs = inputs.with_imu_heading_deg(wrap_deg(heading + d_heading.sample(&mut rng)));
            }
            if available(&mut rng) {
                inputs = inputs.with_imu_roll_deg(sim.roll_deg[i] + cfg.roll_bias + d_roll.sample(&mut rng));
            }
            if available(&mut rng) {
                inputs = inputs.with_imu_yaw_rate_deg_per_sec(sim.yaw_rate[i] + d_yaw_rate.sample(&mut rng));
            }
        }

        // 6. Receiver status
        inputs = inputs.with_gnss(GnssQuality {
            altitude_meters: Some(250.0),
            satellites_tracked: Some(14),
            fix_quality: Some(FixQuality::RtkFixed),
            hdop: Some(0.7),
            age_seconds: Some(1.0),
        });

        data.time.push(t);
        data.inputs.push(inputs);
        data.truth_index.push(i);
    }

    tracing::debug!(ticks = data.len(), stride, "sensor data generated");
    Ok(data)
}

fn wrap_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}
