//! Flat CSV form of a sensor snapshot, used to record runs and replay them.

use anyhow::{bail, Context, Result};
use furrow_core::{GeoCoord, HeadingSource, SensorInputs};
use furrow_sim::SensorData;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub time: f64,
    pub easting: f64,
    pub northing: f64,
    pub speed_kmh: Option<f64>,
    pub heading_true_deg: Option<f64>,
    pub heading_dual_deg: Option<f64>,
    pub imu_heading_deg: Option<f64>,
    pub imu_roll_deg: Option<f64>,
    pub imu_yaw_rate_deg_per_sec: Option<f64>,
    pub altitude_meters: Option<f64>,
    pub satellites_tracked: Option<u16>,
    pub fix_quality: Option<u8>,
    pub hdop: Option<f64>,
    pub age_seconds: Option<f64>,
    pub heading_source: String,
    pub delta_time_seconds: f64,
    pub gps_hz: f64,
}

impl LogRecord {
    pub fn from_inputs(time: f64, inputs: &SensorInputs) -> Self {
        Self {
            time,
            easting: inputs.raw_fix_local.easting,
            northing: inputs.raw_fix_local.northing,
            speed_kmh: inputs.speed_kmh,
            heading_true_deg: inputs.heading_true_deg,
            heading_dual_deg: inputs.heading_dual_deg,
            imu_heading_deg: inputs.imu_heading_deg,
            imu_roll_deg: inputs.imu_roll_deg,
            imu_yaw_rate_deg_per_sec: inputs.imu_yaw_rate_deg_per_sec,
            altitude_meters: inputs.altitude_meters,
            satellites_tracked: inputs.satellites_tracked,
            fix_quality: inputs.fix_quality,
            hdop: inputs.hdop,
            age_seconds: inputs.age_seconds,
            heading_source: inputs.heading_source.label().to_string(),
            delta_time_seconds: inputs.delta_time_seconds,
            gps_hz: inputs.gps_hz,
        }
    }

    pub fn to_inputs(&self) -> Result<SensorInputs> {
        let Some(source) = HeadingSource::from_name(&self.heading_source) else {
            bail!("unknown heading source {:?}", self.heading_source);
        };
        Ok(SensorInputs {
            raw_fix_local: GeoCoord::new(self.easting, self.northing),
            speed_kmh: self.speed_kmh,
            heading_true_deg: self.heading_true_deg,
            heading_dual_deg: self.heading_dual_deg,
            imu_heading_deg: self.imu_heading_deg,
            imu_roll_deg: self.imu_roll_deg,
            imu_yaw_rate_deg_per_sec: self.imu_yaw_rate_deg_per_sec,
            altitude_meters: self.altitude_meters,
            satellites_tracked: self.satellites_tracked,
            fix_quality: self.fix_quality,
            hdop: self.hdop,
            age_seconds: self.age_seconds,
            heading_source: source,
            delta_time_seconds: self.delta_time_seconds,
            gps_hz: self.gps_hz,
        })
    }
}

pub fn write_log(path: &Path, data: &SensorData) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for (t, inputs) in data.time.iter().zip(&data.inputs) {
        wtr.serialize(LogRecord::from_inputs(*t, inputs))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads a recorded log back into engine-ready ticks. There is no ground
/// truth for a log, so `truth_index` stays empty.
pub fn read_log(path: &Path) -> Result<SensorData> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;

    let mut data = SensorData {
        time: Vec::new(),
        inputs: Vec::new(),
        truth_index: Vec::new(),
    };
    for (line, record) in rdr.deserialize::<LogRecord>().enumerate() {
        let record = record.with_context(|| format!("{}: record {}", path.display(), line + 1))?;
        let inputs = record
            .to_inputs()
            .with_context(|| format!("{}: record {}", path.display(), line + 1))?;
        data.time.push(record.time);
        data.inputs.push(inputs);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let inputs = SensorInputs::new(GeoCoord::new(1.5, -2.25), HeadingSource::Vtg)
            .with_timing(0.1, 10.0)
            .with_heading_true_deg(45.0)
            .with_imu_roll_deg(-1.0);
        let record = LogRecord::from_inputs(3.0, &inputs);
        assert_eq!(record.heading_source, "VTG");
        assert_eq!(record.to_inputs().unwrap(), inputs);
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let inputs = SensorInputs::new(GeoCoord::default(), HeadingSource::Fix2Fix);
        let mut record = LogRecord::from_inputs(0.0, &inputs);
        record.heading_source = "compass".to_string();
        assert!(record.to_inputs().is_err());
    }

    #[test]
    fn test_file_roundtrip_keeps_missing_fields_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let data = SensorData {
            time: vec![0.0, 0.1],
            inputs: vec![
                SensorInputs::new(GeoCoord::new(0.0, 0.0), HeadingSource::Dual)
                    .with_timing(0.1, 10.0)
                    .with_heading_dual_deg(12.5),
                SensorInputs::new(GeoCoord::new(0.0, 0.3), HeadingSource::Dual).with_timing(0.1, 10.0),
            ],
            truth_index: Vec::new(),
        };
        write_log(&path, &data).unwrap();

        let back = read_log(&path).unwrap();
        assert_eq!(back.time, data.time);
        assert_eq!(back.inputs, data.inputs);
        assert!(back.inputs[1].heading_dual_deg.is_none());
    }
}
