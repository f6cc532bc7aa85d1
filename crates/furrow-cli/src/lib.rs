//! Furrow CLI - batch runs, parameter sweeps and log replay.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use furrow_core::{CorrectedPositionFrame, HeadingSource, LocalPlane, PositioningConfig};
use furrow_sim::{
    param_spec, run_engine, run_scenario, ReplayResult, ReplayStats, ScenarioConfig, SensorData, SimResult,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod log;

/// Public function that can be called from the main binary
pub fn run_cli_main(args: &[&str]) -> Result<()> {
    let args = Args::parse_from(args);
    run(args)
}

#[derive(Parser, Debug)]
#[command(name = "furrow-cli")]
#[command(about = "Ground-vehicle GNSS/IMU positioning simulator")]
#[command(version)]
pub struct Args {
    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Output file format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Run a single simulation
    #[arg(long)]
    single: bool,

    /// Replay a recorded sensor log instead of simulating
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Scenario configuration (JSON); missing sections fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    // ── Sensor options ────────────────────────────────────────
    #[arg(long, value_enum)]
    heading_source: Option<SourceArg>,

    #[arg(long)]
    dual_antenna: bool,

    #[arg(long)]
    no_imu: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    noise_scale: Option<f64>,

    #[arg(long)]
    dropout: Option<f64>,

    #[arg(long)]
    degenerate: Option<f64>,

    // ── Engine options ────────────────────────────────────────
    #[arg(long)]
    jump_alarm: Option<f64>,

    #[arg(long)]
    yaw_rate_tolerance: Option<f64>,

    // ── Output options ────────────────────────────────────────
    /// Also write the sensor log (sensors.csv) for later replay
    #[arg(long)]
    record: bool,

    /// Also write PGN 100 frames (frames.bin)
    #[arg(long)]
    frames: bool,

    #[arg(long, default_value_t = 53.0)]
    origin_lat: f64,

    #[arg(long, default_value_t = -113.0)]
    origin_lon: f64,

    // ── Sweep options ──────────────────────────────────────────
    #[arg(long, value_delimiter = ' ')]
    sweep_params: Option<Vec<String>>,

    #[arg(long, default_value_t = 5)]
    sweep_steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Fix,
    Vtg,
    Dual,
}

impl From<SourceArg> for HeadingSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Fix => HeadingSource::Fix2Fix,
            SourceArg::Vtg => HeadingSource::Vtg,
            SourceArg::Dual => HeadingSource::Dual,
        }
    }
}

pub fn run(args: Args) -> Result<()> {
    println!("Furrow Positioning Simulator");
    println!("============================\n");

    let config = build_scenario(&args)?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    if let Some(log_path) = &args.replay {
        run_replay(&args, log_path, &config.positioning)?;
    } else if args.single {
        run_single(&args, &config)?;
    } else {
        run_sweep(&args, &config)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Single Run
// ---------------------------------------------------------------------------
fn run_single(args: &Args, config: &ScenarioConfig) -> Result<()> {
    println!("Running single simulation...");

    let run = run_scenario(config)?;
    print_stats(&run.stats);

    write_ticks(args, "simulation", Some(&run.sim), &run.sensor_data, &run.result)?;

    if args.record {
        let path = args.output_dir.join("sensors.csv");
        log::write_log(&path, &run.sensor_data)?;
        println!("Sensor log written to {:?}", path);
    }
    if args.frames {
        write_frames(args, &run.result)?;
    }

    let stats_path = args.output_dir.join("stats.json");
    let summary = serde_json::json!({
        "stats": run.stats,
        "config": config.to_json(),
    });
    std::fs::write(&stats_path, serde_json::to_string_pretty(&summary)?)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Log Replay
// ---------------------------------------------------------------------------
fn run_replay(args: &Args, log_path: &Path, config: &PositioningConfig) -> Result<()> {
    println!("Replaying {:?}...", log_path);

    let data = log::read_log(log_path)?;
    let result = run_engine(&data, config);

    println!("  Ticks:    {}", data.len());
    println!("  Rejected: {}", result.rejected);

    write_ticks(args, "replay", None, &data, &result)?;
    if args.frames {
        write_frames(args, &result)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sweep Run
// ---------------------------------------------------------------------------
#[derive(Debug, Serialize)]
struct SweepRow {
    param: String,
    value: f64,
    position_rmse_m: f64,
    max_position_error_m: f64,
    heading_rmse_deg: f64,
    reverse_accuracy: f64,
}

fn run_sweep(args: &Args, base: &ScenarioConfig) -> Result<()> {
    let default_sweep = vec!["gps_noise".to_string()];
    let sweep_names = args.sweep_params.as_ref().unwrap_or(&default_sweep);
    println!("Sweeping parameters: {:?}", sweep_names);

    let steps = args.sweep_steps.max(2);
    let mut rows = Vec::new();

    for name in sweep_names {
        let Some(spec) = param_spec(name) else {
            bail!("unknown sweep parameter {name:?}");
        };

        for i in 0..steps {
            let value = spec.min + (spec.max - spec.min) * (i as f64 / (steps - 1) as f64);
            let mut cfg = base.clone();
            cfg.set_param(name, value)?;

            let stats = run_scenario(&cfg)?.stats;
            println!(
                "Run {}/{} | {}: {:.3} -> pos RMSE {:.3} m, heading RMSE {:.2}°",
                i + 1,
                steps,
                spec.label,
                value,
                stats.position_rmse_m,
                stats.heading_rmse_deg
            );

            rows.push(SweepRow {
                param: name.clone(),
                value,
                position_rmse_m: stats.position_rmse_m,
                max_position_error_m: stats.max_position_error_m,
                heading_rmse_deg: stats.heading_rmse_deg,
                reverse_accuracy: stats.reverse_accuracy,
            });
        }
    }

    let path = match args.format {
        OutputFormat::Csv => {
            let path = args.output_dir.join("sweep_summary.csv");
            let mut wtr = csv::Writer::from_path(&path)?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
            path
        }
        OutputFormat::Json => {
            let path = args.output_dir.join("sweep_summary.json");
            std::fs::write(&path, serde_json::to_string_pretty(&rows)?)?;
            path
        }
    };

    println!("\nSweep complete. Summary at {:?}", path);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_scenario(args: &Args) -> Result<ScenarioConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ScenarioConfig>(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ScenarioConfig::default(),
    };

    if let Some(source) = args.heading_source {
        config.sensor.heading_source = source.into();
    }
    if args.dual_antenna {
        config.sensor.dual_antenna = true;
    }
    if args.no_imu {
        config.sensor.imu_fitted = false;
    }
    if let Some(seed) = args.seed {
        config.sensor.seed = seed;
    }
    if let Some(scale) = args.noise_scale {
        config.set_param("noise_scale", scale)?;
    }
    if let Some(p) = args.dropout {
        config.set_param("dropout", p)?;
    }
    if let Some(p) = args.degenerate {
        config.sensor.degenerate_probability = p.clamp(0.0, 1.0);
    }
    if let Some(limit) = args.jump_alarm {
        config.positioning.jump_alarm_distance_m = Some(limit);
    }
    if let Some(tolerance) = args.yaw_rate_tolerance {
        config.set_param("yaw_rate_tolerance", tolerance)?;
    }

    config.validate().context("invalid scenario configuration")?;
    tracing::debug!(config = %config.to_json(), "scenario configured");
    Ok(config)
}

fn print_stats(stats: &ReplayStats) {
    println!("\nRun Stats:");
    println!("  Ticks:            {}", stats.ticks);
    println!("  Degenerate:       {}", stats.degenerate);
    println!("  Position RMSE:    {:.4} m", stats.position_rmse_m);
    println!("  Max Pos. Error:   {:.4} m", stats.max_position_error_m);
    println!("  Heading RMSE:     {:.3} °", stats.heading_rmse_deg);
    println!("  Reverse Accuracy: {:.1} %", stats.reverse_accuracy * 100.0);
    println!("-----------------------------");
}

/// One output row per engine tick.
#[derive(Debug, Serialize)]
struct TickRecord {
    time: f64,
    raw_easting: f64,
    raw_northing: f64,
    easting: f64,
    northing: f64,
    heading_deg: f64,
    reverse: &'static str,
    heading_origin: &'static str,
    yaw_rate_blended: bool,
    degenerate: bool,
    fix_jump: bool,
    fix2fix_speed_kmh: Option<f64>,
    // Truth, simulated runs only
    true_easting: Option<f64>,
    true_northing: Option<f64>,
    true_heading_deg: Option<f64>,
    true_reversing: Option<bool>,
}

fn tick_records(sim: Option<&SimResult>, data: &SensorData, result: &ReplayResult) -> Vec<TickRecord> {
    result
        .outputs
        .iter()
        .zip(&result.tick_index)
        .zip(&result.time)
        .map(|((out, &k), &time)| {
            let raw = data.inputs[k].raw_fix_local;
            let truth = sim.zip(data.truth_index.get(k).copied());
            TickRecord {
                time,
                raw_easting: raw.easting,
                raw_northing: raw.northing,
                easting: out.corrected_fix_local.easting,
                northing: out.corrected_fix_local.northing,
                heading_deg: out.fix_heading_deg(),
                reverse: out.reverse_status.label(),
                heading_origin: out.diagnostics.heading_origin.label(),
                yaw_rate_blended: out.diagnostics.yaw_rate_blended,
                degenerate: out.diagnostics.degenerate_tick,
                fix_jump: out.diagnostics.fix_jump,
                fix2fix_speed_kmh: out.diagnostics.fix2fix_speed_kmh,
                true_easting: truth.map(|(s, i)| s.pivot[i].x),
                true_northing: truth.map(|(s, i)| s.pivot[i].y),
                true_heading_deg: truth.map(|(s, i)| s.heading_deg[i]),
                true_reversing: truth.map(|(s, i)| s.reversing(i)),
            }
        })
        .collect()
}

fn write_ticks(
    args: &Args,
    stem: &str,
    sim: Option<&SimResult>,
    data: &SensorData,
    result: &ReplayResult,
) -> Result<()> {
    let records = tick_records(sim, data, result);

    let path = match args.format {
        OutputFormat::Csv => {
            let path = args.output_dir.join(format!("{stem}.csv"));
            let mut wtr = csv::Writer::from_path(&path)?;
            for record in &records {
                wtr.serialize(record)?;
            }
            wtr.flush()?;
            path
        }
        OutputFormat::Json => {
            let path = args.output_dir.join(format!("{stem}.json"));
            std::fs::write(&path, serde_json::to_string_pretty(&records)?)?;
            path
        }
    };

    println!("Data written to {:?}", path);
    Ok(())
}

fn write_frames(args: &Args, result: &ReplayResult) -> Result<()> {
    let plane = LocalPlane::new(args.origin_lat, args.origin_lon);
    let path = args.output_dir.join("frames.bin");
    let mut file = std::io::BufWriter::new(
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );
    for out in &result.outputs {
        file.write_all(&CorrectedPositionFrame::from_outputs(out, &plane).to_bytes())?;
    }
    file.flush()?;
    println!("{} PGN 100 frames written to {:?}", result.outputs.len(), path);
    Ok(())
}
