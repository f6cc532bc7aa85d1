use furrow_core::LeverArm;
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------
pub const DT: f64 = 0.01; // 100 Hz kinematics
const MAX_TIME: f64 = 3600.0;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// One leg of the drive: constant speed and turn rate for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub duration: f64, // s
    pub speed: f64,    // m/s, negative backs up
    pub yaw_rate: f64, // °/s, positive turns right
}

impl Segment {
    pub const fn new(duration: f64, speed: f64, yaw_rate: f64) -> Self {
        Self {
            duration,
            speed,
            yaw_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveParams {
    pub route: Vec<Segment>,
    pub start_heading_deg: f64,

    // Antenna mount
    pub antenna: LeverArm,
    pub antenna_height: f64, // m

    // Terrain: sinusoidal body roll
    pub roll_amplitude_deg: f64,
    pub roll_period: f64, // s
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            route: vec![
                Segment::new(20.0, 3.0, 0.0),  // straight pass
                Segment::new(10.0, 3.0, 9.0),  // 90° right turn
                Segment::new(10.0, 3.0, 0.0),  // straight
                Segment::new(2.0, 0.0, 0.0),   // stop
                Segment::new(8.0, -1.5, 0.0),  // back up
                Segment::new(2.0, 0.0, 0.0),   // stop
                Segment::new(10.0, 2.5, -4.5), // gentle left
            ],
            start_heading_deg: 0.0,
            antenna: LeverArm::new(0.1, 0.0),
            antenna_height: 3.0,
            roll_amplitude_deg: 3.0,
            roll_period: 12.0,
        }
    }
}

impl DriveParams {
    pub fn duration(&self) -> f64 {
        self.route.iter().map(|s| s.duration.max(0.0)).sum::<f64>().min(MAX_TIME)
    }

    fn segment_at(&self, t: f64) -> Segment {
        let mut start = 0.0;
        for segment in &self.route {
            let end = start + segment.duration.max(0.0);
            if t < end {
                return *segment;
            }
            start = end;
        }
        Segment::new(0.0, 0.0, 0.0)
    }

    fn roll_at(&self, t: f64) -> f64 {
        if self.roll_period <= 0.0 {
            return 0.0;
        }
        self.roll_amplitude_deg * (core::f64::consts::TAU * t / self.roll_period).sin()
    }

    /// Antenna position for a pivot pose: lever arm plus the lean of the mast.
    pub fn antenna_position(&self, pivot: Vector2<f64>, heading_rad: f64, roll_deg: f64) -> Vector2<f64> {
        let body = Vector2::new(
            self.antenna.right_m + roll_deg.to_radians().sin() * self.antenna_height,
            self.antenna.forward_m,
        );
        pivot + Rotation2::new(-heading_rad) * body
    }
}

// ---------------------------------------------------------------------------
// Simulation Result
// ---------------------------------------------------------------------------

/// Ground truth sampled every physics step. Positions are (easting, northing).
#[derive(Clone, Debug, Default)]
pub struct SimResult {
    pub time: Vec<f64>,
    pub pivot: Vec<Vector2<f64>>,
    pub antenna: Vec<Vector2<f64>>,
    pub heading_deg: Vec<f64>, // [0, 360)
    pub speed: Vec<f64>,       // m/s, signed
    pub yaw_rate: Vec<f64>,    // °/s
    pub roll_deg: Vec<f64>,
}

impl SimResult {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn reversing(&self, i: usize) -> bool {
        self.speed[i] < 0.0
    }
}

// ---------------------------------------------------------------------------
// Main Loop
// ---------------------------------------------------------------------------

/// Integrates a planar unicycle along the route.
pub fn simulate_drive(p: &DriveParams) -> SimResult {
    let steps = (p.duration() / DT).round() as usize + 1;

    let mut res = SimResult {
        time: Vec::with_capacity(steps),
        pivot: Vec::with_capacity(steps),
        antenna: Vec::with_capacity(steps),
        heading_deg: Vec::with_capacity(steps),
        speed: Vec::with_capacity(steps),
        yaw_rate: Vec::with_capacity(steps),
        roll_deg: Vec::with_capacity(steps),
    };

    let mut pivot = Vector2::zeros();
    let mut heading = p.start_heading_deg.to_radians().rem_euclid(core::f64::consts::TAU);

    for i in 0..steps {
        let t = i as f64 * DT;
        let segment = p.segment_at(t);
        let roll = p.roll_at(t);

        res.time.push(t);
        res.pivot.push(pivot);
        res.antenna.push(p.antenna_position(pivot, heading, roll));
        res.heading_deg.push(heading.to_degrees());
        res.speed.push(segment.speed);
        res.yaw_rate.push(segment.yaw_rate);
        res.roll_deg.push(roll);

        // Midpoint heading keeps arcs on the circle
        let d_heading = segment.yaw_rate.to_radians() * DT;
        let mid = heading + 0.5 * d_heading;
        pivot += Vector2::new(mid.sin(), mid.cos()) * (segment.speed * DT);
        heading = (heading + d_heading).rem_euclid(core::f64::consts::TAU);
    }

    tracing::debug!(steps, duration = p.duration(), "drive simulated");
    res
}
