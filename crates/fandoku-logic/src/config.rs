//! Fan geometry configuration.
//!
//! The user-adjustable knobs for the fan: the visible arc width and the
//! number of displayed generations. Out-of-range requests are snapped or
//! clamped to the nearest valid value and reported with a notice rather
//! than rejected — the chart must never hard-fail on a settings change.

use serde::{Deserialize, Serialize};

/// Supported fan arc widths in degrees.
pub const SUPPORTED_ANGLES: [f64; 3] = [180.0, 240.0, 360.0];

/// Fewest generations that still make a fan: the root plus its parents.
pub const MIN_GENERATIONS: u32 = 2;

/// Most generations the layout supports. Outer rings get one name slot
/// per 1.4° at 180°/8 generations; past that nothing is readable.
pub const MAX_GENERATIONS: u32 = 8;

/// Geometry parameters for the whole fan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanGeometryConfig {
    /// Visible arc in degrees: 180, 240, or 360.
    pub max_angle: f64,
    /// Number of displayed generations, root ring included.
    pub num_generations: u32,
    /// Radial thickness of one generation ring.
    pub radius_per_generation: f64,
    /// Radius of the root disc at the center.
    pub inner_radius: f64,
}

impl Default for FanGeometryConfig {
    fn default() -> Self {
        Self {
            max_angle: 180.0,
            num_generations: 5,
            radius_per_generation: 60.0,
            inner_radius: 30.0,
        }
    }
}

/// Notice returned when a requested setting had to be adjusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigNotice {
    /// The requested arc width was snapped to the nearest supported one.
    AngleSnapped { requested: f64, used: f64 },
    /// The requested generation count was clamped into the valid range.
    GenerationsClamped { requested: u32, used: u32 },
}

impl std::fmt::Display for ConfigNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigNotice::AngleSnapped { requested, used } => {
                write!(f, "Fan angle {}° not supported, using {}°", requested, used)
            }
            ConfigNotice::GenerationsClamped { requested, used } => {
                write!(f, "Generation count {} out of range, using {}", requested, used)
            }
        }
    }
}

impl FanGeometryConfig {
    /// Set the visible arc, snapping to the nearest supported angle.
    pub fn set_max_angle(&mut self, requested: f64) -> Option<ConfigNotice> {
        let used = SUPPORTED_ANGLES
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - requested)
                    .abs()
                    .partial_cmp(&(b - requested).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(SUPPORTED_ANGLES[0]);
        self.max_angle = used;
        if (used - requested).abs() > f64::EPSILON {
            Some(ConfigNotice::AngleSnapped { requested, used })
        } else {
            None
        }
    }

    /// Set the displayed generation count, clamping into the valid range.
    pub fn set_num_generations(&mut self, requested: u32) -> Option<ConfigNotice> {
        let used = requested.clamp(MIN_GENERATIONS, MAX_GENERATIONS);
        self.num_generations = used;
        if used != requested {
            Some(ConfigNotice::GenerationsClamped { requested, used })
        } else {
            None
        }
    }
}
