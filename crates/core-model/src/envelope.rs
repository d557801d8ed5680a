//! Truck cargo hold geometry.
//!
//! Coordinate convention:
//! * x in [0, width], left wall to right wall looking toward the cab.
//! * y in [0, length], y = 0 at the cab, y = length at the door.
//! * z in [0, height], z = 0 at the floor.
//!
//! Invariants:
//! * A valid envelope has strictly positive width and length.
//! * Height may be 0, meaning the roof is unenforced (open trailer).

use serde::{Deserialize, Serialize};

/// Interior dimensions of the cargo hold, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruckEnvelope {
    pub width: f64,
    pub length: f64,
    pub height: f64,
}

impl TruckEnvelope {
    /// North-American 53' dry van interior, the default production target.
    pub const DEFAULT_WIDTH: f64 = 98.0;
    pub const DEFAULT_HEIGHT: f64 = 110.0;

    pub fn new(width: f64, length: f64, height: f64) -> Self {
        Self {
            width,
            length,
            height,
        }
    }

    /// Envelope usable for planning: positive floor plan. A zero height is
    /// tolerated (roof unenforced).
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.length > 0.0 && self.height >= 0.0
    }
}

impl Default for TruckEnvelope {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            length: 636.0,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}
