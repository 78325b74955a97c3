// Message types shared by the controllers and the runtimes

use serde::{Deserialize, Serialize};

use crate::control::clamp;

/// One sample from the 4-element line sensor array, index 0 = leftmost.
/// `true` = sensor over background, `false` = sensor over the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackReading(pub [bool; 4]);

impl TrackReading {
    /// All sensors tripped at once means the line is gone, not a valid fix.
    pub fn line_lost(&self) -> bool {
        self.0.iter().all(|&s| s)
    }
}

/// Orientation sample from the tilt remote, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationReading {
    pub pitch: f64,
    pub roll: f64,
}

// Normalized wheel-speed pair, created fresh every control tick.
// Consumed immediately by the transport, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriveCommand {
    pub left: f64,
    pub right: f64,
}

impl DriveCommand {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    /// Limits both wheels to the symmetric magnitude bound.
    pub fn clamped(self, bound: f64) -> Self {
        Self {
            left: clamp(self.left, -bound, bound),
            right: clamp(self.right, -bound, bound),
        }
    }

    /// Rounds both wheels to two fractional digits, the wire precision.
    pub fn rounded(self) -> Self {
        Self {
            left: round2(self.left),
            right: round2(self.right),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Health status published by the line-follow runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    SensorStale,
}
