// Tilt drive: converts a (pitch, roll) sample from the handheld remote
// into wheel speeds. Pitch sets the forward speed, roll slows the inner
// wheel proportionally to turn.

use crate::control::clamp::clamp;
use crate::messages::{DriveCommand, OrientationReading};

const OPERATIVE_RANGE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltDriveConfig {
    /// Wheel speed at full forward tilt.
    pub max_speed: f64,
}

impl Default for TiltDriveConfig {
    fn default() -> Self {
        Self { max_speed: 50.0 }
    }
}

/// Memoryless: each tick's output depends only on the current sample.
#[derive(Debug, Clone)]
pub struct TiltDriveController {
    config: TiltDriveConfig,
}

impl TiltDriveController {
    pub fn new(config: TiltDriveConfig) -> Self {
        Self { config }
    }

    /// Computes the next drive command, rounded to the wire precision.
    /// A sample pinned at the gimbal limit is transient sensor saturation
    /// and yields `None`, not a fault.
    pub fn step(&self, orientation: OrientationReading) -> Option<DriveCommand> {
        let pitch = clamp(orientation.pitch, -OPERATIVE_RANGE, OPERATIVE_RANGE);
        let roll = clamp(orientation.roll, -OPERATIVE_RANGE, OPERATIVE_RANGE);
        if pitch.abs() == OPERATIVE_RANGE || roll.abs() == OPERATIVE_RANGE {
            return None;
        }

        // Forward tilt (negative pitch) drives forward.
        let speed = -pitch / (OPERATIVE_RANGE / self.config.max_speed);
        let rotation = 1.0 - roll.abs() / OPERATIVE_RANGE;

        let (left, right) = if roll >= 0.0 {
            (speed, speed * rotation)
        } else {
            (speed * rotation, speed)
        };

        Some(DriveCommand::new(left, right).rounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(pitch: f64, roll: f64) -> Option<DriveCommand> {
        TiltDriveController::new(TiltDriveConfig::default())
            .step(OrientationReading { pitch, roll })
    }

    #[test]
    fn saturated_axis_yields_no_command() {
        assert_eq!(step(-90.0, 0.0), None);
        assert_eq!(step(90.0, 0.0), None);
        assert_eq!(step(0.0, 90.0), None);
        assert_eq!(step(-45.0, -90.0), None);
        // Out-of-range device values clamp onto the limit first.
        assert_eq!(step(-180.0, 0.0), None);
        assert_eq!(step(0.0, 135.0), None);
    }

    #[test]
    fn level_roll_drives_straight() {
        let cmd = step(-45.0, 0.0).unwrap();
        assert_eq!(cmd, DriveCommand::new(25.0, 25.0));
    }

    #[test]
    fn positive_roll_slows_the_right_wheel() {
        // Just under pitch saturation: speed = 89 / (90 / 50) = 49.44...
        let cmd = step(-89.0, 45.0).unwrap();
        assert_eq!(cmd.left, 49.44);
        assert_eq!(cmd.right, 24.72);
    }

    #[test]
    fn negative_roll_slows_the_left_wheel() {
        let cmd = step(-89.0, -45.0).unwrap();
        assert_eq!(cmd.right, 49.44);
        assert_eq!(cmd.left, 24.72);
    }

    #[test]
    fn backward_tilt_reverses() {
        let cmd = step(45.0, 0.0).unwrap();
        assert_eq!(cmd, DriveCommand::new(-25.0, -25.0));
    }

    #[test]
    fn custom_max_speed_scales_output() {
        let ctl = TiltDriveController::new(TiltDriveConfig { max_speed: 1.0 });
        let cmd = ctl
            .step(OrientationReading { pitch: -45.0, roll: 0.0 })
            .unwrap();
        assert_eq!(cmd, DriveCommand::new(0.5, 0.5));
    }
}
