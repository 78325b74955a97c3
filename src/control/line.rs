// Line follower: converts a 4-sensor track reading into wheel speeds.
//
// Two calibrations are in use on the same chassis, so the whole weight
// table is configuration rather than a single hardcoded policy.

use crate::control::clamp::clamp;
use crate::messages::{DriveCommand, TrackReading};

pub const SENSOR_COUNT: usize = 4;

/// Per-wheel speed deltas applied when one sensor leaves the line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelDelta {
    pub left: f64,
    pub right: f64,
}

/// Steering calibration for the line follower.
#[derive(Debug, Clone, PartialEq)]
pub enum LineFollowConfig {
    /// Additive zone corrections. One signed weight per sensor: a negative
    /// weight adds its magnitude to the left wheel when that sensor leaves
    /// the line, a positive weight adds to the right wheel. When an extreme
    /// sensor is off the line and its wheel got no correction at all, the
    /// wheel is reverse-biased by `reverse_nudge` so the base turns away
    /// instead of stalling.
    Zone {
        weights: [f64; SENSOR_COUNT],
        reverse_nudge: f64,
        bound: f64,
    },
    /// Empirically tuned offsets around a base forward speed: each untripped
    /// sensor adds its (left, right) delta. Outer sensors push the opposite
    /// wheel harder than the same-side wheel.
    Offset {
        base: f64,
        deltas: [WheelDelta; SENSOR_COUNT],
        bound: f64,
    },
}

impl Default for LineFollowConfig {
    /// Symmetric zone weights: left-side sensors steer via the right wheel
    /// and vice versa, outer and inner sensors contributing 0.2 each.
    fn default() -> Self {
        Self::Zone {
            weights: [0.2, 0.2, -0.2, -0.2],
            reverse_nudge: 0.06,
            bound: 1.0,
        }
    }
}

impl LineFollowConfig {
    /// The tuning that survived track testing with the offset calibration.
    pub fn field_offsets() -> Self {
        Self::Offset {
            base: 0.08,
            deltas: [
                WheelDelta { left: -0.06, right: 0.11 },
                WheelDelta { left: 0.0, right: 0.07 },
                WheelDelta { left: 0.07, right: 0.0 },
                WheelDelta { left: 0.11, right: -0.06 },
            ],
            bound: 1.0,
        }
    }
}

/// Stateless per tick: the output depends only on the current reading.
/// The caller is responsible for holding the previous command across a
/// line-lost tick (see `runtime::LineRuntime`).
#[derive(Debug, Clone)]
pub struct LineFollowController {
    config: LineFollowConfig,
}

impl LineFollowController {
    pub fn new(config: LineFollowConfig) -> Self {
        Self { config }
    }

    /// Computes the next drive command, or `None` when every sensor is
    /// tripped (line lost). Line loss is recoverable, not an error.
    pub fn step(&self, reading: TrackReading) -> Option<DriveCommand> {
        if reading.line_lost() {
            return None;
        }

        let cmd = match &self.config {
            LineFollowConfig::Zone {
                weights,
                reverse_nudge,
                bound,
            } => {
                let mut left = 0.0;
                let mut right = 0.0;
                for (tripped, w) in reading.0.iter().zip(weights.iter()) {
                    if *tripped {
                        continue;
                    }
                    if *w < 0.0 {
                        left += -w;
                    } else {
                        right += w;
                    }
                }

                // Reverse-bias the idle wheel on an extreme-sensor hit.
                if !reading.0[0] && left == 0.0 {
                    left = -reverse_nudge;
                }
                if !reading.0[SENSOR_COUNT - 1] && right == 0.0 {
                    right = -reverse_nudge;
                }

                DriveCommand::new(left, right).clamped(*bound)
            }
            LineFollowConfig::Offset { base, deltas, bound } => {
                let mut left = *base;
                let mut right = *base;
                for (tripped, delta) in reading.0.iter().zip(deltas.iter()) {
                    if !tripped {
                        left += delta.left;
                        right += delta.right;
                    }
                }
                DriveCommand::new(left, right).clamped(*bound)
            }
        };

        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn all_sensors_tripped_means_line_lost() {
        let ctl = LineFollowController::new(LineFollowConfig::default());
        assert_eq!(ctl.step(TrackReading([true; 4])), None);
    }

    #[test]
    fn zone_leftmost_sensor_steers_left() {
        let ctl = LineFollowController::new(LineFollowConfig::default());
        let cmd = ctl.step(TrackReading([false, true, true, true])).unwrap();
        // Right wheel gets the outer correction, left wheel reverse-biases.
        assert!(close(cmd.right, 0.2), "right = {}", cmd.right);
        assert!(close(cmd.left, -0.06), "left = {}", cmd.left);
    }

    #[test]
    fn zone_rightmost_sensor_steers_right() {
        let ctl = LineFollowController::new(LineFollowConfig::default());
        let cmd = ctl.step(TrackReading([true, true, true, false])).unwrap();
        assert!(close(cmd.left, 0.2));
        assert!(close(cmd.right, -0.06));
    }

    #[test]
    fn zone_no_nudge_when_wheel_already_corrected() {
        // Both extremes off the line: each wheel gets a real correction,
        // so neither is reverse-biased.
        let ctl = LineFollowController::new(LineFollowConfig::default());
        let cmd = ctl.step(TrackReading([false, true, true, false])).unwrap();
        assert!(close(cmd.left, 0.2));
        assert!(close(cmd.right, 0.2));
    }

    #[test]
    fn zone_output_respects_bound_for_every_reading() {
        let ctl = LineFollowController::new(LineFollowConfig::Zone {
            weights: [-2.0, -1.0, 1.0, 2.0],
            reverse_nudge: 0.06,
            bound: 1.0,
        });
        for bits in 0u8..15 {
            // 15 = all-true is the sentinel, excluded here
            let reading = TrackReading([
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
            ]);
            let cmd = ctl.step(reading).unwrap();
            assert!(cmd.left.abs() <= 1.0, "{reading:?} -> {cmd:?}");
            assert!(cmd.right.abs() <= 1.0, "{reading:?} -> {cmd:?}");
        }
    }

    #[test]
    fn offset_table_reproduces_field_calibration() {
        let ctl = LineFollowController::new(LineFollowConfig::field_offsets());

        // Leftmost sensor off the line: slow the left wheel, push the right.
        let cmd = ctl.step(TrackReading([false, true, true, true])).unwrap();
        assert!(close(cmd.left, 0.02), "left = {}", cmd.left);
        assert!(close(cmd.right, 0.19), "right = {}", cmd.right);

        // Centered on the line (both inner sensors low): straight ahead.
        let cmd = ctl.step(TrackReading([true, false, false, true])).unwrap();
        assert!(close(cmd.left, 0.15));
        assert!(close(cmd.right, 0.15));
    }

    #[test]
    fn drift_sequence_ends_in_line_lost() {
        let ctl = LineFollowController::new(LineFollowConfig::default());
        let sequence = [
            TrackReading([false, true, true, true]),
            TrackReading([true, false, true, true]),
            TrackReading([true, true, true, true]),
        ];
        let outputs: Vec<_> = sequence.iter().map(|r| ctl.step(*r)).collect();
        assert!(outputs[0].is_some());
        assert!(outputs[1].is_some());
        assert_eq!(outputs[2], None);
    }
}
