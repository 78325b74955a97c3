// Drive controllers for the differential base
//
// Provides:
// - Closed-interval clamp shared by every controller
// - Line follower (4-sensor track array -> wheel speeds)
// - Tilt drive (orientation remote -> wheel speeds)

pub mod clamp;
pub mod line;
pub mod tilt;

pub use clamp::clamp;
pub use line::{LineFollowConfig, LineFollowController, WheelDelta};
pub use tilt::{TiltDriveConfig, TiltDriveController};
