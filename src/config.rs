// Loop rates, topics, link configuration
use std::time::Duration;

// Control loop frequency for the sensor-driven runtimes
pub const LOOP_HZ: u64 = 50;

// Stop the base if no fresh track reading arrives within this window
pub const SENSOR_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_TRACK: &str = "diffbot/sensor/track"; // track readings in
pub const TOPIC_ORIENTATION: &str = "diffbot/sensor/orientation"; // tilt remote in
pub const TOPIC_DRIVE: &str = "diffbot/cmd/drive"; // drive commands out
pub const TOPIC_HEALTH: &str = "diffbot/state/health"; // health status
pub const TOPIC_DUEL: &str = "diffbot/duel"; // duel events, one subtopic per side

// Wired link defaults
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";
pub const SERIAL_BAUD: u32 = 115_200;
