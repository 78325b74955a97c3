// Collaborator seams between the controllers and the hardware.
//
// The core only needs a read primitive (fresh sensor sample per control
// period) and a write primitive (fire-and-forget drive command); both
// sit behind traits so the runtimes stay testable without hardware.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;
use thiserror::Error;
use tracing::{info, warn};

use crate::channel;
use crate::messages::{DriveCommand, TrackReading};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Yields the latest track reading, if a fresh one arrived since the
/// last poll.
pub trait SensorSource {
    fn poll_track(&mut self) -> Option<TrackReading>;
}

/// Accepts drive commands, fire-and-forget; no return value is relied
/// upon beyond surfacing link loss.
pub trait ActuatorSink {
    fn drive(&mut self, cmd: &DriveCommand) -> Result<(), LinkError>;

    fn stop(&mut self) -> Result<(), LinkError> {
        self.drive(&DriveCommand::stop())
    }
}

/// Wired actuator: text-pair lines over a serial link.
pub struct SerialActuator {
    port: Box<dyn SerialPort>,
}

impl SerialActuator {
    pub fn open(port_name: &str, baud: u32) -> Result<Self, LinkError> {
        info!("Opening actuator link on {}", port_name);
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(100))
            .open()?;
        Ok(Self { port })
    }
}

impl ActuatorSink for SerialActuator {
    fn drive(&mut self, cmd: &DriveCommand) -> Result<(), LinkError> {
        self.port.write_all(channel::encode_drive(cmd).as_bytes())?;
        self.port.write_all(b"\n")?;
        Ok(())
    }
}

impl Drop for SerialActuator {
    fn drop(&mut self) {
        // One last stop so the base doesn't keep the previous command
        if let Err(e) = self.stop() {
            warn!("Failed to stop actuator on drop: {}", e);
        }
    }
}
