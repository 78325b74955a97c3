// Control loops: fixed-period tick, sensor watchdog, best-effort stop
// on the way out. One sensor read, one compute step, one command
// emission per tick; the transport is the only suspension point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::time::interval;
use tracing::{debug, info, warn};
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::{Publisher, Subscriber};
use zenoh::sample::Sample;

use crate::channel;
use crate::config::{
    LOOP_HZ, SENSOR_TIMEOUT, TOPIC_DRIVE, TOPIC_DUEL, TOPIC_HEALTH, TOPIC_ORIENTATION, TOPIC_TRACK,
};
use crate::control::line::{LineFollowConfig, LineFollowController};
use crate::control::tilt::{TiltDriveConfig, TiltDriveController};
use crate::duel::{DuelConfig, DuelEvent, DuelSession, GameOutcome};
use crate::io::{ActuatorSink, SensorSource, SerialActuator};
use crate::messages::{DriveCommand, OrientationReading, RuntimeHealth, TrackReading};

type RuntimeError = Box<dyn std::error::Error + Send + Sync>;

/// Sensor-side state of the line-follow loop: keeps the latest reading,
/// holds the previous command across line-lost ticks, and stops the base
/// once the sensor goes stale.
pub struct LineRuntime {
    controller: LineFollowController,
    latest: Option<TrackReading>,
    reading_at: Instant,
    held: DriveCommand,
    timeout: Duration,
    health: RuntimeHealth,
}

impl LineRuntime {
    pub fn new(config: LineFollowConfig, timeout: Duration) -> Self {
        Self {
            controller: LineFollowController::new(config),
            latest: None,
            reading_at: Instant::now(),
            held: DriveCommand::stop(),
            timeout,
            health: RuntimeHealth::SensorStale, // Start stale until first reading
        }
    }

    pub fn on_reading(&mut self, reading: TrackReading) {
        self.latest = Some(reading);
        self.reading_at = Instant::now();
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Compute this tick's drive output (includes watchdog logic).
    pub fn compute_drive(&mut self) -> DriveCommand {
        let reading_age = self.reading_at.elapsed();

        if self.latest.is_none() || reading_age > self.timeout {
            if self.health != RuntimeHealth::SensorStale {
                warn!("Track reading stale ({:?} old), stopping base", reading_age);
            }
            self.health = RuntimeHealth::SensorStale;
            self.held = DriveCommand::stop();
            return self.held;
        }

        self.health = RuntimeHealth::Ok;
        if let Some(reading) = self.latest {
            match self.controller.step(reading) {
                Some(cmd) => self.held = cmd,
                // Line lost: hold the previous command and keep looking
                None => debug!("Line lost, holding {:?}", self.held),
            }
        }
        self.held
    }
}

/// One tick of the line-follow loop against the collaborator seams.
fn service_line_tick(
    runtime: &mut LineRuntime,
    source: &mut dyn SensorSource,
    sink: Option<&mut dyn ActuatorSink>,
) -> DriveCommand {
    if let Some(reading) = source.poll_track() {
        runtime.on_reading(reading);
    }
    let cmd = runtime.compute_drive();
    if let Some(sink) = sink {
        if let Err(e) = sink.drive(&cmd) {
            warn!("Actuator write failed: {}", e);
        }
    }
    cmd
}

/// Track readings arriving as JSON `[bool; 4]` over the sensor topic.
pub struct ZenohTrackSource {
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
}

impl SensorSource for ZenohTrackSource {
    fn poll_track(&mut self) -> Option<TrackReading> {
        let mut latest = None;
        // Drain all pending readings (non-blocking), keep latest
        while let Ok(Some(sample)) = self.subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<TrackReading>(&payload) {
                Ok(reading) => latest = Some(reading),
                Err(e) => warn!("Failed to parse track reading: {}", e),
            }
        }
        latest
    }
}

/// Closed-loop line follower: track topic in, drive commands out, with
/// an optional wired actuator alongside the drive topic.
pub async fn run_line_follow(
    config: LineFollowConfig,
    serial_port: Option<String>,
    baud: u32,
) -> Result<(), RuntimeError> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let subscriber = session.declare_subscriber(TOPIC_TRACK).await?;
    let pub_drive = session.declare_publisher(TOPIC_DRIVE).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut source = ZenohTrackSource { subscriber };
    let mut actuator: Option<SerialActuator> = match &serial_port {
        Some(port) => Some(SerialActuator::open(port, baud)?),
        None => None,
    };

    let mut runtime = LineRuntime::new(config, SENSOR_TIMEOUT);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Line follower started: {}Hz loop, {}ms sensor timeout",
        LOOP_HZ,
        SENSOR_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_TRACK);
    info!("Publishing to: {}, {}", TOPIC_DRIVE, TOPIC_HEALTH);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let cmd = service_line_tick(
            &mut runtime,
            &mut source,
            actuator.as_mut().map(|a| a as &mut dyn ActuatorSink),
        );

        pub_drive.put(channel::encode_drive(&cmd)).await?;
        pub_health
            .put(serde_json::to_string(&runtime.health())?)
            .await?;
    }

    shutdown_stop(&pub_drive, actuator.as_mut()).await;
    Ok(())
}

/// Tilt remote: orientation topic in, drive commands out. Emits nothing
/// on ticks without a fresh sample or with a saturated one.
pub async fn run_tilt_drive(config: TiltDriveConfig) -> Result<(), RuntimeError> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let subscriber = session.declare_subscriber(TOPIC_ORIENTATION).await?;
    let pub_drive = session.declare_publisher(TOPIC_DRIVE).await?;

    let controller = TiltDriveController::new(config);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!("Tilt drive started: {}Hz loop", LOOP_HZ);
    info!("Subscribed to: {}", TOPIC_ORIENTATION);
    info!("Publishing to: {}", TOPIC_DRIVE);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let mut latest = None;
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<OrientationReading>(&payload) {
                Ok(orientation) => latest = Some(orientation),
                Err(e) => warn!("Failed to parse orientation: {}", e),
            }
        }

        let Some(orientation) = latest else { continue };
        match controller.step(orientation) {
            Some(cmd) => pub_drive.put(channel::encode_drive(&cmd)).await?,
            // Gimbal limit: transient saturation, no command this tick
            None => debug!("Orientation saturated, skipping tick"),
        }
    }

    shutdown_stop(&pub_drive, None).await;
    Ok(())
}

/// Relays text-pair drive commands from the wired serial link onto the
/// drive topic, scaling and clamping on the way through.
pub async fn run_tilt_bridge(
    port: String,
    baud: u32,
    scale: f64,
    bound: f64,
) -> Result<(), RuntimeError> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let pub_drive = session.declare_publisher(TOPIC_DRIVE).await?;

    let (tx, mut rx) = tokio::sync::mpsc::channel::<DriveCommand>(16);
    let stop = Arc::new(AtomicBool::new(false));
    let reader_stop = stop.clone();
    let reader =
        tokio::task::spawn_blocking(move || read_drive_lines(&port, baud, tx, reader_stop));

    info!("Bridge started, publishing to {}", TOPIC_DRIVE);

    loop {
        tokio::select! {
            maybe_cmd = rx.recv() => match maybe_cmd {
                Some(cmd) => {
                    let cmd = DriveCommand::new(cmd.left * scale, cmd.right * scale).clamped(bound);
                    pub_drive.put(channel::encode_drive(&cmd)).await?;
                }
                None => break, // reader exited
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    stop.store(true, Ordering::Relaxed);
    drop(rx); // unblocks a reader stuck on a full channel
    shutdown_stop(&pub_drive, None).await;
    reader.await??;
    Ok(())
}

/// Blocking serial reader; lives on its own thread. Partial lines keep
/// accumulating across read timeouts until the newline arrives.
fn read_drive_lines(
    port_name: &str,
    baud: u32,
    tx: tokio::sync::mpsc::Sender<DriveCommand>,
    stop: Arc<AtomicBool>,
) -> Result<(), crate::io::LinkError> {
    use std::io::{BufRead, BufReader};

    info!("Opening serial link on {}", port_name);
    let port = serialport::new(port_name, baud)
        .timeout(Duration::from_millis(10))
        .open()?;
    let mut reader = BufReader::new(port);
    let mut buf = String::new();

    while !stop.load(Ordering::Relaxed) {
        match reader.read_line(&mut buf) {
            Ok(0) => return Ok(()), // link closed
            Ok(_) if buf.ends_with('\n') => {
                match channel::decode_drive(&buf) {
                    Ok(cmd) => {
                        if tx.blocking_send(cmd).is_err() {
                            return Ok(()); // loop side gone
                        }
                    }
                    // Drop the tick's command, never the loop
                    Err(e) => warn!("Undecodable drive line {:?}: {}", buf.trim_end(), e),
                }
                buf.clear();
            }
            Ok(_) => {} // partial line, keep reading
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Turn-based duel against a peer over the broadcast link.
pub async fn run_duel(side: &str, peer: &str, config: DuelConfig) -> Result<(), RuntimeError> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let publisher = session
        .declare_publisher(format!("{TOPIC_DUEL}/{side}"))
        .await?;
    let subscriber = session
        .declare_subscriber(format!("{TOPIC_DUEL}/{peer}"))
        .await?;

    let mut duel = DuelSession::new(config.clone());
    info!("Duel started on side {}: a/d move, space fire, q quit", side);

    enable_raw_mode()?;
    let result = duel_loop(&mut duel, &config, &publisher, &subscriber).await;
    disable_raw_mode()?;

    match duel.outcome() {
        GameOutcome::Won => info!("You won"),
        GameOutcome::Lost => info!("You were hit"),
        GameOutcome::Ongoing => info!("Duel aborted"),
    }
    result
}

async fn duel_loop(
    duel: &mut DuelSession,
    config: &DuelConfig,
    publisher: &Publisher<'_>,
    subscriber: &Subscriber<FifoChannelHandler<Sample>>,
) -> Result<(), RuntimeError> {
    let mut last_tick = Instant::now();

    loop {
        // Poll for key with 20ms timeout between animation ticks
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = event::read()?
            {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                match code {
                    KeyCode::Char('a') | KeyCode::Left if pressed => {
                        duel.move_player(-1);
                        debug!("Position: {}", duel.position());
                    }
                    KeyCode::Char('d') | KeyCode::Right if pressed => {
                        duel.move_player(1);
                        debug!("Position: {}", duel.position());
                    }
                    KeyCode::Char(' ') if pressed => duel.fire(),
                    KeyCode::Char('c') if pressed && modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char('q') | KeyCode::Esc if pressed => return Ok(()),
                    _ => {}
                }
            }
        }

        // Inbound events from the peer
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            let text = String::from_utf8_lossy(&payload);
            match channel::decode_event(&text) {
                Ok(DuelEvent::Launch { column }) => {
                    info!("Incoming shot from column {}", column);
                    duel.receive_launch(column);
                }
                Ok(DuelEvent::Defeat) => duel.receive_defeat(),
                Err(e) => warn!("Undecodable duel payload: {}", e),
            }
        }

        // Fixed-duration animation step, shared with the peer
        if last_tick.elapsed() >= config.tick_every {
            last_tick = Instant::now();
            for event in duel.tick() {
                publisher.put(channel::encode_event(event)).await?;
            }
        }

        if duel.outcome() != GameOutcome::Ongoing {
            return Ok(());
        }
    }
}

/// Best-effort final stop toward both links; failures only get logged.
async fn shutdown_stop(pub_drive: &Publisher<'_>, actuator: Option<&mut SerialActuator>) {
    info!("Shutting down, sending stop");
    let stop_line = channel::encode_drive(&DriveCommand::stop());
    if let Err(e) = pub_drive.put(stop_line).await {
        warn!("Failed to publish stop: {}", e);
    }
    if let Some(sink) = actuator {
        if let Err(e) = sink.stop() {
            warn!("Failed to stop actuator: {}", e);
        }
    }
}
