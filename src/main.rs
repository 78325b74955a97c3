use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use diffbot_runtime::config;
use diffbot_runtime::control::line::LineFollowConfig;
use diffbot_runtime::control::tilt::TiltDriveConfig;
use diffbot_runtime::duel::DuelConfig;
use diffbot_runtime::runtime;

#[derive(Parser)]
#[command(name = "diffbot-runtime", about = "Differential-drive control runtimes")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Clone, Copy, ValueEnum)]
enum Calibration {
    /// Symmetric zone weights
    Zone,
    /// Empirical offset table from track testing
    Offset,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    A,
    B,
}

#[derive(Subcommand)]
enum Mode {
    /// Closed-loop line follower (track topic in, drive commands out)
    Line {
        #[arg(long, value_enum, default_value = "zone")]
        calibration: Calibration,
        /// Serial port for a wired actuator alongside the drive topic
        #[arg(long)]
        port: Option<String>,
        #[arg(long, default_value_t = config::SERIAL_BAUD)]
        baud: u32,
    },
    /// Tilt remote (orientation topic in, drive commands out)
    Tilt {
        /// Wheel speed at full forward tilt
        #[arg(long, default_value_t = 50.0)]
        max_speed: f64,
    },
    /// Relay wired text-pair drive commands onto the drive topic
    Bridge {
        #[arg(long, default_value = config::DEFAULT_SERIAL_PORT)]
        port: String,
        #[arg(long, default_value_t = config::SERIAL_BAUD)]
        baud: u32,
        /// Factor applied to relayed speeds (remote sends -50..50)
        #[arg(long, default_value_t = 0.01)]
        scale: f64,
        /// Speed magnitude bound after scaling
        #[arg(long, default_value_t = 1.0)]
        bound: f64,
    },
    /// Turn-based duel over the broadcast link (a/d move, space fire, q quit)
    Duel {
        #[arg(long, value_enum)]
        side: Side,
    },
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let cli = Cli::parse();
    let result = match cli.mode {
        Mode::Line {
            calibration,
            port,
            baud,
        } => {
            let cfg = match calibration {
                Calibration::Zone => LineFollowConfig::default(),
                Calibration::Offset => LineFollowConfig::field_offsets(),
            };
            runtime::run_line_follow(cfg, port, baud).await
        }
        Mode::Tilt { max_speed } => runtime::run_tilt_drive(TiltDriveConfig { max_speed }).await,
        Mode::Bridge {
            port,
            baud,
            scale,
            bound,
        } => runtime::run_tilt_bridge(port, baud, scale, bound).await,
        Mode::Duel { side } => {
            let (side, peer) = match side {
                Side::A => ("a", "b"),
                Side::B => ("b", "a"),
            };
            runtime::run_duel(side, peer, DuelConfig::default()).await
        }
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
