//! smcfan Daemon (smcfand)
//!
//! Keeps the fans of Apple laptops running Linux at a speed proportional to
//! the temperatures reported by the `applesmc` driver.
//!
//! # Lifecycle
//! - Parse arguments, initialize logging (journald when available)
//! - Verify root privileges and write the PID file
//! - Load the configuration, locate the SMC and discover its sensors and fans
//! - Run the control loop until SIGINT/SIGTERM; SIGHUP reloads
//!
//! The daemon never forks; run it under a service manager.

mod fan_control;
mod pid_file;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use sf_core::constants::paths;
use sf_core::{load_config, ControlEngine, FanConfig, SysFs};

use fan_control::ControlSignals;
use pid_file::PidFile;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fan control daemon for Apple SMC laptops
#[derive(Parser, Debug)]
#[command(name = "smcfand")]
#[command(version, about = "Fan control daemon for Apple SMC laptops", long_about = None)]
struct Args {
    /// Run in foreground (always the case; accepted for compatibility)
    #[arg(short, long)]
    foreground: bool,

    /// Path to the configuration file (`.json` selects the JSON format)
    #[arg(short, long, default_value = paths::CONFIG_FILE)]
    config: PathBuf,

    /// hwmon class directory to search for the SMC device
    #[arg(long, default_value = paths::HWMON_BASE)]
    hwmon_dir: PathBuf,

    /// PID file location
    #[arg(long, default_value = paths::PID_FILE)]
    pid_file: PathBuf,

    /// Do not write a PID file
    #[arg(long)]
    no_pid_file: bool,

    /// Run a single control cycle and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    /// The root check only applies to the real sysfs tree
    fn needs_root(&self) -> bool {
        self.hwmon_dir == Path::new(paths::HWMON_BASE)
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Initialize tracing; returns whether the journal is the sink
fn init_logging() -> bool {
    let log_level = std::env::var("SMCFAN_LOG").unwrap_or_else(|_| "info".to_string());

    if Path::new(paths::JOURNALD_SOCKET).exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&log_level))
                    .init();
                return true;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .init();
    false
}

// ============================================================================
// Privileges
// ============================================================================

fn verify_privileges() -> Result<(), &'static str> {
    // SAFETY: geteuid only returns the effective user id of this process.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        return Err("Daemon must run as root (euid=0) to write fan speeds");
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn initial_config(path: &Path) -> FanConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load {}: {} - using defaults", path.display(), e);
            FanConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let use_journald = init_logging();
    info!("STARTUP: smcfand {} starting", VERSION);
    info!("STARTUP: Logging to {}", if use_journald { "systemd journal" } else { "stdout" });

    if args.needs_root() {
        if let Err(e) = verify_privileges() {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    let pid_file = if args.no_pid_file || args.once {
        None
    } else {
        match PidFile::create(&args.pid_file) {
            Ok(pid_file) => {
                info!("STARTUP: PID file {}", pid_file.path().display());
                Some(pid_file)
            }
            Err(e) => {
                error!("Could not write PID file: {}", e);
                std::process::exit(1);
            }
        }
    };

    let config = initial_config(&args.config);
    let mut engine = match ControlEngine::start(SysFs, &args.hwmon_dir, config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{}", e);
            drop(pid_file);
            std::process::exit(1);
        }
    };

    if args.once {
        let state = engine.run_cycle();
        info!("Speed {} set by {}", state.speed, state.source);
        return Ok(());
    }

    let signals = Arc::new(ControlSignals::new());
    fan_control::spawn_signal_listeners(signals.clone())?;
    info!("STARTUP: PID: {}", std::process::id());

    let result = fan_control::run_control_loop(&mut engine, &args.config, &signals).await;
    drop(pid_file);

    match result {
        Ok(()) => {
            info!("SHUTDOWN: Daemon terminated gracefully");
            Ok(())
        }
        Err(e) => {
            error!("SHUTDOWN: {}", e);
            std::process::exit(1);
        }
    }
}
