//! Fan Control Loop
//!
//! Runs one control cycle per poll interval. Signal listeners only set flags
//! and wake the loop; the flags are checked at the top of each iteration so a
//! running cycle always completes.
//!
//! # Reload
//! - Config errors keep the current configuration
//! - Device errors that leave nothing to control end the loop with an error
//! - Any other rediscovery error keeps the current registry

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use sf_core::{load_config, ControlEngine, PseudoFs};
use sf_error::{Result, SmcfanError};

/// Requests from signal handlers to the control loop
#[derive(Debug, Default)]
pub struct ControlSignals {
    shutdown: AtomicBool,
    reload: AtomicBool,
    /// Wakes the loop out of its sleep
    wake: Notify,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn request_reload(&self) {
        self.reload.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Check and clear the reload flag
    pub fn take_reload(&self) -> bool {
        self.reload.swap(false, Ordering::SeqCst)
    }
}

/// Route SIGHUP to reload and SIGINT/SIGTERM to shutdown
pub fn spawn_signal_listeners(signals: Arc<ControlSignals>) -> Result<()> {
    let install = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| SmcfanError::Signal(format!("{}: {}", name, e)))
    };
    let mut hangup = install(SignalKind::hangup(), "SIGHUP")?;
    let mut interrupt = install(SignalKind::interrupt(), "SIGINT")?;
    let mut terminate = install(SignalKind::terminate(), "SIGTERM")?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = hangup.recv() => {
                    info!("SIGNAL: Received SIGHUP - reloading configuration");
                    signals.request_reload();
                }
                Some(()) = interrupt.recv() => {
                    info!("SIGNAL: Received SIGINT - shutting down");
                    signals.request_shutdown();
                }
                Some(()) = terminate.recv() => {
                    info!("SIGNAL: Received SIGTERM - shutting down");
                    signals.request_shutdown();
                }
                else => break,
            }
        }
    });

    Ok(())
}

/// Re-read the config file and rediscover the device.
///
/// Returns an error only when the daemon must stop.
fn reload<F: PseudoFs>(engine: &mut ControlEngine<F>, config_path: &Path) -> Result<()> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load {}: {} - keeping current configuration", config_path.display(), e);
            engine.config().clone()
        }
    };

    match engine.reload(config) {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Reload failed: {} - keeping current sensors", e);
            Ok(())
        }
    }
}

/// Run the control loop until shutdown is requested or a reload fails fatally
pub async fn run_control_loop<F: PseudoFs>(
    engine: &mut ControlEngine<F>,
    config_path: &Path,
    signals: &ControlSignals,
) -> Result<()> {
    info!("Fan control loop starting");
    let mut cycles: u64 = 0;

    loop {
        if signals.shutdown_requested() {
            info!("Fan control loop shutting down after {} cycles", cycles);
            if let Some(state) = engine.last_state() {
                info!("Fans left at {} (set by {})", state.speed, state.source);
            }
            return Ok(());
        }

        if signals.take_reload() {
            info!("SIGNAL: Configuration reload requested");
            if let Err(e) = reload(engine, config_path) {
                error!("Reload failed: {}", e);
                return Err(e);
            }
        }

        engine.run_cycle();
        cycles += 1;

        tokio::select! {
            _ = tokio::time::sleep(engine.poll_interval()) => {}
            _ = signals.wake.notified() => {
                debug!("Control loop woken up by signal");
            }
        }
    }
}
