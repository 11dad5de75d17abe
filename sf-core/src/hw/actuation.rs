//! Fan actuation
//!
//! The SMC treats `fanN_min` as a lower bound for its own fan controller.
//! Writing the computed speed there and clearing `fanN_manual` keeps the SMC
//! in charge of everything above that bound.

use tracing::{trace, warn};

use crate::constants::fan;
use crate::hw::fs::PseudoFs;
use crate::hw::registry::Actuator;

/// Outcome of writing one speed to all actuators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuationReport {
    pub written: usize,
    pub failed: usize,
}

impl ActuationReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Write `speed` to every actuator and release manual mode.
///
/// Every write is attempted regardless of earlier failures. Nothing is read
/// back.
pub fn apply<F: PseudoFs + ?Sized>(fs: &F, speed: i32, actuators: &[Actuator]) -> ActuationReport {
    let speed_text = speed.to_string();
    let mut report = ActuationReport::default();

    for actuator in actuators {
        let writes = [
            (&actuator.min_path, speed_text.as_str()),
            (&actuator.manual_path, fan::MANUAL_RELEASE),
        ];
        for (path, text) in writes {
            match fs.write_text(path, text) {
                Ok(()) => {
                    trace!(fan = actuator.index, "Wrote {} to {:?}", text, path);
                    report.written += 1;
                }
                Err(e) => {
                    warn!(
                        fan = actuator.index,
                        path = %path.display(),
                        error = %e,
                        "Fan write failed"
                    );
                    report.failed += 1;
                }
            }
        }
    }

    report
}
