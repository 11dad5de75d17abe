//! Hardware interaction modules
//!
//! All access to the SMC device: locating it, enumerating its attributes and
//! writing fan speeds.

pub mod actuation;
pub mod descriptions;
pub mod fs;
pub mod locator;
pub mod registry;

pub use actuation::{apply, ActuationReport};
pub use descriptions::{describe, SENSOR_DESCRIPTIONS};
pub use fs::{PseudoFs, SysFs};
pub use locator::locate;
pub use registry::{Actuator, Channel, Registry};
