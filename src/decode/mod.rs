pub mod revision;
pub mod throttle;

pub use revision::{HardwareRevision, Revision};
pub use throttle::ThrottleStatus;
