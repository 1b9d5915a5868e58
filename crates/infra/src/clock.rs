//! Wall-clock implementation of the core clock port.

use calbridge_core::Clock;
use chrono::{DateTime, Utc};

/// Clock that reads the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
