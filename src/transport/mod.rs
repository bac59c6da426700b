//! # Printer Transport Layer
//!
//! Byte transport to the physical printer, split in two:
//!
//! - [`Link`]: a blocking byte sink ([`SerialLink`] for real hardware, mock
//!   links in tests)
//! - [`ThrottledPort`]: write pacing against the printer's paper-feed
//!   latency, since the device has no flow control of its own
//!
//! The [`Clock`] capability is injected so the pacing logic is testable
//! without real sleeps.

pub mod clock;
pub mod serial;
pub mod throttle;

use std::io;

pub use clock::{Clock, MonotonicClock};
pub use serial::SerialLink;
pub use throttle::{FeedTiming, ThrottledPort, WriteKind};

/// A blocking byte sink. One `send` call transmits one complete payload;
/// implementations must not interleave or reorder.
pub trait Link {
    fn send(&mut self, data: &[u8]) -> io::Result<()>;
}
