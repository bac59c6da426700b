//! # Throttled Port
//!
//! The printer has no hardware flow control and no acknowledgment protocol.
//! If bytes arrive faster than the print head physically executes them, the
//! device's internal buffer overruns silently and corrupts everything that
//! follows. The only defense is on this side of the link: estimate how long
//! the paper feed takes and refuse to write before the printer is ready.
//!
//! [`ThrottledPort`] keeps a single `next_ready` deadline. Text writes
//! advance it automatically, one line-feed interval per completed line. Raw
//! writes (commands, bitmap rows) carry no implicit notion of how much paper
//! they feed, so the caller reports that explicitly through
//! [`ThrottledPort::fed_dots`] / [`ThrottledPort::fed_lines`] once the
//! physical effect is known.
//!
//! The deadline never moves backward: notifications accumulate from
//! whichever of "now" and the previous deadline is later.

use std::time::{Duration, Instant};

use log::trace;

use crate::error::BrasaError;
use crate::transport::clock::{Clock, MonotonicClock};
use crate::transport::Link;

/// How a payload relates to paper movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Line-oriented text; each `\n` feeds one line and advances the
    /// deadline automatically.
    Text,
    /// Opaque bytes; the caller notifies the port about feeding separately.
    Raw,
}

/// Feed-time model of the printer's paper movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTiming {
    /// Time to execute one vertical dot row
    pub dot_feed: Duration,
    /// Time to print and feed one text line (32 dots at default spacing)
    pub line_feed: Duration,
}

impl FeedTiming {
    /// Conservative defaults measured against stock hardware.
    pub const fn conservative() -> Self {
        FeedTiming {
            dot_feed: Duration::from_micros(62_500),
            line_feed: Duration::from_millis(160),
        }
    }

    /// No pacing at all. Only sensible against mock links in tests.
    pub const fn zero() -> Self {
        FeedTiming {
            dot_feed: Duration::ZERO,
            line_feed: Duration::ZERO,
        }
    }
}

impl Default for FeedTiming {
    fn default() -> Self {
        Self::conservative()
    }
}

/// A byte sink that self-paces writes against a [`FeedTiming`] model.
///
/// Owns the link exclusively; all pacing state lives here, never in globals.
/// The "check deadline, sleep, write, advance" sequence is not atomic, so a
/// port (and the façade above it) must not be shared between threads without
/// external serialization.
pub struct ThrottledPort<L, C = MonotonicClock> {
    link: L,
    clock: C,
    timing: FeedTiming,
    next_ready: Instant,
}

impl<L: Link> ThrottledPort<L> {
    /// Wrap a link with the real monotonic clock.
    pub fn new(link: L, timing: FeedTiming) -> Self {
        Self::with_clock(link, timing, MonotonicClock)
    }
}

impl<L: Link, C: Clock> ThrottledPort<L, C> {
    /// Wrap a link with an injected clock.
    pub fn with_clock(link: L, timing: FeedTiming, clock: C) -> Self {
        let next_ready = clock.now();
        ThrottledPort {
            link,
            clock,
            timing,
            next_ready,
        }
    }

    /// The wrapped link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The feed-time model in use.
    pub fn timing(&self) -> FeedTiming {
        self.timing
    }

    /// Write a payload, blocking until the printer is estimated ready.
    ///
    /// `Raw` payloads wait once and do not advance the deadline. `Text`
    /// payloads are split at line terminators (terminator kept with its
    /// preceding chunk); each chunk waits, writes, and, if it completed a
    /// line, pushes the deadline out by one line-feed interval.
    pub fn write(&mut self, data: &[u8], kind: WriteKind) -> Result<(), BrasaError> {
        match kind {
            WriteKind::Raw => {
                self.wait_ready();
                self.link.send(data)?;
            }
            WriteKind::Text => {
                for chunk in data.split_inclusive(|&b| b == b'\n') {
                    self.wait_ready();
                    self.link.send(chunk)?;
                    if chunk.ends_with(b"\n") {
                        self.fed_lines(1);
                    }
                }
            }
        }
        Ok(())
    }

    /// Notify that `n` vertical dot rows have been fed.
    pub fn fed_dots(&mut self, n: u32) {
        self.advance(self.timing.dot_feed * n);
    }

    /// Notify that `n` text lines have been fed.
    pub fn fed_lines(&mut self, n: u32) {
        self.advance(self.timing.line_feed * n);
    }

    fn advance(&mut self, duration: Duration) {
        let now = self.clock.now();
        self.next_ready = self.next_ready.max(now) + duration;
    }

    fn wait_ready(&self) {
        let now = self.clock.now();
        if now < self.next_ready {
            let remaining = self.next_ready - now;
            trace!("throttle: sleeping {:?} before write", remaining);
            self.clock.sleep(remaining);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
