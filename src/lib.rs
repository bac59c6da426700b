//! # Brasa - Serial Thermal Printer Driver
//!
//! Brasa drives cheap thermal receipt printers over a raw serial link.
//! These devices have no hardware flow control and no acknowledgment
//! protocol: send bytes faster than the print head can physically execute
//! them and the internal buffer overruns silently, corrupting everything
//! that follows. The library is built around that constraint:
//!
//! - **Command codec**: named operations → fixed escape-sequence wire format
//! - **Formatting engine**: a tree of style regions rendered to balanced,
//!   minimal on/off escape pairs, even when regions nest or overlap
//! - **Throttled transport**: self-paced writes against a paper-feed time
//!   model, since the printer will never tell us to slow down
//! - **Printer façade**: image printing, reset/resync, heat calibration,
//!   margins, character sets
//!
//! ## Quick Start
//!
//! ```no_run
//! use brasa::{
//!     printer::Printer,
//!     protocol::FormatNode,
//! };
//!
//! let mut printer = Printer::on_serial("/dev/ttyAMA0", 19200)?;
//! printer.set_heat(64, 800, 20)?;
//!
//! printer.print_formatted(&FormatNode::bold(vec![
//!     FormatNode::text("hello, paper\n"),
//! ]))?;
//! printer.feed(32)?;
//! # Ok::<(), brasa::BrasaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Command codec and text formatting engine |
//! | [`transport`] | Serial link and write throttling |
//! | [`printer`] | Printer façade and calibration config |
//! | [`render`] | Image/QR to packed-bitmap conversion |
//! | [`error`] | Error types |
//!
//! ## Concurrency Model
//!
//! Single-threaded, synchronous, blocking. A write may sleep out the
//! remaining throttle interval and then block on the device. One façade
//! owns one port exclusively; wrap the whole façade in a mutex if threads
//! must share it, because "check deadline, sleep, write, advance" is not
//! atomic.

pub mod error;
pub mod printer;
pub mod protocol;
pub mod range;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::BrasaError;
pub use printer::{Printer, PrinterConfig};
pub use transport::SerialLink;
