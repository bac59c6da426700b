//! # Wire Protocol Implementation
//!
//! Low-level building blocks for the printer's escape-sequence protocol.
//!
//! ## Module Structure
//!
//! - [`commands`]: the name → (prefix, arity) command table and [`encode`]
//! - [`format`]: the formatting tree, renderer and flat style API
//! - [`cp437`]: Code Page 437 text encoding
//!
//! ## Usage Example
//!
//! ```
//! use brasa::protocol::{commands, render, FormatNode, TextEncoding};
//!
//! let mut data = Vec::new();
//! data.extend(commands::encode("init", &[])?);
//! data.extend(render(
//!     &FormatNode::bold(vec![FormatNode::text("RECEIPT\n")]),
//!     TextEncoding::Ascii,
//! )?);
//! // Send `data` to the printer via the throttled transport...
//! # Ok::<(), brasa::BrasaError>(())
//! ```

pub mod commands;
pub mod cp437;
pub mod format;

pub use commands::{encode, CommandSpec, VARIADIC};
pub use format::{render, EnlargeKind, Format, FormatNode, ModeKind, StyleOptions, TextEncoding};
