//! # Wire Command Codec
//!
//! This module implements the escape-sequence command set spoken by the
//! printer's serial control board.
//!
//! ## Protocol Overview
//!
//! Every operation is a fixed prefix of one or two control bytes followed by
//! zero or more single-byte arguments. There is no framing, no checksum and
//! no acknowledgment: the printer consumes the stream as-is, which is why the
//! codec is strict about argument counts and byte ranges. A malformed
//! sequence silently desynchronizes the device.
//!
//! ## Command Table
//!
//! Commands are looked up by name in a process-wide table of
//! [`CommandSpec`] entries built once at compile time. An arity of
//! [`VARIADIC`] marks commands (`define_character`) whose payload shape is a
//! hardware quirk the codec deliberately does not model; [`encode`] returns
//! just the prefix and the caller appends the raw payload itself.
//!
//! ## Example
//!
//! ```
//! use brasa::protocol::commands;
//!
//! let feed = commands::encode("print_and_feed", &[5])?;
//! assert_eq!(feed, vec![0x1B, 0x4A, 0x05]);
//! # Ok::<(), brasa::BrasaError>(())
//! ```

use crate::error::BrasaError;

/// ESC (Escape) - prefix byte of most commands
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - prefix byte of extended commands
pub const GS: u8 = 0x1D;

/// DC2 (Device Control 2) - prefix byte of bitmap and board commands
pub const DC2: u8 = 0x12;

/// Arity marker for commands followed by a raw, codec-unchecked payload
pub const VARIADIC: i8 = -1;

/// Shape of one wire command: fixed prefix bytes plus argument arity.
///
/// `arity >= 0` commands take exactly that many single-byte arguments.
/// [`VARIADIC`] commands carry a printer-specific payload that the caller is
/// responsible for.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Control bytes sent before the arguments
    pub prefix: &'static [u8],
    /// Number of single-byte arguments, or [`VARIADIC`]
    pub arity: i8,
}

/// The command table.
///
/// Names follow the control board manual's groupings: print/feed, line
/// spacing, character, bit image and board parameter commands.
static COMMANDS: &[(&str, CommandSpec)] = &[
    // -- print commands --
    // ESC J n    print and feed n dots of paper
    ("print_and_feed", spec(&[ESC, b'J'], 1)),
    // ESC d n    print and feed n lines
    ("print_and_linefeed", spec(&[ESC, b'd'], 1)),
    // -- line spacing commands --
    // ESC 3 n    line spacing in dots (default 32)
    ("set_line_spacing", spec(&[ESC, b'3'], 1)),
    // ESC a n    align mode
    ("set_text_align", spec(&[ESC, b'a'], 1)),
    // ESC $ nH nL    left blank margin in dots
    ("set_left_margin_dots", spec(&[ESC, b'$'], 2)),
    // ESC B n    left blank margin in characters
    ("set_left_margin_chars", spec(&[ESC, b'B'], 1)),
    // -- character commands --
    // ESC ! n    print mode bits
    ("set_print_mode", spec(&[ESC, b'!'], 1)),
    // GS ! n     double width/height register
    ("set_font_enlarge", spec(&[GS, b'!'], 1)),
    // ESC E n    bold on/off
    ("set_font_bold", spec(&[ESC, b'E'], 1)),
    // ESC { n    upside-down printing on/off
    ("set_updown_mode", spec(&[ESC, b'{'], 1)),
    // GS B n     white-on-black printing on/off
    ("set_reverse_mode", spec(&[GS, b'B'], 1)),
    // ESC - n    underline height in dots (0, 1, 2)
    ("set_underline", spec(&[ESC, b'-'], 1)),
    // ESC % n    select/cancel the user-defined font
    ("set_user_font", spec(&[ESC, b'%'], 1)),
    // ESC &      define user-defined characters; raw payload follows
    ("define_character", spec(&[ESC, b'&'], VARIADIC)),
    // ESC R n    internal character set
    ("select_charset", spec(&[ESC, b'R'], 1)),
    // ESC t n    character code table
    ("select_codepage", spec(&[ESC, b't'], 1)),
    // -- bit image commands --
    // DC2 * r n  print an n-byte-wide bitmap of r rows
    ("print_bitmap", spec(&[DC2, b'*'], 2)),
    // -- board parameter commands --
    ("print_test_page", spec(&[DC2, b'T'], 0)),
    ("init", spec(&[ESC, b'@'], 0)),
    ("set_control_parameter", spec(&[ESC, b'7'], 3)),
    ("set_printing_density", spec(&[DC2, b'#'], 2)),
];

const fn spec(prefix: &'static [u8], arity: i8) -> CommandSpec {
    CommandSpec { prefix, arity }
}

/// Look up a command by name.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, spec)| spec)
}

/// Encode a named command with its arguments into wire bytes.
///
/// ## Errors
///
/// - [`BrasaError::UnknownCommand`] if `name` is not in the table
/// - [`BrasaError::InvalidArgumentCount`] if the argument count does not
///   match a non-variadic command's arity
/// - [`BrasaError::ValueOutOfRange`] if any argument exceeds 255
pub fn encode(name: &str, args: &[u16]) -> Result<Vec<u8>, BrasaError> {
    let spec = lookup(name).ok_or_else(|| BrasaError::UnknownCommand(name.to_string()))?;

    if spec.arity >= 0 && args.len() != spec.arity as usize {
        return Err(BrasaError::InvalidArgumentCount {
            command: name.to_string(),
            expected: spec.arity as usize,
            got: args.len(),
        });
    }

    let mut out = Vec::with_capacity(spec.prefix.len() + args.len());
    out.extend_from_slice(spec.prefix);
    for &arg in args {
        let byte = u8::try_from(arg).map_err(|_| BrasaError::ValueOutOfRange(arg))?;
        out.push(byte);
    }

    Ok(out)
}

/// All command names in the table, used by the façade tests to sweep the
/// whole surface.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|(name, _)| *name)
}

// ============================================================================
// TESTS
// ============================================================================
