//! # Text Formatting Engine
//!
//! Styled text is described as a tree of format nodes and rendered to wire
//! bytes in a single depth-first pass. Overlapping style regions nest
//! arbitrarily; the renderer reference-counts each mode per render call so
//! that on-sequences are emitted exactly once per region entry (0→1) and
//! off-sequences exactly once per region exit (1→0), even when a mode nests
//! inside itself.
//!
//! Double width and double height are special: both live in one physical
//! enlarge register (`set_font_enlarge`), so they carry per-bit reference
//! counts and the combined register command is re-emitted only when the
//! effective bitmask actually changes.
//!
//! ```
//! use brasa::protocol::{render, FormatNode, TextEncoding};
//!
//! let tree = FormatNode::bold(vec![FormatNode::text("hello")]);
//! let bytes = render(&tree, TextEncoding::Ascii)?;
//! assert_eq!(bytes, b"\x1B\x45\x01hello\x1B\x45\x00");
//! # Ok::<(), brasa::BrasaError>(())
//! ```
//!
//! For the common non-nested case there is also the flat [`StyleOptions`] /
//! [`Format`] API that yields a `(start, end)` byte pair.

use std::collections::HashMap;

use crate::error::BrasaError;
use crate::protocol::commands::{ESC, GS};
use crate::protocol::cp437;

// ============================================================================
// TEXT ENCODING
// ============================================================================

/// Byte encoding used for text payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Strict 7-bit ASCII
    #[default]
    Ascii,
    /// IBM Code Page 437, the printer's power-on code table
    Cp437,
}

impl TextEncoding {
    /// Encode a string, failing on any character the encoding cannot
    /// represent.
    pub fn encode(self, s: &str) -> Result<Vec<u8>, BrasaError> {
        match self {
            TextEncoding::Ascii => {
                if let Some(ch) = s.chars().find(|ch| !ch.is_ascii()) {
                    return Err(BrasaError::Encoding {
                        ch,
                        code: ch as u32,
                        encoding: self,
                    });
                }
                Ok(s.as_bytes().to_vec())
            }
            TextEncoding::Cp437 => cp437::encode(s),
        }
    }
}

// ============================================================================
// FORMAT TREE
// ============================================================================

/// Toggleable style modes, each owning a fixed on/off sequence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Bold,
    Invert,
    Underline,
    UpsideDown,
    Strikethrough,
}

impl ModeKind {
    /// Escape sequence that activates this mode.
    pub fn on_sequence(self) -> &'static [u8] {
        match self {
            ModeKind::Bold => &[ESC, b'E', 0x01],
            ModeKind::Invert => &[GS, b'B', 0x01],
            ModeKind::Underline => &[ESC, b'-', 0x01],
            ModeKind::UpsideDown => &[ESC, b'{', 0x01],
            // Strikethrough is bit 6 of the print-mode register. The command
            // rewrites the whole register, clearing every other bit.
            ModeKind::Strikethrough => &[ESC, b'!', 0x40],
        }
    }

    /// Escape sequence that deactivates this mode.
    pub fn off_sequence(self) -> &'static [u8] {
        match self {
            ModeKind::Bold => &[ESC, b'E', 0x00],
            ModeKind::Invert => &[GS, b'B', 0x00],
            ModeKind::Underline => &[ESC, b'-', 0x00],
            ModeKind::UpsideDown => &[ESC, b'{', 0x00],
            ModeKind::Strikethrough => &[ESC, b'!', 0x00],
        }
    }
}

/// Enlarge flags, sharing the single `set_font_enlarge` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnlargeKind {
    DoubleWidth,
    DoubleHeight,
}

impl EnlargeKind {
    /// Bit value of this flag in the enlarge register.
    pub fn flag(self) -> u8 {
        match self {
            EnlargeKind::DoubleWidth => 0x20,
            EnlargeKind::DoubleHeight => 0x01,
        }
    }
}

/// A node in the formatting tree.
///
/// The tree is immutable once built; [`render`] consumes it by reference and
/// keeps no state across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatNode {
    /// Leaf text, encoded with the render call's [`TextEncoding`]
    Text(String),
    /// Children rendered in order with no style of their own
    Group(Vec<FormatNode>),
    /// A style region controlled by paired on/off sequences
    Mode {
        kind: ModeKind,
        children: Vec<FormatNode>,
    },
    /// An enlarge region controlled by the shared bitmask register
    Enlarge {
        kind: EnlargeKind,
        children: Vec<FormatNode>,
    },
}

impl FormatNode {
    pub fn text(content: impl Into<String>) -> Self {
        FormatNode::Text(content.into())
    }

    pub fn group(children: Vec<FormatNode>) -> Self {
        FormatNode::Group(children)
    }

    pub fn mode(kind: ModeKind, children: Vec<FormatNode>) -> Self {
        FormatNode::Mode { kind, children }
    }

    pub fn enlarge(kind: EnlargeKind, children: Vec<FormatNode>) -> Self {
        FormatNode::Enlarge { kind, children }
    }

    pub fn bold(children: Vec<FormatNode>) -> Self {
        Self::mode(ModeKind::Bold, children)
    }

    pub fn invert(children: Vec<FormatNode>) -> Self {
        Self::mode(ModeKind::Invert, children)
    }

    pub fn underline(children: Vec<FormatNode>) -> Self {
        Self::mode(ModeKind::Underline, children)
    }

    pub fn upside_down(children: Vec<FormatNode>) -> Self {
        Self::mode(ModeKind::UpsideDown, children)
    }

    pub fn strikethrough(children: Vec<FormatNode>) -> Self {
        Self::mode(ModeKind::Strikethrough, children)
    }

    pub fn double_width(children: Vec<FormatNode>) -> Self {
        Self::enlarge(EnlargeKind::DoubleWidth, children)
    }

    pub fn double_height(children: Vec<FormatNode>) -> Self {
        Self::enlarge(EnlargeKind::DoubleHeight, children)
    }
}

// ============================================================================
// RENDERER
// ============================================================================

/// Render a format tree to wire bytes.
///
/// Deterministic and pure: the output depends only on the tree and the
/// encoding. Fails with [`BrasaError::Encoding`] on unencodable text.
pub fn render(tree: &FormatNode, encoding: TextEncoding) -> Result<Vec<u8>, BrasaError> {
    let mut state = RenderState::default();
    let mut out = Vec::new();
    state.render_node(tree, encoding, &mut out)?;
    Ok(out)
}

/// Per-render-call activation state, discarded when the call returns.
#[derive(Default)]
struct RenderState {
    /// Active nesting count per style mode; counts never go negative because
    /// every descent increment is matched by the ascent decrement.
    modes: HashMap<ModeKind, u32>,
    /// Per-bit nesting counts for the shared enlarge register,
    /// `[DoubleWidth, DoubleHeight]`.
    enlarge: [u32; 2],
}

impl RenderState {
    fn render_node(
        &mut self,
        node: &FormatNode,
        encoding: TextEncoding,
        out: &mut Vec<u8>,
    ) -> Result<(), BrasaError> {
        match node {
            FormatNode::Text(content) => {
                out.extend(encoding.encode(content)?);
            }
            FormatNode::Group(children) => {
                for child in children {
                    self.render_node(child, encoding, out)?;
                }
            }
            FormatNode::Mode { kind, children } => {
                let count = self.modes.entry(*kind).or_insert(0);
                *count += 1;
                if *count == 1 {
                    out.extend_from_slice(kind.on_sequence());
                }

                for child in children {
                    self.render_node(child, encoding, out)?;
                }

                let count = self
                    .modes
                    .get_mut(kind)
                    .expect("mode entered during descent");
                *count -= 1;
                if *count == 0 {
                    out.extend_from_slice(kind.off_sequence());
                }
            }
            FormatNode::Enlarge { kind, children } => {
                let idx = enlarge_index(*kind);

                let before = self.enlarge_mask();
                self.enlarge[idx] += 1;
                self.emit_enlarge_if_changed(before, out);

                for child in children {
                    self.render_node(child, encoding, out)?;
                }

                let before = self.enlarge_mask();
                self.enlarge[idx] -= 1;
                self.emit_enlarge_if_changed(before, out);
            }
        }
        Ok(())
    }

    /// Effective bitmask of the enlarge register right now.
    fn enlarge_mask(&self) -> u8 {
        let mut mask = 0;
        if self.enlarge[0] > 0 {
            mask |= EnlargeKind::DoubleWidth.flag();
        }
        if self.enlarge[1] > 0 {
            mask |= EnlargeKind::DoubleHeight.flag();
        }
        mask
    }

    fn emit_enlarge_if_changed(&self, before: u8, out: &mut Vec<u8>) {
        let after = self.enlarge_mask();
        if after != before {
            out.extend_from_slice(&[GS, b'!', after]);
        }
    }
}

fn enlarge_index(kind: EnlargeKind) -> usize {
    match kind {
        EnlargeKind::DoubleWidth => 0,
        EnlargeKind::DoubleHeight => 1,
    }
}

// ============================================================================
// FLAT STYLE API
// ============================================================================

/// Boolean style switches for the common non-nested case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleOptions {
    pub bold: bool,
    pub invert: bool,
    pub upside_down: bool,
    pub underline: bool,
    pub double_width: bool,
    pub double_height: bool,
    pub strikethrough: bool,
}

/// A precomputed `(start, end)` escape-sequence pair for a set of
/// [`StyleOptions`].
///
/// End sequences appear in the reverse order of their start sequences so a
/// register is never rewritten by a pair that did not set it. Strikethrough
/// goes first among starts and last among ends because its `set_print_mode`
/// command resets every other print-mode bit as a side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    start: Vec<u8>,
    end: Vec<u8>,
}

impl Format {
    pub fn new(options: StyleOptions) -> Self {
        let enlarge_on: [u8; 3];
        let mut pairs: Vec<(&[u8], &[u8])> = Vec::new();

        if options.strikethrough {
            pairs.push((
                ModeKind::Strikethrough.on_sequence(),
                ModeKind::Strikethrough.off_sequence(),
            ));
        }
        if options.upside_down {
            pairs.push((
                ModeKind::UpsideDown.on_sequence(),
                ModeKind::UpsideDown.off_sequence(),
            ));
        }
        if options.invert {
            pairs.push((
                ModeKind::Invert.on_sequence(),
                ModeKind::Invert.off_sequence(),
            ));
        }
        if options.bold {
            pairs.push((ModeKind::Bold.on_sequence(), ModeKind::Bold.off_sequence()));
        }
        if options.underline {
            pairs.push((
                ModeKind::Underline.on_sequence(),
                ModeKind::Underline.off_sequence(),
            ));
        }

        let mut mask = 0;
        if options.double_width {
            mask |= EnlargeKind::DoubleWidth.flag();
        }
        if options.double_height {
            mask |= EnlargeKind::DoubleHeight.flag();
        }
        if mask != 0 {
            enlarge_on = [GS, b'!', mask];
            pairs.push((&enlarge_on, &[GS, b'!', 0x00]));
        }

        let start = pairs.iter().flat_map(|(on, _)| on.iter().copied()).collect();
        let end = pairs
            .iter()
            .rev()
            .flat_map(|(_, off)| off.iter().copied())
            .collect();

        Format { start, end }
    }

    /// Bytes emitted before the styled payload.
    pub fn start(&self) -> &[u8] {
        &self.start
    }

    /// Bytes emitted after the styled payload.
    pub fn end(&self) -> &[u8] {
        &self.end
    }

    /// Wrap a payload in the start/end sequences.
    pub fn apply(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.start.len() + payload.len() + self.end.len());
        out.extend_from_slice(&self.start);
        out.extend_from_slice(payload);
        out.extend_from_slice(&self.end);
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text() {
        let tree = FormatNode::text("hello, world");
        assert_eq!(render(&tree, TextEncoding::Ascii).unwrap(), b"hello, world");
    }

    #[test]
    fn test_bold() {
        let tree = FormatNode::bold(vec![FormatNode::text("hello")]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1B\x45\x01hello\x1B\x45\x00"
        );
    }

    #[test]
    fn test_nested_bold_emits_once() {
        // Re-entering an active mode must not re-emit control bytes.
        let tree = FormatNode::group(vec![
            FormatNode::bold(vec![
                FormatNode::bold(vec![FormatNode::text("hello")]),
                FormatNode::text("world"),
            ]),
            FormatNode::text("nonbold"),
        ]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1B\x45\x01helloworld\x1B\x45\x00nonbold"
        );
    }

    #[test]
    fn test_double_width() {
        let tree = FormatNode::double_width(vec![FormatNode::text("abc")]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1D\x21\x20abc\x1D\x21\x00"
        );
    }

    #[test]
    fn test_enlarge_register_shared() {
        // Height nested inside width: the register is rewritten with the
        // combined mask on entry and back to width-only on exit.
        let tree = FormatNode::double_width(vec![
            FormatNode::text("a"),
            FormatNode::double_height(vec![FormatNode::text("b")]),
            FormatNode::text("c"),
        ]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1D\x21\x20a\x1D\x21\x21b\x1D\x21\x20c\x1D\x21\x00"
        );
    }

    #[test]
    fn test_enlarge_reentrant() {
        // Same flag twice: effective mask never changes inside, so the
        // register command appears exactly once on each side.
        let tree = FormatNode::double_width(vec![FormatNode::double_width(vec![
            FormatNode::text("x"),
        ])]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1D\x21\x20x\x1D\x21\x00"
        );
    }

    #[test]
    fn test_mixed_modes_balanced() {
        let tree = FormatNode::bold(vec![FormatNode::invert(vec![FormatNode::text("x")])]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1B\x45\x01\x1D\x42\x01x\x1D\x42\x00\x1B\x45\x00"
        );
    }

    #[test]
    fn test_strikethrough_sequences() {
        let tree = FormatNode::strikethrough(vec![FormatNode::text("x")]);
        assert_eq!(
            render(&tree, TextEncoding::Ascii).unwrap(),
            b"\x1B\x21\x40x\x1B\x21\x00"
        );
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        let tree = FormatNode::text("héllo");
        assert!(matches!(
            render(&tree, TextEncoding::Ascii),
            Err(BrasaError::Encoding { ch: 'é', .. })
        ));
    }

    #[test]
    fn test_cp437_text() {
        let tree = FormatNode::text("café");
        assert_eq!(
            render(&tree, TextEncoding::Cp437).unwrap(),
            vec![b'c', b'a', b'f', 0x82]
        );
    }

    #[test]
    fn test_empty_group() {
        let tree = FormatNode::group(vec![]);
        assert_eq!(render(&tree, TextEncoding::Ascii).unwrap(), b"");
    }

    // ========== Flat API ==========

    #[test]
    fn test_format_bold_only() {
        let fmt = Format::new(StyleOptions {
            bold: true,
            ..Default::default()
        });
        assert_eq!(fmt.start(), b"\x1B\x45\x01");
        assert_eq!(fmt.end(), b"\x1B\x45\x00");
        assert_eq!(fmt.apply(b"hi"), b"\x1B\x45\x01hi\x1B\x45\x00");
    }

    #[test]
    fn test_format_enlarge_combined() {
        let fmt = Format::new(StyleOptions {
            double_width: true,
            double_height: true,
            ..Default::default()
        });
        assert_eq!(fmt.start(), b"\x1D\x21\x21");
        assert_eq!(fmt.end(), b"\x1D\x21\x00");
    }

    #[test]
    fn test_format_strikethrough_ordering() {
        // Strikethrough resets the whole print-mode register, so it must
        // open first and close last.
        let fmt = Format::new(StyleOptions {
            bold: true,
            strikethrough: true,
            ..Default::default()
        });
        assert_eq!(fmt.start(), b"\x1B\x21\x40\x1B\x45\x01");
        assert_eq!(fmt.end(), b"\x1B\x45\x00\x1B\x21\x00");
    }

    #[test]
    fn test_format_end_reverses_start() {
        let fmt = Format::new(StyleOptions {
            bold: true,
            invert: true,
            underline: true,
            upside_down: true,
            double_width: true,
            strikethrough: true,
            ..Default::default()
        });
        let expected_start: Vec<u8> = [
            &[ESC, b'!', 0x40][..], // strikethrough first
            &[ESC, b'{', 0x01],
            &[GS, b'B', 0x01],
            &[ESC, b'E', 0x01],
            &[ESC, b'-', 0x01],
            &[GS, b'!', 0x20],
        ]
        .concat();
        let expected_end: Vec<u8> = [
            &[GS, b'!', 0x00][..],
            &[ESC, b'-', 0x00],
            &[ESC, b'E', 0x00],
            &[GS, b'B', 0x00],
            &[ESC, b'{', 0x00],
            &[ESC, b'!', 0x00], // strikethrough last
        ]
        .concat();
        assert_eq!(fmt.start(), &expected_start[..]);
        assert_eq!(fmt.end(), &expected_end[..]);
    }

    #[test]
    fn test_format_empty_options() {
        let fmt = Format::new(StyleOptions::default());
        assert!(fmt.start().is_empty());
        assert!(fmt.end().is_empty());
        assert_eq!(fmt.apply(b"plain"), b"plain");
    }
}
