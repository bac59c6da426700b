//! # Code Page 437 Encoding
//!
//! Converts Unicode strings to CP437 single-byte encoding, the power-on
//! code table of the printer (`select_codepage` 0).
//!
//! ASCII (U+0000–U+007F) passes through unchanged. The upper half is the
//! IBM PC character set: accented Latin, box drawing, Greek and math
//! symbols. Characters outside the table are an error: the printer would
//! render a random glyph and there is no way to detect that from this side
//! of the link.

use crate::error::BrasaError;
use crate::protocol::TextEncoding;

/// CP437 upper half: byte `0x80 + i` renders as `CP437_HIGH[i]`.
#[rustfmt::skip]
static CP437_HIGH: [char; 128] = [
    // 0x80–0x8F
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90–0x9F
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0–0xAF
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0–0xBF
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0–0xCF
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0–0xDF
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0–0xEF
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    // 0xF0–0xFF
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// Encode a Unicode string as CP437 bytes.
///
/// Fails with [`BrasaError::Encoding`] on the first character with no CP437
/// representation.
pub fn encode(s: &str) -> Result<Vec<u8>, BrasaError> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        if (ch as u32) < 0x80 {
            out.push(ch as u8);
        } else if let Some(byte) = to_byte(ch) {
            out.push(byte);
        } else {
            return Err(BrasaError::Encoding {
                ch,
                code: ch as u32,
                encoding: TextEncoding::Cp437,
            });
        }
    }
    Ok(out)
}

/// Map a non-ASCII code point to its CP437 byte, if it has one.
fn to_byte(ch: char) -> Option<u8> {
    CP437_HIGH
        .iter()
        .position(|&entry| entry == ch)
        .map(|i| 0x80 + i as u8)
}
