//! # Printer Façade
//!
//! [`Printer`] composes the command codec and the throttled transport into
//! printer-level operations. It holds both collaborators rather than
//! extending either: the codec produces bytes, the port paces and writes
//! them, and every higher-level operation funnels through that one pair, so
//! writes from a single façade instance are strictly ordered.
//!
//! ```no_run
//! use brasa::printer::Printer;
//!
//! let mut printer = Printer::on_serial("/dev/ttyAMA0", 19200)?;
//! printer.set_heat(64, 800, 20)?;
//! printer.print_text("hello, paper\n")?;
//! printer.feed(32)?;
//! # Ok::<(), brasa::BrasaError>(())
//! ```

pub mod config;

use log::debug;

use crate::error::BrasaError;
use crate::protocol::{commands, render, FormatNode, TextEncoding};
use crate::range::Range;
use crate::transport::{
    Clock, FeedTiming, Link, MonotonicClock, SerialLink, ThrottledPort, WriteKind,
};

pub use config::{PrinterConfig, CHARS_PER_LINE, DOTS_PER_LINE, MAX_ROW_BYTES};

/// How many times [`Printer::reset`] replays the init sequence.
///
/// The protocol has no flush or resync command. If a previous session died
/// mid-command, the board may be waiting for the rest of an argument list;
/// replaying a complete idempotent reset several times is the only way to
/// walk it back to a known state.
pub const RESET_REPEATS: usize = 10;

/// Lines on the built-in test page, used to estimate its feed time.
const TEST_PAGE_LINES: u32 = 28;

const MAX_DOTS: Range = Range::new("max_dots", 8, 2048 + 8, 8);
const HEAT_TIME: Range = Range::new("heat_time", 30, 2550 + 10, 10);
const HEAT_INTERVAL: Range = Range::new("heat_interval", 0, 2550 + 10, 10);
const DENSITY: Range = Range::new("density", 0, 32, 1);
const BREAK_TIME: Range = Range::new("break_time", 0, 8, 1);

/// Horizontal alignment of subsequent text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Middle = 1,
    Right = 2,
}

/// Internal character sets selectable with `select_charset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Usa = 0,
    France = 1,
    Germany = 2,
    Uk = 3,
    Denmark1 = 4,
    Sweden = 5,
    Italy = 6,
    Spain1 = 7,
    Japan = 8,
    Norway = 9,
    Denmark2 = 10,
    Spain2 = 11,
    LatinAmerica = 12,
    Korea = 13,
}

/// Character code tables selectable with `select_codepage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePage {
    Cp437 = 0,
    Cp850 = 1,
}

/// A thermal printer bound to one exclusive throttled port.
pub struct Printer<L: Link, C: Clock = MonotonicClock> {
    port: ThrottledPort<L, C>,
    encoding: TextEncoding,
}

impl Printer<SerialLink> {
    /// Open a serial device and bind a printer to it.
    pub fn on_serial(device: &str, baudrate: u32) -> Result<Self, BrasaError> {
        let link = SerialLink::open(device, baudrate)?;
        Self::new(ThrottledPort::new(link, FeedTiming::default()))
    }

    /// Construct a printer from a calibration config: open the device, then
    /// apply the heat settings.
    pub fn from_config(cfg: &PrinterConfig) -> Result<Self, BrasaError> {
        let mut printer = Self::on_serial(&cfg.dev, cfg.baudrate)?;
        printer.set_heat(cfg.max_dots, cfg.heat_time, cfg.interval)?;
        Ok(printer)
    }
}

impl<L: Link, C: Clock> Printer<L, C> {
    /// Bind a printer to a port and bring the device to a known state.
    pub fn new(port: ThrottledPort<L, C>) -> Result<Self, BrasaError> {
        let mut printer = Printer {
            port,
            encoding: TextEncoding::default(),
        };
        printer.reset()?;
        Ok(printer)
    }

    /// Select the text encoding used by [`print_text`](Self::print_text) and
    /// [`print_formatted`](Self::print_formatted).
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// The underlying throttled port.
    pub fn port(&self) -> &ThrottledPort<L, C> {
        &self.port
    }

    /// Encode a named command and write it unpaced (`Raw`).
    pub fn send_command(&mut self, name: &str, args: &[u16]) -> Result<(), BrasaError> {
        debug!("command {} {:?}", name, args);
        let frame = commands::encode(name, args)?;
        self.port.write(&frame, WriteKind::Raw)
    }

    // ------------------------------------------------------------------
    // printing
    // ------------------------------------------------------------------

    /// Write text through the transport with line-feed pacing.
    pub fn print_text(&mut self, text: &str) -> Result<(), BrasaError> {
        let bytes = self.encoding.encode(text)?;
        self.port.write(&bytes, WriteKind::Text)
    }

    /// Render a formatting tree and write it with line-feed pacing.
    pub fn print_formatted(&mut self, tree: &FormatNode) -> Result<(), BrasaError> {
        let bytes = render(tree, self.encoding)?;
        self.port.write(&bytes, WriteKind::Text)
    }

    /// Print buffered data and feed `n` dots of paper.
    pub fn feed(&mut self, n_dots: u8) -> Result<(), BrasaError> {
        self.send_command("print_and_feed", &[n_dots as u16])?;
        self.port.fed_dots(n_dots as u32);
        Ok(())
    }

    /// Print buffered data and feed `n` whole lines.
    pub fn feed_lines(&mut self, n_lines: u8) -> Result<(), BrasaError> {
        self.send_command("print_and_linefeed", &[n_lines as u16])?;
        self.port.fed_lines(n_lines as u32);
        Ok(())
    }

    /// Print a packed monochrome bitmap, row by row.
    ///
    /// `data` is `height * row_width` bytes, top row first, 0-bit = ink.
    /// Each row is sent as its own `print_bitmap` command followed by the
    /// raw row bytes and a one-dot feed notification, keeping the throttle
    /// model accurate at the same granularity the head advances.
    pub fn print_image(&mut self, row_width: u8, data: &[u8]) -> Result<(), BrasaError> {
        if row_width == 0 || row_width > MAX_ROW_BYTES {
            return Err(BrasaError::InvalidValue(format!(
                "row width must be 1-{} bytes, is {}",
                MAX_ROW_BYTES, row_width
            )));
        }
        if data.len() % row_width as usize != 0 {
            return Err(BrasaError::BadImageFormat {
                len: data.len(),
                row_width: row_width as usize,
            });
        }

        for row in data.chunks(row_width as usize) {
            self.send_command("print_bitmap", &[1, row_width as u16])?;
            self.port.write(row, WriteKind::Raw)?;
            self.port.fed_dots(1);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // device state
    // ------------------------------------------------------------------

    /// Resynchronize the device by replaying a full reset [`RESET_REPEATS`]
    /// times.
    pub fn reset(&mut self) -> Result<(), BrasaError> {
        for _ in 0..RESET_REPEATS {
            self.send_command("init", &[])?;
            self.send_command("set_print_mode", &[0])?;
        }
        Ok(())
    }

    /// Apply thermal head calibration.
    ///
    /// - `max_dots`: dots heated per pass, 8-2048 in steps of 8
    /// - `heat_time`: heating time in µs, 30-2550 in steps of 10
    /// - `interval`: pause between passes in µs, 0-2550 in steps of 10
    ///
    /// Values are normalized to register units (`(v - low) / step`) before
    /// being sent.
    pub fn set_heat(
        &mut self,
        max_dots: u32,
        heat_time: u32,
        interval: u32,
    ) -> Result<(), BrasaError> {
        let args = [
            MAX_DOTS.convert(max_dots)?,
            HEAT_TIME.convert(heat_time)?,
            HEAT_INTERVAL.convert(interval)?,
        ];
        self.send_command("set_control_parameter", &args)
    }

    /// Set printing density and the inter-line break time.
    pub fn set_density(&mut self, density: u8, break_time: u8) -> Result<(), BrasaError> {
        let density = DENSITY.convert(density as u32)?;
        let break_time = BREAK_TIME.convert(break_time as u32)?;
        self.send_command("set_printing_density", &[density, break_time])
    }

    // ------------------------------------------------------------------
    // layout
    // ------------------------------------------------------------------

    /// Left margin in character cells.
    pub fn set_left_margin_chars(&mut self, chars: u8) -> Result<(), BrasaError> {
        self.send_command("set_left_margin_chars", &[chars as u16])
    }

    /// Left margin in dots.
    pub fn set_left_margin_dots(&mut self, dots: u16) -> Result<(), BrasaError> {
        self.send_command("set_left_margin_dots", &[dots / 256, dots % 256])
    }

    /// Alignment of subsequent text.
    pub fn set_text_align(&mut self, alignment: Alignment) -> Result<(), BrasaError> {
        self.send_command("set_text_align", &[alignment as u16])
    }

    /// Line spacing in dots (power-on default is 32).
    pub fn set_line_height(&mut self, spacing: u8) -> Result<(), BrasaError> {
        self.send_command("set_line_spacing", &[spacing as u16])
    }

    // ------------------------------------------------------------------
    // character set
    // ------------------------------------------------------------------

    /// Select an internal region character set.
    pub fn set_charset(&mut self, charset: Charset) -> Result<(), BrasaError> {
        self.send_command("select_charset", &[charset as u16])
    }

    /// Select a character code table.
    pub fn set_code_page(&mut self, page: CodePage) -> Result<(), BrasaError> {
        self.send_command("select_codepage", &[page as u16])
    }

    /// Upload one user-defined character glyph.
    ///
    /// `data` is a column-packed bitmap, exactly 3 bytes (24 dots) tall and
    /// 0-12 bytes wide. The frame is written as one raw payload so it cannot
    /// be interleaved mid-definition.
    pub fn upload_custom_character(
        &mut self,
        charnum: u8,
        data: &[u8],
    ) -> Result<(), BrasaError> {
        if data.len() % 3 != 0 {
            return Err(BrasaError::InvalidValue(
                "custom character must be 24 dots (3 bytes) tall".to_string(),
            ));
        }
        let width = data.len() / 3;
        if width > 12 {
            return Err(BrasaError::InvalidValue(format!(
                "character must be between 0 and 12 bytes wide, is {}",
                width
            )));
        }

        let mut frame = commands::encode("define_character", &[])?;
        frame.extend_from_slice(&[3, charnum, charnum, width as u8]);
        frame.extend_from_slice(data);
        // The hardware expects one extra byte beyond the documented payload;
        // 0x00 is blank and not a printable character.
        frame.push(0x00);
        self.port.write(&frame, WriteKind::Raw)
    }

    /// Switch back from the user-defined font to the built-in one.
    pub fn clear_custom_font(&mut self) -> Result<(), BrasaError> {
        self.send_command("set_user_font", &[0])
    }

    // ------------------------------------------------------------------
    // diagnostics
    // ------------------------------------------------------------------

    /// Print the board's built-in test page.
    pub fn print_test_page(&mut self) -> Result<(), BrasaError> {
        self.send_command("print_test_page", &[])?;
        // 28 lines at the fixed 32 dots per line
        self.port.fed_dots(TEST_PAGE_LINES * 32);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::clock::testing::FakeClock;
    use crate::transport::testing::MockLink;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn printer(timing: FeedTiming) -> (Printer<MockLink, FakeClock>, MockLink, FakeClock) {
        let clock = FakeClock::new();
        let link = MockLink::new();
        let port = ThrottledPort::with_clock(link.clone(), timing, clock.clone());
        let printer = Printer::new(port).unwrap();
        link.clear(); // drop the reset preamble
        (printer, link, clock)
    }

    #[test]
    fn test_construction_resets_device() {
        let clock = FakeClock::new();
        let link = MockLink::new();
        let port = ThrottledPort::with_clock(link.clone(), FeedTiming::zero(), clock);
        let _printer = Printer::new(port).unwrap();

        let writes = link.writes();
        assert_eq!(writes.len(), 2 * RESET_REPEATS);
        for pair in writes.chunks(2) {
            assert_eq!(pair[0], vec![0x1B, 0x40]);
            assert_eq!(pair[1], vec![0x1B, 0x21, 0x00]);
        }
    }

    #[test]
    fn test_print_image_row_sequence() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        printer.print_image(2, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(
            link.writes(),
            vec![
                vec![0x12, 0x2A, 0x01, 0x02],
                vec![0xAA, 0xBB],
                vec![0x12, 0x2A, 0x01, 0x02],
                vec![0xCC, 0xDD],
            ]
        );
    }

    #[test]
    fn test_print_image_paces_per_row() {
        let (mut printer, _link, clock) = printer(FeedTiming::conservative());
        printer.print_image(2, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        // Each row after the first waits out the previous row's dot feed;
        // the second row's notification is still pending afterwards.
        printer.send_command("init", &[]).unwrap();
        assert_eq!(clock.total_slept(), Duration::from_micros(2 * 62_500));
    }

    #[test]
    fn test_print_image_bad_format_writes_nothing() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        let err = printer.print_image(2, &[0xAA, 0xBB, 0xCC]).unwrap_err();
        assert!(matches!(
            err,
            BrasaError::BadImageFormat { len: 3, row_width: 2 }
        ));
        assert!(link.writes().is_empty());
    }

    #[test]
    fn test_print_image_rejects_wide_rows() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        assert!(printer.print_image(49, &[0; 49]).is_err());
        assert!(printer.print_image(0, &[]).is_err());
        assert!(link.writes().is_empty());
    }

    #[test]
    fn test_set_heat_normalizes_to_register_units() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        printer.set_heat(64, 800, 20).unwrap();
        // (64-8)/8 = 7, (800-30)/10 = 77, (20-0)/10 = 2
        assert_eq!(link.writes(), vec![vec![0x1B, 0x37, 7, 77, 2]]);
    }

    #[test]
    fn test_set_heat_range_violation() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        match printer.set_heat(64, 2560, 20) {
            Err(BrasaError::Range { field, value, .. }) => {
                assert_eq!(field, "heat_time");
                assert_eq!(value, 2560);
            }
            other => panic!("expected range error, got {:?}", other),
        }
        assert!(link.writes().is_empty());
    }

    #[test]
    fn test_feed_notifies_throttle() {
        let (mut printer, link, clock) = printer(FeedTiming::conservative());
        printer.feed(8).unwrap();
        assert_eq!(link.writes(), vec![vec![0x1B, 0x4A, 8]]);
        printer.send_command("init", &[]).unwrap();
        assert_eq!(clock.total_slept(), Duration::from_micros(8 * 62_500));
    }

    #[test]
    fn test_print_text_line_pacing() {
        let (mut printer, link, clock) = printer(FeedTiming::conservative());
        printer.print_text("a\nb\n").unwrap();
        assert_eq!(link.writes(), vec![b"a\n".to_vec(), b"b\n".to_vec()]);
        assert_eq!(clock.total_slept(), Duration::from_millis(160));
    }

    #[test]
    fn test_print_formatted() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        let tree = FormatNode::bold(vec![FormatNode::text("hi")]);
        printer.print_formatted(&tree).unwrap();
        assert_eq!(link.stream(), b"\x1B\x45\x01hi\x1B\x45\x00");
    }

    #[test]
    fn test_left_margin_dots_split() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        printer.set_left_margin_dots(300).unwrap();
        assert_eq!(link.writes(), vec![vec![0x1B, 0x24, 1, 44]]);
    }

    #[test]
    fn test_align_charset_codepage() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        printer.set_text_align(Alignment::Middle).unwrap();
        printer.set_charset(Charset::LatinAmerica).unwrap();
        printer.set_code_page(CodePage::Cp850).unwrap();
        assert_eq!(
            link.writes(),
            vec![
                vec![0x1B, 0x61, 1],
                vec![0x1B, 0x52, 12],
                vec![0x1B, 0x74, 1],
            ]
        );
    }

    #[test]
    fn test_upload_custom_character_frame() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        let glyph = [0xFF; 6]; // 2 bytes wide, 3 bytes tall
        printer.upload_custom_character(65, &glyph).unwrap();

        let mut expected = vec![0x1B, 0x26, 3, 65, 65, 2];
        expected.extend_from_slice(&glyph);
        expected.push(0x00);
        assert_eq!(link.writes(), vec![expected]);
    }

    #[test]
    fn test_upload_custom_character_bad_dimensions() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        assert!(printer.upload_custom_character(65, &[0xFF; 5]).is_err());
        assert!(printer.upload_custom_character(65, &[0xFF; 39]).is_err());
        assert!(link.writes().is_empty());
    }

    #[test]
    fn test_print_test_page_feed_estimate() {
        let (mut printer, link, clock) = printer(FeedTiming::conservative());
        printer.print_test_page().unwrap();
        assert_eq!(link.writes(), vec![vec![0x12, 0x54]]);
        printer.send_command("init", &[]).unwrap();
        assert_eq!(
            clock.total_slept(),
            Duration::from_micros(28 * 32 * 62_500)
        );
    }

    #[test]
    fn test_set_density() {
        let (mut printer, link, _clock) = printer(FeedTiming::zero());
        printer.set_density(15, 3).unwrap();
        assert_eq!(link.writes(), vec![vec![0x12, 0x23, 15, 3]]);
        assert!(printer.set_density(32, 0).is_err());
        assert!(printer.set_density(0, 8).is_err());
    }
}
