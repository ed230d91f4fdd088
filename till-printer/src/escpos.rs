//! ESC/POS command layer
//!
//! The formatter emits a symbolic [`Command`] stream; [`encode_commands`]
//! lowers it to the byte sequences a thermal printer's firmware consumes.
//! Keeping the stream symbolic means the USB transport can be swapped
//! without touching any layout logic.

use crate::encoding::encode_code_page;

/// Text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Barcode symbology
///
/// Only Code128 today; receipts barcode their receipt number with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    Code128,
}

/// One logical printer operation
///
/// The sequence and content of these tokens is the contract with the
/// formatter; the raw byte encoding is printer-family detail owned here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init,
    SetAlign(Align),
    /// One line of text; a newline is appended at encode time
    Text(String),
    /// Rendered by printer firmware from the payload, not from a raster
    Barcode {
        payload: String,
        symbology: Symbology,
    },
    Feed(u8),
    Cut,
}

/// ESC/POS byte builder
///
/// Accumulates raw command bytes. Text is converted to the printer's
/// single-byte code page as it is written.
pub struct EscPos {
    buf: Vec<u8>,
}

impl EscPos {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(4096),
        }
    }

    /// Initialize printer (ESC @)
    pub fn init(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x40]);
        self
    }

    /// Write a line of text followed by a line feed
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&encode_code_page(s));
        self.buf.push(b'\n');
        self
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    /// Set alignment (ESC a n)
    pub fn align(&mut self, align: Align) -> &mut Self {
        let n = match align {
            Align::Left => 0x00,
            Align::Center => 0x01,
            Align::Right => 0x02,
        };
        self.buf.extend_from_slice(&[0x1B, 0x61, n]);
        self
    }

    /// Full cut (GS V 0)
    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x00]);
        self
    }

    /// Partial cut, leaving a small connection (GS V 1)
    pub fn cut_partial(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x01]);
        self
    }

    /// Open the cash drawer on connector pin 2 (ESC p)
    ///
    /// Drawers share the printer's port in most POS setups.
    pub fn open_drawer(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x70, 0x00, 25, 250]);
        self
    }

    /// Print a firmware-rendered barcode (GS k, function 73 form)
    ///
    /// Emits HRI position, module height/width, then the length-prefixed
    /// payload. Code128 payloads are framed with the `{B` code-set
    /// selector; bytes outside code set B are dropped, and a payload too
    /// long for the one-byte length prefix skips the barcode entirely.
    pub fn barcode(&mut self, payload: &str, symbology: Symbology) -> &mut Self {
        match symbology {
            Symbology::Code128 => self.barcode_code128(payload),
        }
    }

    fn barcode_code128(&mut self, payload: &str) -> &mut Self {
        // Code set B covers ASCII 32..=127
        let data: Vec<u8> = payload
            .bytes()
            .filter(|b| (0x20..=0x7F).contains(b))
            .collect();
        // The GS k length prefix is a single byte; "{B" takes two of it.
        // An oversized payload is skipped like an unencodable one — a
        // wrapped length byte would make the firmware print the tail as
        // literal commands.
        if data.is_empty() || data.len() > u8::MAX as usize - 2 {
            return self;
        }

        // GS H 2 - HRI characters below the barcode
        self.buf.extend_from_slice(&[0x1D, 0x48, 0x02]);
        // GS h n - barcode height in dots
        self.buf.extend_from_slice(&[0x1D, 0x68, 64]);
        // GS w n - module width
        self.buf.extend_from_slice(&[0x1D, 0x77, 0x02]);

        // GS k m=73 n d1..dn with {B code-set selector
        let len = (data.len() + 2) as u8;
        self.buf.extend_from_slice(&[0x1D, 0x6B, 73, len]);
        self.buf.extend_from_slice(b"{B");
        self.buf.extend_from_slice(&data);
        self.buf.push(b'\n');
        self
    }

    /// Consume the builder, returning the raw byte stream
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPos {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower a symbolic command stream to printer bytes
pub fn encode_commands(commands: &[Command]) -> Vec<u8> {
    let mut b = EscPos::new();
    for cmd in commands {
        match cmd {
            Command::Init => {
                b.init();
            }
            Command::SetAlign(align) => {
                b.align(*align);
            }
            Command::Text(s) => {
                b.line(s);
            }
            Command::Barcode { payload, symbology } => {
                b.barcode(payload, *symbology);
            }
            Command::Feed(n) => {
                b.feed(*n);
            }
            Command::Cut => {
                b.cut();
            }
        }
    }
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_cut_bytes() {
        let mut b = EscPos::new();
        b.init().cut();
        assert_eq!(b.build(), vec![0x1B, 0x40, 0x1D, 0x56, 0x00]);
    }

    #[test]
    fn test_align_codes() {
        let mut b = EscPos::new();
        b.align(Align::Center).align(Align::Right).align(Align::Left);
        assert_eq!(
            b.build(),
            vec![0x1B, 0x61, 0x01, 0x1B, 0x61, 0x02, 0x1B, 0x61, 0x00]
        );
    }

    #[test]
    fn test_line_appends_newline() {
        let mut b = EscPos::new();
        b.line("TOTAL");
        let data = b.build();
        assert_eq!(&data[..5], b"TOTAL");
        assert_eq!(data[5], b'\n');
    }

    #[test]
    fn test_barcode_framing() {
        let mut b = EscPos::new();
        b.barcode("REC-1001", Symbology::Code128);
        let data = b.build();

        // GS k 73 appears with the length covering {B + payload
        let pos = data
            .windows(3)
            .position(|w| w == [0x1D, 0x6B, 73])
            .expect("GS k not emitted");
        assert_eq!(data[pos + 3], 10); // "{B" + 8 payload bytes
        assert_eq!(&data[pos + 4..pos + 6], b"{B");
        assert_eq!(&data[pos + 6..pos + 14], b"REC-1001");
    }

    #[test]
    fn test_barcode_skips_oversized_payload() {
        let longest = "R".repeat(253);
        let mut b = EscPos::new();
        b.barcode(&longest, Symbology::Code128);
        let data = b.build();
        let pos = data
            .windows(3)
            .position(|w| w == [0x1D, 0x6B, 73])
            .expect("GS k not emitted");
        assert_eq!(data[pos + 3], 255);

        // One byte more no longer fits the length prefix
        let mut b = EscPos::new();
        b.barcode(&"R".repeat(254), Symbology::Code128);
        assert!(b.build().is_empty());
    }

    #[test]
    fn test_barcode_skips_unencodable_payload() {
        let mut b = EscPos::new();
        b.barcode("\u{1F37A}", Symbology::Code128);
        assert!(b.build().is_empty());
    }

    #[test]
    fn test_drawer_pulse() {
        let mut b = EscPos::new();
        b.open_drawer();
        assert_eq!(b.build(), vec![0x1B, 0x70, 0x00, 25, 250]);
    }

    #[test]
    fn test_encode_commands_order() {
        let bytes = encode_commands(&[
            Command::Init,
            Command::SetAlign(Align::Center),
            Command::Text("Corner Liquor".to_string()),
            Command::Feed(3),
            Command::Cut,
        ]);
        assert_eq!(&bytes[..2], &[0x1B, 0x40]);
        assert_eq!(&bytes[2..5], &[0x1B, 0x61, 0x01]);
        assert_eq!(&bytes[bytes.len() - 6..], &[0x1B, 0x64, 3, 0x1D, 0x56, 0x00]);
    }
}
