//! Code128 raster encoding
//!
//! Receipts barcode their receipt number so a historical sale can be
//! pulled up by scanning the paper copy. The raster produced here is only
//! used for HTML embeds — USB printers render barcodes in firmware from
//! the payload, so no raster ever crosses the bulk endpoint.
//!
//! Encoding failures are surfaced as [`PrintError::Encoding`]; callers
//! omit the barcode block instead of aborting the receipt.

use crate::error::{PrintError, PrintResult};
use barcoders::sym::code128::Code128;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{GrayImage, Luma};
use std::io::Cursor;
use tracing::warn;

/// Module width in pixels
const MODULE_PX: u32 = 2;
/// Bar height in pixels
const BAR_HEIGHT_PX: u32 = 48;
/// Quiet zone on each side, in modules
const QUIET_MODULES: u32 = 10;

/// Encode a payload as a Code128 PNG raster
///
/// The payload is framed in code set B, which covers the printable ASCII
/// range receipt numbers are drawn from.
pub fn encode_png(payload: &str) -> PrintResult<Vec<u8>> {
    // Ɓ selects Code128 character set B
    let symbol = Code128::new(&format!("\u{0181}{payload}"))
        .map_err(|e| PrintError::Encoding(format!("{payload:?}: {e}")))?;
    let modules = symbol.encode();

    let width = (modules.len() as u32 + 2 * QUIET_MODULES) * MODULE_PX;
    let mut img = GrayImage::from_pixel(width, BAR_HEIGHT_PX, Luma([0xFF]));
    for (i, module) in modules.iter().enumerate() {
        if *module == 0 {
            continue;
        }
        let x0 = (QUIET_MODULES + i as u32) * MODULE_PX;
        for x in x0..x0 + MODULE_PX {
            for y in 0..BAR_HEIGHT_PX {
                img.put_pixel(x, y, Luma([0x00]));
            }
        }
    }

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| PrintError::Encoding(format!("PNG encode: {e}")))?;
    Ok(png.into_inner())
}

/// Encode a payload as a `data:` URI suitable for an `<img src>` embed
///
/// Returns `None` (after logging) when encoding fails, so preview
/// generation never raises on a bad payload.
pub fn data_uri(payload: &str) -> Option<String> {
    match encode_png(payload) {
        Ok(png) => Some(format!("data:image/png;base64,{}", STANDARD.encode(png))),
        Err(e) => {
            warn!(payload, error = %e, "barcode omitted");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_produces_png() {
        let png = encode_png("REC-1001").unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = data_uri("REC-1001").unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_unencodable_payload_is_none() {
        // Control characters are outside code set B
        assert!(data_uri("\u{0007}").is_none());
    }
}
