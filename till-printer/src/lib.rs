//! # till-printer
//!
//! Receipt printing core for the till point-of-sale: turns a committed
//! sale into a physical (or preview) receipt across heterogeneous output
//! devices.
//!
//! ## Scope
//!
//! - Receipt formatting (HTML preview, fixed-width text, ESC/POS commands)
//! - Code128 barcode raster for HTML embeds
//! - Printer discovery (USB printer-class devices + OS spool printers)
//! - Print dispatch with the USB → OS-silent → OS-dialog fallback chain
//! - Raw USB transport (claim interface, bulk OUT write, release)
//!
//! Persistence, authorization, and UI state stay in the application: this
//! crate consumes read-only `Sale` and `Settings` snapshots and holds no
//! state between calls.
//!
//! ## Example
//!
//! ```ignore
//! use till_printer::Dispatcher;
//!
//! let dispatcher = Dispatcher::new();
//!
//! // On-screen confirmation before committing to paper
//! let preview = dispatcher.receipt_preview(&sale, &settings);
//!
//! // Print failure is a warning alongside a successful sale, never a
//! // reason to roll the sale back
//! if let Err(e) = dispatcher.print_receipt(&sale, &settings).await {
//!     tracing::warn!(error = %e, "receipt did not print");
//! }
//! ```

#[cfg(feature = "barcode")]
pub mod barcode;
pub mod discovery;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod escpos;
pub mod render;
pub mod surface;
pub mod usb;

// Re-exports
pub use dispatch::{Dispatcher, NusbTransport, PrinterStrategy, UsbTransport};
pub use error::{PrintError, PrintResult};
pub use escpos::{Align, Command, EscPos, Symbology, encode_commands};
pub use render::{RenderOptions, RenderTarget, RenderedReceipt, render, render_opts};
pub use surface::{DialogMode, PrintSurface, SpoolSurface, SurfaceJob};
pub use usb::UsbPrinter;
