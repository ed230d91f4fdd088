//! Error types for the printing core

use thiserror::Error;

/// Printing error taxonomy
///
/// Enumeration failures never reach callers (discovery degrades to an
/// empty list). USB failures trigger the OS-print fallback inside the
/// dispatcher; what escapes `print_receipt` is either an OS-print error
/// that survived the dialog retry or the aggregated two-path failure.
#[derive(Debug, Error)]
pub enum PrintError {
    /// No USB printer matched the configured id (or none attached at all)
    #[error("no USB printer found (wanted {0:?})")]
    NoDeviceFound(Option<shared::UsbId>),

    /// Claiming the printer interface failed
    #[error("failed to claim USB interface {interface}: {cause}")]
    ClaimFailed { interface: u8, cause: String },

    /// The printer interface exposes no bulk OUT endpoint
    #[error("no bulk OUT endpoint on printer interface")]
    NoEndpointFound,

    /// A bulk transfer to the device failed
    #[error("USB transfer failed: {0}")]
    UsbTransfer(String),

    /// Silent submission to the OS print surface failed
    #[error("OS print failed: {0}")]
    OsPrint(String),

    /// OS print failed even after the interactive retry
    #[error("OS print failed after dialog retry: {0}")]
    OsPrintDialog(String),

    /// Barcode payload could not be encoded
    #[error("barcode encoding failed: {0}")]
    Encoding(String),

    /// Both the USB path and the OS fallback (with its retry) failed
    #[error("USB path failed ({usb}); OS fallback failed ({os})")]
    FallbackExhausted {
        usb: Box<PrintError>,
        os: Box<PrintError>,
    },

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Printing is not supported on this platform/build
    #[error("printing not supported: {0}")]
    Unsupported(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
