//! Shared types for the till workspace
//!
//! Data records exchanged between the application layers (checkout,
//! settings store) and the printing core. The printing core receives
//! these as read-only snapshots and never writes them back.

pub mod models;

// Re-exports
pub use models::printer::{PrinterDescriptor, UsbId, UsbIdParseError};
pub use models::sale::{LineItem, Sale};
pub use models::settings::{PaperWidth, PrinterType, Settings};
pub use serde::{Deserialize, Serialize};
