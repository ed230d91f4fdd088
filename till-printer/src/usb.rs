//! USB transport for thermal printers
//!
//! Claims the printer-class interface of a USB device, locates its bulk
//! OUT endpoint, writes raw ESC/POS bytes, and releases the interface.
//! A handle lives for exactly one print call — it is never cached.
//!
//! Two fixed settle delays bracket the transfer: cheap thermal boards need
//! time to come out of interface reset before accepting data, and time to
//! drain their buffer before the interface is released. These are hardware
//! constraints, not polled readiness checks.

use crate::error::{PrintError, PrintResult};
use nusb::transfer::{Direction, EndpointType};
use shared::UsbId;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// USB Printer class code (bInterfaceClass)
const USB_CLASS_PRINTER: u8 = 7;

/// Wait after claiming before the first write (interface reset latency)
pub const SETTLE_AFTER_OPEN: Duration = Duration::from_millis(200);
/// Wait before releasing the interface (buffer flush latency)
pub const SETTLE_BEFORE_CLOSE: Duration = Duration::from_millis(200);

/// An open USB printer connection
///
/// Dropping releases the claimed interface; prefer [`UsbPrinter::close`]
/// so the flush delay runs first.
pub struct UsbPrinter {
    interface: nusb::Interface,
    ep_out: u8,
    id: UsbId,
}

impl UsbPrinter {
    /// Resolve and open a printer.
    ///
    /// With `Some(id)`, only that exact device matches. With `None`, the
    /// first device exposing a printer-class interface wins.
    #[instrument]
    pub async fn open(id: Option<UsbId>) -> PrintResult<Self> {
        let (dev_info, iface_number, id) = resolve_device(id)?;

        let device = dev_info
            .open()
            .map_err(|e| PrintError::ClaimFailed {
                interface: iface_number,
                cause: format!("open failed: {e}"),
            })?;

        let ep_out = find_bulk_out(&device, iface_number)?;

        // A kernel driver (usblp on Linux) may hold the interface;
        // detach it before claiming.
        let interface = device
            .detach_and_claim_interface(iface_number)
            .map_err(|e| PrintError::ClaimFailed {
                interface: iface_number,
                cause: e.to_string(),
            })?;

        info!(%id, iface_number, ep_out, "USB printer claimed");
        tokio::time::sleep(SETTLE_AFTER_OPEN).await;

        Ok(Self {
            interface,
            ep_out,
            id,
        })
    }

    /// Write raw command bytes through the bulk OUT endpoint
    pub async fn write(&self, data: &[u8]) -> PrintResult<()> {
        debug!(id = %self.id, len = data.len(), "bulk OUT transfer");
        let completion = self.interface.bulk_out(self.ep_out, data.to_vec()).await;
        completion
            .status
            .map_err(|e| PrintError::UsbTransfer(e.to_string()))
    }

    /// Release the interface, best-effort
    ///
    /// Never fails: a broken close must not mask the outcome of the print
    /// that preceded it.
    pub async fn close(self) {
        tokio::time::sleep(SETTLE_BEFORE_CLOSE).await;
        // Interface release happens on drop.
        drop(self.interface);
        debug!(id = %self.id, "USB printer released");
    }
}

/// Find the device and printer-class interface to use
fn resolve_device(
    wanted: Option<UsbId>,
) -> PrintResult<(nusb::DeviceInfo, u8, UsbId)> {
    let devices = nusb::list_devices().map_err(|e| {
        warn!(error = %e, "USB enumeration failed");
        PrintError::NoDeviceFound(wanted)
    })?;

    for dev_info in devices {
        let id = UsbId::new(dev_info.vendor_id(), dev_info.product_id());
        if let Some(wanted) = wanted
            && wanted != id
        {
            continue;
        }

        let iface_number = dev_info
            .interfaces()
            .find(|iface| iface.class() == USB_CLASS_PRINTER)
            .map(|iface| iface.interface_number());

        if let Some(iface_number) = iface_number {
            return Ok((dev_info, iface_number, id));
        }
    }

    Err(PrintError::NoDeviceFound(wanted))
}

/// Walk the active configuration for the interface's bulk OUT endpoint.
/// Endpoint index 0 is not assumed — some boards put the OUT endpoint
/// after a bulk IN status endpoint.
fn find_bulk_out(device: &nusb::Device, interface_number: u8) -> PrintResult<u8> {
    let config = device
        .active_configuration()
        .map_err(|e| PrintError::ClaimFailed {
            interface: interface_number,
            cause: format!("no active configuration: {e}"),
        })?;

    for alt_setting in config.interface_alt_settings() {
        if alt_setting.interface_number() != interface_number
            || alt_setting.alternate_setting() != 0
        {
            continue;
        }
        for ep in alt_setting.endpoints() {
            if ep.transfer_type() == EndpointType::Bulk && ep.direction() == Direction::Out {
                return Ok(ep.address());
            }
        }
    }

    Err(PrintError::NoEndpointFound)
}
