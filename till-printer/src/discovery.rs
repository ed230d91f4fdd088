//! Printer discovery
//!
//! Enumerates the two disjoint device universes — USB printer-class
//! devices and OS spool printers — into a single descriptor list for the
//! settings UI. Never fails: any enumeration error is logged and degrades
//! to an empty contribution, which callers read as "no printer available".

use crate::surface::PrintSurface;
use shared::{PrinterDescriptor, UsbId};
use tracing::{info, instrument, warn};

/// USB Printer class code (bInterfaceClass)
const USB_CLASS_PRINTER: u8 = 7;

/// List every selectable printer
///
/// USB results come first, then the surface's spool printers. No
/// de-duplication: USB identifiers always carry `VID:`, OS names never do.
#[instrument(skip(surface))]
pub fn list_printers<S: PrintSurface>(surface: &S) -> Vec<PrinterDescriptor> {
    let mut printers = usb_printers();

    match surface.printers() {
        Ok(system) => printers.extend(system),
        Err(e) => warn!(error = %e, "system printer enumeration failed"),
    }

    info!(count = printers.len(), "printers discovered");
    printers
}

/// Walk attached USB devices for printer-class interfaces
fn usb_printers() -> Vec<PrinterDescriptor> {
    let devices = match nusb::list_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!(error = %e, "USB enumeration failed");
            return Vec::new();
        }
    };

    devices
        .filter(|dev| {
            dev.interfaces()
                .any(|iface| iface.class() == USB_CLASS_PRINTER)
        })
        .map(|dev| {
            descriptor_for_usb(
                UsbId::new(dev.vendor_id(), dev.product_id()),
                dev.product_string(),
                dev.manufacturer_string(),
            )
        })
        .collect()
}

/// Build the descriptor for one USB device
///
/// The identifier embeds the id pair so it survives the round trip
/// through `Settings::printer_device_name`.
fn descriptor_for_usb(
    id: UsbId,
    product: Option<&str>,
    manufacturer: Option<&str>,
) -> PrinterDescriptor {
    let product = product.unwrap_or("USB printer");
    let display_name = format!("{product} ({id})");
    let description = match manufacturer {
        Some(m) if !m.is_empty() => format!("{m} USB thermal printer"),
        _ => "USB thermal printer".to_string(),
    };
    PrinterDescriptor {
        identifier: id.to_string(),
        display_name,
        description,
        is_system_managed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PrintError, PrintResult};
    use crate::surface::{DialogMode, SurfaceJob};

    struct FailingSurface;

    impl PrintSurface for FailingSurface {
        fn printers(&self) -> PrintResult<Vec<PrinterDescriptor>> {
            Err(PrintError::OsPrint("spooler down".to_string()))
        }

        async fn submit(&self, _job: SurfaceJob<'_>, _mode: DialogMode) -> PrintResult<()> {
            unreachable!("discovery never submits")
        }
    }

    struct OneSurface;

    impl PrintSurface for OneSurface {
        fn printers(&self) -> PrintResult<Vec<PrinterDescriptor>> {
            Ok(vec![PrinterDescriptor {
                identifier: "EPSON TM-T20 Receipt".to_string(),
                display_name: "EPSON TM-T20 Receipt".to_string(),
                description: "spooler".to_string(),
                is_system_managed: true,
            }])
        }

        async fn submit(&self, _job: SurfaceJob<'_>, _mode: DialogMode) -> PrintResult<()> {
            unreachable!("discovery never submits")
        }
    }

    #[test]
    fn test_surface_failure_degrades_to_usb_only() {
        // Must not panic or error out, whatever this host's USB bus holds
        let _ = list_printers(&FailingSurface);
    }

    #[test]
    fn test_system_printers_are_appended() {
        let printers = list_printers(&OneSurface);
        let system: Vec<_> = printers.iter().filter(|p| p.is_system_managed).collect();
        assert_eq!(system.len(), 1);
        assert_eq!(system[0].identifier, "EPSON TM-T20 Receipt");
    }

    #[test]
    fn test_usb_descriptor_round_trips() {
        let desc = descriptor_for_usb(UsbId::new(0x04B8, 0x0202), Some("TM-T20"), Some("Epson"));
        assert_eq!(
            UsbId::parse(&desc.identifier).unwrap(),
            UsbId::new(0x04B8, 0x0202)
        );
        assert!(!desc.is_system_managed);
        assert_eq!(desc.display_name, "TM-T20 (VID:04B8 PID:0202)");
    }
}
