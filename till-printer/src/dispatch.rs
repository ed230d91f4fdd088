//! Print dispatcher
//!
//! Resolves the configured strategy once per call and runs the layered
//! fallback: direct USB first, then the OS surface silently, then the OS
//! surface with its dialog — exactly one automatic retry, after which the
//! two underlying causes surface together.
//!
//! One call owns at most one USB handle and always releases it. Calls are
//! independent and may run concurrently for different sales, but two
//! concurrent USB prints against the same physical device race for the
//! interface claim — checkout must serialize per configured device.

use crate::error::{PrintError, PrintResult};
use crate::escpos::encode_commands;
use crate::render::{self, RenderOptions};
use crate::surface::{DialogMode, PrintSurface, SpoolSurface, SurfaceJob};
use crate::usb::UsbPrinter;
use shared::{PrinterDescriptor, PrinterType, Sale, Settings, UsbId};
use tracing::{info, instrument, warn};

/// Execution strategy, resolved from settings once per print call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterStrategy {
    /// Raw ESC/POS over USB; `None` auto-detects the first printer-class device
    Usb(Option<UsbId>),
    /// OS spool path; `None` means the OS default printer
    System(Option<String>),
    /// Render HTML only, touch no transport
    PreviewOnly,
}

impl PrinterStrategy {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.printer_type {
            PrinterType::System => {
                let name = settings.printer_device_name.trim();
                Self::System((!name.is_empty()).then(|| name.to_string()))
            }
            // A device name without a parsable VID/PID pair falls back to
            // first-candidate auto-detection
            PrinterType::Usb => Self::Usb(UsbId::parse(&settings.printer_device_name).ok()),
        }
    }
}

/// Writes an encoded command stream to a USB printer
#[allow(async_fn_in_trait)]
pub trait UsbTransport {
    async fn print(&self, id: Option<UsbId>, data: &[u8]) -> PrintResult<()>;
}

/// Production transport: open → write → unconditional close
pub struct NusbTransport;

impl UsbTransport for NusbTransport {
    async fn print(&self, id: Option<UsbId>, data: &[u8]) -> PrintResult<()> {
        let printer = UsbPrinter::open(id).await?;
        let result = printer.write(data).await;
        // Best-effort close runs on success and failure alike
        printer.close().await;
        result
    }
}

/// The printing front door for the checkout workflow
pub struct Dispatcher<U, S> {
    usb: U,
    surface: S,
    opts: RenderOptions,
}

impl Dispatcher<NusbTransport, SpoolSurface> {
    pub fn new() -> Self {
        Self::with_backends(NusbTransport, SpoolSurface::new())
    }
}

impl Default for Dispatcher<NusbTransport, SpoolSurface> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: UsbTransport, S: PrintSurface> Dispatcher<U, S> {
    pub fn with_backends(usb: U, surface: S) -> Self {
        Self {
            usb,
            surface,
            opts: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, opts: RenderOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Every selectable printer, USB and OS, for the settings UI
    pub fn printers(&self) -> Vec<PrinterDescriptor> {
        crate::discovery::list_printers(&self.surface)
    }

    /// On-screen preview; shares the formatter, touches no transport,
    /// never fails (a bad barcode payload just loses its barcode block)
    pub fn receipt_preview(&self, sale: &Sale, settings: &Settings) -> String {
        render::render_html(sale, settings)
    }

    /// Print a completed sale with the configured strategy
    #[instrument(skip(self, sale, settings), fields(receipt = %sale.receipt_number))]
    pub async fn print_receipt(&self, sale: &Sale, settings: &Settings) -> PrintResult<()> {
        let strategy = PrinterStrategy::from_settings(settings);
        self.print_with_strategy(strategy, sale, settings).await
    }

    /// [`Self::print_receipt`] with an explicit, pre-resolved strategy
    pub async fn print_with_strategy(
        &self,
        strategy: PrinterStrategy,
        sale: &Sale,
        settings: &Settings,
    ) -> PrintResult<()> {
        match strategy {
            // Callers get their preview from `receipt_preview`
            PrinterStrategy::PreviewOnly => Ok(()),
            PrinterStrategy::System(device) => {
                let html = render::render_html(sale, settings);
                let text = render::render_text(sale, settings, &self.opts);
                self.surface_with_retry(SurfaceJob {
                    html: &html,
                    text: Some(&text),
                    device: device.as_deref(),
                })
                .await
            }
            PrinterStrategy::Usb(id) => {
                let commands = render::render_commands(sale, settings, &self.opts);
                let data = encode_commands(&commands);

                match self.usb.print(id, &data).await {
                    Ok(()) => {
                        info!("receipt printed over USB");
                        Ok(())
                    }
                    Err(usb_err) => {
                        warn!(error = %usb_err, "USB path failed, falling back to OS print");
                        let html = render::render_html(sale, settings);
                        let text = render::render_text(sale, settings, &self.opts);
                        self.surface_with_retry(SurfaceJob {
                            html: &html,
                            text: Some(&text),
                            device: None,
                        })
                        .await
                        .map_err(|os_err| PrintError::FallbackExhausted {
                            usb: Box::new(usb_err),
                            os: Box::new(os_err),
                        })
                    }
                }
            }
        }
    }

    /// Print pre-rendered HTML (re-printing a historical sale)
    #[instrument(skip(self, html, settings))]
    pub async fn print_html(&self, html: &str, settings: &Settings) -> PrintResult<()> {
        let device = settings.printer_device_name.trim();
        let device = (settings.printer_type == PrinterType::System && !device.is_empty())
            .then_some(device);
        self.surface_with_retry(SurfaceJob {
            html,
            text: None,
            device,
        })
        .await
    }

    /// One silent submission; on failure, exactly one interactive retry.
    /// Silent driver failures are common and often cleared by the OS's own
    /// dialog (paper/tray prompts), so that retry is built in.
    async fn surface_with_retry(&self, job: SurfaceJob<'_>) -> PrintResult<()> {
        match self.surface.submit(job, DialogMode::Silent).await {
            Ok(()) => Ok(()),
            Err(silent_err) => {
                warn!(error = %silent_err, "silent OS print failed, retrying with dialog");
                match self.surface.submit(job, DialogMode::Interactive).await {
                    Ok(()) => Ok(()),
                    Err(dialog_err) => Err(PrintError::OsPrintDialog(format!(
                        "{silent_err}; dialog retry: {dialog_err}"
                    ))),
                }
            }
        }
    }
}
