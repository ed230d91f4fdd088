//! OS print surface
//!
//! Seam between the dispatcher and whatever the host platform uses to
//! drive OS-registered printers. The bundled [`SpoolSurface`] talks to the
//! Windows print spooler; applications embedding a webview can supply
//! their own implementation with real dialog support.
//!
//! Submissions are awaited to completion before the surface lets go of the
//! job — tearing down early would abort an in-flight spool document.

use crate::error::{PrintError, PrintResult};
use shared::PrinterDescriptor;

/// Whether the OS may show its interactive print dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    /// Submit without user interaction
    Silent,
    /// Let the OS involve the user (the dispatcher's one retry)
    Interactive,
}

/// One receipt handed to the surface
///
/// Carries both representations so each surface picks what it can handle:
/// a webview loads `html`, the spooler takes the fixed-width `text` as a
/// RAW document. When `text` is absent (re-printing stored HTML), RAW
/// targets fall back to a tag-stripped form of the HTML.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceJob<'a> {
    pub html: &'a str,
    pub text: Option<&'a str>,
    /// OS printer name; `None` means the OS default
    pub device: Option<&'a str>,
}

/// An OS printing backend
#[allow(async_fn_in_trait)]
pub trait PrintSurface {
    /// Enumerate OS-registered printers
    fn printers(&self) -> PrintResult<Vec<PrinterDescriptor>>;

    /// Submit a job and wait for the spooler/renderer to accept it
    async fn submit(&self, job: SurfaceJob<'_>, mode: DialogMode) -> PrintResult<()>;
}

/// Reduce pre-rendered receipt HTML to plain text for RAW submission.
/// Good enough for the receipt templates this crate emits; not a general
/// HTML renderer.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut in_tag = false;
    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                in_tag = true;
                // Block-level closers become line breaks
                let rest: String = chars.clone().take(4).collect();
                if rest.starts_with("/div") || rest.starts_with("/p>") || rest.starts_with("br")
                    || rest.starts_with("/h3")
                {
                    out.push('\n');
                }
            }
            '>' => in_tag = false,
            '&' if !in_tag => {
                let entity: String = chars.clone().take_while(|c| *c != ';').take(5).collect();
                let decoded = match entity.as_str() {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    _ => None,
                };
                if let Some(d) = decoded {
                    for _ in 0..=entity.len() {
                        chars.next();
                    }
                    out.push(d);
                } else {
                    out.push('&');
                }
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    // Collapse indentation and runs of blank lines left by the markup
    let mut lines: Vec<&str> = Vec::new();
    let mut last_blank = true;
    for line in out.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !last_blank {
                lines.push("");
            }
            last_blank = true;
        } else {
            lines.push(line);
            last_blank = false;
        }
    }
    let mut text = lines.join("\n");
    while text.ends_with('\n') {
        text.pop();
    }
    text.push('\n');
    text
}

/// Windows print-spooler surface
///
/// Enumerates spool printers (virtual ports filtered out) and submits the
/// job's text rendition as a RAW document. `Interactive` mode re-resolves
/// to the OS default printer before re-submitting — the spooler's closest
/// analogue to the OS dialog sorting out a bad device selection.
#[cfg(windows)]
pub struct SpoolSurface;

#[cfg(windows)]
mod spool {
    use super::*;
    use tracing::{info, instrument, warn};

    impl SpoolSurface {
        pub fn new() -> Self {
            Self
        }

        /// List spool printer names, filtering out virtual printers
        fn printer_names() -> PrintResult<Vec<String>> {
            use windows::Win32::Graphics::Printing::{
                EnumPrintersW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_INFO_5W,
            };
            use windows::core::PWSTR;

            unsafe {
                let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
                let mut needed: u32 = 0;
                let mut returned: u32 = 0;

                let _ = EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned);
                if needed == 0 {
                    return Ok(Vec::new());
                }

                let mut buf: Vec<u8> = vec![0; needed as usize];
                EnumPrintersW(
                    flags,
                    None,
                    5,
                    Some(buf.as_mut_slice()),
                    &mut needed,
                    &mut returned,
                )
                .map_err(|_| PrintError::OsPrint("EnumPrintersW failed".to_string()))?;

                let ptr = buf.as_ptr() as *const PRINTER_INFO_5W;
                let slice = std::slice::from_raw_parts(ptr, returned as usize);

                let mut names = Vec::new();
                for info in slice.iter() {
                    if info.pPrinterName.is_null() {
                        continue;
                    }
                    let name = PWSTR(info.pPrinterName.0).to_string().unwrap_or_default();
                    let port = if info.pPortName.is_null() {
                        String::new()
                    } else {
                        PWSTR(info.pPortName.0).to_string().unwrap_or_default()
                    };
                    if !is_virtual_port(&port) {
                        names.push(name);
                    }
                }
                Ok(names)
            }
        }

        fn default_printer() -> PrintResult<Option<String>> {
            use windows::Win32::Graphics::Printing::GetDefaultPrinterW;
            use windows::core::PWSTR;

            unsafe {
                let mut needed: u32 = 0;
                let _ = GetDefaultPrinterW(None, &mut needed);
                if needed == 0 {
                    return Ok(None);
                }

                let mut buf: Vec<u16> = vec![0; needed as usize];
                if !GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed).as_bool() {
                    return Ok(None);
                }

                let name = PWSTR(buf.as_mut_ptr())
                    .to_string()
                    .map_err(|e| PrintError::OsPrint(format!("UTF-16 decode failed: {e}")))?;
                Ok(Some(name))
            }
        }

        /// Configured name when it still exists, else default, else first
        fn resolve(device: Option<&str>) -> PrintResult<String> {
            let names = Self::printer_names()?;
            if let Some(device) = device
                && !device.is_empty()
            {
                if names.iter().any(|n| n == device) {
                    return Ok(device.to_string());
                }
                warn!(device, "configured printer not found, falling back");
            }
            if let Some(default) = Self::default_printer()? {
                return Ok(default);
            }
            names
                .first()
                .cloned()
                .ok_or_else(|| PrintError::OsPrint("no printers available".to_string()))
        }

        fn write_raw(name: &str, data: &[u8]) -> PrintResult<()> {
            use core::ffi::c_void;
            use windows::Win32::Graphics::Printing::{
                ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW,
                PRINTER_HANDLE, StartDocPrinterW, StartPagePrinter, WritePrinter,
            };
            use windows::core::{PCWSTR, PWSTR};

            fn to_wide(s: &str) -> Vec<u16> {
                s.encode_utf16().chain(std::iter::once(0)).collect()
            }

            unsafe {
                let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
                let name_w = to_wide(name);

                OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                    .map_err(|_| PrintError::OsPrint("OpenPrinterW failed".to_string()))?;

                let doc_name_w = to_wide("Receipt");
                let datatype_w = to_wide("RAW");
                let doc_info = DOC_INFO_1W {
                    pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                    pOutputFile: PWSTR::null(),
                    pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
                };

                if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                    let _ = ClosePrinter(handle);
                    return Err(PrintError::OsPrint("StartDocPrinter failed".to_string()));
                }
                if !StartPagePrinter(handle).as_bool() {
                    let _ = EndDocPrinter(handle);
                    let _ = ClosePrinter(handle);
                    return Err(PrintError::OsPrint("StartPagePrinter failed".to_string()));
                }

                let mut written: u32 = 0;
                let ok = WritePrinter(
                    handle,
                    data.as_ptr() as *const c_void,
                    data.len() as u32,
                    &mut written,
                );

                let _ = EndPagePrinter(handle);
                let _ = EndDocPrinter(handle);
                let _ = ClosePrinter(handle);

                if !ok.as_bool() {
                    return Err(PrintError::OsPrint("WritePrinter failed".to_string()));
                }
                if written != data.len() as u32 {
                    return Err(PrintError::OsPrint("incomplete spool write".to_string()));
                }
                Ok(())
            }
        }
    }

    fn is_virtual_port(port: &str) -> bool {
        let p = port.to_lowercase();
        p == "file:"
            || p == "portprompt:"
            || p == "xpsport:"
            || p.starts_with("onenote")
            || p == "nul:"
            || p.starts_with("wfsport:")
    }

    impl Default for SpoolSurface {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PrintSurface for SpoolSurface {
        fn printers(&self) -> PrintResult<Vec<PrinterDescriptor>> {
            Ok(Self::printer_names()?
                .into_iter()
                .map(|name| PrinterDescriptor {
                    identifier: name.clone(),
                    display_name: name,
                    description: "Windows spooler".to_string(),
                    is_system_managed: true,
                })
                .collect())
        }

        #[instrument(skip(self, job))]
        async fn submit(&self, job: SurfaceJob<'_>, mode: DialogMode) -> PrintResult<()> {
            let name = match mode {
                DialogMode::Silent => Self::resolve(job.device)?,
                // Second chance: let the OS default take the job
                DialogMode::Interactive => Self::resolve(None)?,
            };

            let text = match job.text {
                Some(text) => text.to_string(),
                None => html_to_text(job.html),
            };
            info!(printer = name, bytes = text.len(), "submitting RAW document");

            // Spooling is synchronous Win32; keep it off the async workers
            tokio::task::spawn_blocking(move || Self::write_raw(&name, text.as_bytes()))
                .await
                .map_err(|e| PrintError::OsPrint(format!("spool task join failed: {e}")))?
        }
    }
}

/// Stub surface for platforms without a bundled spooler backend
///
/// Enumeration degrades to empty (no surface exists to query) and
/// submission reports the platform gap; the host application supplies a
/// real surface where OS printing matters.
#[cfg(not(windows))]
pub struct SpoolSurface;

#[cfg(not(windows))]
impl SpoolSurface {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(windows))]
impl Default for SpoolSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(windows))]
impl PrintSurface for SpoolSurface {
    fn printers(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        Ok(Vec::new())
    }

    async fn submit(&self, _job: SurfaceJob<'_>, _mode: DialogMode) -> PrintResult<()> {
        Err(PrintError::Unsupported(
            "no OS print surface on this platform".to_string(),
        ))
    }
}
