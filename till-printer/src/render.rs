//! Receipt formatter
//!
//! Pure transformation of a [`Sale`] + [`Settings`] snapshot into one of
//! three representations: an HTML document (preview, OS print dialogs), a
//! symbolic printer command stream (USB path), or a fixed-width plain-text
//! layout. No device state, no settings mutation.

use crate::encoding::{grid_width, sanitize_currency, truncate_grid};
use crate::escpos::{Align, Command, Symbology};
use chrono::Utc;
use shared::{PaperWidth, Sale, Settings};

/// Which representation to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Html,
    RawText,
    Commands,
}

/// A rendered receipt
#[derive(Debug, Clone)]
pub enum RenderedReceipt {
    Html(String),
    RawText(String),
    Commands(Vec<Command>),
}

/// Formatting knobs that are not part of the persisted settings
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// ASCII substitute for a currency symbol the printer code page
    /// cannot carry (raw/USB path only)
    pub currency_fallback: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            currency_fallback: "$".to_string(),
        }
    }
}

/// Character-grid width for the raw/USB layout
///
/// Conservative reduction from the theoretical maximum so hardware never
/// wraps a full line.
pub fn char_width(paper: PaperWidth) -> usize {
    match paper {
        PaperWidth::Mm58 => 28,
        PaperWidth::Mm80 => 42,
    }
}

/// CSS width for the HTML layout, derived from the same paper setting
pub fn pixel_width(paper: PaperWidth) -> &'static str {
    match paper {
        PaperWidth::Mm58 => "220px",
        PaperWidth::Mm80 => "300px",
    }
}

/// Lay out `left` and `right` on one line of `width` cells
///
/// When both fit, the gap is space-padded so `right` ends flush at the
/// boundary. Otherwise `left` is truncated to make room for one separating
/// space plus the full `right` column; the right column is never dropped.
pub fn two_column(left: &str, right: &str, width: usize) -> String {
    let lw = grid_width(left);
    let rw = grid_width(right);
    if lw + rw < width {
        format!("{left}{}{right}", " ".repeat(width - lw - rw))
    } else {
        let keep = width.saturating_sub(rw + 1);
        format!("{} {right}", truncate_grid(left, keep))
    }
}

/// Format minor units as a fixed two-decimal string
///
/// Pure integer arithmetic; the `i64` representation stays authoritative
/// everywhere outside this function.
pub fn format_minor(v: i64) -> String {
    let sign = if v < 0 { "-" } else { "" };
    let v = v.unsigned_abs();
    format!("{sign}{}.{:02}", v / 100, v % 100)
}

/// Informational tax amount in minor units: round(total × pct / 100)
pub fn tax_minor(total_amount: i64, tax_percentage: f64) -> i64 {
    (total_amount as f64 * tax_percentage / 100.0).round() as i64
}

/// Render a sale into the requested representation
pub fn render(sale: &Sale, settings: &Settings, target: RenderTarget) -> RenderedReceipt {
    render_opts(sale, settings, target, &RenderOptions::default())
}

/// [`render`] with explicit formatting options
pub fn render_opts(
    sale: &Sale,
    settings: &Settings,
    target: RenderTarget,
    opts: &RenderOptions,
) -> RenderedReceipt {
    match target {
        RenderTarget::Html => RenderedReceipt::Html(render_html(sale, settings)),
        RenderTarget::RawText => RenderedReceipt::RawText(render_text(sale, settings, opts)),
        RenderTarget::Commands => {
            RenderedReceipt::Commands(render_commands(sale, settings, opts))
        }
    }
}

fn fmt_percentage(pct: f64) -> String {
    if pct.fract().abs() < 1e-9 {
        format!("{pct:.0}")
    } else {
        format!("{pct}")
    }
}

fn receipt_date(sale: &Sale) -> String {
    sale.created_at
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Body lines shared by the raw-text and command targets.
///
/// Returns (centered header lines, left-aligned body lines, centered
/// footer lines) so the command target can interleave alignment tokens.
fn text_sections(
    sale: &Sale,
    settings: &Settings,
    opts: &RenderOptions,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let width = char_width(settings.printer_paper_width);
    let sym = sanitize_currency(&settings.currency_symbol, &opts.currency_fallback);

    let mut header = Vec::new();
    header.push(truncate_grid(&settings.store_name, width));
    if !settings.store_address.is_empty() {
        header.push(truncate_grid(&settings.store_address, width));
    }
    if !settings.store_phone.is_empty() {
        header.push(truncate_grid(&format!("Tel: {}", settings.store_phone), width));
    }

    let mut body = Vec::new();
    body.push(truncate_grid(
        &format!("Receipt: {}", sale.receipt_number),
        width,
    ));
    body.push(truncate_grid(&format!("Date: {}", receipt_date(sale)), width));
    if let Some(customer) = &sale.customer_name {
        body.push(truncate_grid(&format!("Customer: {customer}"), width));
    }
    body.push("-".repeat(width));

    for item in &sale.items {
        body.push(truncate_grid(&item.name, width));
        body.push(two_column(
            &format!("{} x {sym}{}", item.quantity, format_minor(item.price_at_sale)),
            &format!("{sym}{}", format_minor(item.line_total())),
            width,
        ));
    }

    body.push("-".repeat(width));
    body.push(two_column(
        "TOTAL",
        &format!("{sym}{}", format_minor(sale.total_amount)),
        width,
    ));
    if settings.tax_percentage > 0.0 {
        body.push(two_column(
            &format!("Tax ({}%)", fmt_percentage(settings.tax_percentage)),
            &format!(
                "{sym}{}",
                format_minor(tax_minor(sale.total_amount, settings.tax_percentage))
            ),
            width,
        ));
    }
    body.push(truncate_grid(
        &format!("Payment: {}", sale.payment_method.to_uppercase()),
        width,
    ));

    let mut footer = Vec::new();
    if !settings.receipt_footer.is_empty() {
        footer.push(truncate_grid(&settings.receipt_footer, width));
    }

    (header, body, footer)
}

/// Fixed-width plain-text layout; no line exceeds the grid width
pub fn render_text(sale: &Sale, settings: &Settings, opts: &RenderOptions) -> String {
    let (header, body, footer) = text_sections(sale, settings, opts);
    let mut lines = header;
    lines.push(String::new());
    lines.extend(body);
    lines.push(String::new());
    lines.extend(footer);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Symbolic printer command stream for the USB path
pub fn render_commands(sale: &Sale, settings: &Settings, opts: &RenderOptions) -> Vec<Command> {
    let (header, body, footer) = text_sections(sale, settings, opts);

    let mut cmds = vec![Command::Init, Command::SetAlign(Align::Center)];
    cmds.extend(header.into_iter().map(Command::Text));
    cmds.push(Command::SetAlign(Align::Left));
    cmds.extend(body.into_iter().map(Command::Text));
    cmds.push(Command::SetAlign(Align::Center));
    cmds.extend(footer.into_iter().map(Command::Text));
    cmds.push(Command::Barcode {
        payload: sale.receipt_number.clone(),
        symbology: Symbology::Code128,
    });
    cmds.push(Command::Feed(3));
    cmds.push(Command::Cut);
    cmds
}

/// Stand-alone HTML document for preview and OS print dialogs
///
/// Renders offline: the only external reference is the barcode, embedded
/// as a base64 data URI (and omitted entirely if encoding fails).
pub fn render_html(sale: &Sale, settings: &Settings) -> String {
    let px = pixel_width(settings.printer_paper_width);
    let sym = escape_html(&settings.currency_symbol);

    let mut items = String::new();
    for item in &sale.items {
        items.push_str(&format!(
            concat!(
                "          <div class=\"item\">\n",
                "            <span>{name} x{qty}</span>\n",
                "            <span>{sym}{total}</span>\n",
                "          </div>\n",
            ),
            name = escape_html(&item.name),
            qty = item.quantity,
            sym = sym,
            total = format_minor(item.line_total()),
        ));
    }

    let tax_block = if settings.tax_percentage > 0.0 {
        format!(
            "        <div class=\"tax\">Tax ({}%): {sym}{}</div>\n",
            fmt_percentage(settings.tax_percentage),
            format_minor(tax_minor(sale.total_amount, settings.tax_percentage)),
        )
    } else {
        String::new()
    };

    let customer_block = match &sale.customer_name {
        Some(customer) => format!(
            "          <p>Customer: {}</p>\n",
            escape_html(customer)
        ),
        None => String::new(),
    };

    let barcode_block = barcode_img(&sale.receipt_number);

    format!(
        concat!(
            "<html>\n",
            "  <head>\n",
            "    <style>\n",
            "      body {{ font-family: 'Courier New', monospace; width: {px}; ",
            "margin: 0; padding: 10px; font-size: 12px; }}\n",
            "      .header {{ text-align: center; margin-bottom: 10px; }}\n",
            "      .item {{ display: flex; justify-content: space-between; margin-bottom: 5px; }}\n",
            "      .total {{ border-top: 1px dashed black; margin-top: 10px; ",
            "padding-top: 5px; font-weight: bold; text-align: right; }}\n",
            "      .tax {{ text-align: right; font-size: 11px; }}\n",
            "      .barcode {{ text-align: center; margin-top: 10px; }}\n",
            "      .footer {{ text-align: center; margin-top: 20px; font-size: 10px; }}\n",
            "    </style>\n",
            "  </head>\n",
            "  <body>\n",
            "    <div class=\"header\">\n",
            "      <h3>{store_name}</h3>\n",
            "      <p>{store_address}</p>\n",
            "      <p>Tel: {store_phone}</p>\n",
            "      <p>Receipt: {receipt_number}</p>\n",
            "      <p>{date}</p>\n",
            "{customer_block}",
            "    </div>\n",
            "    <div class=\"items\">\n",
            "{items}",
            "    </div>\n",
            "    <div class=\"total\">TOTAL: {sym}{total}</div>\n",
            "{tax_block}",
            "    <div class=\"payment\">Payment: {payment}</div>\n",
            "{barcode_block}",
            "    <div class=\"footer\">\n",
            "      <p>{footer}</p>\n",
            "    </div>\n",
            "  </body>\n",
            "</html>\n",
        ),
        px = px,
        store_name = escape_html(&settings.store_name),
        store_address = escape_html(&settings.store_address),
        store_phone = escape_html(&settings.store_phone),
        receipt_number = escape_html(&sale.receipt_number),
        date = receipt_date(sale),
        customer_block = customer_block,
        items = items,
        sym = sym,
        total = format_minor(sale.total_amount),
        tax_block = tax_block,
        payment = escape_html(&sale.payment_method.to_uppercase()),
        barcode_block = barcode_block,
        footer = escape_html(&settings.receipt_footer),
    )
}

#[cfg(feature = "barcode")]
fn barcode_img(receipt_number: &str) -> String {
    match crate::barcode::data_uri(receipt_number) {
        Some(uri) => format!(
            "    <div class=\"barcode\"><img src=\"{uri}\" alt=\"{}\"></div>\n",
            escape_html(receipt_number)
        ),
        None => String::new(),
    }
}

#[cfg(not(feature = "barcode"))]
fn barcode_img(_receipt_number: &str) -> String {
    String::new()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::LineItem;

    fn sample_sale() -> Sale {
        Sale {
            receipt_number: "REC-1001".to_string(),
            created_at: None,
            total_amount: 1599,
            payment_method: "cash".to_string(),
            customer_name: None,
            items: vec![LineItem {
                name: "Vodka 750ml".to_string(),
                quantity: 2,
                price_at_sale: 800,
                discount: 0,
            }],
        }
    }

    fn sample_settings() -> Settings {
        Settings {
            store_name: "Corner Liquor".to_string(),
            store_address: "12 Main St".to_string(),
            store_phone: "555-0100".to_string(),
            receipt_footer: "Thank you!".to_string(),
            currency_symbol: "$".to_string(),
            tax_percentage: 0.0,
            ..Settings::default()
        }
    }

    #[test]
    fn test_two_column_fits() {
        assert_eq!(
            two_column("Widget", "$12.34", 20),
            format!("Widget{}$12.34", " ".repeat(8))
        );
        assert_eq!(two_column("Widget", "$12.34", 20).len(), 20);
    }

    #[test]
    fn test_two_column_truncates_left() {
        let line = two_column("An extremely long product name", "$12.34", 20);
        assert_eq!(line.len(), 20);
        assert!(line.ends_with(" $12.34"));
        assert!(line.starts_with("An extremely "));
    }

    #[test]
    fn test_format_minor_exact() {
        assert_eq!(format_minor(1599), "15.99");
        assert_eq!(format_minor(5), "0.05");
        assert_eq!(format_minor(100), "1.00");
        assert_eq!(format_minor(-250), "-2.50");
        // Round trip: every cent value renders without drift
        for v in [0i64, 1, 99, 100, 101, 123456789] {
            let shown = format_minor(v);
            let (units, cents) = shown.split_once('.').unwrap();
            let parsed: i64 = units.parse::<i64>().unwrap() * 100 + cents.parse::<i64>().unwrap();
            assert_eq!(parsed, v);
        }
    }

    #[test]
    fn test_tax_minor_rounding() {
        assert_eq!(tax_minor(1000, 8.5), 85);
        assert_eq!(tax_minor(999, 8.5), 85); // 84.915 rounds up
        assert_eq!(tax_minor(1599, 0.0), 0);
    }

    #[test]
    fn test_total_uses_supplied_amount_not_item_sum() {
        // Items sum to 16.00 but the committed total is 15.99; the
        // formatter must trust the caller's total.
        let text = render_text(&sample_sale(), &sample_settings(), &RenderOptions::default());
        let width = char_width(PaperWidth::Mm80);
        assert!(text.contains(&two_column("TOTAL", "$15.99", width)));
        assert!(text.contains(&two_column("2 x $8.00", "$16.00", width)));
    }

    #[test]
    fn test_tax_line_iff_positive() {
        let sale = sample_sale();
        let mut settings = sample_settings();

        let text = render_text(&sale, &settings, &RenderOptions::default());
        assert!(!text.contains("Tax"));
        assert!(!render_html(&sale, &settings).contains("Tax"));
        let cmds = render_commands(&sale, &settings, &RenderOptions::default());
        assert!(!cmds.iter().any(|c| matches!(c, Command::Text(t) if t.contains("Tax"))));

        settings.tax_percentage = 8.5;
        let text = render_text(&sale, &settings, &RenderOptions::default());
        assert!(text.contains("Tax (8.5%)"));
        assert!(render_html(&sale, &settings).contains("Tax (8.5%)"));
    }

    #[test]
    fn test_no_line_exceeds_grid_width() {
        let mut sale = sample_sale();
        sale.items.push(LineItem {
            name: "A very long artisanal small-batch product description".to_string(),
            quantity: 12,
            price_at_sale: 123456,
            discount: 0,
        });
        for paper in [PaperWidth::Mm58, PaperWidth::Mm80] {
            let mut settings = sample_settings();
            settings.printer_paper_width = paper;
            let text = render_text(&sale, &settings, &RenderOptions::default());
            for line in text.lines() {
                assert!(
                    line.chars().count() <= char_width(paper),
                    "line {line:?} exceeds {} cells",
                    char_width(paper)
                );
            }
        }
    }

    #[test]
    fn test_currency_sanitized_on_text_path_only() {
        let sale = sample_sale();
        let mut settings = sample_settings();
        settings.currency_symbol = "₹".to_string();

        let opts = RenderOptions {
            currency_fallback: "INR".to_string(),
        };
        let text = render_text(&sale, &settings, &opts);
        assert!(text.contains("INR15.99"));
        assert!(!text.contains('₹'));

        // HTML keeps the configured symbol
        assert!(render_html(&sale, &settings).contains("₹15.99"));
    }

    #[test]
    fn test_command_stream_shape() {
        let cmds = render_commands(&sample_sale(), &sample_settings(), &RenderOptions::default());
        assert_eq!(cmds[0], Command::Init);
        assert_eq!(cmds[1], Command::SetAlign(Align::Center));
        assert!(matches!(
            cmds.iter().rev().nth(2),
            Some(Command::Barcode { payload, symbology: Symbology::Code128 }) if payload == "REC-1001"
        ));
        assert_eq!(cmds[cmds.len() - 2], Command::Feed(3));
        assert_eq!(cmds[cmds.len() - 1], Command::Cut);
    }

    #[test]
    fn test_html_width_follows_paper() {
        let sale = sample_sale();
        let mut settings = sample_settings();
        assert!(render_html(&sale, &settings).contains("width: 300px"));
        settings.printer_paper_width = PaperWidth::Mm58;
        assert!(render_html(&sale, &settings).contains("width: 220px"));
    }

    #[test]
    fn test_html_escapes_user_strings() {
        let mut sale = sample_sale();
        sale.items[0].name = "Whisky <\"Reserve\"> & Co".to_string();
        let html = render_html(&sale, &sample_settings());
        assert!(html.contains("Whisky &lt;&quot;Reserve&quot;&gt; &amp; Co"));
    }

    #[cfg(feature = "barcode")]
    #[test]
    fn test_preview_survives_barcode_failure() {
        let mut sale = sample_sale();
        // Control character cannot be Code128-encoded
        sale.receipt_number = "\u{0007}".to_string();
        let html = render_html(&sale, &sample_settings());
        assert!(!html.contains("<img"));
        assert!(html.contains("TOTAL"));
    }

    #[cfg(feature = "barcode")]
    #[test]
    fn test_html_embeds_barcode() {
        let html = render_html(&sample_sale(), &sample_settings());
        assert!(html.contains("data:image/png;base64,"));
    }
}
