mod assets;
mod canvas;
mod debug;
mod doc_context;
mod doc_template;
mod error;
mod flowable;
mod font;
mod form;
mod frame;
mod invoice;
mod metrics;
mod page_template;
mod pdf;
mod pdfinspect;
mod types;

pub use canvas::{Canvas, Command, Document, Page};
use debug::DebugLogger;
pub use doc_context::DocContext;
pub use doc_template::DocTemplate;
pub use error::LedgerPressError;
pub use flowable::{
    BreakAfter, BreakBefore, BreakInside, Column, DetailLine, DetailsPanel, Flowable,
    ImageFlowable, ItemTable, ItemTableData, Pagination, Paragraph, Spacer, TextAlign, TextStyle,
    TotalsPanel,
};
pub use font::FontRegistry;
pub use form::{InvoiceForm, ItemField, parse_decimal_or_zero};
pub use frame::{AddResult, Frame};
pub use invoice::{
    CompanyProfile, InvoiceRecord, LineItem, TaxBreakdown, TaxRate, format_amount, format_date,
    format_money, format_quantity, or_na, trunc_2dp,
};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use page_template::{FrameSpec, PageTemplate};
pub use pdf::document_to_pdf;
pub use pdfinspect::{
    PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes, inspect_pdf_path,
    require_renderable_output,
};
pub use types::{Color, Margins, Pt, Rect, Size};

use invoice::TaxBreakdown as Totals;
use pdf::PdfOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BASE_FONT: &str = "Helvetica";
const BOLD_FONT: &str = "Helvetica-Bold";
const BASE_FONT_SIZE: f32 = 10.0;

// Vertical page anatomy, top-left origin. The chrome band owns everything
// above CONTENT_TOP; the footer pass owns the bottom reserve.
const HEADER_RULE_Y: f32 = 130.0;
const CONTENT_TOP: f32 = 140.0;
const FOOTER_RESERVE: f32 = 100.0;
const FOOTER_RULE_FROM_BOTTOM: f32 = 80.0;

const ACCENT: Color = Color {
    r: 0.1,
    g: 0.1,
    b: 0.6,
};
const MOTTO_COLOR: Color = Color {
    r: 0.6,
    g: 0.1,
    b: 0.1,
};
const CHROME_DARK: Color = Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
};
const CHROME_MUTED: Color = Color {
    r: 0.4,
    g: 0.4,
    b: 0.4,
};
const THANKS_COLOR: Color = Color {
    r: 0.1,
    g: 0.5,
    b: 0.1,
};

/// Render output: the document bytes plus the suggested download name.
/// Delivery is the caller's concern; `write_to_dir` is one trivial adapter.
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl RenderedInvoice {
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

pub struct LedgerPress {
    page_size: Size,
    margins: Margins,
    font_registry: Arc<FontRegistry>,
    asset_dir: PathBuf,
    logo_source: Option<String>,
    signature_source: Option<String>,
    document_title: Option<String>,
    terms_line: String,
    thank_you_line: String,
    debug: Option<Arc<DebugLogger>>,
}

impl std::fmt::Debug for LedgerPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerPress")
            .field("page_size", &self.page_size)
            .field("margins", &self.margins)
            .field("asset_dir", &self.asset_dir)
            .field("logo_source", &self.logo_source)
            .field("signature_source", &self.signature_source)
            .field("document_title", &self.document_title)
            .field("terms_line", &self.terms_line)
            .field("thank_you_line", &self.thank_you_line)
            .field("debug", &self.debug.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct LedgerPressBuilder {
    page_size: Size,
    margins: Margins,
    asset_dir: PathBuf,
    logo_source: Option<String>,
    signature_source: Option<String>,
    document_title: Option<String>,
    terms_line: String,
    thank_you_line: String,
    debug_path: Option<PathBuf>,
    font_files: Vec<PathBuf>,
    font_dirs: Vec<PathBuf>,
}

impl LedgerPress {
    pub fn builder() -> LedgerPressBuilder {
        LedgerPressBuilder {
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            asset_dir: PathBuf::from("assets"),
            logo_source: None,
            signature_source: None,
            document_title: None,
            terms_line: "Subject to Surat Jurisdiction | Payment due within 30 days".to_string(),
            thank_you_line: "Thank you for your business!".to_string(),
            debug_path: None,
            font_files: Vec::new(),
            font_dirs: Vec::new(),
        }
    }

    pub fn render(
        &self,
        record: &InvoiceRecord,
        profile: &CompanyProfile,
    ) -> Result<RenderedInvoice, LedgerPressError> {
        Ok(self.render_parts(record, profile)?.0)
    }

    pub fn render_with_metrics(
        &self,
        record: &InvoiceRecord,
        profile: &CompanyProfile,
    ) -> Result<(RenderedInvoice, DocumentMetrics), LedgerPressError> {
        self.render_parts(record, profile)
    }

    fn render_parts(
        &self,
        record: &InvoiceRecord,
        profile: &CompanyProfile,
    ) -> Result<(RenderedInvoice, DocumentMetrics), LedgerPressError> {
        validate_record(record)?;
        let assets = self.resolve_assets();
        let (mut document, mut metrics) = self.build_document(record, profile, &assets)?;
        self.apply_invoice_footer(&mut document, profile, &assets);

        let options = PdfOptions {
            document_title: self
                .document_title
                .clone()
                .or_else(|| Some(format!("Tax Invoice {}", record.bill_no.trim()))),
        };
        let bytes = pdf::document_to_pdf_with(
            &document,
            Some(&mut metrics),
            Some(self.font_registry.as_ref()),
            &options,
            self.debug.clone(),
        )?;
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary("render");
            logger.flush();
        }

        let rendered = RenderedInvoice {
            bytes,
            file_name: invoice_file_name(&record.bill_no, &record.client_name),
        };
        Ok((rendered, metrics))
    }

    fn resolve_assets(&self) -> InvoiceAssets {
        InvoiceAssets {
            logo: self.resolve_asset(self.logo_source.as_deref(), assets::LOGO_ASSET),
            signature: self.resolve_asset(self.signature_source.as_deref(), assets::SIGNATURE_ASSET),
        }
    }

    fn resolve_asset(&self, explicit: Option<&str>, well_known: &str) -> Option<String> {
        let source = match explicit {
            Some(source) => Some(source.to_string()),
            None => assets::well_known_source(&self.asset_dir, well_known),
        };
        match source {
            Some(source) if assets::probe(&source) => Some(source),
            Some(source) => {
                if let Some(logger) = self.debug.as_deref() {
                    let json = format!(
                        "{{\"type\":\"asset.missing\",\"name\":\"{}\",\"source\":\"{}\"}}",
                        debug::json_escape(well_known),
                        debug::json_escape(&source)
                    );
                    logger.log_json(&json);
                    logger.increment("asset.missing", 1);
                }
                None
            }
            None => None,
        }
    }

    fn content_frame(&self) -> Rect {
        Rect {
            x: self.margins.left,
            y: Pt::from_f32(CONTENT_TOP),
            width: self.page_size.width - self.margins.left - self.margins.right,
            height: self.page_size.height
                - Pt::from_f32(CONTENT_TOP)
                - Pt::from_f32(FOOTER_RESERVE),
        }
    }

    fn build_document(
        &self,
        record: &InvoiceRecord,
        profile: &CompanyProfile,
        assets: &InvoiceAssets,
    ) -> Result<(Document, DocumentMetrics), LedgerPressError> {
        let registry = self.font_registry.clone();
        let chrome_profile = profile.clone();
        let chrome_logo = assets.logo.clone();
        let page_size = self.page_size;
        let margins = self.margins;
        let template = PageTemplate::new("invoice", page_size)
            .with_frame(self.content_frame())
            .set_on_page(move |canvas, _context| {
                draw_page_header(
                    canvas,
                    &chrome_profile,
                    registry.as_ref(),
                    chrome_logo.as_deref(),
                    page_size,
                    margins,
                );
            });

        let mut doc = DocTemplate::new(vec![template]);
        if let Some(logger) = &self.debug {
            doc = doc.with_debug(logger.clone());
        }
        for flowable in self.build_story(record) {
            doc.add_flowable(flowable);
        }
        doc.build_with_metrics()
    }

    fn build_story(&self, record: &InvoiceRecord) -> Vec<Box<dyn Flowable>> {
        let registry = Some(self.font_registry.clone());
        let title_style = TextStyle::sized(16.0)
            .with_font(BOLD_FONT)
            .with_color(ACCENT);
        let title = Paragraph::new("TAX INVOICE")
            .with_style(title_style)
            .with_align(TextAlign::Center)
            .with_font_registry(registry.clone());

        let table = ItemTable::new(build_table_data(record)).with_font_registry(registry);

        let totals = Totals::compute(record);
        let rate = format_quantity(record.tax_rate.percent());
        let totals_panel = TotalsPanel::new(
            vec![
                format!("Subtotal: {}", format_money(totals.subtotal)),
                format!("SGST ({rate}%): {}", format_money(totals.sgst())),
                format!("CGST ({rate}%): {}", format_money(totals.cgst())),
            ],
            format!("TOTAL: {}", format_money(totals.grand_total)),
        );

        vec![
            Box::new(title),
            Box::new(Spacer::new(24.0)),
            Box::new(build_details_panel(record)),
            Box::new(Spacer::new(20.0)),
            Box::new(table),
            Box::new(Spacer::new(20.0)),
            Box::new(totals_panel),
        ]
    }

    /// Second pass over the finished page list, so `Page N of M` is exact.
    fn apply_invoice_footer(
        &self,
        document: &mut Document,
        profile: &CompanyProfile,
        assets: &InvoiceAssets,
    ) {
        let total_pages = document.pages.len();
        if total_pages == 0 {
            return;
        }
        let page_height = document.page_size.height;
        let page_width = document.page_size.width;
        let rule_y = page_height - Pt::from_f32(FOOTER_RULE_FROM_BOTTOM);
        let line_y = page_height - Pt::from_f32(70.0);

        for (idx0, page) in document.pages.iter_mut().enumerate() {
            let page_number = idx0 + 1;
            let commands = &mut page.commands;

            commands.push(Command::SetStrokeColor(Color::gray(0.5)));
            commands.push(Command::SetLineWidth(Pt::from_f32(1.0)));
            commands.push(Command::MoveTo {
                x: self.margins.left,
                y: rule_y,
            });
            commands.push(Command::LineTo {
                x: page_width - self.margins.right,
                y: rule_y,
            });
            commands.push(Command::Stroke);

            commands.push(Command::SetFillColor(CHROME_DARK));
            commands.push(Command::SetFontName(BASE_FONT.to_string()));
            commands.push(Command::SetFontSize(Pt::from_f32(BASE_FONT_SIZE)));
            commands.push(Command::DrawString {
                x: self.margins.left,
                y: line_y,
                text: format!("GSTIN: {}", profile.gstin),
            });

            commands.push(Command::SetFillColor(CHROME_MUTED));
            commands.push(Command::SetFontSize(Pt::from_f32(8.0)));
            let terms_width = self.font_registry.measure_text_width(
                BASE_FONT,
                Pt::from_f32(8.0),
                &self.terms_line,
            );
            commands.push(Command::DrawString {
                x: (page_width - terms_width) / 2,
                y: line_y,
                text: self.terms_line.clone(),
            });

            let page_text = format!("Page {} of {}", page_number, total_pages);
            commands.push(Command::SetFontSize(Pt::from_f32(9.0)));
            let page_text_width = self.font_registry.measure_text_width(
                BASE_FONT,
                Pt::from_f32(9.0),
                &page_text,
            );
            commands.push(Command::DrawString {
                x: page_width - self.margins.right - page_text_width,
                y: line_y,
                text: page_text,
            });

            if let Some(signature) = assets.signature.as_deref() {
                commands.push(Command::SetFontSize(Pt::from_f32(8.0)));
                commands.push(Command::DrawString {
                    x: page_width - Pt::from_f32(140.0),
                    y: page_height - Pt::from_f32(103.0),
                    text: "Authorized Signature:".to_string(),
                });
                commands.push(Command::DrawImage {
                    x: page_width - Pt::from_f32(130.0),
                    y: page_height - Pt::from_f32(85.0),
                    width: Pt::from_f32(80.0),
                    height: Pt::from_f32(35.0),
                    resource_id: signature.to_string(),
                });
            }

            commands.push(Command::SetFillColor(THANKS_COLOR));
            commands.push(Command::SetFontName(BOLD_FONT.to_string()));
            commands.push(Command::SetFontSize(Pt::from_f32(9.0)));
            commands.push(Command::DrawString {
                x: self.margins.left,
                y: page_height - Pt::from_f32(34.0),
                text: self.thank_you_line.clone(),
            });
        }
    }
}

struct InvoiceAssets {
    logo: Option<String>,
    signature: Option<String>,
}

impl LedgerPressBuilder {
    pub fn page_size(mut self, page_size: Size) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    pub fn logo_source(mut self, source: impl Into<String>) -> Self {
        self.logo_source = Some(source.into());
        self
    }

    pub fn signature_source(mut self, source: impl Into<String>) -> Self {
        self.signature_source = Some(source.into());
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }

    pub fn terms_line(mut self, line: impl Into<String>) -> Self {
        self.terms_line = line.into();
        self
    }

    pub fn thank_you_line(mut self, line: impl Into<String>) -> Self {
        self.thank_you_line = line.into();
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    pub fn font_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(path.into());
        self
    }

    pub fn build(self) -> Result<LedgerPress, LedgerPressError> {
        let content_width = self.page_size.width - self.margins.left - self.margins.right;
        let content_height = self.page_size.height
            - Pt::from_f32(CONTENT_TOP)
            - Pt::from_f32(FOOTER_RESERVE);
        if content_width <= Pt::ZERO || content_height <= Pt::ZERO {
            return Err(LedgerPressError::InvalidConfiguration(
                "page size leaves no room for content between header and footer".to_string(),
            ));
        }

        let mut registry = FontRegistry::new();
        for dir in &self.font_dirs {
            registry.register_dir(dir)?;
        }
        for file in &self.font_files {
            registry.register_file(file)?;
        }

        let debug = match &self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };

        Ok(LedgerPress {
            page_size: self.page_size,
            margins: self.margins,
            font_registry: Arc::new(registry),
            asset_dir: self.asset_dir,
            logo_source: self.logo_source,
            signature_source: self.signature_source,
            document_title: self.document_title,
            terms_line: self.terms_line,
            thank_you_line: self.thank_you_line,
            debug,
        })
    }
}

fn validate_record(record: &InvoiceRecord) -> Result<(), LedgerPressError> {
    if record.bill_no.trim().is_empty() {
        return Err(LedgerPressError::MissingField("bill_no"));
    }
    if record.client_name.trim().is_empty() {
        return Err(LedgerPressError::MissingField("client_name"));
    }
    Ok(())
}

/// `Invoice_<bill_no>_<client_name>.pdf`, with each whitespace run in the
/// client name collapsed to one underscore.
pub fn invoice_file_name(bill_no: &str, client_name: &str) -> String {
    format!(
        "Invoice_{}_{}.pdf",
        bill_no,
        collapse_whitespace(client_name)
    )
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

fn centered_x(registry: &FontRegistry, font: &str, size: f32, text: &str, page_width: Pt) -> Pt {
    let width = registry.measure_text_width(font, Pt::from_f32(size), text);
    (page_width - width) / 2
}

/// Per-page letterhead chrome, run from the page template callback before any
/// story content lands on the page.
fn draw_page_header(
    canvas: &mut Canvas,
    profile: &CompanyProfile,
    registry: &FontRegistry,
    logo: Option<&str>,
    page_size: Size,
    margins: Margins,
) {
    if let Some(motto) = profile.motto.as_deref() {
        canvas.set_fill_color(MOTTO_COLOR);
        canvas.set_font_name(BOLD_FONT);
        canvas.set_font_size(Pt::from_f32(12.0));
        let x = centered_x(registry, BOLD_FONT, 12.0, motto, page_size.width);
        canvas.draw_string(x, Pt::from_f32(20.0), motto);
    }

    if let Some(logo) = logo {
        canvas.draw_image(
            margins.left,
            Pt::from_f32(38.0),
            Pt::from_f32(50.0),
            Pt::from_f32(30.0),
            logo,
        );
    }

    canvas.set_fill_color(CHROME_DARK);
    canvas.set_font_name(BOLD_FONT);
    canvas.set_font_size(Pt::from_f32(18.0));
    let x = centered_x(registry, BOLD_FONT, 18.0, &profile.name, page_size.width);
    canvas.draw_string(x, Pt::from_f32(45.0), profile.name.clone());

    canvas.set_font_name(BASE_FONT);
    canvas.set_font_size(Pt::from_f32(9.0));
    for (index, number) in profile.phone.split(',').enumerate() {
        canvas.draw_string(
            page_size.width - Pt::from_f32(150.0),
            Pt::from_f32(45.0 + 12.0 * index as f32),
            number.trim(),
        );
    }

    canvas.set_fill_color(CHROME_MUTED);
    canvas.set_font_size(Pt::from_f32(12.0));
    let x = centered_x(registry, BASE_FONT, 12.0, &profile.address, page_size.width);
    canvas.draw_string(x, Pt::from_f32(72.0), profile.address.clone());

    if let Some(email) = profile.email.as_deref() {
        let line = format!("Email: {}", email);
        canvas.set_font_size(Pt::from_f32(9.0));
        let x = centered_x(registry, BASE_FONT, 9.0, &line, page_size.width);
        canvas.draw_string(x, Pt::from_f32(90.0), line);
    }

    canvas.set_stroke_color(Color::gray(0.3));
    canvas.set_line_width(Pt::from_f32(2.0));
    canvas.move_to(margins.left, Pt::from_f32(HEADER_RULE_Y));
    canvas.line_to(page_size.width - margins.right, Pt::from_f32(HEADER_RULE_Y));
    canvas.stroke();
}

fn build_details_panel(record: &InvoiceRecord) -> DetailsPanel {
    let left = vec![
        DetailLine::new(format!("Bill No: {}", record.bill_no), true),
        DetailLine::new(format!("Client Name: {}", record.client_name), false),
        DetailLine::new(format!("Order No: {}", or_na(&record.order_no)), false),
        DetailLine::new(format!("Challan No: {}", or_na(&record.challan_no)), false),
    ];
    let right = vec![
        DetailLine::new(format!("Date: {}", format_date(record.invoice_date)), true),
        DetailLine::new(format!("GST No: {}", or_na(&record.gst_no)), false),
    ];
    DetailsPanel::new(left, right)
}

fn build_table_data(record: &InvoiceRecord) -> ItemTableData {
    let columns = vec![
        Column::new("Sr.", 35.0).bold(),
        Column::new("Description", 200.0),
        Column::new("HSN", 55.0),
        Column::new("Qty", 40.0),
        Column::new("Rate", 65.0),
        Column::new("Discount", 65.0),
        Column::new("Amount", 75.0),
    ];
    let rows = record
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let description = if item.item_code.trim().is_empty() {
                item.description.clone()
            } else {
                format!("{}, Item Code: {}", item.description, item.item_code)
            };
            vec![
                (index + 1).to_string(),
                description,
                or_na(&item.hsn),
                format_quantity(item.quantity),
                format_money(item.rate),
                format_money(item.discount),
                format_money(item.amount()),
            ]
        })
        .collect();
    ItemTableData {
        columns,
        rows,
        style: TextStyle::default(),
        bold_font: Arc::<str>::from(BOLD_FONT),
        zebra: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn page_contains_text(page: &Page, needle: &str) -> bool {
        page.commands.iter().any(|cmd| match cmd {
            Command::DrawString { text, .. } => text.contains(needle),
            _ => false,
        })
    }

    fn doc_contains_text(doc: &Document, needle: &str) -> bool {
        doc.pages.iter().any(|page| page_contains_text(page, needle))
    }

    fn profile() -> CompanyProfile {
        CompanyProfile {
            name: "Shakti Mechanical Works".to_string(),
            address: "Near Panchratna Bldg. Kosamba (R.S.)".to_string(),
            phone: "+91 98765 00001, +91 91234 00002".to_string(),
            gstin: "24ABCDE1234F1Z5".to_string(),
            email: Some("info@shaktimechanical.example".to_string()),
            motto: Some("Shree".to_string()),
        }
    }

    fn item(description: &str, quantity: f64, rate: f64, discount: f64) -> LineItem {
        LineItem {
            description: description.to_string(),
            item_code: String::new(),
            hsn: String::new(),
            quantity,
            rate,
            discount,
        }
    }

    fn record(items: Vec<LineItem>) -> InvoiceRecord {
        InvoiceRecord {
            bill_no: "001".to_string(),
            client_name: "Acme Corp".to_string(),
            order_no: "PO-77".to_string(),
            challan_no: String::new(),
            gst_no: "22AAAAA0000A1Z5".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 4, 1).expect("date"),
            tax_rate: TaxRate::Gst9,
            items,
        }
    }

    fn engine() -> LedgerPress {
        LedgerPress::builder().build().expect("engine")
    }

    fn no_assets() -> InvoiceAssets {
        InvoiceAssets {
            logo: None,
            signature: None,
        }
    }

    #[test]
    fn empty_bill_no_is_rejected_before_rendering() {
        let mut bad = record(vec![item("widget", 1.0, 10.0, 0.0)]);
        bad.bill_no = "   ".to_string();
        let err = engine().render(&bad, &profile()).expect_err("must fail");
        assert!(matches!(err, LedgerPressError::MissingField("bill_no")));
    }

    #[test]
    fn empty_client_name_is_rejected_before_rendering() {
        let mut bad = record(vec![item("widget", 1.0, 10.0, 0.0)]);
        bad.client_name = String::new();
        let err = engine().render(&bad, &profile()).expect_err("must fail");
        assert!(matches!(err, LedgerPressError::MissingField("client_name")));
    }

    #[test]
    fn file_name_collapses_whitespace_runs() {
        assert_eq!(invoice_file_name("001", "Acme   Corp"), "Invoice_001_Acme_Corp.pdf");
        assert_eq!(invoice_file_name("17", "Acme Corp"), "Invoice_17_Acme_Corp.pdf");
        // Leading and trailing runs collapse too; nothing is trimmed.
        assert_eq!(invoice_file_name("9", " Acme\tCorp "), "Invoice_9__Acme_Corp_.pdf");
    }

    #[test]
    fn single_item_invoice_renders_one_page_with_chrome_and_totals() {
        let engine = engine();
        let record = record(vec![item("hydraulic seal kit", 2.0, 450.0, 50.0)]);
        let (doc, _metrics) = engine
            .build_document(&record, &profile(), &no_assets())
            .expect("layout");
        assert_eq!(doc.pages.len(), 1);
        let page = &doc.pages[0];
        assert!(page_contains_text(page, "TAX INVOICE"));
        assert!(page_contains_text(page, "Shakti Mechanical Works"));
        assert!(page_contains_text(page, "Bill No: 001"));
        assert!(page_contains_text(page, "hydraulic seal kit"));
        // 2 * 450 - 50
        assert!(page_contains_text(page, "Rs. 850.00"));
        assert!(page_contains_text(page, "SGST (9%): Rs. 76.50"));
        assert!(page_contains_text(page, "CGST (9%): Rs. 76.50"));
        assert!(page_contains_text(page, "TOTAL: Rs. 1003.00"));
    }

    #[test]
    fn negative_amount_rows_are_not_clamped() {
        let engine = engine();
        let record = record(vec![item("discounted part", 1.0, 5.0, 8.0)]);
        let (doc, _metrics) = engine
            .build_document(&record, &profile(), &no_assets())
            .expect("layout");
        assert!(doc_contains_text(&doc, "Rs. -3.00"));
    }

    #[test]
    fn item_code_is_appended_to_the_description_cell() {
        let engine = engine();
        let mut coded = item("bearing", 1.0, 99.0, 0.0);
        coded.item_code = "BRG-12".to_string();
        let (doc, _metrics) = engine
            .build_document(&record(vec![coded]), &profile(), &no_assets())
            .expect("layout");
        assert!(doc_contains_text(&doc, "bearing, Item Code: BRG-12"));
    }

    #[test]
    fn blank_hsn_renders_as_na() {
        let engine = engine();
        let record = record(vec![item("widget", 1.0, 10.0, 0.0)]);
        let (doc, _metrics) = engine
            .build_document(&record, &profile(), &no_assets())
            .expect("layout");
        assert!(doc_contains_text(&doc, "N/A"));
    }

    #[test]
    fn long_invoices_paginate_with_repeated_chrome_and_header_band() {
        let engine = engine();
        let items: Vec<LineItem> = (0..40)
            .map(|i| item(&format!("Row item {i}"), 1.0, 10.0, 0.0))
            .collect();
        let (doc, _metrics) = engine
            .build_document(&record(items), &profile(), &no_assets())
            .expect("layout");
        assert!(doc.pages.len() >= 2);
        for page in doc.pages.iter().take(doc.pages.len() - 1) {
            assert!(page_contains_text(page, "Shakti Mechanical Works"));
            assert!(page_contains_text(page, "Description"));
        }
        // The first page carries the one-off title and details panel.
        assert!(page_contains_text(&doc.pages[0], "TAX INVOICE"));
        assert!(!page_contains_text(&doc.pages[1], "TAX INVOICE"));
        assert!(page_contains_text(&doc.pages[1], "Description"));
    }

    #[test]
    fn totals_panel_moves_to_a_fresh_page_instead_of_clipping() {
        // 40 single-line rows: 17 land on page 1 under the title and details
        // panel, 23 fill page 2 to within 2pt of the frame bottom, so the
        // totals panel cannot fit and must open page 3.
        let engine = engine();
        let items: Vec<LineItem> = (0..40)
            .map(|i| item(&format!("Row item {i}"), 1.0, 10.0, 0.0))
            .collect();
        let (doc, _metrics) = engine
            .build_document(&record(items), &profile(), &no_assets())
            .expect("layout");
        assert_eq!(doc.pages.len(), 3);
        assert!(!page_contains_text(&doc.pages[1], "Subtotal:"));
        assert!(page_contains_text(&doc.pages[2], "Subtotal:"));
        assert!(page_contains_text(&doc.pages[2], "TOTAL: Rs. 472.00"));
        // The totals-only page has no item table band.
        assert!(!page_contains_text(&doc.pages[2], "Description"));
    }

    #[test]
    fn footer_pass_numbers_every_page() {
        let engine = engine();
        let items: Vec<LineItem> = (0..40)
            .map(|i| item(&format!("Row item {i}"), 1.0, 10.0, 0.0))
            .collect();
        let record = record(items);
        let (mut doc, _metrics) = engine
            .build_document(&record, &profile(), &no_assets())
            .expect("layout");
        engine.apply_invoice_footer(&mut doc, &profile(), &no_assets());
        let total = doc.pages.len();
        for (idx, page) in doc.pages.iter().enumerate() {
            assert!(page_contains_text(page, &format!("Page {} of {}", idx + 1, total)));
            assert!(page_contains_text(page, "GSTIN: 24ABCDE1234F1Z5"));
            assert!(page_contains_text(page, "Thank you for your business!"));
        }
    }

    #[test]
    fn reordering_items_changes_serials_but_not_totals() {
        let engine = engine();
        let forward = record(vec![
            item("alpha", 1.0, 10.0, 0.0),
            item("beta", 2.0, 7.5, 1.0),
        ]);
        let mut reversed_items = forward.items.clone();
        reversed_items.reverse();
        let reversed = record(reversed_items);

        let (doc_a, _) = engine
            .build_document(&forward, &profile(), &no_assets())
            .expect("layout");
        let (doc_b, _) = engine
            .build_document(&reversed, &profile(), &no_assets())
            .expect("layout");
        assert!(doc_contains_text(&doc_a, "Subtotal: Rs. 24.00"));
        assert!(doc_contains_text(&doc_b, "Subtotal: Rs. 24.00"));
    }

    #[test]
    fn render_produces_parseable_pdf_bytes_and_metrics() {
        let engine = engine();
        let record = record(vec![item("widget", 1.0, 10.0, 0.0)]);
        let (rendered, metrics) = engine
            .render_with_metrics(&record, &profile())
            .expect("render");
        assert_eq!(rendered.file_name, "Invoice_001_Acme_Corp.pdf");
        assert!(metrics.total_bytes > 0);
        assert_eq!(metrics.total_bytes, rendered.bytes.len());
        assert_eq!(metrics.pages.len(), 1);
        assert!(metrics.pages[0].content_bytes > 0);

        let report = inspect_pdf_bytes(&rendered.bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
        require_renderable_output(&report).expect("renderable");
    }

    #[test]
    fn form_to_render_round_trip() {
        let mut form = InvoiceForm::new();
        form.bill_no = "INV-9".to_string();
        form.client_name = "Kosamba Mills".to_string();
        form.tax_rate = TaxRate::Gst14;
        form.update_item(0, ItemField::Description, "gear shaft");
        form.update_item(0, ItemField::Quantity, "3");
        form.update_item(0, ItemField::Rate, "120.50");
        form.add_item();

        let record = form.record();
        assert_eq!(record.items.len(), 1);
        let rendered = engine().render(&record, &profile()).expect("render");
        assert_eq!(rendered.file_name, "Invoice_INV-9_Kosamba_Mills.pdf");
        let report = inspect_pdf_bytes(&rendered.bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
    }

    #[test]
    fn missing_assets_do_not_block_rendering() {
        let engine = LedgerPress::builder()
            .asset_dir("/nonexistent")
            .logo_source("/nonexistent/logo.png")
            .build()
            .expect("engine");
        let record = record(vec![item("widget", 1.0, 10.0, 0.0)]);
        let rendered = engine.render(&record, &profile()).expect("render");
        assert!(inspect_pdf_bytes(&rendered.bytes).is_ok());
    }

    #[test]
    fn builder_rejects_degenerate_page_geometry() {
        let err = LedgerPress::builder()
            .page_size(Size::new(60.0, 120.0))
            .build()
            .expect_err("no content room");
        assert!(matches!(err, LedgerPressError::InvalidConfiguration(_)));
    }
}
