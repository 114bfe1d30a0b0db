use crate::assets::{self, AlphaData, ImageData};
use crate::canvas::{Command, Document, Page};
use crate::debug::{DebugLogger, json_escape};
use crate::font::{FontProgramKind, FontRegistry, RegisteredFont};
use crate::metrics::DocumentMetrics;
use crate::types::{Color, Pt, Size};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub(crate) struct PdfOptions {
    pub document_title: Option<String>,
}

const PDF_HEADER: &[u8] = b"%PDF-1.7\n";

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamFontKind {
    // Base-14 font referenced by name only.
    Type1,
    // Embedded font program with WinAnsi widths.
    TrueTypeWinAnsi,
}

struct StreamFont {
    logical_name: String,
    resource: String,
    start_id: usize,
    kind: StreamFontKind,
}

pub(crate) struct PdfStreamWriter<'a, W: Write> {
    writer: &'a mut W,
    offset: usize,
    offsets: Vec<usize>, // indexed by object id; 0 is the free object.
    next_id: usize,
    page_size: Size,
    options: PdfOptions,
    registry: Option<&'a FontRegistry>,
    debug: Option<Arc<DebugLogger>>,

    fonts: BTreeMap<String, StreamFont>,
    next_font_resource: usize,

    image_resources: Vec<(String, usize)>,
    // Source -> resource name; an empty value records a known-missing source.
    image_name_map: HashMap<String, String>,
    image_content_map: HashMap<u64, String>,
    next_image_index: usize,
    image_bytes_total: usize,

    page_ids: Vec<usize>,
    pub(crate) page_content_bytes: Vec<usize>,
}

impl<'a, W: Write> PdfStreamWriter<'a, W> {
    pub(crate) fn new(
        writer: &'a mut W,
        page_size: Size,
        registry: Option<&'a FontRegistry>,
        options: PdfOptions,
        debug: Option<Arc<DebugLogger>>,
    ) -> io::Result<Self> {
        let mut offset: usize = 0;
        write_bytes(writer, PDF_HEADER, &mut offset)?;
        write_bytes(writer, b"%\xE2\xE3\xCF\xD3\n", &mut offset)?;

        Ok(Self {
            writer,
            offset,
            offsets: vec![0; PDF_RESOURCES_ID + 1],
            next_id: PDF_RESOURCES_ID + 1,
            page_size,
            options,
            registry,
            debug,
            fonts: BTreeMap::new(),
            next_font_resource: 1,
            image_resources: Vec::new(),
            image_name_map: HashMap::new(),
            image_content_map: HashMap::new(),
            next_image_index: 1,
            image_bytes_total: 0,
            page_ids: Vec::new(),
            page_content_bytes: Vec::new(),
        })
    }

    pub(crate) fn add_document(&mut self, document: &Document) -> io::Result<()> {
        if (document.page_size.width - self.page_size.width).abs() > Pt::from_f32(0.01)
            || (document.page_size.height - self.page_size.height).abs() > Pt::from_f32(0.01)
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mixed page sizes are not supported in a single PDF stream",
            ));
        }
        for page in &document.pages {
            self.add_page(page)?;
        }
        Ok(())
    }

    fn add_page(&mut self, page: &Page) -> io::Result<()> {
        let start = self.alloc_ids(2);
        let content_id = start;
        let page_id = start + 1;

        let content_stream = self.render_commands(&page.commands, self.page_size.height)?;
        self.page_content_bytes.push(content_stream.len());
        self.write_object(content_id, &stream_object(&content_stream))?;
        self.page_ids.push(page_id);

        let page_obj = format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
            PDF_PAGES_ID,
            fmt_pt(self.page_size.width),
            fmt_pt(self.page_size.height),
            PDF_RESOURCES_ID,
            content_id,
        );
        self.write_object(page_id, &page_obj)
    }

    fn render_commands(&mut self, commands: &[Command], page_height: Pt) -> io::Result<String> {
        let mut out = String::new();
        let mut current_font_size = Pt::from_f32(12.0);
        let mut current_font_name = "Helvetica".to_string();
        self.ensure_font(&current_font_name)?;

        for cmd in commands {
            match cmd {
                Command::SetFillColor(color) => {
                    out.push_str(&color_to_pdf_fill(*color));
                }
                Command::SetStrokeColor(color) => {
                    out.push_str(&color_to_pdf_stroke(*color));
                }
                Command::SetLineWidth(width) => {
                    out.push_str(&format!("{} w\n", fmt_pt(*width)));
                }
                Command::SetFontName(name) => {
                    current_font_name = name.clone();
                    self.ensure_font(&current_font_name)?;
                }
                Command::SetFontSize(size) => {
                    current_font_size = *size;
                }
                Command::MoveTo { x, y } => {
                    out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
                }
                Command::LineTo { x, y } => {
                    out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
                }
                Command::Stroke => out.push_str("S\n"),
                Command::DrawString { x, y, text } => {
                    let Some(resource) = self
                        .fonts
                        .get(&current_font_name)
                        .map(|font| font.resource.clone())
                    else {
                        continue;
                    };
                    out.push_str("BT\n");
                    out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(current_font_size)));
                    out.push_str(&format!(
                        "{} {} Td\n",
                        fmt_pt(*x),
                        fmt_pt(page_height - *y - current_font_size)
                    ));
                    let encoded = encode_winansi_pdf_string(text);
                    if encoded.replaced > 0 {
                        if let Some(logger) = self.debug.as_deref() {
                            let json = format!(
                                "{{\"type\":\"pdf.winansi.lossy\",\"font\":\"{}\",\"replaced\":{},\"sample\":\"{}\"}}",
                                json_escape(&current_font_name),
                                encoded.replaced,
                                json_escape(&truncate_preview(text, 80))
                            );
                            logger.log_json(&json);
                            logger.increment("pdf.winansi.lossy", encoded.replaced as u64);
                        }
                    }
                    out.push_str(&format!("({}) Tj\n", encoded.text));
                    out.push_str("ET\n");
                }
                Command::FillRect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let draw_y = page_height - *y - *height;
                    out.push_str(&format!(
                        "{} {} {} {} re\nf\n",
                        fmt_pt(*x),
                        fmt_pt(draw_y),
                        fmt_pt(*width),
                        fmt_pt(*height)
                    ));
                }
                Command::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let draw_y = page_height - *y - *height;
                    out.push_str(&format!(
                        "{} {} {} {} re\nS\n",
                        fmt_pt(*x),
                        fmt_pt(draw_y),
                        fmt_pt(*width),
                        fmt_pt(*height)
                    ));
                }
                Command::DrawImage {
                    x,
                    y,
                    width,
                    height,
                    resource_id,
                } => {
                    if let Some(name) = self.ensure_image(resource_id)? {
                        let draw_y = page_height - *y - *height;
                        out.push_str("q\n");
                        out.push_str(&format!(
                            "{} 0 0 {} {} {} cm\n",
                            fmt_pt(*width),
                            fmt_pt(*height),
                            fmt_pt(*x),
                            fmt_pt(draw_y)
                        ));
                        out.push_str(&format!("/{} Do\n", name));
                        out.push_str("Q\n");
                    }
                }
            }
        }
        Ok(out)
    }

    fn ensure_font(&mut self, name: &str) -> io::Result<()> {
        if self.fonts.contains_key(name) {
            return Ok(());
        }

        let resource = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;

        let embeddable = !is_base14_font(name)
            && self
                .registry
                .map(|registry| registry.resolve(name).is_some())
                .unwrap_or(false);
        let (kind, id_count) = if embeddable {
            (StreamFontKind::TrueTypeWinAnsi, 3)
        } else {
            (StreamFontKind::Type1, 1)
        };
        let start_id = self.alloc_ids(id_count);
        self.fonts.insert(
            name.to_string(),
            StreamFont {
                logical_name: name.to_string(),
                resource,
                start_id,
                kind,
            },
        );
        Ok(())
    }

    fn ensure_image(&mut self, source: &str) -> io::Result<Option<String>> {
        if let Some(name) = self.image_name_map.get(source) {
            if name.is_empty() {
                return Ok(None);
            }
            return Ok(Some(name.clone()));
        }

        let Some(image) = assets::load_image(source) else {
            self.image_name_map
                .insert(source.to_string(), String::new());
            if let Some(logger) = self.debug.as_deref() {
                let json = format!(
                    "{{\"type\":\"pdf.image.missing\",\"source\":\"{}\"}}",
                    json_escape(source)
                );
                logger.log_json(&json);
                logger.increment("pdf.image.missing", 1);
            }
            return Ok(None);
        };

        let hash = hash_image(&image);
        if let Some(name) = self.image_content_map.get(&hash) {
            let name = name.clone();
            self.image_name_map.insert(source.to_string(), name.clone());
            return Ok(Some(name));
        }

        let smask_id = if image.alpha.is_some() {
            Some(self.alloc_ids(1))
        } else {
            None
        };
        let obj_id = self.alloc_ids(1);
        let name = format!("Im{}", self.next_image_index);
        self.next_image_index += 1;

        if let (Some(alpha), Some(mask_id)) = (image.alpha.as_ref(), smask_id) {
            let body = image_smask_object(alpha);
            self.write_object(mask_id, &body)?;
        }
        let body = image_object(&image, smask_id);
        self.write_object(obj_id, &body)?;
        self.image_bytes_total += image.data.len();

        self.image_resources.push((name.clone(), obj_id));
        self.image_name_map.insert(source.to_string(), name.clone());
        self.image_content_map.insert(hash, name.clone());
        Ok(Some(name))
    }

    pub(crate) fn finish(&mut self) -> io::Result<usize> {
        // 1) Fonts: ids were allocated on first use, objects land here.
        let fonts = std::mem::take(&mut self.fonts);
        for font_state in fonts.values() {
            match font_state.kind {
                StreamFontKind::Type1 => {
                    self.write_object(font_state.start_id, &font_object(&font_state.logical_name))?;
                }
                StreamFontKind::TrueTypeWinAnsi => {
                    let Some(font) = self
                        .registry
                        .and_then(|registry| registry.resolve(&font_state.logical_name))
                    else {
                        return Err(io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("font not found in registry: {}", font_state.logical_name),
                        ));
                    };
                    let objs = build_embedded_font_objects(font, font_state.start_id);
                    for (i, obj) in objs.iter().enumerate() {
                        self.write_object(font_state.start_id + i, obj)?;
                    }
                }
            }
        }

        // 2) Shared resources dictionary.
        let font_entries: Vec<(String, usize)> = fonts
            .values()
            .map(|font| (font.resource.clone(), font.start_id))
            .collect();
        let mut resources = vec![format!("/Font {}", name_id_dict(&font_entries))];
        if !self.image_resources.is_empty() {
            resources.push(format!("/XObject {}", name_id_dict(&self.image_resources)));
        }
        self.write_object(PDF_RESOURCES_ID, &format!("<< {} >>", resources.join(" ")))?;

        // 3) Page tree.
        let kids = self
            .page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.write_object(
            PDF_PAGES_ID,
            &format!(
                "<< /Type /Pages /Count {} /Kids [{}] >>",
                self.page_ids.len(),
                kids
            ),
        )?;

        // 4) Info + catalog.
        let mut info_id = None;
        if self.options.document_title.is_some() {
            let id = self.alloc_ids(1);
            self.write_object(id, &info_object(self.options.document_title.as_deref()))?;
            info_id = Some(id);
        }
        let mut catalog = format!("<< /Type /Catalog /Pages {} 0 R", PDF_PAGES_ID);
        if self.options.document_title.is_some() {
            catalog.push_str(" /ViewerPreferences << /DisplayDocTitle true >>");
        }
        catalog.push_str(" >>");
        self.write_object(PDF_CATALOG_ID, &catalog)?;

        // 5) XRef + trailer.
        let total_objects = self.next_id.saturating_sub(1);
        let xref_start = self.offset;
        write_str(
            self.writer,
            &format!("xref\n0 {}\n", total_objects + 1),
            &mut self.offset,
        )?;
        write_bytes(self.writer, b"0000000000 65535 f \n", &mut self.offset)?;
        for id in 1..=total_objects {
            let obj_offset = self.offsets.get(id).copied().unwrap_or(0);
            write_str(
                self.writer,
                &format!("{:010} 00000 n \n", obj_offset),
                &mut self.offset,
            )?;
        }
        let mut trailer = format!(
            "trailer\n<< /Size {} /Root {} 0 R",
            total_objects + 1,
            PDF_CATALOG_ID
        );
        if let Some(id) = info_id {
            trailer.push_str(&format!(" /Info {} 0 R", id));
        }
        trailer.push_str(&format!(" >>\nstartxref\n{}\n%%EOF", xref_start));
        write_str(self.writer, &trailer, &mut self.offset)?;

        let bytes_written = self.offset;
        if let Some(logger) = self.debug.as_deref() {
            let json = format!(
                "{{\"type\":\"pdf.link\",\"bytes\":{},\"pages\":{},\"fonts\":{},\"images\":{},\"image_bytes\":{}}}",
                bytes_written,
                self.page_ids.len(),
                font_entries.len(),
                self.image_resources.len(),
                self.image_bytes_total
            );
            logger.log_json(&json);
        }
        Ok(bytes_written)
    }

    fn ensure_offsets_len(&mut self, required_len: usize) {
        if self.offsets.len() < required_len {
            self.offsets.resize(required_len, 0);
        }
    }

    fn alloc_ids(&mut self, count: usize) -> usize {
        let start = self.next_id;
        self.next_id = self.next_id.saturating_add(count);
        self.ensure_offsets_len(self.next_id);
        start
    }

    fn write_object(&mut self, obj_id: usize, body: &str) -> io::Result<()> {
        if let Some(slot) = self.offsets.get_mut(obj_id) {
            *slot = self.offset;
        }
        write_str(self.writer, &format!("{} 0 obj\n", obj_id), &mut self.offset)?;
        write_bytes(self.writer, body.as_bytes(), &mut self.offset)?;
        write_bytes(self.writer, b"\nendobj\n", &mut self.offset)
    }
}

/// Serialize a command-recorded document with default options and no
/// registered fonts. The invoice pipeline goes through `document_to_pdf_with`.
pub fn document_to_pdf(document: &Document) -> io::Result<Vec<u8>> {
    document_to_pdf_with(document, None, None, &PdfOptions::default(), None)
}

pub(crate) fn document_to_pdf_with(
    document: &Document,
    mut metrics: Option<&mut DocumentMetrics>,
    registry: Option<&FontRegistry>,
    options: &PdfOptions,
    debug: Option<Arc<DebugLogger>>,
) -> io::Result<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    let mut stream = PdfStreamWriter::new(
        &mut bytes,
        document.page_size,
        registry,
        options.clone(),
        debug,
    )?;
    stream.add_document(document)?;
    let total_bytes = stream.finish()?;

    if let Some(metrics) = metrics.as_deref_mut() {
        metrics.total_bytes = total_bytes;
        for (page_index, content_bytes) in stream.page_content_bytes.iter().enumerate() {
            if let Some(entry) = metrics.pages.get_mut(page_index) {
                entry.content_bytes = *content_bytes;
            }
        }
    }
    Ok(bytes)
}

fn is_base14_font(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "helvetica"
            | "helvetica-bold"
            | "helvetica-oblique"
            | "helvetica-boldoblique"
            | "courier"
            | "courier-bold"
            | "courier-oblique"
            | "courier-boldoblique"
            | "times-roman"
            | "times-bold"
            | "times-italic"
            | "times-bolditalic"
            | "symbol"
            | "zapfdingbats"
    )
}

fn font_object(name: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        sanitize_font_name(name)
    )
}

fn build_embedded_font_objects(font: &RegisteredFont, start_id: usize) -> Vec<String> {
    let descriptor_id = start_id + 1;
    let font_file_id = start_id + 2;
    let base = sanitize_font_name(&font.name);
    let metrics = &font.metrics;

    let subtype = match font.program_kind {
        FontProgramKind::OpenTypeCff => "Type1",
        FontProgramKind::TrueType => "TrueType",
    };
    let widths = metrics
        .widths
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let font_obj = format!(
        "<< /Type /Font /Subtype /{} /BaseFont /{} /FirstChar {} /LastChar {} /Widths [{}] /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
        subtype, base, metrics.first_char, metrics.last_char, widths, descriptor_id
    );

    // Bit 6 marks a nonsymbolic font; bit 1 fixed pitch.
    let mut flags = 32u32;
    if metrics.is_fixed_pitch {
        flags |= 1;
    }
    let (x_min, y_min, x_max, y_max) = metrics.bbox;
    let file_key = match font.program_kind {
        FontProgramKind::OpenTypeCff => "FontFile3",
        FontProgramKind::TrueType => "FontFile2",
    };
    let descriptor_obj = format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags {} /FontBBox [{} {} {} {}] /ItalicAngle {} /Ascent {} /Descent {} /CapHeight {} /StemV {} /{} {} 0 R >>",
        base,
        flags,
        x_min,
        y_min,
        x_max,
        y_max,
        metrics.italic_angle,
        metrics.ascent,
        metrics.descent,
        metrics.cap_height,
        metrics.stem_v,
        file_key,
        font_file_id
    );

    let file_obj = font_file_object(&font.data, font.program_kind);
    vec![font_obj, descriptor_obj, file_obj]
}

fn font_file_object(data: &[u8], kind: FontProgramKind) -> String {
    let compressed = assets::flate_compress(data);
    let stream_data = encode_stream_data(&compressed);
    let subtype = match kind {
        FontProgramKind::OpenTypeCff => " /Subtype /OpenType",
        FontProgramKind::TrueType => "",
    };
    format!(
        "<< /Length {} /Length1 {} /Filter [/ASCIIHexDecode /FlateDecode]{} >>\nstream\n{}\nendstream",
        stream_data.len(),
        data.len(),
        subtype,
        stream_data
    )
}

fn sanitize_font_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        }
    }
    if out.is_empty() {
        "Unnamed".to_string()
    } else {
        out
    }
}

fn name_id_dict(entries: &[(String, usize)]) -> String {
    let body = entries
        .iter()
        .map(|(name, id)| format!("/{} {} 0 R", name, id))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<< {} >>", body)
}

fn info_object(title: Option<&str>) -> String {
    let mut entries = vec!["/Producer (ledgerpress)".to_string()];
    if let Some(title) = title {
        entries.push(format!("/Title ({})", escape_pdf_string(title)));
    }
    format!("<< {} >>", entries.join(" "))
}

fn image_object(image: &ImageData, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let filters = match image.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} /Length {} /Filter {}{} >>\nstream\n{}\nendstream",
        image.width,
        image.height,
        image.color_space,
        image.bits_per_component,
        stream_data.len(),
        filters,
        smask,
        stream_data
    )
}

fn image_smask_object(alpha: &AlphaData) -> String {
    let stream_data = encode_stream_data(&alpha.data);
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent {} /Length {} /Filter [/ASCIIHexDecode /FlateDecode] >>\nstream\n{}\nendstream",
        alpha.width,
        alpha.height,
        alpha.bits_per_component,
        stream_data.len(),
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = String::with_capacity(data.len() * 2 + 1);
    for byte in data {
        hex.push_str(&format!("{:02X}", byte));
    }
    hex.push('>');
    hex
}

fn hash_image(image: &ImageData) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    image.data.hash(&mut hasher);
    if let Some(alpha) = &image.alpha {
        alpha.data.hash(&mut hasher);
    }
    hasher.finish()
}

fn stream_object(content: &str) -> String {
    format!(
        "<< /Length {} >>\nstream\n{}\nendstream",
        content.len(),
        content
    )
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, data: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, data.as_bytes(), offset)
}

fn color_to_pdf_fill(color: Color) -> String {
    format!(
        "{} {} {} rg\n",
        fmt_f32(color.r),
        fmt_f32(color.g),
        fmt_f32(color.b)
    )
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!(
        "{} {} {} RG\n",
        fmt_f32(color.r),
        fmt_f32(color.g),
        fmt_f32(color.b)
    )
}

fn fmt_pt(value: Pt) -> String {
    let milli = value.to_milli_i64();
    let negative = milli < 0;
    let milli = milli.unsigned_abs();
    let whole = milli / 1000;
    let frac = milli % 1000;
    let mut out = String::new();
    if negative && (whole > 0 || frac > 0) {
        out.push('-');
    }
    out.push_str(&whole.to_string());
    if frac > 0 {
        let frac = format!("{:03}", frac);
        let trimmed = frac.trim_end_matches('0');
        out.push('.');
        out.push_str(trimmed);
    }
    out
}

fn fmt_f32(value: f32) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn escape_pdf_string(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

struct WinAnsiEncoded {
    text: String,
    replaced: usize,
}

fn encode_winansi_pdf_string(input: &str) -> WinAnsiEncoded {
    let mut out = String::new();
    let mut replaced = 0usize;
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            // WinAnsi extensions (cp1252).
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => {
                replaced += 1;
                b'?'
            }
        };

        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }

    WinAnsiEncoded { text: out, replaced }
}

fn truncate_preview(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut out = String::new();
    for (idx, ch) in input.chars().enumerate() {
        if idx >= max_chars {
            break;
        }
        out.push(ch);
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;

    #[test]
    fn fmt_pt_trims_trailing_zeros() {
        assert_eq!(fmt_pt(Pt::from_f32(595.28)), "595.28");
        assert_eq!(fmt_pt(Pt::from_f32(40.0)), "40");
        assert_eq!(fmt_pt(Pt::from_f32(0.5)), "0.5");
        assert_eq!(fmt_pt(Pt::from_f32(-12.25)), "-12.25");
    }

    #[test]
    fn pdf_string_escaping() {
        assert_eq!(escape_pdf_string("a(b)c"), "a\\(b\\)c");
        assert_eq!(escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn winansi_replaces_unencodable_chars() {
        let encoded = encode_winansi_pdf_string("Rs. 100 \u{20B9} \u{0936}");
        assert_eq!(encoded.replaced, 2);
        assert!(encoded.text.contains('?'));
        // The euro sign maps into cp1252 rather than being replaced.
        let euro = encode_winansi_pdf_string("\u{20AC}");
        assert_eq!(euro.replaced, 0);
        assert_eq!(euro.text, "\\200");
    }

    #[test]
    fn simple_document_serializes_with_header_and_trailer() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font_size(Pt::from_f32(10.0));
        canvas.draw_string(Pt::from_f32(40.0), Pt::from_f32(40.0), "TAX INVOICE");
        let doc = canvas.finish();
        let bytes = document_to_pdf(&doc).expect("serialize");
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(11).any(|w| w == b"TAX INVOICE".as_slice()));
    }

    #[test]
    fn produced_bytes_parse_with_lopdf() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_string(Pt::from_f32(40.0), Pt::from_f32(40.0), "hello");
        canvas.show_page();
        canvas.draw_string(Pt::from_f32(40.0), Pt::from_f32(40.0), "world");
        let doc = canvas.finish();
        let bytes = document_to_pdf(&doc).expect("serialize");
        let parsed = lopdf::Document::load_mem(&bytes).expect("lopdf parse");
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[test]
    fn mixed_page_sizes_are_rejected() {
        let canvas = Canvas::new(Size::a4());
        let mut doc = canvas.finish();
        doc.page_size = Size::new(300.0, 300.0);
        let mut bytes = Vec::new();
        let mut stream = PdfStreamWriter::new(
            &mut bytes,
            Size::a4(),
            None,
            PdfOptions::default(),
            None,
        )
        .expect("writer");
        let err = stream.add_document(&doc).expect_err("size mismatch");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn missing_image_degrades_to_no_draw() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_image(
            Pt::from_f32(40.0),
            Pt::from_f32(40.0),
            Pt::from_f32(50.0),
            Pt::from_f32(30.0),
            "/nonexistent/logo.png",
        );
        canvas.draw_string(Pt::from_f32(40.0), Pt::from_f32(80.0), "still renders");
        let doc = canvas.finish();
        let bytes = document_to_pdf(&doc).expect("serialize");
        let parsed = lopdf::Document::load_mem(&bytes).expect("lopdf parse");
        assert_eq!(parsed.get_pages().len(), 1);
    }
}
