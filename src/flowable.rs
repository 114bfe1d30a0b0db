use crate::canvas::Canvas;
use crate::font::{FontRegistry, heuristic_text_width};
use crate::types::{Color, Pt, Size};
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakBefore {
    Auto,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakAfter {
    Auto,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakInside {
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub break_before: BreakBefore,
    pub break_after: BreakAfter,
    pub break_inside: BreakInside,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            break_before: BreakBefore::Auto,
            break_after: BreakAfter::Auto,
            break_inside: BreakInside::Auto,
        }
    }
}

impl Pagination {
    pub fn avoid_break_inside() -> Self {
        Self {
            break_inside: BreakInside::Avoid,
            ..Self::default()
        }
    }
}

pub trait Flowable: FlowableClone + Send + Sync {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, avail_height: Pt);

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub trait FlowableClone {
    fn clone_box(&self) -> Box<dyn Flowable>;
}

impl<T> FlowableClone for T
where
    T: 'static + Flowable + Clone,
{
    fn clone_box(&self) -> Box<dyn Flowable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Flowable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_size: Pt,
    pub line_height: Pt,
    pub color: Color,
    pub font_name: Arc<str>,
}

impl Default for TextStyle {
    fn default() -> Self {
        let font_size = Pt::from_f32(10.0);
        Self {
            font_size,
            line_height: font_size.mul_ratio(7, 5),
            color: Color::BLACK,
            font_name: Arc::<str>::from("Helvetica"),
        }
    }
}

impl TextStyle {
    pub fn sized(font_size: f32) -> Self {
        let font_size = Pt::from_f32(font_size);
        Self {
            font_size,
            line_height: font_size.mul_ratio(7, 5),
            ..Self::default()
        }
    }

    pub fn with_font(mut self, name: impl Into<Arc<str>>) -> Self {
        self.font_name = name.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

fn style_text_width(
    registry: Option<&FontRegistry>,
    style: &TextStyle,
    text: &str,
) -> Pt {
    match registry {
        Some(registry) => registry.measure_text_width(&style.font_name, style.font_size, text),
        None => heuristic_text_width(style.font_size, text),
    }
}

/// Greedy word wrap. Embedded line breaks split the input first and each
/// segment wraps independently; a word wider than `max_width` on its own is
/// broken character by character. The result is never empty: an empty input
/// (or segment) contributes exactly one empty line.
pub(crate) fn wrap_text(text: &str, max_width: Pt, measure: &dyn Fn(&str) -> Pt) -> Vec<String> {
    let max_width = max_width.max(Pt::from_f32(1.0));
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        if segment.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in segment.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_string();
            } else {
                // The trailing fragment stays open so following words can
                // still join it.
                let mut parts = split_word_by_width(word, max_width, measure);
                current = parts.pop().unwrap_or_default();
                lines.append(&mut parts);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_word_by_width(word: &str, max_width: Pt, measure: &dyn Fn(&str) -> Pt) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && measure(&candidate) > max_width {
            parts.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        parts.push(String::new());
    }
    parts
}

#[derive(Clone)]
pub struct Paragraph {
    text: String,
    style: TextStyle,
    align: TextAlign,
    pagination: Pagination,
    font_registry: Option<Arc<FontRegistry>>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            align: TextAlign::Left,
            pagination: Pagination::default(),
            font_registry: None,
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub(crate) fn with_font_registry(mut self, registry: Option<Arc<FontRegistry>>) -> Self {
        self.font_registry = registry;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn measure(&self, text: &str) -> Pt {
        style_text_width(self.font_registry.as_deref(), &self.style, text)
    }

    // Registered faces get their real leading; otherwise the style value.
    fn effective_line_height(&self) -> Pt {
        if let Some(registry) = &self.font_registry {
            return registry.line_height(
                &self.style.font_name,
                self.style.font_size,
                self.style.line_height,
            );
        }
        self.style.line_height
    }

    fn layout_lines(&self, avail_width: Pt) -> Vec<String> {
        wrap_text(&self.text, avail_width, &|t| self.measure(t))
    }
}

impl Flowable for Paragraph {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let lines = self.layout_lines(avail_width);
        let width = lines
            .iter()
            .fold(Pt::ZERO, |acc, line| acc.max(self.measure(line)))
            .min(avail_width);
        Size {
            width,
            height: self.effective_line_height() * (lines.len() as i32),
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let lines = self.layout_lines(avail_width);
        let lh = self.effective_line_height().to_milli_i64();
        let ah = avail_height.to_milli_i64();
        if lh <= 0 || ah <= 0 {
            return None;
        }
        let max_lines = (ah / lh) as usize;
        if max_lines == 0 || max_lines >= lines.len() {
            return None;
        }
        let first = Paragraph {
            text: lines[..max_lines].join("\n"),
            style: self.style.clone(),
            align: self.align,
            pagination: Pagination {
                break_before: BreakBefore::Auto,
                break_after: BreakAfter::Auto,
                ..self.pagination
            },
            font_registry: self.font_registry.clone(),
        };
        let second = Paragraph {
            text: lines[max_lines..].join("\n"),
            style: self.style.clone(),
            align: self.align,
            pagination: Pagination {
                break_before: BreakBefore::Auto,
                ..self.pagination
            },
            font_registry: self.font_registry.clone(),
        };
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let lines = self.layout_lines(avail_width);
        canvas.set_fill_color(self.style.color);
        canvas.set_font_name(self.style.font_name.as_ref());
        canvas.set_font_size(self.style.font_size);

        let line_height = self.effective_line_height();
        let mut cursor_y = y;
        for line in &lines {
            let line_width = self.measure(line);
            let offset = match self.align {
                TextAlign::Left => Pt::ZERO,
                TextAlign::Center => ((avail_width - line_width).max(Pt::ZERO)).mul_ratio(1, 2),
                TextAlign::Right => (avail_width - line_width).max(Pt::ZERO),
            };
            canvas.draw_string(x + offset, cursor_y, line.clone());
            cursor_y += line_height;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[derive(Debug, Clone)]
pub struct Spacer {
    height: Pt,
    pagination: Pagination,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self {
            height: Pt::from_f32(height),
            pagination: Pagination::default(),
        }
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height.max(Pt::ZERO),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[derive(Debug, Clone)]
pub struct ImageFlowable {
    pub width: Pt,
    pub height: Pt,
    pub resource_id: String,
    pagination: Pagination,
}

impl ImageFlowable {
    pub fn new(width: f32, height: f32, resource_id: impl Into<String>) -> Self {
        Self {
            width: Pt::from_f32(width),
            height: Pt::from_f32(height),
            resource_id: resource_id.into(),
            pagination: Pagination::default(),
        }
    }
}

impl Flowable for ImageFlowable {
    fn wrap(&self, _avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, _avail_width: Pt, _avail_height: Pt) {
        canvas.draw_image(x, y, self.width, self.height, self.resource_id.clone());
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

// Table geometry. Row height tracks the tallest wrapped cell; the floor keeps
// single-line rows from collapsing below a tappable band.
const CELL_PAD: f32 = 4.0;
const ROW_V_PAD: f32 = 10.0;
const MIN_ROW_HEIGHT: f32 = 25.0;
const HEADER_BAND_HEIGHT: f32 = 25.0;

const HEADER_BAND_FILL: Color = Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
};
const HEADER_BAND_BORDER: Color = Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
};
const ROW_BORDER: Color = Color {
    r: 0.7,
    g: 0.7,
    b: 0.7,
};
const ROW_STRIPE: Color = Color {
    r: 0.98,
    g: 0.98,
    b: 0.98,
};

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    pub width: Pt,
    pub bold: bool,
}

impl Column {
    pub fn new(title: impl Into<String>, width: f32) -> Self {
        Self {
            title: title.into(),
            width: Pt::from_f32(width),
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

pub struct ItemTableData {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub style: TextStyle,
    pub bold_font: Arc<str>,
    pub zebra: bool,
}

/// The line-item band. Splitting only happens between rows; a row is atomic
/// and the header band repeats on every continuation.
#[derive(Clone)]
pub struct ItemTable {
    data: Arc<ItemTableData>,
    body_range: Range<usize>,
    include_header: bool,
    repeat_header: bool,
    pagination: Pagination,
    font_registry: Option<Arc<FontRegistry>>,
}

impl ItemTable {
    pub fn new(data: ItemTableData) -> Self {
        let row_count = data.rows.len();
        Self {
            data: Arc::new(data),
            body_range: 0..row_count,
            include_header: true,
            repeat_header: true,
            pagination: Pagination::default(),
            font_registry: None,
        }
    }

    pub(crate) fn with_font_registry(mut self, registry: Option<Arc<FontRegistry>>) -> Self {
        self.font_registry = registry;
        self
    }

    pub fn table_width(&self) -> Pt {
        self.data.columns.iter().map(|col| col.width).sum()
    }

    fn cell_style(&self, column: &Column) -> TextStyle {
        if column.bold {
            let mut style = self.data.style.clone();
            style.font_name = self.data.bold_font.clone();
            style
        } else {
            self.data.style.clone()
        }
    }

    fn cell_lines(&self, column: &Column, text: &str) -> Vec<String> {
        let style = self.cell_style(column);
        let drawable = column.width - Pt::from_f32(2.0 * CELL_PAD);
        let registry = self.font_registry.clone();
        wrap_text(text, drawable, &|t| {
            style_text_width(registry.as_deref(), &style, t)
        })
    }

    fn row_lines(&self, row: &[String]) -> Vec<Vec<String>> {
        self.data
            .columns
            .iter()
            .zip(row.iter())
            .map(|(column, text)| self.cell_lines(column, text))
            .collect()
    }

    fn row_height(&self, row: &[String]) -> Pt {
        let max_lines = self
            .row_lines(row)
            .iter()
            .map(|lines| lines.len())
            .max()
            .unwrap_or(1);
        let text_height =
            self.data.style.line_height * (max_lines as i32) + Pt::from_f32(ROW_V_PAD);
        text_height.max(Pt::from_f32(MIN_ROW_HEIGHT))
    }

    fn header_height(&self) -> Pt {
        if self.include_header {
            Pt::from_f32(HEADER_BAND_HEIGHT)
        } else {
            Pt::ZERO
        }
    }

    fn draw_header_band(&self, canvas: &mut Canvas, x: Pt, y: Pt) {
        let band_height = Pt::from_f32(HEADER_BAND_HEIGHT);
        canvas.set_line_width(Pt::from_f32(1.0));
        canvas.set_stroke_color(HEADER_BAND_BORDER);
        let mut cell_x = x;
        for column in &self.data.columns {
            canvas.set_fill_color(HEADER_BAND_FILL);
            canvas.fill_rect(cell_x, y, column.width, band_height);
            canvas.stroke_rect(cell_x, y, column.width, band_height);
            cell_x += column.width;
        }
        canvas.set_font_name(self.data.bold_font.as_ref());
        canvas.set_font_size(self.data.style.font_size);
        canvas.set_fill_color(Color::WHITE);
        let title_y = y + (band_height - self.data.style.font_size) / 2;
        let mut cell_x = x;
        for column in &self.data.columns {
            canvas.draw_string(cell_x + Pt::from_f32(CELL_PAD), title_y, column.title.clone());
            cell_x += column.width;
        }
    }

    fn draw_cell(
        &self,
        canvas: &mut Canvas,
        column: &Column,
        lines: &[String],
        x: Pt,
        y: Pt,
        height: Pt,
    ) {
        let style = self.cell_style(column);
        let pad = Pt::from_f32(CELL_PAD);
        let inner_height = (height - pad * 2).max(Pt::ZERO);
        let block_height = style.line_height * (lines.len() as i32);
        let top = y + pad + ((inner_height - block_height).max(Pt::ZERO)) / 2;

        canvas.set_font_name(style.font_name.as_ref());
        canvas.set_font_size(style.font_size);
        canvas.set_fill_color(style.color);
        for (index, line) in lines.iter().enumerate() {
            let line_top = top + style.line_height * (index as i32);
            // Clamp against rows sized smaller than their content: a line
            // falling outside the padded interior is not drawn.
            if line_top + style.font_size > y + height - pad {
                break;
            }
            canvas.draw_string(x + pad, line_top, line.clone());
        }
    }

    fn draw_row(&self, canvas: &mut Canvas, absolute_index: usize, row: &[String], x: Pt, y: Pt) {
        let height = self.row_height(row);
        let lines = self.row_lines(row);
        canvas.set_line_width(Pt::from_f32(0.5));
        canvas.set_stroke_color(ROW_BORDER);
        let mut cell_x = x;
        for column in &self.data.columns {
            if self.data.zebra {
                let fill = if absolute_index % 2 == 0 {
                    Color::WHITE
                } else {
                    ROW_STRIPE
                };
                canvas.set_fill_color(fill);
                canvas.fill_rect(cell_x, y, column.width, height);
            }
            canvas.stroke_rect(cell_x, y, column.width, height);
            cell_x += column.width;
        }
        let mut cell_x = x;
        for (column, cell) in self.data.columns.iter().zip(lines.iter()) {
            self.draw_cell(canvas, column, cell, cell_x, y, height);
            cell_x += column.width;
        }
    }
}

impl Flowable for ItemTable {
    fn wrap(&self, _avail_width: Pt, _avail_height: Pt) -> Size {
        let mut height = self.header_height();
        for row in &self.data.rows[self.body_range.clone()] {
            height += self.row_height(row);
        }
        Size {
            width: self.table_width(),
            height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let available = avail_height - self.header_height();
        if available <= Pt::ZERO {
            return None;
        }

        let start = self.body_range.start;
        let end = self.body_range.end;
        let mut used = Pt::ZERO;
        let mut split_at = start;
        for row in &self.data.rows[self.body_range.clone()] {
            let row_height = self.row_height(row);
            if used + row_height > available {
                break;
            }
            used += row_height;
            split_at += 1;
        }

        let fitted = split_at.saturating_sub(start);
        if fitted == 0 || split_at >= end {
            return None;
        }

        let first = ItemTable {
            data: self.data.clone(),
            body_range: start..split_at,
            include_header: self.include_header,
            repeat_header: self.repeat_header,
            pagination: Pagination {
                break_before: BreakBefore::Auto,
                break_after: BreakAfter::Auto,
                ..self.pagination
            },
            font_registry: self.font_registry.clone(),
        };
        let second = ItemTable {
            data: self.data.clone(),
            body_range: split_at..end,
            include_header: self.repeat_header,
            repeat_header: self.repeat_header,
            pagination: Pagination {
                break_before: BreakBefore::Auto,
                ..self.pagination
            },
            font_registry: self.font_registry.clone(),
        };
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, _avail_width: Pt, _avail_height: Pt) {
        let mut cursor_y = y;
        if self.include_header {
            self.draw_header_band(canvas, x, cursor_y);
            cursor_y += Pt::from_f32(HEADER_BAND_HEIGHT);
        }
        for (offset, row) in self.data.rows[self.body_range.clone()].iter().enumerate() {
            let absolute_index = self.body_range.start + offset;
            self.draw_row(canvas, absolute_index, row, x, cursor_y);
            cursor_y += self.row_height(row);
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

const DETAILS_PANEL_HEIGHT: f32 = 80.0;
const DETAIL_INSET: f32 = 10.0;
const DETAIL_LINE_STEP: f32 = 15.0;
const RIGHT_COLUMN_FROM_EDGE: f32 = 160.0;

const PANEL_FILL: Color = Color {
    r: 0.98,
    g: 0.98,
    b: 0.98,
};
const PANEL_BORDER: Color = Color {
    r: 0.7,
    g: 0.7,
    b: 0.7,
};

#[derive(Debug, Clone)]
pub struct DetailLine {
    pub text: String,
    pub bold: bool,
}

impl DetailLine {
    pub fn new(text: impl Into<String>, bold: bool) -> Self {
        Self {
            text: text.into(),
            bold,
        }
    }
}

/// Boxed invoice-metadata block drawn once on the first content page.
#[derive(Clone)]
pub struct DetailsPanel {
    left: Vec<DetailLine>,
    right: Vec<DetailLine>,
    style: TextStyle,
    bold_font: Arc<str>,
    pagination: Pagination,
}

impl DetailsPanel {
    pub fn new(left: Vec<DetailLine>, right: Vec<DetailLine>) -> Self {
        Self {
            left,
            right,
            style: TextStyle::default(),
            bold_font: Arc::<str>::from("Helvetica-Bold"),
            pagination: Pagination::avoid_break_inside(),
        }
    }

    fn draw_column(&self, canvas: &mut Canvas, lines: &[DetailLine], x: Pt, y: Pt) {
        for (index, line) in lines.iter().enumerate() {
            let font = if line.bold {
                self.bold_font.as_ref()
            } else {
                self.style.font_name.as_ref()
            };
            canvas.set_font_name(font);
            canvas.set_font_size(self.style.font_size);
            canvas.set_fill_color(self.style.color);
            let line_y = y + Pt::from_f32(DETAIL_INSET + DETAIL_LINE_STEP * index as f32);
            canvas.draw_string(x, line_y, line.text.clone());
        }
    }
}

impl Flowable for DetailsPanel {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: Pt::from_f32(DETAILS_PANEL_HEIGHT),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let height = Pt::from_f32(DETAILS_PANEL_HEIGHT);
        canvas.set_fill_color(PANEL_FILL);
        canvas.fill_rect(x, y, avail_width, height);
        canvas.set_line_width(Pt::from_f32(1.0));
        canvas.set_stroke_color(PANEL_BORDER);
        canvas.stroke_rect(x, y, avail_width, height);

        let inset = Pt::from_f32(DETAIL_INSET);
        self.draw_column(canvas, &self.left, x + inset, y);
        let right_x = x + avail_width - Pt::from_f32(RIGHT_COLUMN_FROM_EDGE);
        self.draw_column(canvas, &self.right, right_x, y);
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

const TOTALS_WIDTH: f32 = 180.0;
const TOTALS_HEIGHT: f32 = 120.0;
const TOTALS_FILL: Color = Color {
    r: 0.95,
    g: 0.95,
    b: 0.95,
};
const TOTALS_BORDER: Color = Color {
    r: 0.3,
    g: 0.3,
    b: 0.3,
};
const ACCENT: Color = Color {
    r: 0.1,
    g: 0.1,
    b: 0.6,
};

/// Right-aligned summary box: subtotal, both tax lines, highlighted grand
/// total. Never splits; when it cannot fit it moves whole to the next page.
#[derive(Clone)]
pub struct TotalsPanel {
    lines: Vec<String>,
    total_line: String,
    style: TextStyle,
    bold_font: Arc<str>,
    pagination: Pagination,
}

impl TotalsPanel {
    pub fn new(lines: Vec<String>, total_line: impl Into<String>) -> Self {
        Self {
            lines,
            total_line: total_line.into(),
            style: TextStyle::default(),
            bold_font: Arc::<str>::from("Helvetica-Bold"),
            pagination: Pagination::avoid_break_inside(),
        }
    }
}

impl Flowable for TotalsPanel {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: Pt::from_f32(TOTALS_HEIGHT),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let width = Pt::from_f32(TOTALS_WIDTH);
        let height = Pt::from_f32(TOTALS_HEIGHT);
        let box_x = x + (avail_width - width).max(Pt::ZERO);

        canvas.set_fill_color(TOTALS_FILL);
        canvas.fill_rect(box_x, y, width, height);
        canvas.set_line_width(Pt::from_f32(1.0));
        canvas.set_stroke_color(TOTALS_BORDER);
        canvas.stroke_rect(box_x, y, width, height);

        canvas.set_font_name(self.style.font_name.as_ref());
        canvas.set_font_size(self.style.font_size);
        canvas.set_fill_color(self.style.color);
        let inset = Pt::from_f32(DETAIL_INSET);
        for (index, line) in self.lines.iter().enumerate() {
            let line_y = y + Pt::from_f32(15.0 + 20.0 * index as f32);
            canvas.draw_string(box_x + inset, line_y, line.clone());
        }

        canvas.set_fill_color(ACCENT);
        canvas.fill_rect(
            box_x + Pt::from_f32(5.0),
            y + Pt::from_f32(70.0),
            width - Pt::from_f32(10.0),
            Pt::from_f32(25.0),
        );
        canvas.set_font_name(self.bold_font.as_ref());
        canvas.set_font_size(self.style.font_size + Pt::from_f32(2.0));
        canvas.set_fill_color(Color::WHITE);
        canvas.draw_string(box_x + inset, y + Pt::from_f32(77.0), self.total_line.clone());
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_measure(text: &str) -> Pt {
        Pt::from_f32(6.0) * (text.chars().count() as i32)
    }

    #[test]
    fn wrap_empty_string_yields_one_empty_line() {
        let lines = wrap_text("", Pt::from_f32(100.0), &fixed_measure);
        assert_eq!(lines, vec![String::new()]);
    }

    #[test]
    fn wrap_packs_words_greedily() {
        // 16 chars max per line at 6pt each.
        let lines = wrap_text("one two three four", Pt::from_f32(96.0), &fixed_measure);
        assert_eq!(lines, vec!["one two three".to_string(), "four".to_string()]);
    }

    #[test]
    fn wrap_breaks_spaceless_words_by_char() {
        let lines = wrap_text("abcdefghij", Pt::from_f32(24.0), &fixed_measure);
        assert_eq!(
            lines,
            vec!["abcd".to_string(), "efgh".to_string(), "ij".to_string()]
        );
        for line in &lines {
            assert!(fixed_measure(line) <= Pt::from_f32(24.0));
        }
    }

    #[test]
    fn wrap_never_exceeds_max_width() {
        let text = "wrapping a string with no spaces longerthanthecolumnwidth splits it";
        let max = Pt::from_f32(60.0);
        for line in wrap_text(text, max, &fixed_measure) {
            assert!(fixed_measure(&line) <= max, "line too wide: {line:?}");
        }
    }

    #[test]
    fn wrap_splits_on_embedded_newlines() {
        let lines = wrap_text("first\n\nsecond", Pt::from_f32(100.0), &fixed_measure);
        assert_eq!(
            lines,
            vec!["first".to_string(), String::new(), "second".to_string()]
        );
    }

    #[test]
    fn word_fragment_after_char_split_stays_open() {
        // At 6 chars per line "abcdefg" splits into "abcdef" + "g"; the
        // trailing fragment still has room, so "ij" joins it.
        let lines = wrap_text("abcdefg ij", Pt::from_f32(36.0), &fixed_measure);
        assert_eq!(lines, vec!["abcdef".to_string(), "g ij".to_string()]);
    }

    #[test]
    fn paragraph_split_keeps_every_line() {
        let paragraph = Paragraph::new("a\nb\nc\nd\ne");
        let width = Pt::from_f32(100.0);
        // Two 14pt lines fit in 30pt; the remaining three move on.
        let (first, second) = paragraph
            .split(width, Pt::from_f32(30.0))
            .expect("paragraph should split");
        assert_eq!(first.wrap(width, width).height, Pt::from_f32(28.0));
        assert_eq!(second.wrap(width, width).height, Pt::from_f32(42.0));
    }

    #[test]
    fn paragraph_that_fits_does_not_split() {
        let paragraph = Paragraph::new("single line");
        assert!(paragraph
            .split(Pt::from_f32(200.0), Pt::from_f32(100.0))
            .is_none());
    }

    #[test]
    fn image_flowable_reports_its_fixed_size() {
        let image = ImageFlowable::new(50.0, 30.0, "assets/logo.png");
        let size = image.wrap(Pt::from_f32(500.0), Pt::from_f32(500.0));
        assert_eq!(size.width, Pt::from_f32(50.0));
        assert_eq!(size.height, Pt::from_f32(30.0));
        assert!(image.split(Pt::from_f32(10.0), Pt::from_f32(10.0)).is_none());
    }

    fn sample_table(rows: Vec<Vec<String>>) -> ItemTable {
        let data = ItemTableData {
            columns: vec![
                Column::new("Sr.", 35.0).bold(),
                Column::new("Description", 200.0),
                Column::new("Amount", 75.0),
            ],
            rows,
            style: TextStyle::default(),
            bold_font: Arc::<str>::from("Helvetica-Bold"),
            zebra: true,
        };
        ItemTable::new(data)
    }

    fn row(serial: &str, desc: &str, amount: &str) -> Vec<String> {
        vec![serial.to_string(), desc.to_string(), amount.to_string()]
    }

    #[test]
    fn row_height_has_a_floor() {
        let table = sample_table(vec![row("1", "short", "Rs. 1.00")]);
        let height = table.row_height(&row("1", "short", "Rs. 1.00"));
        assert_eq!(height, Pt::from_f32(25.0));
    }

    #[test]
    fn row_height_grows_with_wrapped_lines() {
        let long = "a description that is long enough to wrap across several lines in a two hundred point column";
        let table = sample_table(vec![row("1", long, "Rs. 1.00")]);
        let height = table.row_height(&row("1", long, "Rs. 1.00"));
        assert!(height > Pt::from_f32(25.0));
    }

    #[test]
    fn table_split_is_row_atomic_and_repeats_header() {
        let rows: Vec<Vec<String>> = (0..10)
            .map(|i| row(&(i + 1).to_string(), "line item", "Rs. 1.00"))
            .collect();
        let table = sample_table(rows);
        // Room for the header band plus three full rows and change.
        let avail = Pt::from_f32(HEADER_BAND_HEIGHT + 3.0 * MIN_ROW_HEIGHT + 10.0);
        let (first, second) = table
            .split(Pt::from_f32(310.0), avail)
            .expect("table should split");
        let first_height = first.wrap(Pt::from_f32(310.0), avail).height;
        assert!(first_height <= avail);
        // Continuation re-includes the header band: 7 rows + band.
        let second_height = second.wrap(Pt::from_f32(310.0), Pt::from_f32(10_000.0)).height;
        assert_eq!(
            second_height,
            Pt::from_f32(HEADER_BAND_HEIGHT + 7.0 * MIN_ROW_HEIGHT)
        );
    }

    #[test]
    fn table_split_returns_none_when_nothing_fits() {
        let table = sample_table(vec![row("1", "only row", "Rs. 1.00")]);
        assert!(table.split(Pt::from_f32(310.0), Pt::from_f32(30.0)).is_none());
    }

    #[test]
    fn totals_panel_never_splits() {
        let panel = TotalsPanel::new(vec!["Subtotal: Rs. 1.00".to_string()], "TOTAL: Rs. 1.18");
        assert!(panel.split(Pt::from_f32(515.0), Pt::from_f32(10.0)).is_none());
        assert_eq!(
            panel.pagination().break_inside,
            BreakInside::Avoid
        );
    }
}
