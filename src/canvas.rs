use crate::types::{Color, Pt, Size};

#[derive(Debug, Clone)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    Stroke,
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    // Filled rectangle in the current fill color.
    FillRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    // Stroked rectangle outline in the current stroke color.
    StrokeRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

/// The append-only page list built by one render call. The footer pass reads
/// and extends finished pages; nothing ever removes or reorders them.
#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl GraphicsState {
    fn page_default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
            font_name: "Helvetica".to_string(),
        }
    }
}

/// Coordinates are top-left origin; the PDF serializer flips y. Redundant
/// state changes are elided so content streams stay small.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    current_state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            current_state: GraphicsState::page_default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.current_state.fill_color == color {
            return;
        }
        self.current_state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.current_state.stroke_color == color {
            return;
        }
        self.current_state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = if width < Pt::ZERO { Pt::ZERO } else { width };
        if self.current_state.line_width == width {
            return;
        }
        self.current_state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.current_state.font_name == name {
            return;
        }
        self.current_state.font_name = name.to_string();
        self.current
            .commands
            .push(Command::SetFontName(self.current_state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.current_state.font_size == size {
            return;
        }
        self.current_state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    /// `y` is the top of the text box for the current font size.
    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn fill_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn stroke_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::StrokeRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn draw_image(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: impl Into<String>,
    ) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.current_state = GraphicsState::page_default();
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_state_changes_are_elided() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::rgb(0.5, 0.5, 0.5));
        canvas.set_fill_color(Color::rgb(0.5, 0.5, 0.5));
        canvas.set_font_size(Pt::from_f32(10.0));
        canvas.set_font_size(Pt::from_f32(10.0));
        assert_eq!(canvas.current_command_count(), 2);
    }

    #[test]
    fn state_resets_between_pages() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font_name("Helvetica-Bold");
        canvas.show_page();
        canvas.set_font_name("Helvetica-Bold");
        assert_eq!(canvas.current_command_count(), 1);
    }

    #[test]
    fn finish_always_yields_at_least_one_page() {
        let canvas = Canvas::new(Size::a4());
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 1);
    }
}
