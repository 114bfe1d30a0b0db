use crate::error::LedgerPressError;
use crate::types::Pt;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontProgramKind {
    TrueType,
    OpenTypeCff,
}

pub(crate) struct RegisteredFont {
    pub name: String,
    pub data: Vec<u8>,
    pub metrics: FontMetrics,
    pub program_kind: FontProgramKind,
}

pub(crate) struct FontMetrics {
    pub first_char: u8,
    pub last_char: u8,
    // Advance widths in 1/1000 em for first_char..=last_char.
    pub widths: Vec<u16>,
    pub missing_width: u16,
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
    pub cap_height: i16,
    pub italic_angle: i16,
    pub stem_v: i16,
    pub bbox: (i16, i16, i16, i16),
    pub is_fixed_pitch: bool,
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> (Self, FontProgramKind) {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;

        let mut widths = Vec::with_capacity((last_char - first_char + 1) as usize);
        for code in first_char..=last_char {
            let ch = char::from(code);
            let advance = face
                .glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .unwrap_or(0);
            widths.push(scale_u16(advance, scale));
        }
        let missing_width = widths.first().copied().unwrap_or(0);

        let ascent = scale_i16(face.ascender(), scale);
        let descent = scale_i16(face.descender(), scale);
        let line_gap = scale_i16(face.line_gap(), scale);
        let cap_height = face
            .capital_height()
            .map(|value| scale_i16(value, scale))
            .unwrap_or(ascent);
        let italic_angle = face
            .italic_angle()
            .map(|value| value.round() as i16)
            .unwrap_or(0);
        let bbox = face.global_bounding_box();
        let bbox = (
            scale_i16(bbox.x_min, scale),
            scale_i16(bbox.y_min, scale),
            scale_i16(bbox.x_max, scale),
            scale_i16(bbox.y_max, scale),
        );

        let program_kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };

        (
            Self {
                first_char,
                last_char,
                widths,
                missing_width,
                ascent,
                descent,
                line_gap,
                cap_height,
                italic_angle,
                stem_v: 80,
                bbox,
                is_fixed_pitch: face.is_monospaced(),
            },
            program_kind,
        )
    }

    fn advance_for_char(&self, ch: char) -> u16 {
        let code = ch as u32;
        let first = self.first_char as u32;
        let last = self.last_char as u32;
        if code < first || code > last {
            return self.missing_width;
        }
        let idx = (code - first) as usize;
        self.widths.get(idx).copied().unwrap_or(self.missing_width)
    }

    pub(crate) fn measure_text_width(&self, font_size: Pt, text: &str) -> Pt {
        let mut total_units: i32 = 0;
        for ch in text.chars() {
            total_units = total_units.saturating_add(self.advance_for_char(ch) as i32);
        }
        if total_units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(total_units, 1000)
    }

    fn line_height(&self, font_size: Pt) -> Pt {
        let height_1000 = self.ascent as i32 - self.descent as i32 + self.line_gap as i32;
        if height_1000 <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(height_1000, 1000)
    }
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round();
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn scale_u16(value: u16, scale: f32) -> u16 {
    let scaled = (value as f32 * scale).round();
    scaled.clamp(0.0, u16::MAX as f32) as u16
}

/// Text measurement for line wrapping. Registered faces measure from their
/// advance tables; unregistered names (the base-14 set included) fall back to
/// a 0.6 em-per-char estimate.
#[derive(Default)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn register_file(&mut self, path: &Path) -> Result<String, LedgerPressError> {
        let data = std::fs::read(path)
            .map_err(|err| LedgerPressError::Asset(format!("{}: {}", path.display(), err)))?;
        self.register_bytes(data, Some(path.to_string_lossy().as_ref()))
    }

    pub fn register_dir(&mut self, dir: &Path) -> Result<usize, LedgerPressError> {
        let mut registered = 0usize;
        let entries = std::fs::read_dir(dir)
            .map_err(|err| LedgerPressError::Asset(format!("{}: {}", dir.display(), err)))?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|v| v.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
                .unwrap_or(false);
            if is_font && self.register_file(&path).is_ok() {
                registered += 1;
            }
        }
        Ok(registered)
    }

    pub fn register_bytes(
        &mut self,
        data: Vec<u8>,
        source: Option<&str>,
    ) -> Result<String, LedgerPressError> {
        let source = source.unwrap_or("<bytes>").to_string();
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            return Err(LedgerPressError::Asset(format!(
                "invalid font data for {source}"
            )));
        };

        let name = face_family_name(&face).unwrap_or_else(|| {
            Path::new(&source)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Unnamed".to_string())
        });
        let (metrics, program_kind) = FontMetrics::from_face(&face);
        let index = self.fonts.len();
        self.fonts.push(RegisteredFont {
            name: name.clone(),
            data,
            metrics,
            program_kind,
        });

        let key = normalize_name(&name);
        if !key.is_empty() {
            self.lookup.entry(key).or_insert(index);
        }
        Ok(name)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&RegisteredFont> {
        let key = normalize_name(name);
        self.lookup
            .get(&key)
            .and_then(|index| self.fonts.get(*index))
    }

    pub(crate) fn measure_text_width(&self, name: &str, font_size: Pt, text: &str) -> Pt {
        match self.resolve(name) {
            Some(font) => font.metrics.measure_text_width(font_size, text),
            None => heuristic_text_width(font_size, text),
        }
    }

    pub(crate) fn line_height(&self, name: &str, font_size: Pt, fallback: Pt) -> Pt {
        let Some(font) = self.resolve(name) else {
            return fallback;
        };
        font.metrics.line_height(font_size).max(fallback)
    }
}

pub(crate) fn heuristic_text_width(font_size: Pt, text: &str) -> Pt {
    let char_width = (font_size * 0.6).max(Pt::from_f32(1.0));
    char_width * (text.chars().count() as i32)
}

fn face_family_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut family = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        if name.trim().is_empty() {
            continue;
        }
        match entry.name_id {
            name_id::FULL_NAME => return Some(name),
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => {
                if family.is_none() {
                    family = Some(name);
                }
            }
            _ => {}
        }
    }
    family
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_width_scales_with_char_count() {
        let size = Pt::from_f32(10.0);
        let one = heuristic_text_width(size, "a");
        let five = heuristic_text_width(size, "aaaaa");
        assert_eq!(five.to_milli_i64(), one.to_milli_i64() * 5);
    }

    #[test]
    fn unregistered_names_measure_heuristically() {
        let registry = FontRegistry::new();
        let width = registry.measure_text_width("Helvetica", Pt::from_f32(10.0), "ab");
        assert_eq!(width.to_milli_i64(), 12_000);
    }

    #[test]
    fn line_height_falls_back_for_unknown_fonts() {
        let registry = FontRegistry::new();
        let fallback = Pt::from_f32(14.0);
        let value = registry.line_height("Helvetica", Pt::from_f32(10.0), fallback);
        assert_eq!(value, fallback);
    }

    #[test]
    fn register_bytes_rejects_garbage() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register_bytes(vec![0u8; 16], Some("bogus.ttf"))
            .expect_err("garbage font data must be rejected");
        assert!(matches!(err, LedgerPressError::Asset(_)));
    }
}
