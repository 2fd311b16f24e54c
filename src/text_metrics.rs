use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

const DEFAULT_LINE_HEIGHT: f32 = 1.2;

/// Width and height of a single-line label in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Text measurement capability consumed by the layout.
///
/// Implementations must be deterministic for a given text and font.
pub trait TextMeasure {
    fn measure(
        &self,
        text: &str,
        font_size: f32,
        font_family: &str,
        font_weight: u16,
    ) -> TextExtent;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(
        &self,
        text: &str,
        font_size: f32,
        font_family: &str,
        font_weight: u16,
    ) -> TextExtent {
        (**self).measure(text, font_size, font_family, font_weight)
    }
}

/// Font-free measurer using calibrated per-character widths.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasure for HeuristicMeasurer {
    fn measure(
        &self,
        text: &str,
        font_size: f32,
        _font_family: &str,
        font_weight: u16,
    ) -> TextExtent {
        if text.is_empty() || font_size <= 0.0 {
            return TextExtent {
                width: 0.0,
                height: font_size.max(0.0) * DEFAULT_LINE_HEIGHT,
            };
        }
        TextExtent {
            width: fallback_text_width(text, font_size) * weight_factor(font_weight),
            height: font_size * DEFAULT_LINE_HEIGHT,
        }
    }
}

/// Bold faces run a few percent wider than regular ones.
fn weight_factor(font_weight: u16) -> f32 {
    if font_weight >= 600 { 1.05 } else { 1.0 }
}

pub(crate) fn char_width_factor(ch: char) -> f32 {
    if is_wide(ch) {
        return 1.0;
    }
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '\'' => 0.321,
        'I' | 'i' | 'j' | 'l' => 0.25,
        'f' | 't' | 'r' => 0.34,
        'M' | 'W' | 'm' | 'w' => 0.86,
        '@' | '#' | '%' | '&' => 0.946,
        'A'..='Z' => 0.66,
        '0'..='9' => 0.58,
        _ => 0.568,
    }
}

/// CJK ideographs, kana, hangul and fullwidth forms take a full em.
fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD)
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_width_factor)
        .sum::<f32>()
        * font_size
}

/// Measures with real font advances resolved through the system font
/// database.
///
/// The database is loaded on first use and faces are cached per
/// family/weight for the lifetime of the measurer. Text whose family does not
/// resolve is measured with [`HeuristicMeasurer`].
pub struct FontMeasurer {
    db: OnceCell<Database>,
    faces: Mutex<HashMap<(String, u16), Option<FontFace>>>,
    line_height: f32,
}

impl Default for FontMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl FontMeasurer {
    pub fn new() -> Self {
        Self {
            db: OnceCell::new(),
            faces: Mutex::new(HashMap::new()),
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        if line_height.is_finite() && line_height > 0.0 {
            self.line_height = line_height;
        }
        self
    }

    fn database(&self) -> &Database {
        self.db.get_or_init(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system font database");
            db
        })
    }

    fn measure_width(
        &self,
        text: &str,
        font_size: f32,
        font_family: &str,
        font_weight: u16,
    ) -> Option<f32> {
        let key = (normalize_family_key(font_family), font_weight);
        let mut faces = self.faces.lock().ok()?;
        if !faces.contains_key(&key) {
            let face = load_face(self.database(), font_family, font_weight);
            if face.is_none() {
                tracing::debug!(family = %key.0, weight = font_weight, "no font face resolved");
            }
            faces.insert(key.clone(), face);
        }
        let face = faces.get_mut(&key).and_then(|face| face.as_mut())?;
        face.measure_width(text, font_size)
    }
}

impl TextMeasure for FontMeasurer {
    fn measure(
        &self,
        text: &str,
        font_size: f32,
        font_family: &str,
        font_weight: u16,
    ) -> TextExtent {
        let height = font_size.max(0.0) * self.line_height;
        if text.is_empty() || font_size <= 0.0 {
            return TextExtent { width: 0.0, height };
        }
        let width = self
            .measure_width(text, font_size, font_family, font_weight)
            .unwrap_or_else(|| {
                HeuristicMeasurer
                    .measure(text, font_size, font_family, font_weight)
                    .width
            });
        TextExtent { width, height }
    }
}

fn load_face(db: &Database, font_family: &str, font_weight: u16) -> Option<FontFace> {
    #[derive(Clone, Copy)]
    enum FamilyToken {
        Generic(Family<'static>),
        Name(usize),
    }

    let mut names: Vec<String> = Vec::new();
    let mut order: Vec<FamilyToken> = Vec::new();
    for part in font_family.split(',') {
        let raw = part.trim().trim_matches('"').trim_matches('\'');
        if raw.is_empty() {
            continue;
        }
        match raw.to_ascii_lowercase().as_str() {
            "serif" => order.push(FamilyToken::Generic(Family::Serif)),
            "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                order.push(FamilyToken::Generic(Family::SansSerif))
            }
            "monospace" | "ui-monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
            "cursive" => order.push(FamilyToken::Generic(Family::Cursive)),
            "fantasy" => order.push(FamilyToken::Generic(Family::Fantasy)),
            _ => {
                let idx = names.len();
                names.push(raw.to_string());
                order.push(FamilyToken::Name(idx));
            }
        }
    }
    if order.is_empty() {
        order.push(FamilyToken::Generic(Family::SansSerif));
    }

    let families: Vec<Family<'_>> = order
        .into_iter()
        .map(|token| match token {
            FamilyToken::Generic(family) => family,
            FamilyToken::Name(idx) => Family::Name(names[idx].as_str()),
        })
        .collect();

    let query = Query {
        families: &families,
        weight: Weight(font_weight),
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
        .flatten()
}

/// Glyph advances extracted once from a parsed face.
struct FontFace {
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advances: HashMap<char, Option<u16>>,
    data: Vec<u8>,
    index: u32,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph_id) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph_id).unwrap_or(0);
            }
        }
        Some(Self {
            units_per_em,
            ascii_advances,
            advances: HashMap::new(),
            data,
            index,
        })
    }

    fn advance(&mut self, ch: char) -> Option<u16> {
        if ch.is_ascii() {
            let advance = self.ascii_advances[ch as usize];
            return (advance != 0).then_some(advance);
        }
        if let Some(cached) = self.advances.get(&ch) {
            return *cached;
        }
        let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
            let glyph = face.glyph_index(ch)?;
            face.glyph_hor_advance(glyph)
        });
        self.advances.insert(ch, advance);
        advance
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            match self.advance(ch) {
                Some(advance) => width += advance as f32 * scale,
                None => width += char_width_factor(ch) * font_size,
            }
        }
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_width_factor_returns_positive_values() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}', 'é'] {
            assert!(char_width_factor(ch) > 0.0, "char {:?} has zero width", ch);
        }
    }

    #[test]
    fn cjk_characters_take_a_full_em() {
        let extent = HeuristicMeasurer.measure("天安门", 20.0, "sans-serif", 400);
        assert!((extent.width - 60.0).abs() < 1e-3, "got {}", extent.width);
        assert!((extent.height - 24.0).abs() < 1e-3);
    }

    #[test]
    fn heuristic_width_scales_with_font_size() {
        let w16 = HeuristicMeasurer.measure("Hello", 16.0, "sans-serif", 400).width;
        let w32 = HeuristicMeasurer.measure("Hello", 32.0, "sans-serif", 400).width;
        assert!((w32 - w16 * 2.0).abs() < 0.01, "width should double with font size");
    }

    #[test]
    fn bold_measures_wider() {
        let regular = HeuristicMeasurer.measure("Museum", 20.0, "sans-serif", 400).width;
        let bold = HeuristicMeasurer.measure("Museum", 20.0, "sans-serif", 700).width;
        assert!(bold > regular);
    }

    #[test]
    fn empty_text_has_no_width() {
        let extent = HeuristicMeasurer.measure("", 20.0, "sans-serif", 400);
        assert_eq!(extent.width, 0.0);
        let extent = FontMeasurer::new().measure("", 20.0, "sans-serif", 400);
        assert_eq!(extent.width, 0.0);
    }

    #[test]
    fn font_measurer_always_produces_an_extent() {
        // Falls back to the heuristic on machines without matching fonts.
        let measurer = FontMeasurer::new().with_line_height(1.5);
        let extent = measurer.measure("Summer Palace", 24.0, "NoSuchFamily, sans-serif", 700);
        assert!(extent.width > 0.0);
        assert!((extent.height - 36.0).abs() < 1e-3);
        let again = measurer.measure("Summer Palace", 24.0, "NoSuchFamily, sans-serif", 700);
        assert_eq!(extent, again);
    }

    #[test]
    fn family_key_defaults_to_sans_serif() {
        assert_eq!(normalize_family_key("   "), "sans-serif");
        assert_eq!(normalize_family_key(" Arial "), "Arial");
    }
}
