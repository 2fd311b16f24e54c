use crate::config::{CenterLabelMode, FontSettings, Language};
use crate::geometry::{GeoPoint, Rect, distance_m};
use crate::text_metrics::TextMeasure;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

const CENTER_CAPTION_ZH: &str = "中心位置";
const CENTER_CAPTION_EN: &str = "Center";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "name_en", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Integer(i64),
    Number(f64),
    String(String),
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Integer(val) => val.to_string(),
        NumberOrString::Number(val) => format!("{}", val),
        NumberOrString::String(val) => val,
    })
}

impl Point {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lng: f64, lat: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            name_en: None,
            lng: Some(lng),
            lat: Some(lat),
            similarity: None,
            font_size: None,
        }
    }

    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Geographic position, or `None` when a coordinate is missing or not finite.
    pub fn position(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.lng?, self.lat?);
        point.is_valid().then_some(point)
    }

    /// Similarity used by the metrics; absent scores count as 0.
    pub fn similarity_or_zero(&self) -> f32 {
        self.similarity.filter(|s| s.is_finite()).unwrap_or(0.0)
    }
}

pub fn display_name(point: &Point, language: Language) -> String {
    match language {
        Language::En => match point.name_en.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => point.name.clone(),
        },
        Language::Zh => point.name.clone(),
    }
}

/// Bucket a similarity in `[0, 1]` into one of `level_count` levels.
pub fn similarity_level(similarity: f32, level_count: usize) -> usize {
    let levels = level_count.max(1);
    if !similarity.is_finite() || similarity <= 0.0 {
        return 0;
    }
    let level = (similarity * levels as f32).floor() as usize;
    level.min(levels - 1)
}

/// Font size for a similarity: the top level gets `font_sizes[0]`.
pub fn font_size_for_similarity(similarity: f32, font: &FontSettings) -> f32 {
    let levels = font.level_count.max(1);
    let level = similarity_level(similarity, levels);
    let index = (levels - 1 - level).min(font.font_sizes.len().saturating_sub(1));
    font.font_sizes
        .get(index)
        .copied()
        .unwrap_or_else(|| font.default_font_size())
}

/// Order points by descending similarity and fill in missing font sizes.
///
/// The sort is stable, so equally similar points keep their input order.
pub fn prepare_points(points: &mut [Point], font: &FontSettings) {
    points.sort_by(|a, b| {
        b.similarity_or_zero()
            .partial_cmp(&a.similarity_or_zero())
            .unwrap_or(Ordering::Equal)
    });
    for point in points.iter_mut() {
        let valid = point.font_size.is_some_and(|size| size.is_finite() && size > 0.0);
        if !valid {
            point.font_size = Some(font_size_for_similarity(point.similarity_or_zero(), font));
        }
    }
}

/// Points within `radius_km` of `center`. Points without a position are dropped.
pub fn within_radius(points: &[Point], center: GeoPoint, radius_km: f64) -> Vec<Point> {
    let radius_m = radius_km * 1000.0;
    points
        .iter()
        .filter(|point| {
            point
                .position()
                .is_some_and(|pos| distance_m(center, pos) <= radius_m)
        })
        .cloned()
        .collect()
}

/// Index of the point closest to `center`, ignoring points without a position.
pub fn nearest(points: &[Point], center: GeoPoint) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, point) in points.iter().enumerate() {
        let Some(pos) = point.position() else {
            continue;
        };
        let distance = distance_m(center, pos);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}

/// The label drawn on the center itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterLabel {
    pub text: String,
    /// Index of the point the caption came from, when it names a point.
    pub source: Option<usize>,
}

pub fn center_label(points: &[Point], center: GeoPoint, font: &FontSettings) -> CenterLabel {
    let caption = || match font.language {
        Language::Zh => CENTER_CAPTION_ZH.to_string(),
        Language::En => CENTER_CAPTION_EN.to_string(),
    };
    match font.center_label_mode {
        CenterLabelMode::Center => CenterLabel {
            text: caption(),
            source: None,
        },
        CenterLabelMode::Nearest => match nearest(points, center) {
            Some(idx) => CenterLabel {
                text: display_name(&points[idx], font.language),
                source: Some(idx),
            },
            None => CenterLabel {
                text: caption(),
                source: None,
            },
        },
    }
}

/// Reserved rectangle for the center label, measured at the largest font size.
pub fn center_label_rect<M: TextMeasure + ?Sized>(
    text: &str,
    font: &FontSettings,
    measurer: &M,
    center_x: f32,
    center_y: f32,
) -> Rect {
    let extent = measurer.measure(
        text,
        font.largest_font_size(),
        &font.font_family,
        font.font_weight,
    );
    Rect::new(center_x, center_y, extent.width, extent.height)
}
