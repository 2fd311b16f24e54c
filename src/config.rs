use crate::layout::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_FONT_SIZES: [f32; 7] = [64.0, 52.0, 44.0, 36.0, 28.0, 24.0, 20.0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterLabelMode {
    /// Label the center with the name of the nearest point.
    #[default]
    Nearest,
    /// Label the center with a fixed caption.
    Center,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSettings {
    pub level_count: usize,
    pub font_sizes: Vec<f32>,
    pub font_family: String,
    pub font_weight: u16,
    /// Label height as a multiple of the font size.
    pub line_height: f32,
    pub language: Language,
    pub center_label_mode: CenterLabelMode,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            level_count: 5,
            font_sizes: DEFAULT_FONT_SIZES.to_vec(),
            font_family: "DengXian, \"Microsoft YaHei\", \"Noto Sans CJK SC\", sans-serif"
                .to_string(),
            font_weight: 700,
            line_height: 1.2,
            language: Language::Zh,
            center_label_mode: CenterLabelMode::Nearest,
        }
    }
}

impl FontSettings {
    /// Size used for points that carry no usable font size.
    pub fn default_font_size(&self) -> f32 {
        self.font_sizes
            .first()
            .copied()
            .filter(|size| size.is_finite() && *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZES[0])
    }

    pub fn largest_font_size(&self) -> f32 {
        self.font_sizes
            .iter()
            .copied()
            .filter(|size| size.is_finite() && *size > 0.0)
            .fold(None, |acc: Option<f32>, size| Some(acc.map_or(size, |a| a.max(size))))
            .unwrap_or(DEFAULT_FONT_SIZES[0])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadialConfig {
    pub start_radius: f32,
    pub radius_step: f32,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            start_radius: 5.0,
            radius_step: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectorConfig {
    /// Half width of the search sector in degrees.
    pub half_angle: f32,
    pub start_radius: f32,
    /// Radius added after each sweep of the sector.
    pub radius_step: f32,
    pub angle_step: f32,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            half_angle: 15.0,
            start_radius: 5.0,
            radius_step: 8.0,
            angle_step: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementConfig {
    /// Minimum gap kept between label rectangles.
    pub padding: f32,
    pub radial: RadialConfig,
    pub sector: SectorConfig,
    /// Probe budget per label. Unreachable on an unbounded canvas with sane
    /// inputs; it only stops runaway searches.
    pub max_attempts: usize,
    /// Bounded-canvas variant: probes beyond this radius fail the label.
    pub max_radius: Option<f32>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            padding: 4.0,
            radial: RadialConfig::default(),
            sector: SectorConfig::default(),
            max_attempts: 100_000,
            max_radius: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackerConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub padding: f32,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            canvas_width: 10_000.0,
            canvas_height: 10_000.0,
            padding: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl CanvasConfig {
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub font: FontSettings,
    pub placement: PlacementConfig,
    pub packer: PackerConfig,
    pub canvas: CanvasConfig,
    pub strategy: Strategy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    font: Option<FontSettings>,
    font_settings: Option<FontSettings>,
    placement: Option<PlacementConfig>,
    packer: Option<PackerConfig>,
    canvas: Option<CanvasConfig>,
    #[serde(alias = "algorithm")]
    strategy: Option<Strategy>,
}

/// Load a JSON5 config file. Every section is optional and fills in from
/// the defaults; without a path the defaults are returned as-is.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(font) = parsed.font.or(parsed.font_settings) {
        config.font = font;
    }
    if let Some(placement) = parsed.placement {
        config.placement = placement;
    }
    if let Some(packer) = parsed.packer {
        config.packer = packer;
    }
    if let Some(canvas) = parsed.canvas {
        config.canvas = canvas;
    }
    if let Some(strategy) = parsed.strategy {
        config.strategy = strategy;
    }

    if config.font.font_sizes.is_empty() {
        anyhow::bail!("font.fontSizes must list at least one size");
    }
    if !(config.placement.padding >= 0.0) {
        anyhow::bail!("placement.padding must be a non-negative number");
    }
    for (name, step) in [
        ("placement.radial.radiusStep", config.placement.radial.radius_step),
        ("placement.sector.radiusStep", config.placement.sector.radius_step),
        ("placement.sector.angleStep", config.placement.sector.angle_step),
    ] {
        if !(step > 0.0) {
            anyhow::bail!("{name} must be positive");
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_settings() {
        let config = Config::default();
        assert_eq!(config.font.font_sizes, DEFAULT_FONT_SIZES.to_vec());
        assert_eq!(config.font.font_weight, 700);
        assert_eq!(config.placement.padding, 4.0);
        assert_eq!(config.placement.sector.half_angle, 15.0);
        assert_eq!(config.strategy, Strategy::SectorSpiral);
        assert_eq!(config.canvas.center(), (600.0, 400.0));
    }

    #[test]
    fn parse_config_merges_partial_sections() {
        let config = parse_config(
            r#"{
                // comments are allowed
                placement: { padding: 2, radial: { radiusStep: 3 } },
                strategy: "single-angle-radial",
                font: { language: "en", fontSizes: [40, 30], },
            }"#,
        )
        .unwrap();
        assert_eq!(config.placement.padding, 2.0);
        assert_eq!(config.placement.radial.radius_step, 3.0);
        assert_eq!(config.placement.radial.start_radius, 5.0);
        assert_eq!(config.placement.sector.radius_step, 8.0);
        assert_eq!(config.strategy, Strategy::Radial);
        assert_eq!(config.font.language, Language::En);
        assert_eq!(config.font.font_weight, 700);
        assert_eq!(config.font.largest_font_size(), 40.0);
    }

    #[test]
    fn parse_config_accepts_algorithm_alias() {
        let config = parse_config(r#"{ "algorithm": "archimedean-spiral" }"#).unwrap();
        assert_eq!(config.strategy, Strategy::Packer);
    }

    #[test]
    fn parse_config_rejects_zero_steps() {
        assert!(parse_config(r#"{ placement: { sector: { angleStep: 0 } } }"#).is_err());
        assert!(parse_config(r#"{ font: { fontSizes: [] } }"#).is_err());
    }

    #[test]
    fn load_config_without_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.packer.canvas_width, 10_000.0);
    }

    #[test]
    fn font_size_fallbacks_skip_invalid_entries() {
        let font = FontSettings {
            font_sizes: vec![f32::NAN, 12.0, 30.0],
            ..Default::default()
        };
        assert_eq!(font.default_font_size(), 64.0);
        assert_eq!(font.largest_font_size(), 30.0);
    }
}
