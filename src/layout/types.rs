use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{Config, FontSettings, PlacementConfig};
use crate::geometry::{GeoPoint, Rect};
use crate::poi::Point;

/// Placement algorithm selected for a layout run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Walk outward along the exact bearing.
    #[serde(rename = "single-angle-radial")]
    Radial,
    /// Sweep a ±15° sector around the bearing, ring by ring.
    #[default]
    #[serde(rename = "multi-angle-radial")]
    SectorSpiral,
    /// Hand the whole batch to a generic word-cloud packer.
    #[serde(rename = "archimedean-spiral")]
    Packer,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Radial, Strategy::SectorSpiral, Strategy::Packer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Radial => "single-angle-radial",
            Strategy::SectorSpiral => "multi-angle-radial",
            Strategy::Packer => "archimedean-spiral",
        }
    }

    /// Whether placements are searched around each label's bearing.
    pub fn is_bearing_constrained(&self) -> bool {
        !matches!(self, Strategy::Packer)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single-angle-radial" | "radial" => Ok(Strategy::Radial),
            "multi-angle-radial" | "sector" | "sector-spiral" | "spiral" => {
                Ok(Strategy::SectorSpiral)
            }
            "archimedean-spiral" | "packer" | "cloud" => Ok(Strategy::Packer),
            other => Err(format!(
                "unknown strategy '{other}' (expected one of: {})",
                Strategy::ALL.map(|s| s.as_str()).join(", ")
            )),
        }
    }
}

/// One label committed by a layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub point: Point,
    pub text: String,
    /// Center of the label in canvas space.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    /// True geographic bearing from the center, clockwise from north.
    pub bearing: f32,
    /// Set when the point had no usable coordinates and was laid out at
    /// bearing 0.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bearing_fallback: bool,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn radial_distance(&self, center_x: f32, center_y: f32) -> f32 {
        (self.x - center_x).hypot(self.y - center_y)
    }
}

/// Inputs of a single layout run.
#[derive(Debug, Clone)]
pub struct LayoutRequest<'a> {
    /// Points in placement order, most relevant first.
    pub points: &'a [Point],
    pub center: GeoPoint,
    pub center_x: f32,
    pub center_y: f32,
    pub font: &'a FontSettings,
    pub placement: &'a PlacementConfig,
    pub strategy: Strategy,
    /// Pre-drawn region (e.g. the center label) that labels must avoid.
    pub reserved: Option<Rect>,
}

impl<'a> LayoutRequest<'a> {
    pub fn new(
        points: &'a [Point],
        center: GeoPoint,
        center_x: f32,
        center_y: f32,
        config: &'a Config,
    ) -> Self {
        Self {
            points,
            center,
            center_x,
            center_y,
            font: &config.font,
            placement: &config.placement,
            strategy: config.strategy,
            reserved: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_reserved(mut self, reserved: Option<Rect>) -> Self {
        self.reserved = reserved;
        self
    }
}

/// What a bearing-constrained strategy needs to know about one label.
#[derive(Debug, Clone, Copy)]
pub struct LabelProbe<'a> {
    pub label: &'a str,
    pub center_x: f32,
    pub center_y: f32,
    pub bearing: f32,
    pub width: f32,
    pub height: f32,
}
