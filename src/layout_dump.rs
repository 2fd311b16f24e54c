use crate::evaluation::StrategyReport;
use crate::geometry::{GeoPoint, Rect};
use crate::layout::{Placement, Strategy};
use crate::metrics::Metrics;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Everything one layout run produced, in the shape written to disk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDump {
    pub strategy: Strategy,
    pub center: GeoPoint,
    pub center_x: f32,
    pub center_y: f32,
    pub center_label: Option<CenterLabelDump>,
    pub placements: Vec<PlacementDump>,
    pub metrics: Metrics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterLabelDump {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDump {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub bearing: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bearing_fallback: bool,
}

/// Metrics of every strategy over the same input.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDump {
    pub center: GeoPoint,
    pub label_count: usize,
    pub reports: Vec<StrategyReport>,
}

impl CloudDump {
    pub fn new(
        strategy: Strategy,
        center: GeoPoint,
        center_x: f32,
        center_y: f32,
        placements: &[Placement],
        metrics: Metrics,
    ) -> Self {
        let placements = placements
            .iter()
            .map(|placement| PlacementDump {
                id: placement.point.id.clone(),
                text: placement.text.clone(),
                x: placement.x,
                y: placement.y,
                width: placement.width,
                height: placement.height,
                font_size: placement.font_size,
                bearing: placement.bearing,
                similarity: placement.point.similarity,
                bearing_fallback: placement.bearing_fallback,
            })
            .collect();

        CloudDump {
            strategy,
            center,
            center_x,
            center_y,
            center_label: None,
            placements,
            metrics,
        }
    }

    pub fn with_center_label(mut self, text: &str, rect: Rect) -> Self {
        self.center_label = Some(CenterLabelDump {
            text: text.to_string(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
        self
    }
}

/// Pretty-print `value` as JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
