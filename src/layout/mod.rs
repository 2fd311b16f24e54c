mod error;
pub mod packer;
mod placed;
pub mod radial;
pub mod sector;
pub(crate) mod types;

pub use error::{LayoutError, PackError};
pub use packer::{ArchimedeanPacker, PackWord, PackedWord, Packer};
pub use placed::PlacedSet;
pub use radial::RadialProbe;
pub use sector::SectorSpiralProbe;
pub use types::*;

use crate::geometry::{Rect, bearing_between};
use crate::poi::Point;
use crate::text_metrics::TextMeasure;
use std::cmp::Ordering;
use tracing::Instrument;

const PROGRESS_EVERY: usize = 10;

/// A placement search around one label's bearing.
pub trait ProbeStrategy {
    /// Center position for the label such that it clears every rectangle in
    /// `placed`.
    fn find_position(
        &self,
        probe: &LabelProbe<'_>,
        placed: &PlacedSet,
    ) -> Result<(f32, f32), LayoutError>;
}

/// A point after naming and measurement, ready to be placed.
#[derive(Debug, Clone)]
struct MeasuredLabel {
    index: usize,
    text: String,
    font_size: f32,
    width: f32,
    height: f32,
    bearing: f32,
    bearing_fallback: bool,
}

impl MeasuredLabel {
    fn into_placement(self, point: &Point, x: f32, y: f32) -> Placement {
        Placement {
            point: point.clone(),
            text: self.text,
            x,
            y,
            width: self.width,
            height: self.height,
            font_size: self.font_size,
            bearing: self.bearing,
            bearing_fallback: self.bearing_fallback,
        }
    }
}

/// Lay out every point of `request` around the center.
///
/// Bearing-constrained strategies place labels one at a time in input
/// order, each against everything committed before it. The packer strategy
/// submits all labels at once, largest font first, and ignores the reserved
/// rectangle. Either way the result is only available once the whole run
/// has finished.
pub async fn layout<M, N, P>(
    request: &LayoutRequest<'_>,
    measurer: &M,
    display_name: N,
    packer: &P,
) -> Result<Vec<Placement>, LayoutError>
where
    M: TextMeasure + ?Sized,
    N: Fn(&Point) -> String,
    P: Packer,
{
    let span = tracing::debug_span!(
        "layout",
        strategy = request.strategy.as_str(),
        points = request.points.len()
    );
    async {
        let labels = measure_labels(request, measurer, &display_name)?;
        let placements = match request.strategy {
            Strategy::Radial => {
                place_incremental(request, labels, &RadialProbe::new(request.placement))?
            }
            Strategy::SectorSpiral => {
                place_incremental(request, labels, &SectorSpiralProbe::new(request.placement))?
            }
            Strategy::Packer => place_with_packer(request, labels, packer).await?,
        };

        tracing::info!(
            strategy = request.strategy.as_str(),
            placed = placements.len(),
            total = request.points.len(),
            "layout finished"
        );
        Ok::<_, LayoutError>(placements)
    }
    .instrument(span)
    .await
}

/// [`layout`] driven to completion on the current thread.
pub fn layout_blocking<M, N, P>(
    request: &LayoutRequest<'_>,
    measurer: &M,
    display_name: N,
    packer: &P,
) -> Result<Vec<Placement>, LayoutError>
where
    M: TextMeasure + ?Sized,
    N: Fn(&Point) -> String,
    P: Packer,
{
    pollster::block_on(layout(request, measurer, display_name, packer))
}

fn measure_labels<M, N>(
    request: &LayoutRequest<'_>,
    measurer: &M,
    display_name: &N,
) -> Result<Vec<MeasuredLabel>, LayoutError>
where
    M: TextMeasure + ?Sized,
    N: Fn(&Point) -> String,
{
    let font = request.font;
    let mut labels = Vec::with_capacity(request.points.len());
    for (index, point) in request.points.iter().enumerate() {
        let (bearing, bearing_fallback) = match point.position() {
            Some(position) => (bearing_between(request.center, position), false),
            None => {
                tracing::warn!(id = %point.id, name = %point.name, "point has no usable coordinates; using bearing 0");
                (0.0, true)
            }
        };
        let text = display_name(point);
        let font_size = point
            .font_size
            .filter(|size| size.is_finite() && *size > 0.0)
            .unwrap_or_else(|| font.default_font_size());
        let extent = measurer.measure(&text, font_size, &font.font_family, font.font_weight);
        let valid = |v: f32| v.is_finite() && v >= 0.0;
        if !valid(extent.width) || !valid(extent.height) {
            return Err(LayoutError::InvalidExtent {
                label: text,
                width: extent.width,
                height: extent.height,
            });
        }
        labels.push(MeasuredLabel {
            index,
            text,
            font_size,
            width: extent.width,
            height: extent.height,
            bearing,
            bearing_fallback,
        });
    }
    Ok(labels)
}

fn place_incremental<S: ProbeStrategy>(
    request: &LayoutRequest<'_>,
    labels: Vec<MeasuredLabel>,
    strategy: &S,
) -> Result<Vec<Placement>, LayoutError> {
    let mut placed = PlacedSet::with_reserved(request.placement.padding, request.reserved);
    let mut placements = Vec::with_capacity(labels.len());
    let total = labels.len();

    for label in labels {
        let probe = LabelProbe {
            label: &label.text,
            center_x: request.center_x,
            center_y: request.center_y,
            bearing: label.bearing,
            width: label.width,
            height: label.height,
        };
        let (x, y) = strategy.find_position(&probe, &placed)?;
        placed.push(Rect::new(x, y, label.width, label.height));

        let point = &request.points[label.index];
        placements.push(label.into_placement(point, x, y));

        let done = placements.len();
        if done % PROGRESS_EVERY == 0 || done == total {
            tracing::debug!(done, total, "layout progress");
        }
    }
    Ok(placements)
}

async fn place_with_packer<P: Packer>(
    request: &LayoutRequest<'_>,
    labels: Vec<MeasuredLabel>,
    packer: &P,
) -> Result<Vec<Placement>, LayoutError> {
    if request.reserved.is_some() {
        tracing::debug!("packer strategy ignores the reserved rectangle");
    }
    let mut labels = labels;
    // Stable: equal sizes keep their input order.
    labels.sort_by(|a, b| b.font_size.partial_cmp(&a.font_size).unwrap_or(Ordering::Equal));

    let words: Vec<PackWord> = labels
        .iter()
        .map(|label| PackWord {
            index: label.index,
            text: label.text.clone(),
            font_size: label.font_size,
            width: label.width,
            height: label.height,
        })
        .collect();
    let packed = packer.pack(words).await?;

    let mut by_index: Vec<Option<MeasuredLabel>> = vec![None; request.points.len()];
    for label in labels {
        let slot = label.index;
        by_index[slot] = Some(label);
    }

    let mut placements = Vec::with_capacity(packed.len());
    for word in packed {
        let label = by_index
            .get_mut(word.index)
            .and_then(Option::take)
            .ok_or_else(|| {
                PackError::Failed(format!("packer returned unknown or repeated word {}", word.index))
            })?;
        let point = &request.points[label.index];
        placements.push(label.into_placement(
            point,
            request.center_x + word.x,
            request.center_y + word.y,
        ));
    }
    let missing = by_index.iter().filter(|slot| slot.is_some()).count();
    if missing > 0 {
        return Err(PackError::Incomplete {
            unplaced: missing,
            total: request.points.len(),
        }
        .into());
    }
    Ok(placements)
}
