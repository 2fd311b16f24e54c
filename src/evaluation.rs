use std::time::Instant;

use serde::Serialize;

use crate::layout::{LayoutError, LayoutRequest, Packer, Placement, Strategy, layout};
use crate::metrics::{Metrics, compute_metrics};
use crate::poi::Point;
use crate::text_metrics::TextMeasure;

#[derive(Debug, Clone, PartialEq)]
pub struct TimedLayout {
    pub placements: Vec<Placement>,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub metrics: Metrics,
}

/// Run [`layout`] once and score the result with the wall time it took.
pub async fn timed_layout<M, N, P>(
    request: &LayoutRequest<'_>,
    measurer: &M,
    display_name: N,
    packer: &P,
) -> Result<TimedLayout, LayoutError>
where
    M: TextMeasure + ?Sized,
    N: Fn(&Point) -> String,
    P: Packer,
{
    let start = Instant::now();
    let placements = layout(request, measurer, display_name, packer).await?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let metrics = compute_metrics(
        &placements,
        request.center,
        request.center_x,
        request.center_y,
        elapsed_ms,
    );
    Ok(TimedLayout {
        placements,
        metrics,
    })
}

/// Lay out the same input with every strategy, in [`Strategy::ALL`] order.
///
/// The first failing strategy aborts the comparison.
pub async fn compare_strategies<M, N, P>(
    request: &LayoutRequest<'_>,
    measurer: &M,
    display_name: N,
    packer: &P,
) -> Result<Vec<StrategyReport>, LayoutError>
where
    M: TextMeasure + ?Sized,
    N: Fn(&Point) -> String,
    P: Packer,
{
    let mut reports = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let run = request.clone().with_strategy(strategy);
        let timed = timed_layout(&run, measurer, &display_name, packer).await?;
        tracing::info!(
            strategy = strategy.as_str(),
            compactness = timed.metrics.compactness_index,
            mae = timed.metrics.orientation_retention.mae,
            uniformity = timed.metrics.layout_uniformity,
            "strategy scored"
        );
        reports.push(StrategyReport {
            strategy,
            metrics: timed.metrics,
        });
    }
    Ok(reports)
}
