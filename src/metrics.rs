// Degenerate inputs (no placements, zero variance) score 0 rather than failing.

use serde::Serialize;

use crate::geometry::{GeoPoint, angle_difference, bearing_between, canvas_bearing};
use crate::layout::Placement;

/// Number of equal sectors the circle is split into for the uniformity score.
pub const SECTOR_COUNT: usize = 36;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OrientationRetention {
    /// Mean absolute angular error in degrees.
    pub mae: f64,
    /// Largest absolute angular error in degrees.
    #[serde(rename = "maxE")]
    pub max_e: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub label_count: usize,
    /// Total label area over the area of their common bounding box.
    pub compactness_index: f64,
    pub orientation_retention: OrientationRetention,
    pub radial_distance_similarity_correlation: f64,
    /// Coefficient of variation of per-sector label counts.
    pub layout_uniformity: f64,
    /// Wall time of the layout call in milliseconds, as measured by the caller.
    pub execution_time: f64,
}

pub fn compute_metrics(
    placements: &[Placement],
    center: GeoPoint,
    center_x: f32,
    center_y: f32,
    elapsed_ms: f64,
) -> Metrics {
    if placements.is_empty() {
        return Metrics {
            execution_time: elapsed_ms,
            ..Metrics::default()
        };
    }

    Metrics {
        label_count: placements.len(),
        compactness_index: compactness_index(placements),
        orientation_retention: orientation_retention(placements, center, center_x, center_y),
        radial_distance_similarity_correlation: radial_similarity_correlation(
            placements, center_x, center_y,
        ),
        layout_uniformity: layout_uniformity(placements, center_x, center_y),
        execution_time: elapsed_ms,
    }
}

fn compactness_index(placements: &[Placement]) -> f64 {
    let mut total_area = 0.0f64;
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for placement in placements {
        let rect = placement.rect();
        total_area += f64::from(rect.width) * f64::from(rect.height);
        min_x = min_x.min(f64::from(rect.left()));
        min_y = min_y.min(f64::from(rect.top()));
        max_x = max_x.max(f64::from(rect.right()));
        max_y = max_y.max(f64::from(rect.bottom()));
    }
    let bounding_area = (max_x - min_x) * (max_y - min_y);
    if bounding_area > 0.0 {
        total_area / bounding_area
    } else {
        0.0
    }
}

fn orientation_retention(
    placements: &[Placement],
    center: GeoPoint,
    center_x: f32,
    center_y: f32,
) -> OrientationRetention {
    let errors: Vec<f64> = placements
        .iter()
        .filter_map(|placement| {
            let position = placement.point.position()?;
            let geographic = bearing_between(center, position);
            let realized = canvas_bearing(center_x, center_y, placement.x, placement.y);
            Some(f64::from(angle_difference(geographic, realized)))
        })
        .collect();
    if errors.is_empty() {
        return OrientationRetention::default();
    }
    OrientationRetention {
        mae: errors.iter().sum::<f64>() / errors.len() as f64,
        max_e: errors.iter().copied().fold(0.0, f64::max),
    }
}

fn radial_similarity_correlation(placements: &[Placement], center_x: f32, center_y: f32) -> f64 {
    let (distances, similarities): (Vec<f64>, Vec<f64>) = placements
        .iter()
        .filter(|placement| placement.point.position().is_some())
        .map(|placement| {
            (
                f64::from(placement.radial_distance(center_x, center_y)),
                f64::from(placement.point.similarity_or_zero()),
            )
        })
        .unzip();
    pearson(&distances, &similarities)
}

fn layout_uniformity(placements: &[Placement], center_x: f32, center_y: f32) -> f64 {
    let counts = sector_counts(placements, center_x, center_y);
    let counts: Vec<f64> = counts.iter().map(|&count| count as f64).collect();
    coefficient_of_variation(&counts)
}

/// Labels per 10° sector of canvas bearing, starting at north.
pub fn sector_counts(placements: &[Placement], center_x: f32, center_y: f32) -> [usize; SECTOR_COUNT] {
    let mut counts = [0usize; SECTOR_COUNT];
    for placement in placements {
        let bearing = canvas_bearing(center_x, center_y, placement.x, placement.y);
        let sector = (bearing / 360.0 * SECTOR_COUNT as f32).floor() as usize;
        counts[sector.min(SECTOR_COUNT - 1)] += 1;
    }
    counts
}

/// Pearson correlation coefficient; 0 for empty, mismatched or constant series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.is_empty() {
        return 0.0;
    }
    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = xs.iter().map(|x| x * x).sum();
    let sum_y2: f64 = ys.iter().map(|y| y * y).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let spread = (n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y);
    if spread <= 0.0 {
        return 0.0;
    }
    numerator / spread.sqrt()
}

/// Population standard deviation over the mean; 0 when the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_on_bearing;
    use crate::poi::Point;

    fn center() -> GeoPoint {
        GeoPoint::new(116.40, 39.90)
    }

    fn placement(point: Point, x: f32, y: f32, width: f32, height: f32) -> Placement {
        let bearing = point
            .position()
            .map_or(0.0, |position| bearing_between(center(), position));
        Placement {
            text: point.name.clone(),
            point,
            x,
            y,
            width,
            height,
            font_size: height,
            bearing,
            bearing_fallback: false,
        }
    }

    /// A label placed exactly on its geographic bearing at `radius`.
    fn on_bearing(id: usize, lng: f64, lat: f64, radius: f32, similarity: f32) -> Placement {
        let point = Point::new(id.to_string(), format!("P{id}"), lng, lat).with_similarity(similarity);
        let bearing = bearing_between(center(), GeoPoint::new(lng, lat));
        let (x, y) = point_on_bearing(0.0, 0.0, bearing, radius);
        placement(point, x, y, 20.0, 10.0)
    }

    #[test]
    fn empty_layout_only_reports_time() {
        let metrics = compute_metrics(&[], center(), 0.0, 0.0, 123.0);
        assert_eq!(
            metrics,
            Metrics {
                execution_time: 123.0,
                ..Metrics::default()
            }
        );
    }

    #[test]
    fn single_label_is_perfectly_compact() {
        let only = on_bearing(1, 116.5, 39.9, 50.0, 1.0);
        let metrics = compute_metrics(&[only], center(), 0.0, 0.0, 1.0);
        assert_eq!(metrics.label_count, 1);
        assert!((metrics.compactness_index - 1.0).abs() < 1e-9);
    }

    #[test]
    fn compactness_counts_gaps_in_the_bounding_box() {
        let a = placement(Point::new("a", "a", 116.5, 39.9), 5.0, 5.0, 10.0, 10.0);
        let b = placement(Point::new("b", "b", 116.5, 39.9), 35.0, 5.0, 10.0, 10.0);
        let metrics = compute_metrics(&[a, b], center(), 0.0, 0.0, 0.0);
        // 200 px² of labels in a 40 x 10 box.
        assert!((metrics.compactness_index - 0.5).abs() < 1e-9);
    }

    #[test]
    fn exact_bearings_have_no_orientation_error() {
        let placements: Vec<Placement> = (0..8)
            .map(|i| {
                let angle = (i as f64 * 45.0 + 10.0).to_radians();
                on_bearing(i, 116.40 + 0.1 * angle.sin(), 39.90 + 0.1 * angle.cos(), 100.0, 0.5)
            })
            .collect();
        let metrics = compute_metrics(&placements, center(), 0.0, 0.0, 0.0);
        assert!(metrics.orientation_retention.mae < 1e-3);
        assert!(metrics.orientation_retention.max_e < 1e-3);
    }

    #[test]
    fn orientation_error_is_measured_against_canvas_bearing() {
        let point = Point::new("n", "north", 116.40, 40.0);
        // Due north geographically, drawn due east.
        let east = placement(point, 100.0, 0.0, 20.0, 10.0);
        let metrics = compute_metrics(&[east], center(), 0.0, 0.0, 0.0);
        assert!((metrics.orientation_retention.mae - 90.0).abs() < 1e-3);
        assert!((metrics.orientation_retention.max_e - 90.0).abs() < 1e-3);
    }

    #[test]
    fn closer_labels_with_higher_similarity_correlate_negatively() {
        let placements: Vec<Placement> = (0..5)
            .map(|i| on_bearing(i, 116.5, 39.9 + i as f64 * 0.01, 50.0 + 25.0 * i as f32, 1.0 - 0.2 * i as f32))
            .collect();
        let metrics = compute_metrics(&placements, center(), 0.0, 0.0, 0.0);
        assert!((metrics.radial_distance_similarity_correlation + 1.0).abs() < 1e-6);
    }

    #[test]
    fn points_without_coordinates_are_left_out_of_bearing_metrics() {
        let mut stray = Point::new("x", "stray", 0.0, 0.0).with_similarity(0.9);
        stray.lng = None;
        let mut fallback = placement(stray, 200.0, 0.0, 20.0, 10.0);
        fallback.bearing_fallback = true;
        let good = on_bearing(1, 116.5, 39.9, 40.0, 0.5);
        let metrics = compute_metrics(&[good, fallback], center(), 0.0, 0.0, 0.0);
        assert_eq!(metrics.label_count, 2);
        assert!(metrics.orientation_retention.max_e < 1e-3);
        // A single remaining pair has no variance.
        assert_eq!(metrics.radial_distance_similarity_correlation, 0.0);
    }

    #[test]
    fn one_label_per_sector_is_perfectly_uniform() {
        let placements: Vec<Placement> = (0..SECTOR_COUNT)
            .map(|i| {
                let (x, y) = point_on_bearing(0.0, 0.0, i as f32 * 10.0 + 5.0, 100.0);
                placement(Point::new(i.to_string(), "p", 116.5, 39.9), x, y, 5.0, 5.0)
            })
            .collect();
        assert_eq!(sector_counts(&placements, 0.0, 0.0), [1; SECTOR_COUNT]);
        let metrics = compute_metrics(&placements, center(), 0.0, 0.0, 0.0);
        assert!(metrics.layout_uniformity.abs() < 1e-12);
    }

    #[test]
    fn uniformity_grows_as_labels_concentrate() {
        let total = 36;
        let mut previous = -1.0;
        for sectors in [36usize, 18, 9, 4, 1] {
            let placements: Vec<Placement> = (0..total)
                .map(|i| {
                    let bearing = (i % sectors) as f32 * 10.0 + 5.0;
                    let (x, y) = point_on_bearing(0.0, 0.0, bearing, 100.0);
                    placement(Point::new(i.to_string(), "p", 116.5, 39.9), x, y, 5.0, 5.0)
                })
                .collect();
            let cv = compute_metrics(&placements, center(), 0.0, 0.0, 0.0).layout_uniformity;
            assert!(cv > previous, "{sectors} sectors: {cv} <= {previous}");
            previous = cv;
        }
    }

    #[test]
    fn bearing_just_below_north_lands_in_last_sector() {
        let (x, y) = point_on_bearing(0.0, 0.0, 359.99, 100.0);
        let p = placement(Point::new("1", "p", 116.5, 39.9), x, y, 5.0, 5.0);
        assert_eq!(sector_counts(&[p], 0.0, 0.0)[SECTOR_COUNT - 1], 1);
    }

    #[test]
    fn degenerate_statistics_are_zero() {
        assert_eq!(pearson(&[], &[]), 0.0);
        assert_eq!(pearson(&[1.0, 2.0], &[3.0]), 0.0);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[0.0; 4]), 0.0);
        assert_eq!(coefficient_of_variation(&[2.0; 4]), 0.0);
    }

    #[test]
    fn metric_keys_are_camel_case() {
        let json = serde_json::to_value(compute_metrics(&[], center(), 0.0, 0.0, 7.0)).unwrap();
        assert_eq!(json["executionTime"], 7.0);
        assert!(json["orientationRetention"].get("maxE").is_some());
        assert!(json.get("radialDistanceSimilarityCorrelation").is_some());
        assert!(json.get("layoutUniformity").is_some());
    }
}
