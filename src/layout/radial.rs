// Single-angle radial probe: labels move straight out along their bearing.

use crate::config::PlacementConfig;
use crate::geometry::{Rect, point_on_bearing};

use super::{LabelProbe, LayoutError, PlacedSet, ProbeStrategy};

#[derive(Debug, Clone)]
pub struct RadialProbe {
    pub start_radius: f32,
    pub radius_step: f32,
    pub max_attempts: usize,
    pub max_radius: Option<f32>,
}

impl RadialProbe {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            start_radius: config.radial.start_radius.max(f32::EPSILON),
            radius_step: config.radial.radius_step,
            max_attempts: config.max_attempts,
            max_radius: config.max_radius,
        }
    }
}

impl ProbeStrategy for RadialProbe {
    fn find_position(
        &self,
        probe: &LabelProbe<'_>,
        placed: &PlacedSet,
    ) -> Result<(f32, f32), LayoutError> {
        let mut radius = self.start_radius;
        for attempt in 0..self.max_attempts {
            if let Some(max_radius) = self.max_radius
                && radius > max_radius
            {
                return Err(capacity_exceeded(probe, attempt, radius));
            }
            let (x, y) = point_on_bearing(probe.center_x, probe.center_y, probe.bearing, radius);
            let candidate = Rect::new(x, y, probe.width, probe.height);
            if !placed.collides(&candidate) {
                return Ok((x, y));
            }
            radius += self.radius_step;
        }
        Err(capacity_exceeded(probe, self.max_attempts, radius))
    }
}

pub(super) fn capacity_exceeded(probe: &LabelProbe<'_>, attempts: usize, radius: f32) -> LayoutError {
    tracing::warn!(label = probe.label, attempts, radius, "placement search exhausted");
    LayoutError::CapacityExceeded {
        label: probe.label.to_string(),
        attempts,
        radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(bearing: f32) -> LabelProbe<'static> {
        LabelProbe {
            label: "label",
            center_x: 400.0,
            center_y: 300.0,
            bearing,
            width: 40.0,
            height: 20.0,
        }
    }

    #[test]
    fn first_label_due_north_sits_at_start_radius() {
        let strategy = RadialProbe::new(&PlacementConfig::default());
        let placed = PlacedSet::new(4.0);
        let (x, y) = strategy.find_position(&probe(0.0), &placed).unwrap();
        assert!((x - 400.0).abs() < 1e-4);
        assert!((y - 295.0).abs() < 1e-4);
    }

    #[test]
    fn same_bearing_stacks_outward() {
        let strategy = RadialProbe::new(&PlacementConfig::default());
        let mut placed = PlacedSet::new(4.0);
        let mut last_radius = 0.0;
        for _ in 0..4 {
            let (x, y) = strategy.find_position(&probe(90.0), &placed).unwrap();
            assert!((y - 300.0).abs() < 1e-3, "left the ray: y = {y}");
            let radius = x - 400.0;
            assert!(radius > last_radius, "{radius} <= {last_radius}");
            last_radius = radius;
            placed.push(Rect::new(x, y, 40.0, 20.0));
        }
        assert_eq!(placed.len(), 4);
    }

    #[test]
    fn clears_reserved_center() {
        let strategy = RadialProbe::new(&PlacementConfig::default());
        let reserved = Rect::new(400.0, 300.0, 120.0, 40.0);
        let placed = PlacedSet::with_reserved(4.0, Some(reserved));
        let (x, y) = strategy.find_position(&probe(180.0), &placed).unwrap();
        assert_eq!(x.round(), 400.0);
        // Bottom of the reserved box is 320; the label top must clear it by the padding.
        assert!(y - 10.0 > 324.0, "y = {y}");
    }

    #[test]
    fn bounded_canvas_reports_capacity() {
        let config = PlacementConfig {
            max_radius: Some(20.0),
            ..Default::default()
        };
        let strategy = RadialProbe::new(&config);
        let placed = PlacedSet::with_reserved(4.0, Some(Rect::new(400.0, 300.0, 400.0, 400.0)));
        let err = strategy.find_position(&probe(45.0), &placed).unwrap_err();
        assert!(matches!(err, LayoutError::CapacityExceeded { .. }));
    }

    #[test]
    fn attempt_budget_reports_capacity() {
        let config = PlacementConfig {
            max_attempts: 3,
            ..Default::default()
        };
        let strategy = RadialProbe::new(&config);
        let placed = PlacedSet::with_reserved(4.0, Some(Rect::new(400.0, 300.0, 400.0, 400.0)));
        match strategy.find_position(&probe(45.0), &placed) {
            Err(LayoutError::CapacityExceeded { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected capacity error, got {other:?}"),
        }
    }
}
