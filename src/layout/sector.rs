// Bounded-sector spiral probe: sweep a narrow sector around the bearing,
// one ring at a time, trading a little bearing fidelity for density.

use crate::config::PlacementConfig;
use crate::geometry::{Rect, point_on_bearing};

use super::radial::capacity_exceeded;
use super::{LabelProbe, LayoutError, PlacedSet, ProbeStrategy};

const ANGLE_EPS: f32 = 1e-3;

#[derive(Debug, Clone)]
pub struct SectorSpiralProbe {
    pub half_angle: f32,
    pub start_radius: f32,
    pub radius_step: f32,
    pub angle_step: f32,
    pub max_attempts: usize,
    pub max_radius: Option<f32>,
}

impl SectorSpiralProbe {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            half_angle: config.sector.half_angle.clamp(0.0, 180.0),
            start_radius: config.sector.start_radius.max(f32::EPSILON),
            radius_step: config.sector.radius_step,
            angle_step: config.sector.angle_step,
            max_attempts: config.max_attempts,
            max_radius: config.max_radius,
        }
    }
}

impl ProbeStrategy for SectorSpiralProbe {
    fn find_position(
        &self,
        probe: &LabelProbe<'_>,
        placed: &PlacedSet,
    ) -> Result<(f32, f32), LayoutError> {
        let min_angle = probe.bearing - self.half_angle;
        let max_angle = probe.bearing + self.half_angle;
        let mut radius = self.start_radius;
        let mut angle = min_angle;

        for attempt in 0..self.max_attempts {
            if let Some(max_radius) = self.max_radius
                && radius > max_radius
            {
                return Err(capacity_exceeded(probe, attempt, radius));
            }
            let (x, y) = point_on_bearing(probe.center_x, probe.center_y, angle, radius);
            let candidate = Rect::new(x, y, probe.width, probe.height);
            if !placed.collides(&candidate) {
                return Ok((x, y));
            }
            angle += self.angle_step;
            if angle > max_angle + ANGLE_EPS {
                angle = min_angle;
                radius += self.radius_step;
            }
        }
        Err(capacity_exceeded(probe, self.max_attempts, radius))
    }
}
