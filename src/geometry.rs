// Geographic math runs in f64; canvas space is f32 like the rest of the layout.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Axis-aligned rectangle in canvas space, stored by its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from a top-left corner, the convention canvas APIs use.
    pub fn from_top_left(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left + width / 2.0, top + height / 2.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub(crate) fn inflate(&self, pad: f32) -> Rect {
        if pad <= 0.0 {
            return *self;
        }
        Rect::new(self.x, self.y, self.width + pad * 2.0, self.height + pad * 2.0)
    }
}

/// Wrap any angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn to_canvas_degrees(degrees: f64) -> f32 {
    let value = normalize_degrees(degrees) as f32;
    if value >= 360.0 { 0.0 } else { value }
}

/// Initial great-circle bearing from `center` to `point`, clockwise from
/// north, in `[0, 360)`.
///
/// Coincident points have no defined bearing; they return 0.
pub fn bearing(center_lat: f64, center_lng: f64, point_lat: f64, point_lng: f64) -> f32 {
    let lat1 = center_lat.to_radians();
    let lat2 = point_lat.to_radians();
    let d_lng = (point_lng - center_lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    if y == 0.0 && x == 0.0 {
        return 0.0;
    }
    let theta = y.atan2(x);
    if !theta.is_finite() {
        return 0.0;
    }
    to_canvas_degrees(theta.to_degrees())
}

/// Same as [`bearing`], taking both ends as [`GeoPoint`]s.
pub fn bearing_between(center: GeoPoint, point: GeoPoint) -> f32 {
    bearing(center.lat, center.lng, point.lat, point.lng)
}

/// Bearing from `(center_x, center_y)` to `(x, y)` in canvas space, where y
/// grows downward and north is up.
pub fn canvas_bearing(center_x: f32, center_y: f32, x: f32, y: f32) -> f32 {
    let dx = (x - center_x) as f64;
    let dy = (y - center_y) as f64;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    to_canvas_degrees(dx.atan2(-dy).to_degrees())
}

/// Canvas position at `radius` from the center along `bearing_deg`.
pub fn point_on_bearing(center_x: f32, center_y: f32, bearing_deg: f32, radius: f32) -> (f32, f32) {
    let rad = bearing_deg.to_radians();
    (center_x + radius * rad.sin(), center_y - radius * rad.cos())
}

/// True unless the rectangles are at least `padding` apart along an axis.
pub fn rectangles_overlap(a: &Rect, b: &Rect, padding: f32) -> bool {
    !(a.right() + padding < b.left()
        || b.right() + padding < a.left()
        || a.bottom() + padding < b.top()
        || b.bottom() + padding < a.top())
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
pub fn angle_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Haversine distance in meters.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn bearing_of_coincident_points_is_zero() {
        assert_eq!(bearing(39.9, 116.4, 39.9, 116.4), 0.0);
        assert_eq!(bearing(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        assert!(close(bearing(0.0, 0.0, 1.0, 0.0), 0.0, 1e-4));
        assert!(close(bearing(0.0, 0.0, 0.0, 1.0), 90.0, 1e-4));
        assert!(close(bearing(0.0, 0.0, -1.0, 0.0), 180.0, 1e-4));
        assert!(close(bearing(0.0, 0.0, 0.0, -1.0), 270.0, 1e-4));
    }

    #[test]
    fn bearing_is_periodic_in_longitude() {
        let base = bearing(39.9, 116.4, 40.1, 116.7);
        let shifted = bearing(39.9, 116.4, 40.1, 116.7 + 360.0);
        assert!(close(base, shifted, 1e-3), "{base} vs {shifted}");
        let shifted_center = bearing(39.9, 116.4 - 360.0, 40.1, 116.7);
        assert!(close(base, shifted_center, 1e-3));
    }

    #[test]
    fn bearing_stays_in_range() {
        for (lat, lng) in [(10.0, -170.0), (-45.0, 179.9), (89.0, 0.0), (-89.0, -0.1)] {
            let b = bearing(0.0, 0.0, lat, lng);
            assert!((0.0..360.0).contains(&b), "bearing {b} out of range");
        }
    }

    #[test]
    fn canvas_bearing_inverts_y_axis() {
        assert!(close(canvas_bearing(100.0, 100.0, 100.0, 50.0), 0.0, 1e-4));
        assert!(close(canvas_bearing(100.0, 100.0, 150.0, 100.0), 90.0, 1e-4));
        assert!(close(canvas_bearing(100.0, 100.0, 100.0, 150.0), 180.0, 1e-4));
        assert!(close(canvas_bearing(100.0, 100.0, 50.0, 100.0), 270.0, 1e-4));
        assert_eq!(canvas_bearing(5.0, 5.0, 5.0, 5.0), 0.0);
    }

    #[test]
    fn point_on_bearing_matches_canvas_bearing() {
        for deg in [0.0f32, 33.0, 90.0, 181.0, 300.0] {
            let (x, y) = point_on_bearing(400.0, 300.0, deg, 120.0);
            let back = canvas_bearing(400.0, 300.0, x, y);
            assert!(angle_difference(deg, back) < 1e-2, "{deg} -> {back}");
        }
    }

    #[test]
    fn angle_difference_wraps_and_is_symmetric() {
        assert!(close(angle_difference(10.0, 350.0), 20.0, 1e-4));
        assert!(close(angle_difference(350.0, 10.0), 20.0, 1e-4));
        assert_eq!(angle_difference(0.0, 180.0), 180.0);
        assert_eq!(angle_difference(45.0, 45.0), 0.0);
    }

    #[test]
    fn overlap_respects_padding() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        let gap_three = Rect::new(13.0, 0.0, 10.0, 10.0);
        let gap_five = Rect::new(15.0, 0.0, 10.0, 10.0);
        assert!(rectangles_overlap(&a, &touching, 0.0));
        assert!(rectangles_overlap(&a, &gap_three, 4.0));
        assert!(!rectangles_overlap(&a, &gap_five, 4.0));
        assert!(!rectangles_overlap(&a, &gap_three, 2.0));
    }

    #[test]
    fn overlap_requires_both_axes() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let diagonal = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert!(!rectangles_overlap(&a, &diagonal, 4.0));
        let stacked = Rect::new(0.0, 12.0, 10.0, 10.0);
        assert!(rectangles_overlap(&a, &stacked, 4.0));
    }

    #[test]
    fn rect_edges_from_top_left() {
        let rect = Rect::from_top_left(10.0, 20.0, 40.0, 10.0);
        assert_eq!((rect.x, rect.y), (30.0, 25.0));
        assert_eq!(rect.left(), 10.0);
        assert_eq!(rect.bottom(), 30.0);
        assert_eq!(rect.area(), 400.0);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
        assert_eq!(distance_m(GeoPoint::new(3.0, 4.0), GeoPoint::new(3.0, 4.0)), 0.0);
    }

    #[test]
    fn normalize_degrees_handles_negatives() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_degrees(f64::NAN), 0.0);
    }
}
