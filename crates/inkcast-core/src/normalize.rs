//! Camera-independent point coordinates.
//!
//! The annotating participant and the receiver look at the same scene
//! through different cameras. Points travel as viewport fractions so each
//! side can map them through its own camera.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, WorldPoint};
use crate::error::NormalizeError;

/// A viewport fraction in `[0, 1] x [0, 1]`.
///
/// Only [`normalize`] and deserialization produce these; raw device
/// positions never become a `NormalizedPoint` directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub(crate) const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a point from an already-computed viewport fraction, rejecting
    /// anything outside the unit square.
    pub fn from_fraction(x: f64, y: f64) -> Option<Self> {
        let p = Self::new(x, y);
        p.is_valid().then_some(p)
    }

    /// True if both coordinates are finite and within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

impl From<NormalizedPoint> for Point {
    fn from(p: NormalizedPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

/// Map a device position through the source camera's viewport.
///
/// Positions outside the viewport are clamped to its edge. Non-finite
/// positions are rejected.
pub fn normalize(device: Point, camera: &Camera) -> Result<NormalizedPoint, NormalizeError> {
    if !device.is_finite() {
        return Err(NormalizeError::NonFinite);
    }
    let fraction = camera.screen_to_viewport(device)?;
    Ok(NormalizedPoint::new(
        fraction.x.clamp(0.0, 1.0),
        fraction.y.clamp(0.0, 1.0),
    ))
}

/// Map a normalized point into the target camera's world at `depth`.
pub fn denormalize(
    point: NormalizedPoint,
    camera: &Camera,
    depth: f64,
) -> Result<WorldPoint, NormalizeError> {
    let screen = camera.viewport_to_screen(point.into())?;
    camera.screen_to_world(screen, depth)
}

#[cfg(test)]
pub(crate) fn point(x: f64, y: f64) -> NormalizedPoint {
    NormalizedPoint::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Projection;
    use kurbo::{Rect, Size};

    #[test]
    fn test_normalize_maps_into_unit_square() {
        let camera = Camera::new(Size::new(200.0, 100.0), Projection::default());
        let p = normalize(Point::new(50.0, 75.0), &camera).unwrap();
        assert!((p.x - 0.25).abs() < f64::EPSILON);
        assert!((p.y - 0.75).abs() < f64::EPSILON);
        assert!(p.is_valid());
    }

    #[test]
    fn test_normalize_is_camera_independent() {
        let small = Camera::new(Size::new(100.0, 100.0), Projection::default());
        let mut large = Camera::new(Size::new(1000.0, 1000.0), Projection::default());
        large.viewport = Rect::new(500.0, 500.0, 1500.0, 1500.0);

        let a = normalize(Point::new(30.0, 60.0), &small).unwrap();
        let b = normalize(Point::new(800.0, 1100.0), &large).unwrap();
        assert!((a.x - b.x).abs() < 1e-12);
        assert!((a.y - b.y).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_clamps_outside_viewport() {
        let camera = Camera::new(Size::new(100.0, 100.0), Projection::default());
        let p = normalize(Point::new(-20.0, 180.0), &camera).unwrap();
        assert_eq!(p, point(0.0, 1.0));
    }

    #[test]
    fn test_normalize_rejects_non_finite() {
        let camera = Camera::new(Size::new(100.0, 100.0), Projection::default());
        assert_eq!(
            normalize(Point::new(f64::NAN, 10.0), &camera),
            Err(NormalizeError::NonFinite)
        );
        assert_eq!(
            normalize(Point::new(10.0, f64::INFINITY), &camera),
            Err(NormalizeError::NonFinite)
        );
    }

    #[test]
    fn test_from_fraction_validates() {
        assert_eq!(NormalizedPoint::from_fraction(0.2, 1.0), Some(point(0.2, 1.0)));
        assert_eq!(NormalizedPoint::from_fraction(1.2, 0.5), None);
        assert_eq!(NormalizedPoint::from_fraction(f64::NAN, 0.5), None);
    }

    #[test]
    fn test_not_ready_camera_is_rejected() {
        let camera = Camera::default();
        assert_eq!(
            normalize(Point::new(1.0, 1.0), &camera),
            Err(NormalizeError::CameraNotReady)
        );
        assert_eq!(
            denormalize(point(0.5, 0.5), &camera, 8.0),
            Err(NormalizeError::CameraNotReady)
        );
    }

    #[test]
    fn test_denormalize_orthographic() {
        let camera = Camera::new(
            Size::new(720.0, 720.0),
            Projection::Orthographic { half_height: 6.25 },
        );
        let world = denormalize(point(0.1, 0.1), &camera, 8.0).unwrap();
        assert!(world.distance(WorldPoint::new(-5.0, -5.0, 8.0)) < 1e-10);

        let world = denormalize(point(0.9, 0.9), &camera, 8.0).unwrap();
        assert!(world.distance(WorldPoint::new(5.0, 5.0, 8.0)) < 1e-10);
    }

    #[test]
    fn test_denormalize_is_deterministic() {
        let camera = Camera::new(Size::new(1080.0, 1920.0), Projection::default());
        let a = denormalize(point(0.3, 0.7), &camera, 8.0).unwrap();
        let b = denormalize(point(0.3, 0.7), &camera, 8.0).unwrap();
        assert_eq!(a, b);
    }
}
