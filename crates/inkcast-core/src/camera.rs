//! Camera module for viewport and projection transforms.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use crate::error::NormalizeError;

/// A position in the receiver's 3D world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPoint {
    pub const ORIGIN: WorldPoint = WorldPoint::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: WorldPoint) -> f64 {
        let d = *self - other;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }
}

impl Add for WorldPoint {
    type Output = WorldPoint;

    fn add(self, rhs: WorldPoint) -> WorldPoint {
        WorldPoint::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for WorldPoint {
    type Output = WorldPoint;

    fn sub(self, rhs: WorldPoint) -> WorldPoint {
        WorldPoint::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// How the camera maps depth to visible extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Perspective frustum with the given vertical field of view.
    Perspective { fov_y_degrees: f64 },
    /// Orthographic box with the given half height in world units.
    Orthographic { half_height: f64 },
}

impl Projection {
    /// Half of the visible height at `depth` units in front of the camera.
    pub fn half_height_at(&self, depth: f64) -> f64 {
        match *self {
            Projection::Perspective { fov_y_degrees } => {
                depth * (fov_y_degrees.to_radians() / 2.0).tan()
            }
            Projection::Orthographic { half_height } => half_height,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective { fov_y_degrees: 60.0 }
    }
}

/// Camera state shared by both participants.
///
/// `viewport` is the device-space rectangle the camera renders into. A camera
/// whose viewport has zero extent has not been laid out yet and rejects every
/// conversion with [`NormalizeError::CameraNotReady`].
///
/// The camera sits at `position` and looks down the positive z axis, with x
/// to the right and y up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub viewport: Rect,
    pub position: WorldPoint,
    pub projection: Projection,
}

impl Camera {
    /// Create a camera covering `size` device units from the device origin.
    pub fn new(size: kurbo::Size, projection: Projection) -> Self {
        Self {
            viewport: Rect::from_origin_size(Point::ZERO, size),
            position: WorldPoint::ORIGIN,
            projection,
        }
    }

    /// Whether the viewport has been laid out.
    pub fn is_ready(&self) -> bool {
        let w = self.viewport.width();
        let h = self.viewport.height();
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }

    /// Width over height of the viewport.
    pub fn aspect(&self) -> Result<f64, NormalizeError> {
        self.ready()?;
        Ok(self.viewport.width() / self.viewport.height())
    }

    /// Resize the viewport, keeping its origin.
    pub fn resize(&mut self, size: kurbo::Size) {
        self.viewport = Rect::from_origin_size(self.viewport.origin(), size);
    }

    /// Move the camera by a delta in world units.
    pub fn translate(&mut self, delta: WorldPoint) {
        self.position = self.position + delta;
    }

    /// Device position to viewport fraction (`0..1` inside the viewport).
    pub fn screen_to_viewport(&self, screen: Point) -> Result<Point, NormalizeError> {
        self.ready()?;
        let local = screen - self.viewport.origin();
        Ok(Point::new(
            local.x / self.viewport.width(),
            local.y / self.viewport.height(),
        ))
    }

    /// Viewport fraction to device position.
    pub fn viewport_to_screen(&self, viewport: Point) -> Result<Point, NormalizeError> {
        self.ready()?;
        let offset = Vec2::new(
            viewport.x * self.viewport.width(),
            viewport.y * self.viewport.height(),
        );
        Ok(self.viewport.origin() + offset)
    }

    /// Unproject a device position onto the plane `depth` units in front of
    /// the camera.
    pub fn screen_to_world(&self, screen: Point, depth: f64) -> Result<WorldPoint, NormalizeError> {
        let fraction = self.screen_to_viewport(screen)?;
        let half_h = self.projection.half_height_at(depth);
        let half_w = half_h * self.aspect()?;

        // Viewport fraction to [-1, 1]
        let ndc_x = fraction.x * 2.0 - 1.0;
        let ndc_y = fraction.y * 2.0 - 1.0;

        Ok(self.position + WorldPoint::new(ndc_x * half_w, ndc_y * half_h, depth))
    }

    fn ready(&self) -> Result<(), NormalizeError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(NormalizeError::CameraNotReady)
        }
    }
}
