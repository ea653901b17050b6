//! Stroke buffer: turns pointer input into flushed strokes.
//!
//! The buffer is a two-state machine (idle / capturing). While capturing it
//! normalizes each movement sample, drops samples that moved less than the
//! minimum distance from the last accepted one, and flushes a [`Stroke`] to
//! its [`StrokeObserver`] whenever the buffer fills up or the gesture ends.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::color::Rgba;
use crate::config::SyncConfig;
use crate::normalize::{NormalizedPoint, normalize};
use crate::stroke::{ClearDirective, Stroke};

/// Pointer input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Gesture start (button down / touch begin).
    Down { x: f64, y: f64 },
    /// Pointer moved while the gesture is held.
    Move { x: f64, y: f64 },
    /// Gesture end (button up / touch end).
    Up { x: f64, y: f64 },
}

impl PointerEvent {
    /// Device-space position of the event.
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { x, y } | PointerEvent::Move { x, y } | PointerEvent::Up { x, y } => {
                Point::new(x, y)
            }
        }
    }
}

/// Receives the buffer's output.
pub trait StrokeObserver {
    /// A batch of points is ready to be sent.
    fn on_stroke_ready(&mut self, stroke: Stroke);

    /// The user asked to clear every mark.
    fn on_clear_requested(&mut self, clear: ClearDirective);

    /// A point was accepted into the buffer. Used for local preview.
    fn on_point_accepted(&mut self, _point: NormalizedPoint, _color: Rgba) {}
}

/// Decides whether a device position lands on interactive UI.
pub trait UiHitTest {
    fn hit_test_ui(&self, position: Point) -> bool;
}

/// A hit tester with no UI at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUi;

impl UiHitTest for NoUi {
    fn hit_test_ui(&self, _position: Point) -> bool {
        false
    }
}

/// Rectangular UI regions in device space.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiRegions {
    pub regions: Vec<Rect>,
}

impl UiRegions {
    pub fn new(regions: Vec<Rect>) -> Self {
        Self { regions }
    }
}

impl UiHitTest for UiRegions {
    fn hit_test_ui(&self, position: Point) -> bool {
        self.regions.iter().any(|r| r.contains(position))
    }
}

/// Capture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

/// Accumulates the points of the current gesture.
#[derive(Debug, Clone)]
pub struct StrokeBuffer {
    state: CaptureState,
    points: Vec<NormalizedPoint>,
    /// Device position of the last accepted point. Survives gesture end and
    /// is only reset by a clear.
    last_accepted: Option<Point>,
    color: Rgba,
    capacity: usize,
    min_distance: f64,
    stamp_sessions: bool,
    session: u64,
}

impl StrokeBuffer {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            state: CaptureState::Idle,
            points: Vec::with_capacity(config.buffer_capacity),
            last_accepted: None,
            color: Rgba::BLACK,
            capacity: config.buffer_capacity.max(1),
            min_distance: config.min_distance,
            stamp_sessions: config.stamp_sessions,
            session: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Points accepted since the last flush.
    pub fn pending(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Set the draw color. Applies to every later flush, including the
    /// points already buffered.
    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    /// Current drawing session id.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Process one pointer sample.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        camera: &Camera,
        ui: &dyn UiHitTest,
        observer: &mut dyn StrokeObserver,
    ) {
        match event {
            PointerEvent::Down { .. } => {
                if self.is_capturing() {
                    // A missed gesture end; do not lose what was captured
                    self.flush(observer);
                }
                self.state = CaptureState::Capturing;
                self.points.clear();
                self.sample(event.position(), camera, ui, observer);
            }
            PointerEvent::Move { .. } => {
                if self.is_capturing() {
                    self.sample(event.position(), camera, ui, observer);
                }
            }
            PointerEvent::Up { .. } => {
                if self.is_capturing() {
                    self.flush(observer);
                    self.state = CaptureState::Idle;
                }
            }
        }
    }

    /// Discard local drawing state and emit a clear directive.
    ///
    /// Points buffered for the current gesture are dropped. Strokes already
    /// handed to the observer are not recalled.
    pub fn request_clear(&mut self, observer: &mut dyn StrokeObserver) {
        self.points.clear();
        self.last_accepted = None;
        let clear = if self.stamp_sessions {
            self.session += 1;
            ClearDirective::with_session(self.session)
        } else {
            ClearDirective::new()
        };
        log::debug!("Clear requested (session {})", self.session);
        observer.on_clear_requested(clear);
    }

    fn sample(
        &mut self,
        position: Point,
        camera: &Camera,
        ui: &dyn UiHitTest,
        observer: &mut dyn StrokeObserver,
    ) {
        if ui.hit_test_ui(position) {
            return;
        }

        if let Some(last) = self.last_accepted {
            if last.distance(position) <= self.min_distance {
                return;
            }
        }

        let point = match normalize(position, camera) {
            Ok(point) => point,
            Err(e) => {
                log::debug!("Skipping point at {:?}: {}", position, e);
                return;
            }
        };

        self.last_accepted = Some(position);
        self.points.push(point);
        observer.on_point_accepted(point, self.color);

        if self.points.len() >= self.capacity {
            self.flush(observer);
        }
    }

    fn flush(&mut self, observer: &mut dyn StrokeObserver) {
        if self.points.is_empty() {
            return;
        }
        let points = std::mem::replace(&mut self.points, Vec::with_capacity(self.capacity));
        let mut stroke = Stroke::new(self.color, points);
        if self.stamp_sessions {
            stroke = stroke.with_session(self.session);
        }
        log::debug!("Flushing stroke with {} points", stroke.len());
        observer.on_stroke_ready(stroke);
    }
}
