//! Remote reconstruction of strokes on the receiving side.
//!
//! Messages must be fed in arrival order, one at a time, from the same tick
//! that renders the scene. The engine keeps at most one live anchor; strokes
//! add dots under it and a clear destroys it.

use crate::camera::{Camera, WorldPoint};
use crate::codec;
use crate::config::SyncConfig;
use crate::normalize::denormalize;
use crate::scene::{Anchor, AnchorId, Scene};
use crate::stroke::{ClearDirective, Stroke, WireMessage};

/// What a single message did to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dots were added. `skipped` points could not be placed.
    Drawn { dots: usize, skipped: usize },
    /// The current anchor was destroyed (or there was none).
    Cleared,
    /// A stroke from a drawing session that an earlier clear ended.
    Stale,
    /// The payload could not be decoded.
    Ignored,
}

/// Rebuilds the sender's marks in the receiver's coordinate space.
#[derive(Debug, Clone)]
pub struct ReconstructionEngine {
    scene: Scene,
    /// Lookup handle only; the scene owns the anchor.
    current_anchor: Option<AnchorId>,
    camera: Camera,
    reference_origin: WorldPoint,
    projection_depth: f64,
    dot_scale: f64,
    next_dot_index: u64,
    /// Lowest drawing session still accepted, as announced by the last clear.
    min_session: Option<u64>,
}

impl ReconstructionEngine {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            scene: Scene::new(),
            current_anchor: None,
            camera: Camera::default(),
            reference_origin: WorldPoint::ORIGIN,
            projection_depth: config.projection_depth,
            dot_scale: config.dot_scale,
            next_dot_index: 0,
            min_session: None,
        }
    }

    /// Use `origin` of the receiver's reference space for new anchors.
    pub fn with_reference_origin(mut self, origin: WorldPoint) -> Self {
        self.reference_origin = origin;
        self
    }

    /// Update the camera that incoming points are unprojected through.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The anchor of the current drawing session, if any.
    pub fn current_anchor(&self) -> Option<&Anchor> {
        self.current_anchor.and_then(|id| self.scene.anchor(id))
    }

    /// Handle one arrived payload.
    pub fn on_message(&mut self, bytes: &[u8]) -> Outcome {
        match codec::decode(bytes) {
            Ok(message) => self.apply(message),
            Err(e) => {
                log::warn!("Dropping malformed annotation message: {}", e);
                Outcome::Ignored
            }
        }
    }

    /// Apply an already decoded message.
    pub fn apply(&mut self, message: WireMessage) -> Outcome {
        match message {
            WireMessage::Clear(clear) => self.clear(clear),
            WireMessage::Stroke(stroke) => self.draw(&stroke),
        }
    }

    /// The remote participant went away; drop everything they drew.
    pub fn on_disconnect(&mut self) {
        self.destroy_current_anchor();
        self.min_session = None;
    }

    fn clear(&mut self, clear: ClearDirective) -> Outcome {
        self.destroy_current_anchor();
        if let Some(session) = clear.session {
            self.min_session = Some(self.min_session.map_or(session, |s| s.max(session)));
        }
        Outcome::Cleared
    }

    fn draw(&mut self, stroke: &Stroke) -> Outcome {
        if let (Some(min), Some(session)) = (self.min_session, stroke.session) {
            if session < min {
                log::debug!("Dropping stroke from session {} (cleared through {})", session, min - 1);
                return Outcome::Stale;
            }
        }

        let mut dots = 0;
        let mut skipped = 0;
        for point in &stroke.points {
            let world = match denormalize(*point, &self.camera, self.projection_depth) {
                Ok(world) => world,
                Err(e) => {
                    log::debug!("Skipping point {:?}: {}", point, e);
                    skipped += 1;
                    continue;
                }
            };
            // The anchor appears with its first dot
            let anchor_id = self.ensure_anchor();
            let Some(anchor) = self.scene.anchor_mut(anchor_id) else {
                return Outcome::Ignored;
            };
            let index = self.next_dot_index;
            self.next_dot_index += 1;
            anchor.spawn_dot(index, world, self.dot_scale, stroke.color);
            log::debug!("dot {} pos:{:?} => {:?}", index, point, world);
            dots += 1;
        }

        Outcome::Drawn { dots, skipped }
    }

    fn ensure_anchor(&mut self) -> AnchorId {
        if let Some(id) = self.current_anchor {
            if self.scene.anchor(id).is_some() {
                return id;
            }
        }
        let id = self.scene.create_anchor(self.reference_origin);
        log::debug!("Created anchor {}", id);
        self.current_anchor = Some(id);
        id
    }

    fn destroy_current_anchor(&mut self) {
        if let Some(id) = self.current_anchor.take() {
            if let Some(anchor) = self.scene.destroy_anchor(id) {
                log::debug!("Destroyed anchor {} with {} dots", id, anchor.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Projection;
    use crate::codec::{encode_clear, encode_stroke};
    use crate::color::Rgba;
    use crate::normalize::point;
    use kurbo::Size;

    fn engine() -> ReconstructionEngine {
        let mut engine = ReconstructionEngine::new(&SyncConfig::default());
        engine.set_camera(Camera::new(
            Size::new(100.0, 100.0),
            Projection::Orthographic { half_height: 6.25 },
        ));
        engine
    }

    fn stroke(n: usize) -> Stroke {
        let points = (0..n).map(|i| point(i as f64 / 10.0, 0.5)).collect();
        Stroke::new(Rgba::BLUE, points)
    }

    #[test]
    fn test_first_stroke_creates_anchor() {
        let mut engine = engine();
        assert!(engine.current_anchor().is_none());

        let outcome = engine.on_message(&encode_stroke(&stroke(3)));
        assert_eq!(outcome, Outcome::Drawn { dots: 3, skipped: 0 });

        let anchor = engine.current_anchor().unwrap();
        assert_eq!(anchor.len(), 3);
        assert_eq!(anchor.origin, WorldPoint::ORIGIN);
        assert!(anchor.dots().iter().all(|d| d.color == Rgba::BLUE));
        assert!(anchor.dots().iter().all(|d| (d.scale - 0.15).abs() < f64::EPSILON));
    }

    #[test]
    fn test_strokes_share_one_anchor_in_order() {
        let mut engine = engine();
        engine.on_message(&encode_stroke(&stroke(2)));
        engine.on_message(&encode_stroke(&stroke(4)));

        assert_eq!(engine.scene().anchor_count(), 1);
        let anchor = engine.current_anchor().unwrap();
        let indices: Vec<u64> = anchor.dots().iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_clear_destroys_anchor() {
        let mut engine = engine();
        engine.on_message(&encode_stroke(&stroke(3)));
        let first = engine.current_anchor().unwrap().id;

        assert_eq!(engine.on_message(&encode_clear(&ClearDirective::new())), Outcome::Cleared);
        assert!(engine.current_anchor().is_none());
        assert_eq!(engine.scene().dot_count(), 0);

        engine.on_message(&encode_stroke(&stroke(1)));
        let second = engine.current_anchor().unwrap().id;
        assert_ne!(first, second);
    }

    #[test]
    fn test_clear_without_anchor_is_harmless() {
        let mut engine = engine();
        assert_eq!(engine.on_message(br#"{"clear":true}"#), Outcome::Cleared);
        assert_eq!(engine.scene().anchor_count(), 0);
    }

    #[test]
    fn test_malformed_message_leaves_state_alone() {
        let mut engine = engine();
        engine.on_message(&encode_stroke(&stroke(2)));
        assert_eq!(engine.on_message(b"{\"points\":[{\"x\":"), Outcome::Ignored);
        assert_eq!(engine.on_message(b"hello"), Outcome::Ignored);
        assert_eq!(engine.current_anchor().unwrap().len(), 2);
    }

    #[test]
    fn test_camera_not_ready_skips_points() {
        let mut engine = ReconstructionEngine::new(&SyncConfig::default());
        let outcome = engine.on_message(&encode_stroke(&stroke(3)));
        assert_eq!(outcome, Outcome::Drawn { dots: 0, skipped: 3 });
        assert!(engine.current_anchor().is_none());
        assert_eq!(engine.scene().anchor_count(), 0);
    }

    #[test]
    fn test_denormalized_positions() {
        let mut engine = engine();
        let s = Stroke::new(Rgba::BLACK, vec![point(0.1, 0.1), point(0.5, 0.5)]);
        engine.apply(s.into());

        let anchor = engine.current_anchor().unwrap();
        let a = anchor.world_position(&anchor.dots()[0]);
        let b = anchor.world_position(&anchor.dots()[1]);
        assert!(a.distance(WorldPoint::new(-5.0, -5.0, 8.0)) < 1e-10);
        assert!(b.distance(WorldPoint::new(0.0, 0.0, 8.0)) < 1e-10);
    }

    #[test]
    fn test_reference_origin_offsets_anchor() {
        let mut engine = engine().with_reference_origin(WorldPoint::new(0.0, 0.0, 2.0));
        engine.apply(Stroke::new(Rgba::BLACK, vec![point(0.5, 0.5)]).into());

        let anchor = engine.current_anchor().unwrap();
        let dot = &anchor.dots()[0];
        assert_eq!(anchor.origin, WorldPoint::new(0.0, 0.0, 2.0));
        assert!(dot.local_position.distance(WorldPoint::new(0.0, 0.0, 6.0)) < 1e-10);
        assert!(anchor.world_position(dot).distance(WorldPoint::new(0.0, 0.0, 8.0)) < 1e-10);
    }

    #[test]
    fn test_stale_session_is_dropped() {
        let mut engine = engine();
        engine.apply(ClearDirective::with_session(2).into());

        assert_eq!(engine.apply(stroke(2).with_session(1).into()), Outcome::Stale);
        assert!(engine.current_anchor().is_none());

        assert_eq!(
            engine.apply(stroke(2).with_session(2).into()),
            Outcome::Drawn { dots: 2, skipped: 0 }
        );
        // Strokes without a session id are always drawn
        assert_eq!(
            engine.apply(stroke(1).into()),
            Outcome::Drawn { dots: 1, skipped: 0 }
        );
    }

    #[test]
    fn test_disconnect_drops_anchor() {
        let mut engine = engine();
        engine.apply(stroke(3).into());
        engine.on_disconnect();
        assert!(engine.current_anchor().is_none());
        assert_eq!(engine.scene().anchor_count(), 0);
    }
}
