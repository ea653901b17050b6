//! Receiver-side scene graph for reconstructed marks.
//!
//! Anchors own their dots. Removing an anchor removes every dot under it;
//! there is no way to remove a single dot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::WorldPoint;
use crate::color::Rgba;

/// Unique identifier for an anchor.
pub type AnchorId = Uuid;

/// Unique identifier for a dot.
pub type DotId = Uuid;

/// Name given to every anchor node.
pub const ANCHOR_NAME: &str = "DrawAnchor";

/// A single reconstructed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub id: DotId,
    /// Process-wide spawn index, used for the dot's name.
    pub index: u64,
    /// Position relative to the owning anchor's origin.
    pub local_position: WorldPoint,
    /// Uniform scale.
    pub scale: f64,
    /// Material color.
    pub color: Rgba,
}

impl Dot {
    pub fn name(&self) -> String {
        format!("dot {}", self.index)
    }

    /// Dots never take part in UI hit-testing.
    pub fn is_interactive(&self) -> bool {
        false
    }
}

/// Grouping node for the dots of one drawing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    /// Origin in the receiver's reference space.
    pub origin: WorldPoint,
    dots: Vec<Dot>,
}

impl Anchor {
    fn new(origin: WorldPoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            dots: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        ANCHOR_NAME
    }

    /// Dots in spawn order.
    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    /// World position of one of this anchor's dots.
    pub fn world_position(&self, dot: &Dot) -> WorldPoint {
        self.origin + dot.local_position
    }

    /// Parent a new dot at a world position.
    pub fn spawn_dot(&mut self, index: u64, world: WorldPoint, scale: f64, color: Rgba) -> DotId {
        let dot = Dot {
            id: Uuid::new_v4(),
            index,
            local_position: world - self.origin,
            scale,
            color,
        };
        let id = dot.id;
        self.dots.push(dot);
        id
    }
}

/// All live anchors.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    anchors: HashMap<AnchorId, Anchor>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty anchor at `origin`.
    pub fn create_anchor(&mut self, origin: WorldPoint) -> AnchorId {
        let anchor = Anchor::new(origin);
        let id = anchor.id;
        self.anchors.insert(id, anchor);
        id
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(&id)
    }

    pub fn anchor_mut(&mut self, id: AnchorId) -> Option<&mut Anchor> {
        self.anchors.get_mut(&id)
    }

    /// Remove an anchor together with all of its dots.
    pub fn destroy_anchor(&mut self, id: AnchorId) -> Option<Anchor> {
        self.anchors.remove(&id)
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn dot_count(&self) -> usize {
        self.anchors.values().map(Anchor::len).sum()
    }

    /// Every dot with its world position, for rendering.
    pub fn dots(&self) -> impl Iterator<Item = (&Dot, WorldPoint)> {
        self.anchors
            .values()
            .flat_map(|a| a.dots.iter().map(move |d| (d, a.world_position(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_dot_stores_local_position() {
        let mut scene = Scene::new();
        let id = scene.create_anchor(WorldPoint::new(1.0, 1.0, 0.0));
        let anchor = scene.anchor_mut(id).unwrap();
        anchor.spawn_dot(0, WorldPoint::new(2.0, 3.0, 8.0), 0.15, Rgba::RED);

        let anchor = scene.anchor(id).unwrap();
        let dot = &anchor.dots()[0];
        assert_eq!(dot.local_position, WorldPoint::new(1.0, 2.0, 8.0));
        assert_eq!(anchor.world_position(dot), WorldPoint::new(2.0, 3.0, 8.0));
        assert_eq!(dot.name(), "dot 0");
        assert!(!dot.is_interactive());
    }

    #[test]
    fn test_destroy_anchor_removes_dots() {
        let mut scene = Scene::new();
        let id = scene.create_anchor(WorldPoint::ORIGIN);
        for i in 0..3 {
            scene
                .anchor_mut(id)
                .unwrap()
                .spawn_dot(i, WorldPoint::new(i as f64, 0.0, 8.0), 0.15, Rgba::BLACK);
        }
        assert_eq!(scene.dot_count(), 3);

        let removed = scene.destroy_anchor(id).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(scene.anchor_count(), 0);
        assert_eq!(scene.dot_count(), 0);
        assert!(scene.anchor(id).is_none());
    }

    #[test]
    fn test_dots_iterator_reports_world_positions() {
        let mut scene = Scene::new();
        let id = scene.create_anchor(WorldPoint::new(0.0, 0.0, 1.0));
        scene
            .anchor_mut(id)
            .unwrap()
            .spawn_dot(0, WorldPoint::new(0.0, 0.0, 9.0), 0.15, Rgba::BLACK);

        let positions: Vec<_> = scene.dots().map(|(_, p)| p).collect();
        assert_eq!(positions, vec![WorldPoint::new(0.0, 0.0, 9.0)]);
    }
}
