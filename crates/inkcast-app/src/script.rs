//! Gesture scripts for the `annotate` command.

use std::path::Path;

use inkcast_core::{Camera, PointerEvent, Projection};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::AppResult;

/// One scripted action, replayed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStep", into = "RawStep")]
pub enum ScriptStep {
    Pointer(PointerEvent),
    Clear,
    Color { index: usize },
    Wait { ms: u64 },
}

/// Flat wire form so pointer and control steps share one `type` tag.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawStep {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Clear,
    Color { index: usize },
    Wait { ms: u64 },
}

impl From<RawStep> for ScriptStep {
    fn from(raw: RawStep) -> Self {
        match raw {
            RawStep::Down { x, y } => ScriptStep::Pointer(PointerEvent::Down { x, y }),
            RawStep::Move { x, y } => ScriptStep::Pointer(PointerEvent::Move { x, y }),
            RawStep::Up { x, y } => ScriptStep::Pointer(PointerEvent::Up { x, y }),
            RawStep::Clear => ScriptStep::Clear,
            RawStep::Color { index } => ScriptStep::Color { index },
            RawStep::Wait { ms } => ScriptStep::Wait { ms },
        }
    }
}

impl From<ScriptStep> for RawStep {
    fn from(step: ScriptStep) -> Self {
        match step {
            ScriptStep::Pointer(PointerEvent::Down { x, y }) => RawStep::Down { x, y },
            ScriptStep::Pointer(PointerEvent::Move { x, y }) => RawStep::Move { x, y },
            ScriptStep::Pointer(PointerEvent::Up { x, y }) => RawStep::Up { x, y },
            ScriptStep::Clear => RawStep::Clear,
            ScriptStep::Color { index } => RawStep::Color { index },
            ScriptStep::Wait { ms } => RawStep::Wait { ms },
        }
    }
}

/// A recorded annotation session: the source viewport plus the steps to replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureScript {
    pub viewport: Size,
    #[serde(default)]
    pub projection: Projection,
    /// Screen rectangles covered by UI; touches there never draw.
    #[serde(default)]
    pub ui_regions: Vec<Rect>,
    pub steps: Vec<ScriptStep>,
}

impl GestureScript {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let script = Self::from_json(&json)?;
        log::info!("Loaded script {:?} with {} steps", path, script.steps.len());
        Ok(script)
    }

    /// Camera the script's coordinates were recorded against.
    pub fn camera(&self) -> Camera {
        Camera::new(self.viewport, self.projection)
    }
}
