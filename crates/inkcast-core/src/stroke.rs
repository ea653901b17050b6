//! Stroke and clear messages exchanged between participants.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::normalize::NormalizedPoint;

/// One flushed batch of points drawn in a single color.
///
/// Point order is capture order and is never changed between the stroke
/// buffer and the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgba,
    pub points: Vec<NormalizedPoint>,
    /// Drawing session the stroke belongs to, if the sender stamps sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<u64>,
}

impl Stroke {
    pub fn new(color: Rgba, points: Vec<NormalizedPoint>) -> Self {
        Self {
            color,
            points,
            session: None,
        }
    }

    /// Attach a drawing-session id.
    pub fn with_session(mut self, session: u64) -> Self {
        self.session = Some(session);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Instruction to discard every mark currently displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearDirective {
    /// First drawing session that follows this clear.
    pub session: Option<u64>,
}

impl ClearDirective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: u64) -> Self {
        Self {
            session: Some(session),
        }
    }
}

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Stroke(Stroke),
    Clear(ClearDirective),
}

impl From<Stroke> for WireMessage {
    fn from(stroke: Stroke) -> Self {
        WireMessage::Stroke(stroke)
    }
}

impl From<ClearDirective> for WireMessage {
    fn from(clear: ClearDirective) -> Self {
        WireMessage::Clear(clear)
    }
}
