//! inkcast Core Library
//!
//! Annotation synchronization between two participants viewing the same
//! scene through different cameras: pointer capture into normalized strokes,
//! the wire codec, the transport port, and reconstruction of the marks in
//! the receiver's world space.

pub mod buffer;
pub mod camera;
pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod normalize;
pub mod reconstruct;
pub mod relay;
pub mod scene;
pub mod session;
pub mod stroke;
pub mod transport;

pub use buffer::{CaptureState, NoUi, PointerEvent, StrokeBuffer, StrokeObserver, UiHitTest, UiRegions};
pub use camera::{Camera, Projection, WorldPoint};
pub use codec::{decode, encode, encode_clear, encode_stroke};
pub use color::{Palette, Rgba};
pub use config::SyncConfig;
pub use error::{ConfigError, DecodeError, NormalizeError, PaletteError, TransportError};
pub use normalize::{NormalizedPoint, denormalize, normalize};
pub use reconstruct::{Outcome, ReconstructionEngine};
pub use relay::RelayTransport;
pub use scene::{Anchor, AnchorId, Dot, DotId, Scene};
pub use session::{Publisher, ReceiverSession, SenderSession};
pub use stroke::{ClearDirective, Stroke, WireMessage};
pub use transport::{ConnectionState, MemoryTransport, ReceivedMessage, TransportEvent, TransportPort};
