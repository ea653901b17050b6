//! Sender and receiver sessions.
//!
//! A session is the explicit context a driver hands input and ticks to. It
//! replaces engine update hooks: the driver calls [`SenderSession::process_input`]
//! for every pointer sample and [`ReceiverSession::tick`] once per frame.

use crate::buffer::{PointerEvent, StrokeBuffer, StrokeObserver, UiHitTest};
use crate::camera::Camera;
use crate::codec;
use crate::color::{Palette, Rgba};
use crate::config::SyncConfig;
use crate::error::{PaletteError, TransportError};
use crate::normalize::NormalizedPoint;
use crate::reconstruct::{Outcome, ReconstructionEngine};
use crate::stroke::{ClearDirective, Stroke};
use crate::transport::{TransportEvent, TransportPort};

/// Encodes buffer output and hands it to the transport.
///
/// Sends are fire-and-forget: when no channel is available the message is
/// dropped, never queued or retried.
pub struct Publisher<T: TransportPort> {
    transport: T,
    local_echo: bool,
    preview: Vec<(NormalizedPoint, Rgba)>,
    sent: usize,
    dropped: usize,
}

impl<T: TransportPort> Publisher<T> {
    pub fn new(transport: T, local_echo: bool) -> Self {
        Self {
            transport,
            local_echo,
            preview: Vec::new(),
            sent: 0,
            dropped: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Points drawn locally since the last clear (only with local echo).
    pub fn preview(&self) -> &[(NormalizedPoint, Rgba)] {
        &self.preview
    }

    /// Messages handed to the transport.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Messages dropped because no channel was available.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn publish(&mut self, payload: Vec<u8>) {
        let result = if self.transport.is_available() {
            self.transport.send(&payload)
        } else {
            Err(TransportError::ChannelUnavailable)
        };
        match result {
            Ok(()) => self.sent += 1,
            Err(e) => {
                log::debug!("Dropping annotation message: {}", e);
                self.dropped += 1;
            }
        }
    }
}

impl<T: TransportPort> StrokeObserver for Publisher<T> {
    fn on_stroke_ready(&mut self, stroke: Stroke) {
        self.publish(codec::encode_stroke(&stroke));
    }

    fn on_clear_requested(&mut self, clear: ClearDirective) {
        self.preview.clear();
        self.publish(codec::encode_clear(&clear));
    }

    fn on_point_accepted(&mut self, point: NormalizedPoint, color: Rgba) {
        if self.local_echo {
            self.preview.push((point, color));
        }
    }
}

/// The annotating participant.
pub struct SenderSession<T: TransportPort> {
    buffer: StrokeBuffer,
    publisher: Publisher<T>,
    camera: Camera,
    palette: Palette,
    ui: Box<dyn UiHitTest>,
}

impl<T: TransportPort> SenderSession<T> {
    pub fn new(config: &SyncConfig, transport: T, camera: Camera, ui: Box<dyn UiHitTest>) -> Self {
        let palette = Palette::default();
        let mut buffer = StrokeBuffer::new(config);
        buffer.set_color(palette.selected());
        Self {
            buffer,
            publisher: Publisher::new(transport, config.local_echo),
            camera,
            palette,
            ui,
        }
    }

    /// Replace the palette; its selected color becomes the draw color.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.buffer.set_color(palette.selected());
        self.palette = palette;
        self
    }

    /// Process one pointer sample.
    pub fn process_input(&mut self, event: PointerEvent) {
        self.buffer
            .handle_event(event, &self.camera, self.ui.as_ref(), &mut self.publisher);
    }

    /// Clear every mark, locally and on the receiver.
    pub fn request_clear(&mut self) {
        self.buffer.request_clear(&mut self.publisher);
    }

    /// Pick a palette color for subsequent strokes.
    pub fn select_color(&mut self, index: usize) -> Result<Rgba, PaletteError> {
        let color = self.palette.select(index)?;
        self.buffer.set_color(color);
        Ok(color)
    }

    /// Use an arbitrary color for subsequent strokes.
    pub fn set_color(&mut self, color: Rgba) {
        self.buffer.set_color(color);
    }

    /// Update the source camera (e.g. after a viewport resize).
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Drain transport events. The sender only logs them.
    pub fn tick(&mut self) -> Vec<TransportEvent> {
        let events = self.publisher.transport_mut().poll_events();
        for event in &events {
            log::debug!("Sender transport event: {:?}", event);
        }
        events
    }

    pub fn buffer(&self) -> &StrokeBuffer {
        &self.buffer
    }

    pub fn publisher(&self) -> &Publisher<T> {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut Publisher<T> {
        &mut self.publisher
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

/// The participant whose scene the marks are reconstructed in.
pub struct ReceiverSession<T: TransportPort> {
    engine: ReconstructionEngine,
    transport: T,
    /// Peer whose messages built the current marks.
    annotator: Option<String>,
}

impl<T: TransportPort> ReceiverSession<T> {
    pub fn new(config: &SyncConfig, transport: T, camera: Camera) -> Self {
        let mut engine = ReconstructionEngine::new(config);
        engine.set_camera(camera);
        Self {
            engine,
            transport,
            annotator: None,
        }
    }

    /// Drain the transport and apply every message in arrival order.
    pub fn tick(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        self.tick_with(|_, outcome| outcomes.push(outcome));
        outcomes
    }

    /// Like [`tick`](Self::tick), but hands each outcome to `on_outcome`
    /// right after its message is applied, while the scene still reflects
    /// exactly that message.
    pub fn tick_with(&mut self, mut on_outcome: impl FnMut(&ReconstructionEngine, Outcome)) {
        for event in self.transport.poll_events() {
            match event {
                TransportEvent::Message(msg) => {
                    let outcome = self.engine.on_message(&msg.payload);
                    if outcome != Outcome::Ignored {
                        self.annotator = Some(msg.sender);
                    }
                    on_outcome(&self.engine, outcome);
                }
                TransportEvent::PeerLeft { peer } => {
                    if self.annotator.as_deref() == Some(peer.as_str()) {
                        log::info!("Peer {} left, dropping its marks", peer);
                        self.annotator = None;
                        self.engine.on_disconnect();
                    } else {
                        log::debug!("Peer {} left", peer);
                    }
                }
                TransportEvent::Disconnected => {
                    log::info!("Transport disconnected, dropping marks");
                    self.annotator = None;
                    self.engine.on_disconnect();
                }
                TransportEvent::Error { message } => {
                    log::warn!("Transport error: {}", message);
                }
                other => log::debug!("Receiver transport event: {:?}", other),
            }
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.engine.set_camera(camera);
    }

    pub fn engine(&self) -> &ReconstructionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ReconstructionEngine {
        &mut self.engine
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
