use super::event::SessionEvent;
use super::state::SessionState;
use crate::capture::{AudioChunk, CaptureError, CaptureSource};
use crate::config::ClientOptions;
use crate::encode;
use crate::transport::{ErrorPayload, ReplyPayload, TransportChannel};
use crate::ui::{self, SessionOutput, ViewState};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

const DISCONNECTED_STATUS: &str = "Disconnected from service";

/// Handle for driving and observing a running session
#[derive(Clone)]
pub struct SessionHandle {
    /// Feed for session events (user intents, transport events)
    pub events: mpsc::Sender<SessionEvent>,
    /// Latest projected view, updated after every applied event
    pub view: watch::Receiver<ViewState>,
}

/// The recording session state machine
///
/// Owns the capture source and the outbound transport half exclusively;
/// nothing else starts, stops, or touches them. Events are applied one at
/// a time from a single ordered queue, and the projected view is
/// republished after each event, so no half-applied transition is ever
/// observable.
pub struct Session {
    state: SessionState,
    is_streaming: bool,
    options: ClientOptions,
    capture: Box<dyn CaptureSource>,
    transport: Arc<dyn TransportChannel>,
    output: SessionOutput,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: Option<mpsc::Receiver<SessionEvent>>,
    view_tx: watch::Sender<ViewState>,
}

impl Session {
    /// Create a session in Idle with its driving handle
    pub fn new(
        options: ClientOptions,
        capture: Box<dyn CaptureSource>,
        transport: Arc<dyn TransportChannel>,
    ) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let initial = ui::project(SessionState::Idle, &SessionOutput::default());
        let (view_tx, view_rx) = watch::channel(initial);

        let session = Self {
            state: SessionState::Idle,
            is_streaming: false,
            options,
            capture,
            transport,
            output: SessionOutput::default(),
            events_tx: events_tx.clone(),
            events_rx: Some(events_rx),
            view_tx,
        };

        let handle = SessionHandle {
            events: events_tx,
            view: view_rx,
        };

        (session, handle)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Whether the capture source is currently active
    pub fn capture_active(&self) -> bool {
        self.capture.is_active()
    }

    /// Consume events until the queue closes
    pub async fn run(mut self) {
        let Some(mut events) = self.events_rx.take() else {
            return;
        };

        info!(session_id = %self.options.session_id, "session started in Idle");

        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }

        // Queue closed: make sure the microphone is never left open.
        self.capture.halt().await;
        info!("session ended");
    }

    /// Apply one event fully, then republish the view
    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StartPressed => self.on_start().await,
            SessionEvent::StopPressed => self.on_stop().await,
            SessionEvent::ChunkCaptured(chunk) => self.on_chunk(chunk),
            SessionEvent::Reply(reply) => self.on_reply(reply),
            SessionEvent::ServiceError(err) => self.on_service_error(err),
            SessionEvent::Connected => self.on_connected(),
            SessionEvent::Disconnected => self.on_disconnected().await,
            SessionEvent::CaptureLost => self.on_capture_lost().await,
        }

        self.view_tx.send_replace(ui::project(self.state, &self.output));
    }

    async fn on_start(&mut self) {
        if self.state != SessionState::Idle {
            debug!(state = %self.state, "start ignored outside Idle");
            return;
        }

        // Clear prior output panels before a new utterance.
        self.output.status = None;
        self.output.response_text = None;
        self.output.tts_audio = None;

        let chunk_rx = match self
            .capture
            .begin(&self.options.constraints, self.options.chunk_interval)
            .await
        {
            Ok(rx) => rx,
            Err(e @ CaptureError::Access(_)) => {
                warn!("microphone access denied: {}", e);
                self.output.status = Some(e.to_string());
                return;
            }
            Err(e) => {
                warn!("capture failed to start: {}", e);
                self.output.status = Some(e.to_string());
                return;
            }
        };

        // Forward chunks into the ordered event queue. When the chunk
        // channel closes without a halt (device loss), CaptureLost tells
        // the session to tear down.
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut chunk_rx = chunk_rx;
            while let Some(chunk) = chunk_rx.recv().await {
                if events_tx
                    .send(SessionEvent::ChunkCaptured(chunk))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            let _ = events_tx.send(SessionEvent::CaptureLost).await;
        });

        self.transition(SessionState::Recording);
        self.is_streaming = false;
    }

    async fn on_stop(&mut self) {
        if self.state != SessionState::Recording {
            debug!(state = %self.state, "stop ignored outside Recording");
            return;
        }

        // Halt within this turn: no further chunks are produced, though
        // in-flight encodes for already-captured chunks may still land.
        self.capture.halt().await;
        self.transition(SessionState::Processing);
        self.is_streaming = false;

        if let Err(e) = self.transport.send_end_of_utterance().await {
            warn!("failed to signal end of utterance: {}", e);
        }
    }

    fn on_chunk(&mut self, chunk: AudioChunk) {
        match self.state {
            SessionState::Recording => {
                self.is_streaming = true;
                debug!(
                    samples = chunk.samples.len(),
                    timestamp_ms = chunk.timestamp_ms,
                    "chunk captured"
                );
                encode::spawn_encode_and_send(chunk, Arc::clone(&self.transport));
            }
            SessionState::Processing => {
                // Captured before the halt, still in the queue: a late
                // send the service is expected to tolerate.
                encode::spawn_encode_and_send(chunk, Arc::clone(&self.transport));
            }
            SessionState::Idle => {
                debug!("chunk dropped while Idle");
            }
        }
    }

    fn on_reply(&mut self, reply: ReplyPayload) {
        if self.state != SessionState::Processing {
            debug!(state = %self.state, "late reply ignored");
            return;
        }

        if let Some(transcription) = &reply.transcription {
            info!(%transcription, "service heard");
        }

        self.output.status = None;
        self.output.response_text = reply.response;
        self.output.tts_audio = reply.tts_audio;
        self.transition(SessionState::Idle);
    }

    fn on_service_error(&mut self, err: ErrorPayload) {
        warn!("service error: {}", err.message);
        self.output.status = Some(err.message);

        // Only Processing transitions on a service error; while Recording
        // the session keeps capturing and the message stays on the status
        // line.
        if self.state == SessionState::Processing {
            self.transition(SessionState::Idle);
        }
    }

    fn on_connected(&mut self) {
        info!("transport connected");
        self.output.connected = true;
        // A reconnect clears the stale disconnect notice; any other
        // status (access error, service error) stays visible.
        if self.output.status.as_deref() == Some(DISCONNECTED_STATUS) {
            self.output.status = None;
        }
    }

    async fn on_disconnected(&mut self) {
        info!("transport disconnected");
        self.output.connected = false;

        match self.state {
            SessionState::Recording | SessionState::Processing => {
                // Teardown is idempotent; a concurrent stop may already
                // have halted capture.
                self.capture.halt().await;
                self.output.status = Some(DISCONNECTED_STATUS.to_string());
                self.is_streaming = false;
                self.transition(SessionState::Idle);
            }
            SessionState::Idle => {
                self.output.status = Some(DISCONNECTED_STATUS.to_string());
            }
        }
    }

    async fn on_capture_lost(&mut self) {
        if self.state != SessionState::Recording {
            // Normal halt also closes the chunk channel; nothing to do.
            return;
        }

        warn!("capture source lost while recording");
        self.capture.halt().await;
        self.output.status = Some("Microphone lost".to_string());
        self.is_streaming = false;
        self.transition(SessionState::Idle);
    }

    fn transition(&mut self, to: SessionState) {
        info!(from = %self.state, to = %to, "session transition");
        self.state = to;
    }
}
