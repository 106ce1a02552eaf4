mod backoff;
pub use backoff::BackoffPolicy;
mod codec;
pub use codec::MessageCodec;
mod commands;
pub use commands::MonitorCommand;
mod connection;
pub use connection::{ConnectionManager, Frame};
mod controller;
pub use controller::{ControlSignal, PlaybackController};
mod error;
pub use error::DisplayError;
mod events;
pub use events::{DisplayEvent, ItemEvent};
mod models;
pub use models::{MediaKind, PlaylistItem};
mod reporter;
pub use reporter::EventReporter;
mod session;
mod settings;
pub use settings::Settings;
mod state;
pub use state::{ChannelSignal, ConnectionPhase};
mod surface;
pub use surface::{RenderSurface, SurfaceEvent};

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

/// Remotely-controlled presentation client: renders a sequence of
/// video/image assets under the direction of an external Monitor reachable
/// over a persistent WebSocket channel. The Monitor pushes playlists and
/// transport commands; the client sequences items, enforces per-item
/// repeat/duration semantics, and reports lifecycle events back.
///
/// The embedding host supplies the actual rendering surface (an
/// implementation of [`RenderSurface`]) together with an mpsc channel of
/// [`SurfaceEvent`]s for end-of-media notifications, then drives
/// [`run`](Self::run) on a tokio runtime. Everything with state — the
/// resilient connection, the playlist machine, pending timers — lives behind
/// that one call; the host keeps the [`ConnectionManager`] handle to shut
/// the client down.
///
/// # Logging
///
/// This library uses the `tracing` crate for logging. To enable logs,
/// initialize a tracing subscriber in your application:
/// ```no_run
/// use tracing::Level;
/// use tracing_subscriber::FmtSubscriber;
///
/// let subscriber = FmtSubscriber::builder()
///     .with_max_level(Level::DEBUG)
///     .finish();
/// tracing::subscriber::set_global_default(subscriber)
///     .expect("Failed to set tracing subscriber");
/// ```
pub struct DisplayClient<S: RenderSurface> {
    connection: Arc<ConnectionManager>,
    controller: PlaybackController<S>,
    reporter: EventReporter,
    codec: MessageCodec,
    control_rx: mpsc::Receiver<ControlSignal>,
    surface_rx: mpsc::Receiver<SurfaceEvent>,
}

impl<S: RenderSurface> DisplayClient<S> {
    /// Build a client from settings, a rendering surface, and the channel
    /// the surface host reports end-of-media notices on.
    pub fn new(settings: &Settings, surface: S, surface_rx: mpsc::Receiver<SurfaceEvent>) -> Self {
        let connection = Arc::new(ConnectionManager::new(
            settings.monitor_url(),
            settings.backoff_policy(),
            settings.frame_buffer_capacity,
            settings.outbound_buffer_capacity,
        ));
        let codec = MessageCodec::new(settings.legacy_single_video);
        let (control_tx, control_rx) = mpsc::channel(16);
        let controller =
            PlaybackController::new(surface, control_tx, settings.event_buffer_capacity);
        let reporter = EventReporter::new(connection.clone(), codec.clone());

        Self {
            connection,
            controller,
            reporter,
            codec,
            control_rx,
            surface_rx,
        }
    }

    /// Handle to the connection manager, e.g. to `close()` the client from
    /// another task.
    pub fn connection(&self) -> Arc<ConnectionManager> {
        self.connection.clone()
    }

    /// Subscribe to the lifecycle events the controller produces (the same
    /// stream the Monitor receives).
    pub fn event_receiver(&self) -> broadcast::Receiver<DisplayEvent> {
        self.controller.event_receiver()
    }

    /// Open the channel and run the dispatch loop until the connection is
    /// permanently closed.
    ///
    /// All playback transitions execute on this one loop — inbound commands,
    /// image timer fires, and surface end-of-media notices are serialized
    /// here in arrival order, so controller logic never runs reentrantly.
    pub async fn run(mut self) -> Result<(), DisplayError> {
        // Subscribe before opening so frames arriving right after the
        // handshake cannot be missed.
        let mut frames = self.connection.frame_receiver();
        let mut states = self.connection.state_receiver();
        let mut events = self.controller.event_receiver();

        self.connection.open().await;

        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let phase = *states.borrow_and_update();
                    match phase {
                        ConnectionPhase::Connected => {
                            info!("connected to monitor, announcing ready");
                            self.reporter.emit(&DisplayEvent::Ready).await;
                        }
                        ConnectionPhase::Closed => {
                            info!("channel closed, stopping client");
                            break;
                        }
                        _ => {}
                    }
                }

                frame = frames.recv() => match frame {
                    Ok(frame) => {
                        if let Some(command) = self.codec.decode(&frame) {
                            self.controller.handle_command(command);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dropped inbound frames, dispatch loop lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                Some(signal) = self.control_rx.recv() => {
                    self.controller.handle_control(signal);
                }

                notice = self.surface_rx.recv() => match notice {
                    Some(SurfaceEvent::MediaEnded { src }) => {
                        self.controller.handle_media_ended(&src);
                    }
                    None => {
                        error!("surface host dropped its notification channel");
                        return Err(DisplayError::SurfaceClosed);
                    }
                },

                event = events.recv() => match event {
                    Ok(event) => self.reporter.emit(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dropped lifecycle events, dispatch loop lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        Ok(())
    }
}
