use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::commands::MonitorCommand;
use crate::events::DisplayEvent;
use crate::models::{MediaKind, PlaylistItem};
use crate::session::{ItemProgress, PlaybackSession};
use crate::surface::RenderSurface;

/// Internal signals routed back into the controller through the client's
/// dispatch loop. Timer tasks produce these; the epoch stamps let the
/// controller discard fires scheduled for an item that has since been
/// preempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    ImageElapsed { epoch: u64 },
}

/// The playlist sequencer and per-item state machine.
///
/// All methods run on the client's single dispatch loop, so no two
/// transitions ever execute concurrently. Every transition fully invalidates
/// the previous item's resources (surface stop, timer cancel) before
/// installing new ones, which keeps stale completion callbacks from ever
/// advancing the session: image timers carry an epoch that must still be
/// current when the fire is processed, and end-of-media notices must match
/// the active item's src.
///
/// Lifecycle events are published on a broadcast channel; the client loop
/// forwards them to the Monitor through the event reporter.
pub struct PlaybackController<S: RenderSurface> {
    surface: S,
    event_tx: broadcast::Sender<DisplayEvent>,
    control_tx: mpsc::Sender<ControlSignal>,
    session: Option<PlaybackSession>,
    paused: bool,
    timer_epoch: u64,
    image_timer: Option<tokio::task::JoinHandle<()>>,
}

impl<S: RenderSurface> PlaybackController<S> {
    pub fn new(surface: S, control_tx: mpsc::Sender<ControlSignal>, event_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            surface,
            event_tx,
            control_tx,
            session: None,
            paused: false,
            timer_epoch: 0,
            image_timer: None,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn event_receiver(&self) -> broadcast::Receiver<DisplayEvent> {
        self.event_tx.subscribe()
    }

    /// No playlist installed and nothing active.
    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Index of the active item, if a session is live.
    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.current_index)
    }

    /// Single entry point for decoded Monitor commands.
    pub fn handle_command(&mut self, command: MonitorCommand) {
        debug!(command = command.name(), "handling monitor command");
        match command {
            MonitorCommand::Playlist { playlist } => self.install_playlist(playlist),
            MonitorCommand::Pause => self.pause(),
            MonitorCommand::Play => self.resume(),
        }
    }

    /// Replace whatever is playing with a new playlist, synchronously. An
    /// empty list settles the machine in idle.
    fn install_playlist(&mut self, items: Vec<PlaylistItem>) {
        info!(items = items.len(), "installing new playlist");
        self.invalidate_active_item();
        self.session = None;
        self.paused = false;

        if items.is_empty() {
            debug!("empty playlist, settling idle");
            return;
        }

        self.session = Some(PlaybackSession::new(items));
        self.start_item(0);
    }

    /// Tear down the active item: cancel its timer and release the surface.
    /// Always runs before a new item starts, so two completion callbacks can
    /// never race each other into advancing the session.
    fn invalidate_active_item(&mut self) {
        self.cancel_image_timer();
        self.surface.stop_video();
        self.surface.clear_image();
        if let Some(session) = self.session.as_mut() {
            session.progress = ItemProgress::Pending;
        }
    }

    fn cancel_image_timer(&mut self) {
        self.timer_epoch = self.timer_epoch.wrapping_add(1);
        if let Some(handle) = self.image_timer.take() {
            handle.abort();
        }
    }

    fn schedule_image_timer(&mut self, delay: Duration) {
        let epoch = self.timer_epoch;
        let tx = self.control_tx.clone();
        self.image_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControlSignal::ImageElapsed { epoch }).await;
        }));
    }

    fn start_item(&mut self, index: usize) {
        self.invalidate_active_item();

        let item = match self.session.as_ref().and_then(|s| s.playlist.get(index)) {
            Some(item) => item.clone(),
            None => return,
        };
        if let Some(session) = self.session.as_mut() {
            session.current_index = index;
        }

        match item {
            PlaylistItem::Image {
                image,
                display_secs,
            } => self.start_image(index, image, display_secs),
            PlaylistItem::Video { video, loop_count } => {
                self.start_video(index, video, loop_count)
            }
            PlaylistItem::Unknown(raw) => {
                warn!(item = %raw, "playlist item is neither video nor image, skipping");
                self.advance(index + 1);
            }
        }
    }

    fn start_video(&mut self, index: usize, src: String, loop_count: i32) {
        if loop_count == 0 {
            debug!(%src, "video item with zero repeats, skipping");
            self.advance(index + 1);
            return;
        }

        let auto_repeat = loop_count == -1;
        let progress = if auto_repeat {
            ItemProgress::VideoInfinite
        } else {
            ItemProgress::VideoFinite {
                remaining_loops: loop_count.max(1),
            }
        };
        if let Some(session) = self.session.as_mut() {
            session.progress = progress;
        }

        info!(%src, index, loop_count, "starting video item");
        self.surface.set_volume(1.0);
        if let Err(err) = self.surface.show_video(&src, auto_repeat) {
            // No retry and no skip: playback stalls on this item until the
            // Monitor sends a new command.
            error!(%src, error = %err, "surface failed to start video");
        }
        self.emit(DisplayEvent::started(MediaKind::Video, src, index));
    }

    fn start_image(&mut self, index: usize, src: String, display_secs: i32) {
        if display_secs == 0 {
            debug!(%src, "image item with zero duration, skipping");
            self.advance(index + 1);
            return;
        }

        info!(%src, index, display_secs, "starting image item");
        self.surface.show_image(&src);

        if display_secs == -1 {
            if let Some(session) = self.session.as_mut() {
                session.progress = ItemProgress::ImageInfinite;
            }
        } else {
            let remaining = Duration::from_secs(display_secs.max(1) as u64);
            if let Some(session) = self.session.as_mut() {
                session.progress = ItemProgress::ImageTimed {
                    remaining,
                    started_at: Some(Instant::now()),
                };
            }
            self.schedule_image_timer(remaining);
        }
        self.emit(DisplayEvent::started(MediaKind::Image, src, index));
    }

    /// Move to `index`, or settle in idle when the playlist is exhausted.
    fn advance(&mut self, index: usize) {
        let len = match self.session.as_ref() {
            Some(session) => session.playlist.len(),
            None => return,
        };

        if index >= len {
            debug!("playlist exhausted, settling idle");
            self.invalidate_active_item();
            self.session = None;
        } else {
            self.start_item(index);
        }
    }

    /// React to a natural end of media reported by the surface. `src` must
    /// match the active item; anything else is a stale notice and ignored.
    pub fn handle_media_ended(&mut self, src: &str) {
        enum Outcome {
            Restart,
            Finished { src: String, index: usize },
            Ignore,
        }

        let outcome = match self.session.as_mut() {
            None => Outcome::Ignore,
            Some(session) => {
                if session.active_src() != Some(src) {
                    debug!(%src, "end of media for inactive asset, ignoring");
                    Outcome::Ignore
                } else {
                    match &mut session.progress {
                        // The surface repeats infinite videos itself; if a
                        // notice slips through anyway, just play it again.
                        ItemProgress::VideoInfinite => Outcome::Restart,
                        ItemProgress::VideoFinite { remaining_loops } => {
                            *remaining_loops -= 1;
                            if *remaining_loops > 0 {
                                Outcome::Restart
                            } else {
                                Outcome::Finished {
                                    src: src.to_owned(),
                                    index: session.current_index,
                                }
                            }
                        }
                        _ => {
                            trace!(%src, "end of media while no video active, ignoring");
                            Outcome::Ignore
                        }
                    }
                }
            }
        };

        match outcome {
            Outcome::Restart => {
                if let Err(err) = self.surface.restart_video() {
                    error!(error = %err, "surface failed to restart video");
                }
            }
            Outcome::Finished { src, index } => {
                debug!(%src, index, "video item completed its repeats");
                self.emit(DisplayEvent::finished(MediaKind::Video, src, index));
                self.advance(index + 1);
            }
            Outcome::Ignore => {}
        }
    }

    /// React to an image display timer firing.
    pub fn handle_control(&mut self, signal: ControlSignal) {
        match signal {
            ControlSignal::ImageElapsed { epoch } => {
                if epoch != self.timer_epoch {
                    trace!(epoch, "stale image timer fire, ignoring");
                    return;
                }
                self.image_timer = None;

                let finished = match self.session.as_ref() {
                    Some(session) => match (&session.progress, session.item()) {
                        (
                            ItemProgress::ImageTimed { .. },
                            Some(PlaylistItem::Image { image, .. }),
                        ) => Some((image.clone(), session.current_index)),
                        _ => None,
                    },
                    None => None,
                };

                if let Some((src, index)) = finished {
                    debug!(%src, index, "image display time elapsed");
                    self.emit(DisplayEvent::finished(MediaKind::Image, src, index));
                    self.advance(index + 1);
                }
            }
        }
    }

    /// Freeze playback. Idempotent: a second pause leaves the recorded
    /// remaining time untouched.
    fn pause(&mut self) {
        if self.paused {
            debug!("pause ignored, playback already paused");
            return;
        }
        self.paused = true;

        let mut pause_video = false;
        let mut suspend_timer = false;
        if let Some(session) = self.session.as_mut() {
            match &mut session.progress {
                ItemProgress::VideoFinite { .. } | ItemProgress::VideoInfinite => {
                    pause_video = true;
                }
                ItemProgress::ImageTimed {
                    remaining,
                    started_at,
                } => {
                    if let Some(started) = started_at.take() {
                        *remaining = remaining.saturating_sub(started.elapsed());
                        suspend_timer = true;
                    }
                }
                ItemProgress::ImageInfinite | ItemProgress::Pending => {}
            }
        }

        if pause_video {
            self.surface.pause_video();
        }
        if suspend_timer {
            self.cancel_image_timer();
        }
        info!("playback paused");
    }

    /// Resume from a pause. Idempotent: a resume while playing does nothing.
    fn resume(&mut self) {
        if !self.paused {
            debug!("resume ignored, playback not paused");
            return;
        }
        self.paused = false;

        let mut resume_video = false;
        let mut reschedule = None;
        if let Some(session) = self.session.as_mut() {
            match &mut session.progress {
                ItemProgress::VideoFinite { .. } | ItemProgress::VideoInfinite => {
                    resume_video = true;
                }
                ItemProgress::ImageTimed {
                    remaining,
                    started_at,
                } => {
                    *started_at = Some(Instant::now());
                    reschedule = Some(*remaining);
                }
                ItemProgress::ImageInfinite | ItemProgress::Pending => {}
            }
        }

        if resume_video {
            if let Err(err) = self.surface.resume_video() {
                error!(error = %err, "surface failed to resume video");
            }
        }
        if let Some(delay) = reschedule {
            self.schedule_image_timer(delay);
        }
        info!("playback resumed");
    }

    fn emit(&self, event: DisplayEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl<S: RenderSurface> Drop for PlaybackController<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.image_timer.take() {
            handle.abort();
        }
    }
}
