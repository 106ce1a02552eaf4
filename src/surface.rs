use crate::error::DisplayError;

/// The rendering surface the playback controller drives: one video element
/// and one image element, exclusively owned by the controller.
///
/// Implementations are provided by the window host (whatever actually puts
/// pixels on screen). The contract mirrors a media element:
///
/// - `show_video` loads `src` from position zero and starts playback; with
///   `auto_repeat` the surface loops the asset itself and must not report an
///   end of media.
/// - `stop_video` halts playback and unloads the asset; no end-of-media
///   notification may be delivered for an unloaded asset.
/// - End of media is reported out of band as
///   [`SurfaceEvent::MediaEnded`] on the channel the host handed to
///   [`DisplayClient::new`](crate::DisplayClient::new), carrying the `src`
///   that ended.
pub trait RenderSurface: Send + 'static {
    /// Load and play a video. Errors mean the surface could not start
    /// playback; the controller logs them and stalls on the item.
    fn show_video(&mut self, src: &str, auto_repeat: bool) -> Result<(), DisplayError>;

    /// Seek the loaded video back to position zero and play it again.
    fn restart_video(&mut self) -> Result<(), DisplayError>;

    fn pause_video(&mut self);

    fn resume_video(&mut self) -> Result<(), DisplayError>;

    /// Stop and unload the video.
    fn stop_video(&mut self);

    fn show_image(&mut self, src: &str);

    fn clear_image(&mut self);

    /// Playback volume, 0.0..=1.0.
    fn set_volume(&mut self, volume: f64);
}

/// Notifications flowing from the surface host back into the client loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The loaded video reached its natural end of media.
    MediaEnded { src: String },
}
