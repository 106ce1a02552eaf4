use std::time::Duration;

use tokio::time::Instant;

use crate::models::PlaylistItem;

/// The live playback position. At most one session exists at a time, owned
/// exclusively by the playback controller; no session means the controller
/// is idle.
#[derive(Debug)]
pub(crate) struct PlaybackSession {
    pub(crate) playlist: Vec<PlaylistItem>,
    pub(crate) current_index: usize,
    pub(crate) progress: ItemProgress,
}

/// Per-item progress of the active playlist entry.
#[derive(Debug)]
pub(crate) enum ItemProgress {
    /// Between items: nothing active yet.
    Pending,
    /// Finite video: plays once per end-of-media notification until the
    /// counter runs out.
    VideoFinite { remaining_loops: i32 },
    /// Infinite video: the surface auto-repeats, no completion ever.
    VideoInfinite,
    /// Timed image: `remaining` is the unserved display time of the current
    /// leg; `started_at` is `None` while paused.
    ImageTimed {
        remaining: Duration,
        started_at: Option<Instant>,
    },
    /// Infinite image: displayed until preempted.
    ImageInfinite,
}

impl PlaybackSession {
    pub(crate) fn new(playlist: Vec<PlaylistItem>) -> Self {
        Self {
            playlist,
            current_index: 0,
            progress: ItemProgress::Pending,
        }
    }

    pub(crate) fn item(&self) -> Option<&PlaylistItem> {
        self.playlist.get(self.current_index)
    }

    /// Asset path of the active item, if any.
    pub(crate) fn active_src(&self) -> Option<&str> {
        self.item().and_then(PlaylistItem::src)
    }
}
