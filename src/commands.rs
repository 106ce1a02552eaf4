use serde::{Deserialize, Serialize};

use crate::models::PlaylistItem;

/// Transport commands pushed by the Monitor. The wire form is one JSON
/// object per message, discriminated by the `tasks` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tasks", rename_all = "lowercase")]
pub enum MonitorCommand {
    /// Replace the current playlist and start from item 0. An empty list
    /// clears playback entirely.
    Playlist {
        #[serde(default)]
        playlist: Vec<PlaylistItem>,
    },
    /// Freeze playback in place (video paused, image timer suspended).
    Pause,
    /// Resume from wherever `pause` left off.
    Play,
}

impl MonitorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorCommand::Playlist { .. } => "playlist",
            MonitorCommand::Pause => "pause",
            MonitorCommand::Play => "play",
        }
    }
}
