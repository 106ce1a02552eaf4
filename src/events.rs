use serde::{Deserialize, Serialize};

use crate::models::MediaKind;

/// Lifecycle events reported back to the Monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum DisplayEvent {
    /// The display is connected and ready for commands. Emitted on every
    /// successful (re)connection.
    Ready,
    /// An item began rendering.
    Started(ItemEvent),
    /// An item finished its configured repeats/duration. Never emitted for
    /// infinite items, nor for items skipped with a zero sentinel.
    Finished(ItemEvent),
}

/// Body shared by `started`/`finished`: which item, where in the playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvent {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub src: String,
    pub index: usize,
}

impl DisplayEvent {
    pub fn started(kind: MediaKind, src: impl Into<String>, index: usize) -> Self {
        DisplayEvent::Started(ItemEvent {
            kind,
            src: src.into(),
            index,
        })
    }

    pub fn finished(kind: MediaKind, src: impl Into<String>, index: usize) -> Self {
        DisplayEvent::Finished(ItemEvent {
            kind,
            src: src.into(),
            index,
        })
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DisplayEvent::Ready => "ready",
            DisplayEvent::Started(_) => "started",
            DisplayEvent::Finished(_) => "finished",
        }
    }
}
