// Wire codec for the Monitor protocol: one JSON object per WebSocket
// message, no framing beyond that.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::commands::MonitorCommand;
use crate::connection::Frame;
use crate::error::DisplayError;
use crate::events::DisplayEvent;
use crate::models::{MediaKind, PlaylistItem};

/// Decodes inbound frames into [`MonitorCommand`]s and serializes
/// [`DisplayEvent`]s to the wire format.
///
/// Decoding never fails hard: malformed payloads are logged and dropped so
/// the playback state machine is untouched. With `legacy_single_video` set
/// the codec also accepts the first-generation single-video command schema
/// and emits video `finished` events in its legacy shape.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    legacy_single_video: bool,
}

impl MessageCodec {
    pub fn new(legacy_single_video: bool) -> Self {
        Self {
            legacy_single_video,
        }
    }

    /// Decode one inbound frame. Binary frames are UTF-8 decoded first.
    /// Returns `None` for anything that is not a recognizable command.
    pub fn decode(&self, frame: &Frame) -> Option<MonitorCommand> {
        let text = match frame {
            Frame::Text(text) => text.as_str(),
            Frame::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "dropping binary frame with invalid UTF-8");
                    return None;
                }
            },
        };

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, payload = %text, "dropping non-JSON frame");
                return None;
            }
        };

        match value.get("tasks").and_then(Value::as_str) {
            Some("playlist") | Some("pause") | Some("play") => {
                match serde_json::from_value::<MonitorCommand>(value) {
                    Ok(command) => {
                        debug!(command = command.name(), "decoded monitor command");
                        Some(command)
                    }
                    Err(err) => {
                        warn!(error = %err, "dropping malformed monitor command");
                        None
                    }
                }
            }
            Some(other) => {
                warn!(tasks = other, "unknown command task, ignoring");
                None
            }
            None if self.legacy_single_video => self.decode_legacy(&value),
            None => {
                warn!(payload = %text, "frame carries no tasks field, ignoring");
                None
            }
        }
    }

    /// Map the first-generation single-video schema onto the playlist
    /// vocabulary: `play` becomes a one-item playlist, `idle` an infinite
    /// one, `stop`/`pause` clear playback.
    fn decode_legacy(&self, value: &Value) -> Option<MonitorCommand> {
        let command = match value.get("command").and_then(Value::as_str) {
            Some(command) => command,
            None => {
                warn!("legacy frame carries no command field, ignoring");
                return None;
            }
        };

        match command {
            "play" => {
                let uri = value.get("uri").and_then(Value::as_str)?;
                let looping = value
                    .get("loop")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let loop_count = if looping { -1 } else { 1 };
                Some(MonitorCommand::Playlist {
                    playlist: vec![PlaylistItem::video(uri, loop_count)],
                })
            }
            "idle" => {
                let video = value.get("video").and_then(Value::as_str)?;
                Some(MonitorCommand::Playlist {
                    playlist: vec![PlaylistItem::video(video, -1)],
                })
            }
            // The legacy client unloaded the asset for both, so both map to
            // a cleared playlist.
            "stop" | "pause" => Some(MonitorCommand::Playlist { playlist: vec![] }),
            other => {
                warn!(command = other, "unknown legacy command, ignoring");
                None
            }
        }
    }

    /// Serialize an outbound event to one text frame.
    pub fn encode(&self, event: &DisplayEvent) -> Result<String, DisplayError> {
        if self.legacy_single_video {
            if let DisplayEvent::Finished(item) = event {
                if item.kind == MediaKind::Video {
                    let legacy = json!({
                        "event": "finished",
                        "video": item.src,
                        "page": Value::Null,
                    });
                    return serde_json::to_string(&legacy).map_err(DisplayError::ParseFailed);
                }
            }
        }
        serde_json::to_string(event).map_err(DisplayError::ParseFailed)
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(false)
    }
}
