use serde::{Deserialize, Serialize};

/// Kind of media an item renders. Serialized lowercase on the wire
/// (`"type": "video"` / `"type": "image"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// One entry of a Monitor playlist, resolved into a tagged variant at decode
/// time instead of re-inspecting duck-typed fields at each use site.
///
/// The `loop` value shares one sentinel convention across both kinds:
/// `-1` = infinite, `0` = skip this item, `n > 0` = finite repeats (video)
/// or display seconds (image). A missing `loop` defaults to 1.
///
/// Monitors may attach extra geometry fields (`left`, `top`, `width`,
/// `height`) to items; those are accepted and ignored. An object carrying
/// neither an `image` nor a `video` field decodes as [`Unknown`] and is
/// skipped by the playback controller.
///
/// [`Unknown`]: PlaylistItem::Unknown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaylistItem {
    // Image first: items carrying both fields resolve as images.
    Image {
        image: String,
        #[serde(rename = "loop", default = "default_loop")]
        display_secs: i32,
    },
    Video {
        video: String,
        #[serde(rename = "loop", default = "default_loop")]
        loop_count: i32,
    },
    Unknown(serde_json::Value),
}

fn default_loop() -> i32 {
    1
}

impl PlaylistItem {
    pub fn video(src: impl Into<String>, loop_count: i32) -> Self {
        PlaylistItem::Video {
            video: src.into(),
            loop_count,
        }
    }

    pub fn image(src: impl Into<String>, display_secs: i32) -> Self {
        PlaylistItem::Image {
            image: src.into(),
            display_secs,
        }
    }

    /// Asset path of the item, if it has one.
    pub fn src(&self) -> Option<&str> {
        match self {
            PlaylistItem::Video { video, .. } => Some(video),
            PlaylistItem::Image { image, .. } => Some(image),
            PlaylistItem::Unknown(_) => None,
        }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            PlaylistItem::Video { .. } => Some(MediaKind::Video),
            PlaylistItem::Image { .. } => Some(MediaKind::Image),
            PlaylistItem::Unknown(_) => None,
        }
    }
}
