use serde_json::json;

use monitor_display_rs::{MediaKind, PlaylistItem};

#[test]
fn test_video_item_deserialization() {
    let item: PlaylistItem =
        serde_json::from_value(json!({"video": "../assets/intro.webm", "loop": 2})).unwrap();
    assert_eq!(item, PlaylistItem::video("../assets/intro.webm", 2));
    assert_eq!(item.src(), Some("../assets/intro.webm"));
    assert_eq!(item.kind(), Some(MediaKind::Video));
}

#[test]
fn test_image_item_deserialization() {
    let item: PlaylistItem =
        serde_json::from_value(json!({"image": "../assets/slide.jpeg", "loop": 3})).unwrap();
    assert_eq!(item, PlaylistItem::image("../assets/slide.jpeg", 3));
    assert_eq!(item.kind(), Some(MediaKind::Image));
}

#[test]
fn test_infinite_sentinel_is_preserved() {
    let item: PlaylistItem =
        serde_json::from_value(json!({"video": "idle.webm", "loop": -1})).unwrap();
    assert_eq!(item, PlaylistItem::video("idle.webm", -1));
}

// Monitors attach window geometry to items; the decoder must tolerate it.
#[test]
fn test_extra_geometry_fields_are_ignored() {
    let item: PlaylistItem = serde_json::from_value(json!({
        "video": "v.webm",
        "loop": 1,
        "left": 1200,
        "top": 700,
        "width": 100,
        "height": 300
    }))
    .unwrap();
    assert_eq!(item, PlaylistItem::video("v.webm", 1));
}

#[test]
fn test_missing_loop_defaults_to_one() {
    let item: PlaylistItem = serde_json::from_value(json!({"video": "v.webm"})).unwrap();
    assert_eq!(item, PlaylistItem::video("v.webm", 1));

    let item: PlaylistItem = serde_json::from_value(json!({"image": "i.png"})).unwrap();
    assert_eq!(item, PlaylistItem::image("i.png", 1));
}

// An item carrying both fields resolves as an image, matching the order the
// fields are inspected in.
#[test]
fn test_item_with_both_fields_resolves_as_image() {
    let item: PlaylistItem =
        serde_json::from_value(json!({"image": "i.png", "video": "v.webm", "loop": 1})).unwrap();
    assert_eq!(item.kind(), Some(MediaKind::Image));
}

#[test]
fn test_unrecognized_item_decodes_as_unknown() {
    let raw = json!({"audio": "song.mp3", "loop": 1});
    let item: PlaylistItem = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(item, PlaylistItem::Unknown(raw));
    assert_eq!(item.src(), None);
    assert_eq!(item.kind(), None);
}

#[test]
fn test_item_round_trip() {
    let items = vec![
        PlaylistItem::video("a.webm", 2),
        PlaylistItem::image("b.png", 3),
        PlaylistItem::video("c.webm", -1),
    ];
    for item in items {
        let encoded = serde_json::to_string(&item).unwrap();
        let decoded: PlaylistItem = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, item);
    }
}

#[test]
fn test_media_kind_wire_form() {
    assert_eq!(serde_json::to_string(&MediaKind::Video).unwrap(), "\"video\"");
    assert_eq!(serde_json::to_string(&MediaKind::Image).unwrap(), "\"image\"");
    assert_eq!(MediaKind::Video.as_str(), "video");
}
