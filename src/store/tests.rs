use super::*;
use serde_json::json;

fn record() -> VideoRecord {
    VideoRecord {
        video_id: "abc".to_string(),
        url: "https://www.youtube.com/watch?v=abc".to_string(),
        title: "Title".to_string(),
        description: "Description".to_string(),
        channel: "Channel".to_string(),
        tags: vec!["tag".to_string()],
        category: None,
        published: "2024-01-01T00:00:00Z".to_string(),
        duration: "PT1M".to_string(),
        views: 1,
        likes: 2,
        comments: 3,
    }
}

#[test]
fn entry_is_keyed_by_video_id() {
    let entry = EmbeddingEntry::new(vec![0.1, 0.2, 0.3], record());

    assert_eq!(entry.id, "abc");
    assert_eq!(entry.vector.len(), 3);
    assert_eq!(entry.metadata.title, "Title");
}

#[test]
fn similar_video_serialization() {
    let similar = SimilarVideo {
        record: record(),
        distance: 0.5,
    };

    let value = serde_json::to_value(&similar).expect("should serialize");
    assert_eq!(value["Video URL"], json!("https://www.youtube.com/watch?v=abc"));
    assert_eq!(value["Distance"], json!(0.5));
    assert!(value.get("video_id").is_none());
}
