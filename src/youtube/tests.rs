use super::*;
use crate::ScraperError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> YoutubeClient {
    let config = YoutubeConfig {
        api_url: format!("{}/youtube/v3", server.uri()),
        timeout_secs: None,
    };
    let api_key =
        ApiKey::from_lookup(|_| Some("test-key".to_string())).expect("should build api key");
    YoutubeClient::new(&config, api_key).expect("should create client")
}

fn video_item(title: &str) -> serde_json::Value {
    json!({
        "kind": "youtube#video",
        "snippet": {
            "title": title,
            "description": "description",
            "channelTitle": "channel",
            "publishedAt": "2024-03-01T12:00:00Z",
            "tags": ["lofi", "beats"],
            "categoryId": "10"
        },
        "contentDetails": { "duration": "PT3M20S" },
        "statistics": { "viewCount": "1200", "likeCount": "40", "commentCount": "7" }
    })
}

#[tokio::test]
async fn search_sends_expected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("part", "id,snippet"))
        .and(query_param("q", "lofi hip hop"))
        .and(query_param("type", "video"))
        .and(query_param("maxResults", "2"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "kind": "youtube#video", "videoId": "abc" } },
                { "id": { "kind": "youtube#video", "videoId": "def" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = test_client(&server)
        .search("lofi hip hop", 2)
        .await
        .expect("search should succeed");

    assert_eq!(
        hits,
        vec![
            SearchHit {
                video_id: "abc".to_string(),
                kind: VIDEO_KIND.to_string(),
            },
            SearchHit {
                video_id: "def".to_string(),
                kind: VIDEO_KIND.to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn search_keeps_other_kinds_for_the_caller_to_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "kind": "youtube#channel", "channelId": "UC123" } },
                { "id": { "kind": "youtube#video", "videoId": "abc" } }
            ]
        })))
        .mount(&server)
        .await;

    let hits = test_client(&server)
        .search("lofi", 10)
        .await
        .expect("search should succeed");

    assert_eq!(hits.len(), 2);
    assert!(!hits[0].is_video());
    assert_eq!(hits[0].video_id, "UC123");
    assert!(hits[1].is_video());
}

#[tokio::test]
async fn search_drops_other_kinds_without_an_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "kind": "youtube#playlist" } },
                { "id": { "kind": "youtube#video", "videoId": "abc" } }
            ]
        })))
        .mount(&server)
        .await;

    let hits = test_client(&server)
        .search("lofi", 10)
        .await
        .expect("search should succeed");

    assert_eq!(
        hits,
        vec![SearchHit {
            video_id: "abc".to_string(),
            kind: VIDEO_KIND.to_string(),
        }]
    );
}

#[tokio::test]
async fn search_rejects_video_item_without_video_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": { "kind": "youtube#video" } }]
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .search("lofi", 10)
        .await
        .expect_err("video without id should fail the search");
    assert!(err.to_string().contains("no videoId"), "message: {err}");
}

#[tokio::test]
async fn configured_timeout_fails_slow_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = YoutubeConfig {
        api_url: format!("{}/youtube/v3", server.uri()),
        timeout_secs: Some(1),
    };
    let api_key =
        ApiKey::from_lookup(|_| Some("test-key".to_string())).expect("should build api key");
    let client = YoutubeClient::new(&config, api_key).expect("should create client");

    let err = client
        .search("lofi", 5)
        .await
        .expect_err("slow response should time out");
    assert!(matches!(err, ScraperError::Upstream(_)), "got {err:?}");
}

#[test]
fn zero_timeout_is_rejected() {
    let config = YoutubeConfig {
        timeout_secs: Some(0),
        ..YoutubeConfig::default()
    };
    let api_key =
        ApiKey::from_lookup(|_| Some("test-key".to_string())).expect("should build api key");

    assert!(matches!(
        YoutubeClient::new(&config, api_key),
        Err(ConfigError::InvalidTimeout(0))
    ));
}

#[tokio::test]
async fn search_without_items_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "youtube#searchListResponse" })))
        .mount(&server)
        .await;

    let hits = test_client(&server)
        .search("nothing", 5)
        .await
        .expect("search should succeed");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn search_surfaces_api_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota."
            }
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .search("lofi", 5)
        .await
        .expect_err("quota error should fail the search");

    match err {
        ScraperError::Upstream(message) => {
            assert!(message.contains("exceeded your quota"), "message: {message}");
            assert!(!message.contains("test-key"), "api key leaked: {message}");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn search_reports_status_without_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .search("lofi", 5)
        .await
        .expect_err("gateway error should fail the search");
    assert!(err.to_string().contains("HTTP 502"), "message: {err}");
}

#[tokio::test]
async fn details_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/videos"))
        .and(query_param("part", "snippet,contentDetails,statistics"))
        .and(query_param("id", "abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "items": [video_item("First")] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let lookup = test_client(&server)
        .video_details("abc")
        .await
        .expect("details should succeed");

    let DetailsLookup::Found(video) = lookup else {
        panic!("expected a video, got {lookup:?}");
    };
    assert_eq!(video.snippet.title, "First");
    assert_eq!(video.content_details.duration, "PT3M20S");
    assert_eq!(video.statistics.view_count, 1200);
    assert_eq!(video.statistics.comment_count, 7);
}

#[tokio::test]
async fn details_with_no_items_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let lookup = test_client(&server)
        .video_details("gone")
        .await
        .expect("empty details is not an error");
    assert_eq!(lookup, DetailsLookup::Missing);
}

#[tokio::test]
async fn details_missing_required_field_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "snippet": { "title": "no description" },
                "contentDetails": { "duration": "PT1M" }
            }]
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .video_details("broken")
        .await
        .expect_err("malformed payload should fail");
    assert!(err.to_string().contains("Failed to parse videos response"));
}

#[test]
fn statistics_accept_numbers_strings_and_absence() {
    let video: RawVideo = serde_json::from_value(json!({
        "snippet": {
            "title": "t",
            "description": "d",
            "channelTitle": "c",
            "publishedAt": "2024-01-01T00:00:00Z"
        },
        "contentDetails": { "duration": "PT1S" },
        "statistics": { "viewCount": 15, "likeCount": "3" }
    }))
    .expect("should parse video");

    assert_eq!(video.statistics.view_count, 15);
    assert_eq!(video.statistics.like_count, 3);
    assert_eq!(video.statistics.comment_count, 0);
    assert!(video.snippet.tags.is_empty());
    assert_eq!(video.snippet.category_id, None);
}
