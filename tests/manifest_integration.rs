//! Integration tests for manifest resolution against a mock video API.

mod support;

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use course_downloader::{
    ApiError, AuthContext, CatalogClient, ManifestResolver, Platform, Quality, ResolveError,
};
use support::TOKEN;
use support::socket_guard::start_mock_server_or_skip;

fn resolver(server: &MockServer, quality: Quality) -> ManifestResolver {
    let platform = Platform::new(&server.uri(), &server.uri()).unwrap();
    let auth = AuthContext::new(&platform, TOKEN).unwrap();
    let client = CatalogClient::new(platform, &auth).unwrap();
    ManifestResolver::new(Arc::new(client), quality)
}

async fn mount_source(server: &MockServer, hash: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/video/{hash}/source")))
        .and(query_param("f", "m3u8"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolve_every_quality() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_source(
        &server,
        "abc",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": "https://cdn.example.com/hls/abc/index.m3u8?token=t"
        })),
    )
    .await;

    for quality in Quality::ALL {
        let url = resolver(&server, quality).resolve("abc").await.unwrap();
        assert_eq!(
            url.as_str(),
            format!("https://cdn.example.com/hls/abc/{}.m3u8?token=t", quality.rendition())
        );
    }
}

#[tokio::test]
async fn test_resolve_http_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_source(&server, "gone", ResponseTemplate::new(404)).await;

    let err = resolver(&server, Quality::P1080).resolve("gone").await.unwrap_err();
    match err {
        ResolveError::Api { lesson_hash, source } => {
            assert_eq!(lesson_hash, "gone");
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_missing_or_empty_url() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_source(&server, "nourl", ResponseTemplate::new(200).set_body_json(serde_json::json!({}))).await;
    mount_source(
        &server,
        "empty",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "url": "" })),
    )
    .await;

    let resolver = resolver(&server, Quality::P720);
    for hash in ["nourl", "empty"] {
        let err = resolver.resolve(hash).await.unwrap_err();
        assert!(matches!(err, ResolveError::MissingUrl { .. }), "{hash}: {err:?}");
    }
}

#[tokio::test]
async fn test_resolve_malformed_body_and_url() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_source(&server, "html", ResponseTemplate::new(200).set_body_string("<html>")).await;
    mount_source(
        &server,
        "relative",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "url": "hls/index.m3u8" })),
    )
    .await;

    let resolver = resolver(&server, Quality::P360);

    let err = resolver.resolve("html").await.unwrap_err();
    assert!(matches!(err, ResolveError::Api { source: ApiError::Decode { .. }, .. }));

    let err = resolver.resolve("relative").await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidUrl { .. }));
}
