//! Integration tests for the authentication cookie on real HTTP requests.

mod support;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use course_downloader::{AuthContext, CatalogClient, Platform};
use support::socket_guard::start_mock_server_or_skip;
use support::{SLUG, TOKEN, mount_course};

fn platform_for(uri: &str) -> Platform {
    Platform::new(uri, uri).unwrap()
}

#[tokio::test]
async fn test_api_requests_carry_cookie_origin_and_referer() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let origin = server.uri();

    Mock::given(method("GET"))
        .and(path(format!("/courses/{SLUG}")))
        .and(header("cookie", format!("fem_auth_mod={TOKEN}").as_str()))
        .and(header("origin", origin.as_str()))
        .and(header("referer", format!("{origin}/").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "Rust",
            "lessonData": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let platform = platform_for(&origin);
    let auth = AuthContext::new(&platform, TOKEN).unwrap();
    let client = CatalogClient::new(platform, &auth).unwrap();

    let course = client.fetch_course(SLUG).await.unwrap();
    assert_eq!(course.title, "Rust");
}

#[tokio::test]
async fn test_set_cookie_from_api_refreshes_shared_jar() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(format!("/courses/{SLUG}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "fem_auth_mod=rotated-token; Path=/")
                .set_body_json(serde_json::json!({ "title": "Rust" })),
        )
        .mount(&server)
        .await;

    let platform = platform_for(&server.uri());
    let auth = AuthContext::new(&platform, TOKEN).unwrap();
    let client = CatalogClient::new(platform, &auth).unwrap();
    client.fetch_course(SLUG).await.unwrap();

    // The header snapshot for a later remux sees the refreshed value.
    let manifest = url::Url::parse(&format!("{}/hls/h1/index.m3u8", server.uri())).unwrap();
    assert_eq!(
        auth.cookie_header_for(&manifest).as_deref(),
        Some("fem_auth_mod=rotated-token")
    );
}

#[tokio::test]
async fn test_cookie_not_sent_to_unrelated_host() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_course(&server, "Rust", &[]).await;

    // Cookie scoped to a different site: the mock server must not receive it.
    let platform = Platform::new(&server.uri(), "https://frontendmasters.com").unwrap();
    let auth = AuthContext::new(&platform, TOKEN).unwrap();
    let client = CatalogClient::new(platform, &auth).unwrap();
    client.fetch_course(SLUG).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("cookie").is_none());
    assert_eq!(
        requests[0].headers.get("origin").unwrap().to_str().unwrap(),
        "https://frontendmasters.com"
    );
}
