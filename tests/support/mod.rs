//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::{Path, PathBuf};

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use course_downloader::FileConfig;

pub const TOKEN: &str = "secret-token";
pub const SLUG: &str = "rust";

/// A stand-in for ffmpeg.
///
/// Arguments arrive as `-y -headers <block> -i <url> -map 0 -c copy <out>`.
/// It appends `start`/`end` lines to `remux.log` in the download root, writes
/// the header block and input URL into the output file, and reacts to markers
/// in the input URL: `REMUX_FAIL` exits 3, `REMUX_HANG` never finishes.
#[cfg(unix)]
const FAKE_REMUX_SCRIPT: &str = r#"#!/bin/sh
out="${10}"
log="$(dirname "$out")/../remux.log"
echo "start $(basename "$out")" >> "$log"
case "$5" in
  *REMUX_FAIL*) echo "simulated remux failure" >&2; exit 3 ;;
  *REMUX_HANG*) exec sleep 30 ;;
esac
printf '%s\n%s\n' "$3" "$5" > "$out"
echo "frame=1 fps=0.0 q=-1.0 size=1kB" >&2
printf 'remux progress\n'
sleep 0.5
echo "end $(basename "$out")" >> "$log"
"#;

/// Path of the fake remux program, written once per test binary.
///
/// Written before any test spawns it so no child holds it open for writing.
#[cfg(unix)]
pub fn fake_remux() -> &'static Path {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;

    static SCRIPT: OnceLock<(tempfile::TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = SCRIPT.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake-ffmpeg");
        std::fs::write(&path, FAKE_REMUX_SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

/// Configuration pointing every endpoint at `server` with throttling off.
pub fn config_for(server: &MockServer, download_dir: &Path, ffmpeg: &Path) -> FileConfig {
    FileConfig {
        auth_token: Some(TOKEN.to_string()),
        course_url: Some(format!("https://frontendmasters.com/courses/{SLUG}/")),
        concurrency: Some(1),
        bandwidth_limit: Some(0),
        download_dir: Some(download_dir.to_path_buf()),
        ffmpeg_path: Some(ffmpeg.to_path_buf()),
        api_base_url: Some(server.uri()),
        site_origin: Some(server.uri()),
        ..FileConfig::default()
    }
}

/// Mounts `GET /courses/{SLUG}` returning `title` and the given `(hash, title, index)` lessons.
pub async fn mount_course(server: &MockServer, title: &str, lessons: &[(&str, &str, u32)]) {
    let lesson_data: serde_json::Map<String, serde_json::Value> = lessons
        .iter()
        .map(|(hash, title, index)| {
            (
                (*hash).to_string(),
                json!({ "title": title, "index": index, "slug": hash }),
            )
        })
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/courses/{SLUG}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": title,
            "slug": SLUG,
            "lessonData": lesson_data,
        })))
        .mount(server)
        .await;
}

/// Mounts the manifest source for `hash`, pointing at `{server}/hls/{hash}{marker}/index.m3u8`.
pub async fn mount_manifest(server: &MockServer, hash: &str, marker: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/video/{hash}/source")))
        .and(query_param("f", "m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/hls/{hash}{marker}/index.m3u8", server.uri()),
        })))
        .mount(server)
        .await;
}

/// Reads `remux.log` under `root` as lines.
pub fn remux_log(root: &Path) -> Vec<String> {
    std::fs::read_to_string(root.join("remux.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}
