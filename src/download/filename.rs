//! Output paths for courses and lessons.

use std::path::{Path, PathBuf};

/// Directory holding a course's videos: `{root}/{course title}`.
#[must_use]
pub fn course_dir(download_root: &Path, course_title: &str) -> PathBuf {
    download_root.join(sanitize_path_segment(course_title))
}

/// File name for a lesson: `{index}_{title}.mp4`.
#[must_use]
pub fn lesson_file_name(index: u32, title: &str) -> String {
    format!("{index}_{}.mp4", sanitize_path_segment(title))
}

/// Makes a title usable as a single path segment.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
/// Spaces and other printable characters are kept.
pub(crate) fn sanitize_path_segment(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if sanitized.chars().all(|c| c == '.') {
        sanitized.replace('.', "_")
    } else {
        sanitized
    }
}
