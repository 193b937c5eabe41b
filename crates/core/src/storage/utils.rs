//! Pure storage helpers: backoff timing, path formatting, file classification.

use std::time::Duration;

use chrono::Utc;

/// Extensions and MIME types treated as images.
const IMAGE_TYPES: &[&str] = &[
    "jpg",
    "jpeg",
    "png",
    "gif",
    "webp",
    "svg",
    "bmp",
    "ico",
    "avif",
    "image/jpg",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/x-icon",
    "image/vnd.microsoft.icon",
    "image/avif",
];

/// Suspend the current task for `duration`.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Exponential backoff: `base * 2^attempt`, saturating at `Duration::MAX`.
#[must_use]
pub fn calculate_backoff_delay(attempt: u32, base: Duration) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    2u32.checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

/// Collision-resistant object path: `<epoch-ms>-<name>` with every whitespace
/// run in `name` replaced by a single `_`.
#[must_use]
pub fn format_storage_path(name: &str) -> String {
    format_storage_path_at(name, Utc::now().timestamp_millis())
}

/// [`format_storage_path`] with an explicit timestamp.
#[must_use]
pub fn format_storage_path_at(name: &str, epoch_millis: i64) -> String {
    let mut path = format!("{epoch_millis}-");
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                path.push('_');
            }
            in_whitespace = true;
        } else {
            path.push(c);
            in_whitespace = false;
        }
    }
    path
}

/// Lowercased text after the last `.` of `path`.
///
/// Returns `None` when there is no `.` or nothing follows it.
#[must_use]
pub fn get_file_extension(path: &str) -> Option<String> {
    let (_, ext) = path.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Whether an extension (with or without a leading `.`) or a MIME type names
/// an image.
#[must_use]
pub fn is_image_type(mime_or_ext: &str) -> bool {
    let normalized = mime_or_ext.trim().trim_start_matches('.').to_lowercase();
    IMAGE_TYPES.contains(&normalized.as_str())
}

/// Best-effort MIME type for a file name, `application/octet-stream` when
/// unknown.
#[must_use]
pub fn content_type_for_path(path: &str) -> &'static str {
    match get_file_extension(path).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("avif") => "image/avif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::storage::config::StorageConfig;

    #[rstest]
    #[case(0, 1000)]
    #[case(1, 2000)]
    #[case(2, 4000)]
    #[case(3, 8000)]
    #[case(4, 16000)]
    fn test_backoff_delay_default_base(#[case] attempt: u32, #[case] expected_ms: u64) {
        assert_eq!(
            calculate_backoff_delay(attempt, StorageConfig::DEFAULT_RETRY_BASE_DELAY),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn test_backoff_delay_saturates() {
        assert_eq!(calculate_backoff_delay(64, StorageConfig::DEFAULT_RETRY_BASE_DELAY), Duration::MAX);
        assert_eq!(calculate_backoff_delay(10, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_format_storage_path_shape() {
        let path = format_storage_path("my file.png");
        let (prefix, rest) = path.split_once('-').expect("path has a dash");
        assert!(!prefix.is_empty());
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "my_file.png");
    }

    #[rstest]
    #[case("my file.png", "42-my_file.png")]
    #[case("a  \t b.txt", "42-a_b.txt")]
    #[case(" lead", "42-_lead")]
    #[case("plain.pdf", "42-plain.pdf")]
    #[case("", "42-")]
    fn test_format_storage_path_at(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(format_storage_path_at(name, 42), expected);
    }

    #[rstest]
    #[case("photo.PNG", Some("png"))]
    #[case("archive.tar.gz", Some("gz"))]
    #[case("README", None)]
    #[case("trailing.", None)]
    #[case(".env", Some("env"))]
    fn test_get_file_extension(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(get_file_extension(path).as_deref(), expected);
    }

    #[rstest]
    #[case("png", true)]
    #[case(".JPG", true)]
    #[case("image/jpeg", true)]
    #[case("IMAGE/WEBP", true)]
    #[case("pdf", false)]
    #[case("application/pdf", false)]
    #[case("", false)]
    fn test_is_image_type(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_image_type(input), expected);
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path("avatar.JPG"), "image/jpeg");
        assert_eq!(content_type_for_path("report.pdf"), "application/pdf");
        assert_eq!(content_type_for_path("blob"), "application/octet-stream");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_advances_clock() {
        let start = tokio::time::Instant::now();
        sleep(Duration::from_millis(1500)).await;
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
