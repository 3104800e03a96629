//! Path classification: binary detection and hidden/OS-junk filtering.

/// Extensions whose content is transported base64-encoded.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "avif", "woff", "woff2", "ttf", "otf",
    "eot", "mp3", "mp4", "webm", "ogg", "wav", "pdf", "wasm", "zip", "gz",
];

/// Well-known OS artifact filenames that never belong in a deployment.
const JUNK_NAMES: &[&str] = &["Thumbs.db", "desktop.ini"];

/// Returns `true` when the file at `path` should be base64-encoded.
///
/// Classification is by extension only; files without an extension are
/// treated as text.
pub fn is_binary_path(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => BINARY_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)),
        None => false,
    }
}

/// Returns `true` when any path segment is hidden (starts with `.`) or a
/// known OS artifact.
///
/// The hidden rule also drops `..` traversal segments and `.DS_Store` style
/// metadata; `__MACOSX` resource trees are excluded explicitly.
pub fn is_junk_path(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        segment.starts_with('.')
            || segment == "__MACOSX"
            || JUNK_NAMES.iter().any(|junk| segment.eq_ignore_ascii_case(junk))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_binary_extensions() {
        assert!(is_binary_path("logo.png"));
        assert!(is_binary_path("assets/photo.JPEG"));
        assert!(is_binary_path("fonts/main.woff2"));
        assert!(is_binary_path("app.wasm"));
    }

    #[test]
    fn text_files_are_not_binary() {
        assert!(!is_binary_path("index.html"));
        assert!(!is_binary_path("src/main.js"));
        assert!(!is_binary_path("styles.css"));
        assert!(!is_binary_path("icon.svg"));
        assert!(!is_binary_path("README"));
    }

    #[test]
    fn hidden_segments_are_junk() {
        assert!(is_junk_path(".env"));
        assert!(is_junk_path(".git/config"));
        assert!(is_junk_path("src/.cache/data.json"));
        assert!(is_junk_path(".DS_Store"));
    }

    #[test]
    fn os_artifacts_are_junk() {
        assert!(is_junk_path("Thumbs.db"));
        assert!(is_junk_path("photos/thumbs.db"));
        assert!(is_junk_path("desktop.ini"));
        assert!(is_junk_path("__MACOSX/index.html"));
    }

    #[test]
    fn traversal_segments_are_junk() {
        assert!(is_junk_path("../escape.txt"));
        assert!(is_junk_path("sub/../../escape.txt"));
    }

    #[test]
    fn normal_paths_are_kept() {
        assert!(!is_junk_path("index.html"));
        assert!(!is_junk_path("assets/img/logo.png"));
        assert!(!is_junk_path("deep/nested/path/file.txt"));
    }

    #[test]
    fn backslash_separators_are_handled() {
        assert!(is_junk_path("src\\.hidden\\file.txt"));
        assert!(!is_junk_path("src\\visible\\file.txt"));
    }
}
