//! ZIP extraction into a flat, transport-ready file list.

use std::io::{Cursor, Read};

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::warn;
use zip::ZipArchive;

use crate::classify::{is_binary_path, is_junk_path};
use crate::defaults::ensure_default_files;
use crate::hash::compute_hash;
use crate::{BundleError, MAX_FILE_BYTES, MAX_FILE_COUNT};

/// One extracted file ready for deployment transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleFile {
    /// Path relative to the bundle root, `/`-separated.
    pub path: String,
    /// UTF-8 text, or base64 when `is_binary` is set.
    pub content: String,
    pub is_binary: bool,
}

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExtractedBundle {
    pub files: Vec<BundleFile>,
    /// SHA-256 hex digest of the raw archive bytes.
    pub content_hash: String,
}

/// Extracts a ZIP archive into a flat file list.
///
/// Skips directory entries, hidden files and OS junk. Entries whose
/// decompressed size exceeds [`MAX_FILE_BYTES`] are skipped with a warning.
/// Collection stops once [`MAX_FILE_COUNT`] files are gathered; files
/// collected up to that point are kept. Binary files (by extension) are
/// base64-encoded, text files are decoded as UTF-8 (lossy). A root
/// `index.html` is injected if the archive has none.
///
/// A structurally malformed archive fails the whole extraction with a
/// single error; partially parsed files are discarded.
pub fn extract(archive_bytes: &[u8]) -> Result<ExtractedBundle, BundleError> {
    let content_hash = compute_hash(archive_bytes);

    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| BundleError::Malformed(e.to_string()))?;

    let mut files = Vec::new();

    for index in 0..archive.len() {
        if files.len() >= MAX_FILE_COUNT {
            warn!(
                limit = MAX_FILE_COUNT,
                remaining = archive.len() - index,
                "file count limit reached, ignoring remaining entries"
            );
            break;
        }

        let entry = archive
            .by_index(index)
            .map_err(|e| BundleError::Malformed(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let path = normalize_path(entry.name());
        if path.is_empty() || is_junk_path(&path) {
            continue;
        }

        if entry.size() > MAX_FILE_BYTES {
            warn!(path = %path, size = entry.size(), "skipping oversized bundle entry");
            continue;
        }

        // Declared sizes are untrusted archive metadata; the actual
        // decompressed stream is capped independently.
        let mut raw = Vec::with_capacity(entry.size() as usize);
        entry
            .take(MAX_FILE_BYTES + 1)
            .read_to_end(&mut raw)
            .map_err(|e| BundleError::Malformed(format!("{path}: {e}")))?;
        if raw.len() as u64 > MAX_FILE_BYTES {
            warn!(path = %path, size = raw.len(), "skipping oversized bundle entry");
            continue;
        }

        let is_binary = is_binary_path(&path);
        let content = if is_binary {
            STANDARD.encode(&raw)
        } else {
            String::from_utf8_lossy(&raw).into_owned()
        };

        files.push(BundleFile {
            path,
            content,
            is_binary,
        });
    }

    ensure_default_files(&mut files);

    Ok(ExtractedBundle {
        files,
        content_hash,
    })
}

/// Normalizes an archive entry name: `\` separators become `/`, leading
/// `./` and `/` are stripped.
fn normalize_path(name: &str) -> String {
    let name = name.replace('\\', "/");
    let name = name.trim_start_matches("./");
    name.trim_start_matches('/').to_string()
}
