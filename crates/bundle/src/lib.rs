//! Bundle validation, extraction and repackaging for publish jobs.
//!
//! An uploaded bundle is a ZIP archive of application files. This crate
//! turns it into the flat file list handed to the deployment provider:
//! size limits, hidden/junk-file filtering, binary classification with
//! base64 transport encoding, and injection of a fallback entry file.

mod classify;
mod defaults;
mod extract;
mod hash;

pub use classify::{is_binary_path, is_junk_path};
pub use defaults::{PLACEHOLDER_INDEX, ensure_default_files};
pub use extract::{BundleFile, ExtractedBundle, extract};
pub use hash::compute_hash;

/// Maximum accepted bundle size: 50 MiB.
///
/// A payload of exactly this length is still accepted.
pub const MAX_BUNDLE_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum decompressed size for a single archive entry: 10 MiB.
///
/// Larger entries are skipped with a warning, not fatal.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of files collected from one archive.
pub const MAX_FILE_COUNT: usize = 10_000;

/// Errors produced by the bundle crate.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("bundle too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("malformed archive: {0}")]
    Malformed(String),
}

/// Checks an uploaded payload length against [`MAX_BUNDLE_BYTES`].
pub fn validate_size(byte_length: u64) -> Result<(), BundleError> {
    if byte_length > MAX_BUNDLE_BYTES {
        return Err(BundleError::TooLarge {
            size: byte_length,
            limit: MAX_BUNDLE_BYTES,
        });
    }
    Ok(())
}
