//! Fallback entry-file injection.

use tracing::info;

use crate::extract::BundleFile;

/// Minimal page injected when a bundle has no root `index.html`.
pub const PLACEHOLDER_INDEX: &str = "<!doctype html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>Deployed application</title>\n</head>\n<body>\n  <h1>Application deployed</h1>\n  <p>This bundle did not include an index.html entry point.</p>\n</body>\n</html>\n";

/// Guarantees the file list contains a root-level `index.html`.
///
/// Hosting providers treat the root index as the site entry point; a bundle
/// without one would deploy successfully but serve nothing.
pub fn ensure_default_files(files: &mut Vec<BundleFile>) {
    if files.iter().any(|f| f.path == "index.html") {
        return;
    }
    info!("bundle has no root index.html, injecting placeholder");
    files.push(BundleFile {
        path: "index.html".to_string(),
        content: PLACEHOLDER_INDEX.to_string(),
        is_binary: false,
    });
}
