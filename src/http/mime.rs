//! Extension to content type lookup.

use std::path::Path;

/// Content type for `path`'s extension, ignoring case. Paths without an
/// extension, or with one no registry entry covers, have none.
pub fn content_type(path: &Path) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}
