//! Classification of declared paths that are served from somewhere else.
//!
//! A remote path keeps its declared form in the rendered tag and the publisher never looks
//! at it. Everything else is a local file that has to be copied into the assets directory.

use std::sync::LazyLock;

use regex::Regex;

/// Protocol-relative URLs, any `scheme://` URL, bare `http:`/`https:` and `data:` URIs.
static REMOTE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?://|[a-z][a-z0-9+.-]*://|https?:|data:)")
        .expect("remote path pattern is valid")
});

/// Returns `true` when the declared path is not a local file.
///
/// The scheme must be followed by `//` except for `http:`, `https:` and `data:`, so a
/// Windows drive such as `C:\theme\site.css` stays local.
pub fn is_remote_reference(path: &str) -> bool {
    REMOTE_PATH.is_match(path)
}
