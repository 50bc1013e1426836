use crate::asset_paths::alias::{is_alias, strip_namespace};
use crate::project::PublishLayout;

/// Produce the externally visible URL for a declared asset path.
///
/// Alias-prefixed paths are served from the assets URL with their namespace stripped. Every
/// other value (remote URLs, absolute paths, raw literals) is returned unchanged.
pub fn build_asset_url(layout: &PublishLayout, path: &str) -> String {
    if !is_alias(path) {
        return path.to_string();
    }

    format!("{}/{}", layout.assets_url(), strip_namespace(path))
}
