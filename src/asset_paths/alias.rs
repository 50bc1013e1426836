use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::AssetError;
use crate::models::ResolvedAsset;

/// Character that marks a path as alias-prefixed, e.g. `@theme/css/site.css`.
pub const ALIAS_MARKER: char = '@';

/// Lookup of alias namespaces registered by the surrounding application.
///
/// Namespaces are passed including the marker (`@theme`).
pub trait AliasLookup {
    /// Base directory registered for the namespace.
    fn base_dir(&self, namespace: &str) -> Option<&Path>;

    /// Resolve a declared path into its source file and namespace-stripped destination.
    ///
    /// Paths without the alias marker are used as the source verbatim; their destination is
    /// still derived through [`strip_namespace`] so that both kinds of local paths land in
    /// the assets directory the same way. A `..` segment anywhere in the path is rejected.
    fn resolve(&self, path: &str) -> Result<ResolvedAsset, AssetError> {
        if has_parent_segment(path) {
            return Err(AssetError::PathTraversal {
                path: path.to_string(),
            });
        }

        let destination = strip_namespace(path);
        if !is_alias(path) {
            return Ok(ResolvedAsset {
                source: PathBuf::from(path),
                destination,
            });
        }

        let namespace = alias_namespace(path);
        let base = self
            .base_dir(namespace)
            .ok_or_else(|| AssetError::UnresolvableAlias {
                path: path.to_string(),
                namespace: namespace.to_string(),
            })?;

        let source = destination
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(base.to_path_buf(), |source, segment| source.join(segment));

        Ok(ResolvedAsset {
            source,
            destination,
        })
    }
}

/// Returns `true` when the path starts with the alias marker.
pub fn is_alias(path: &str) -> bool {
    path.starts_with(ALIAS_MARKER)
}

/// The first path segment, which names the alias namespace.
pub fn alias_namespace(path: &str) -> &str {
    let normalised_end = path.find(['/', '\\']).unwrap_or(path.len());
    &path[..normalised_end]
}

/// Remove exactly the first path segment.
///
/// Both the publisher and the URL builder derive their relative path through this function,
/// which keeps the published file and its URL addressing the same location.
pub fn strip_namespace(path: &str) -> String {
    let normalised = path.replace('\\', "/");
    match normalised.split_once('/') {
        Some((_, rest)) => rest.to_string(),
        None => String::new(),
    }
}

fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// In-memory alias table keyed by namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: BTreeMap<String, PathBuf>,
}

impl AliasMap {
    /// Create an empty alias table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace. The alias marker is added when missing.
    pub fn insert(&mut self, namespace: impl AsRef<str>, base_dir: impl Into<PathBuf>) {
        self.entries
            .insert(normalise_namespace(namespace.as_ref()), base_dir.into());
    }

    /// Registered namespaces in sorted order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Rebase every relative base directory onto `root`.
    pub fn rooted_at(self, root: &Path) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|(namespace, dir)| {
                let dir = if dir.is_relative() { root.join(dir) } else { dir };
                (namespace, dir)
            })
            .collect();
        Self { entries }
    }
}

impl AliasLookup for AliasMap {
    fn base_dir(&self, namespace: &str) -> Option<&Path> {
        self.entries.get(namespace).map(PathBuf::as_path)
    }
}

impl<K: AsRef<str>, V: Into<PathBuf>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (namespace, dir) in iter {
            map.insert(namespace, dir);
        }
        map
    }
}

fn normalise_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim().trim_end_matches('/');
    if trimmed.starts_with(ALIAS_MARKER) {
        trimmed.to_string()
    } else {
        format!("{ALIAS_MARKER}{trimmed}")
    }
}
