//! Data structures describing declared, resolved and rendered assets.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::{MapAccess, Visitor};

/// Kind of static resource referenced from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
  /// Stylesheet emitted as a `<link>` tag.
  Style,
  /// Script emitted as a `<script>` tag.
  Script,
}

/// Markup attributes kept in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
  /// Create an empty attribute list.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set an attribute, replacing the value in place when the key already exists.
  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
    let key = key.into();
    let value = value.into();
    match self.0.iter_mut().find(|(existing, _)| *existing == key) {
      Some((_, slot)) => *slot = value,
      None => self.0.push((key, value)),
    }
  }

  /// Look up an attribute value.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|(existing, _)| existing == key)
      .map(|(_, value)| value.as_str())
  }

  /// Iterate attributes in insertion order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
  }

  /// Number of attributes.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns `true` when no attributes are set.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut attributes = Self::new();
    for (key, value) in iter {
      attributes.insert(key, value);
    }
    attributes
  }
}

impl<'de> Deserialize<'de> for Attributes {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
      type Value = Attributes;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of attribute names to string values")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut attributes = Attributes::new();
        while let Some((key, value)) = map.next_entry::<String, String>()? {
          attributes.insert(key, value);
        }
        Ok(attributes)
      }
    }

    deserializer.deserialize_map(OrderedVisitor)
  }
}

/// Default rendering position for declarations that do not set one.
pub const DEFAULT_POSITION: i64 = 1;

/// Metadata shared by every path registered through one `add_style`/`add_script` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOptions {
  /// Output group; `None` selects the default bucket.
  pub group: Option<String>,
  /// Markup attributes passed through to the rendered tag.
  pub attributes: Attributes,
  /// Emit the path literally and never publish it.
  pub raw: bool,
  /// Rendering priority, lower values render first.
  pub position: i64,
}

impl Default for AssetOptions {
  fn default() -> Self {
    Self {
      group: None,
      attributes: Attributes::new(),
      raw: false,
      position: DEFAULT_POSITION,
    }
  }
}

impl AssetOptions {
  /// Place the declaration into a named group. An empty name selects the default group.
  pub fn group(mut self, group: impl Into<String>) -> Self {
    self.group = normalise_group(Some(group.into()));
    self
  }

  /// Add a markup attribute.
  pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.insert(key, value);
    self
  }

  /// Mark the declaration as raw.
  pub fn raw(mut self, raw: bool) -> Self {
    self.raw = raw;
    self
  }

  /// Override the rendering position.
  pub fn position(mut self, position: i64) -> Self {
    self.position = position;
    self
  }
}

/// Collapse empty group names into the default group.
pub(crate) fn normalise_group(group: Option<String>) -> Option<String> {
  group.filter(|value| !value.is_empty())
}

/// A single registered asset. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDeclaration {
  /// Stylesheet or script.
  pub kind: AssetKind,
  /// Remote URL, local path or alias-prefixed path as declared.
  pub path: String,
  /// Output group; `None` is the default bucket.
  pub group: Option<String>,
  /// Markup attributes in declaration order.
  pub attributes: Attributes,
  /// Emit the path literally and skip publishing.
  pub raw: bool,
  /// Rendering priority, lower values render first.
  pub position: i64,
  /// Registration counter used to break position ties.
  pub sequence: u64,
}

impl AssetDeclaration {
  /// Returns `true` when the declaration belongs to the `(kind, group)` partition.
  pub fn matches(&self, kind: AssetKind, group: Option<&str>) -> bool {
    self.kind == kind && self.group.as_deref() == group
  }
}

/// Anything that can be registered as one or more asset paths.
pub trait IntoAssetPaths {
  /// Expand into the list of paths to register.
  fn into_asset_paths(self) -> Vec<String>;
}

impl IntoAssetPaths for &str {
  fn into_asset_paths(self) -> Vec<String> {
    vec![self.to_string()]
  }
}

impl IntoAssetPaths for String {
  fn into_asset_paths(self) -> Vec<String> {
    vec![self]
  }
}

impl IntoAssetPaths for &String {
  fn into_asset_paths(self) -> Vec<String> {
    vec![self.clone()]
  }
}

impl<S: Into<String>> IntoAssetPaths for Vec<S> {
  fn into_asset_paths(self) -> Vec<String> {
    self.into_iter().map(Into::into).collect()
  }
}

impl<S: Into<String>, const N: usize> IntoAssetPaths for [S; N] {
  fn into_asset_paths(self) -> Vec<String> {
    self.into_iter().map(Into::into).collect()
  }
}

impl<S: AsRef<str>> IntoAssetPaths for &[S] {
  fn into_asset_paths(self) -> Vec<String> {
    self.iter().map(|path| path.as_ref().to_string()).collect()
  }
}

/// Source and destination derived from a declared path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
  /// File the asset is copied from.
  pub source: PathBuf,
  /// Destination relative to the assets directory, namespace stripped.
  pub destination: String,
}

/// What a publish pass did with one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
  /// The source was copied to the destination.
  Copied(PathBuf),
  /// The destination was recent enough and left untouched.
  Fresh(PathBuf),
  /// Remote URLs are never published.
  Remote,
  /// Raw declarations are never published.
  Raw,
}

/// Summary of a completed publish pass.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
  /// Outcome per declaration sequence, in registry order. Failed assets are absent.
  pub outcomes: Vec<(u64, PublishOutcome)>,
}

impl PublishReport {
  /// Destinations written during the pass.
  pub fn copied(&self) -> impl Iterator<Item = &Path> {
    self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
      PublishOutcome::Copied(path) => Some(path.as_path()),
      _ => None,
    })
  }

  /// Destinations that were considered fresh.
  pub fn fresh(&self) -> impl Iterator<Item = &Path> {
    self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
      PublishOutcome::Fresh(path) => Some(path.as_path()),
      _ => None,
    })
  }
}

/// An ordered asset paired with its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAsset {
  /// Externally visible URL.
  pub url: String,
  /// Declaration the URL was built from.
  pub declaration: AssetDeclaration,
}
