//! Loading declarative asset lists from YAML or JSON manifests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::models::{AssetKind, AssetOptions, Attributes, DEFAULT_POSITION, normalise_group};
use crate::pipeline::AssetPipeline;

/// Deserialised asset manifest.
#[derive(Debug, Default, Deserialize)]
pub struct AssetManifest {
  /// Stylesheet declarations in registration order.
  #[serde(default)]
  pub styles: Vec<ManifestEntry>,
  /// Script declarations in registration order.
  #[serde(default)]
  pub scripts: Vec<ManifestEntry>,
}

/// One declaration call: a path or a list of paths sharing the same options.
#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
  /// Single path.
  #[serde(default)]
  pub path: Option<String>,
  /// Several paths registered with identical options.
  #[serde(default)]
  pub paths: Vec<String>,
  /// Output group.
  #[serde(default)]
  pub group: Option<String>,
  /// Markup attributes in declaration order.
  #[serde(default)]
  pub attributes: Attributes,
  /// Emit literally and skip publishing.
  #[serde(default)]
  pub raw: bool,
  /// Rendering priority.
  #[serde(default = "default_position")]
  pub position: i64,
}

fn default_position() -> i64 {
  DEFAULT_POSITION
}

impl ManifestEntry {
  /// Every path of the entry, `path` first.
  pub fn all_paths(&self) -> Vec<String> {
    self
      .path
      .iter()
      .chain(self.paths.iter())
      .cloned()
      .collect()
  }

  /// Registration options of the entry.
  pub fn options(&self) -> AssetOptions {
    AssetOptions {
      group: normalise_group(self.group.clone()),
      attributes: self.attributes.clone(),
      raw: self.raw,
      position: self.position,
    }
  }
}

impl AssetManifest {
  /// Parse a manifest, choosing JSON for `.json` files and YAML otherwise.
  pub fn parse(content: &str, path: &Path) -> Result<Self> {
    let is_json = path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let manifest: Self = if is_json {
      serde_json::from_str(content)
        .with_context(|| format!("failed to parse manifest JSON {}", path.display()))?
    } else {
      serde_yaml::from_str(content)
        .with_context(|| format!("failed to parse manifest YAML {}", path.display()))?
    };
    manifest.validate(path)?;
    Ok(manifest)
  }

  fn validate(&self, path: &Path) -> Result<()> {
    let entries = self.styles.iter().chain(self.scripts.iter());
    for (index, entry) in entries.enumerate() {
      if entry.path.is_none() && entry.paths.is_empty() {
        bail!(
          "manifest entry {} in {} declares no path",
          index + 1,
          path.display()
        );
      }
    }
    Ok(())
  }

  /// Register every entry with the pipeline, styles before scripts. Returns the declaration count.
  pub fn register(&self, pipeline: &AssetPipeline) -> usize {
    let styles = self.styles.iter().map(|entry| (AssetKind::Style, entry));
    let scripts = self.scripts.iter().map(|entry| (AssetKind::Script, entry));
    styles
      .chain(scripts)
      .map(|(kind, entry)| pipeline.add(kind, entry.all_paths(), entry.options()).len())
      .sum()
  }
}

/// Load an asset manifest from disk.
pub fn load_manifest(path: &Path) -> Result<AssetManifest> {
  let content = fs::read_to_string(path)
    .with_context(|| format!("manifest not found at {}", path.display()))?;
  AssetManifest::parse(&content, path)
}
