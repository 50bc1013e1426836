//! Pipeline configuration loader describing the publish layout and alias table.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::asset_paths::AliasMap;
use crate::error::ConfigError;
use crate::pipeline::AssetPipeline;
use crate::project::{DEFAULT_DIRECTORY_MODE, DEFAULT_REFRESH_SECS, PublishLayout};

/// File name searched for by [`PipelineConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "site-assets.json";

/// Discoverable configuration for the asset pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Public web root, relative paths are resolved against the configuration directory.
  pub web_root: PathBuf,
  /// Directory below the web root receiving published assets.
  pub assets_dir: String,
  /// Seconds a published file stays fresh before it is copied again.
  pub refresh_threshold_secs: u64,
  /// Permission bits for created directories, as an integer or an octal string (`"0755"`).
  #[serde(deserialize_with = "deserialize_mode")]
  pub directory_create_mode: u32,
  /// Base URL of the web root. Usually replaced by the current request's base URL.
  pub base_url: String,
  /// Alias namespaces mapped to their base directories.
  pub aliases: BTreeMap<String, PathBuf>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      web_root: "web".into(),
      assets_dir: "assets".into(),
      refresh_threshold_secs: DEFAULT_REFRESH_SECS,
      directory_create_mode: DEFAULT_DIRECTORY_MODE,
      base_url: String::new(),
      aliases: BTreeMap::new(),
    }
  }
}

impl PipelineConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing file yields the defaults. An unreadable or invalid file is reported through the
  /// log and also falls back to the defaults.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if !candidate.exists() {
      return Self::default();
    }
    match Self::from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        log::warn!("{err}; using default configuration");
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Resolve relative web root and alias directories against `root`.
  pub fn rooted_at(mut self, root: &Path) -> Self {
    if self.web_root.is_relative() {
      self.web_root = root.join(&self.web_root);
    }
    for dir in self.aliases.values_mut() {
      if dir.is_relative() {
        *dir = root.join(&*dir);
      }
    }
    self
  }

  /// Convert the configuration into an owned publish layout.
  pub fn into_layout(self) -> PublishLayout {
    PublishLayout::new(self.web_root, self.assets_dir, self.base_url)
      .refresh_threshold(Duration::from_secs(self.refresh_threshold_secs))
      .directory_mode(self.directory_create_mode)
  }

  /// Borrowing conversion into a layout, cloning the underlying values.
  pub fn to_layout(&self) -> PublishLayout {
    self.clone().into_layout()
  }

  /// Alias table described by the configuration.
  pub fn alias_map(&self) -> AliasMap {
    self.aliases.iter().collect()
  }

  /// Build a pipeline from the configuration.
  pub fn into_pipeline(self) -> AssetPipeline {
    let aliases = self.alias_map();
    AssetPipeline::new(self.into_layout(), aliases)
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeValue {
  Number(u32),
  Text(String),
}

fn deserialize_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
  match ModeValue::deserialize(deserializer)? {
    ModeValue::Number(mode) => Ok(mode),
    ModeValue::Text(text) => {
      let digits = text.trim();
      let digits = digits
        .strip_prefix("0o")
        .or_else(|| digits.strip_prefix('0').filter(|rest| !rest.is_empty()))
        .unwrap_or(digits);
      u32::from_str_radix(digits, 8)
        .map_err(|_| serde::de::Error::custom(format!("invalid octal mode `{text}`")))
    }
  }
}
