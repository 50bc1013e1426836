//! Public output layout shared by the publisher and the URL builder.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of seconds a published file stays fresh.
pub const DEFAULT_REFRESH_SECS: u64 = 86_400;

/// Default permission bits for directories created below the assets directory.
pub const DEFAULT_DIRECTORY_MODE: u32 = 0o755;

/// Where published assets live on disk and under which URL they are served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishLayout {
  /// Public web root on disk.
  pub web_root: PathBuf,
  /// Directory below the web root that receives published assets.
  pub assets_dir: String,
  /// Base URL the web root is served from, without a trailing slash.
  pub base_url: String,
  /// Maximum age of a published file before it is copied again.
  pub refresh_threshold: Duration,
  /// Permission bits used when creating destination directories.
  pub directory_mode: u32,
}

impl PublishLayout {
  /// Layout with the default refresh threshold and directory mode.
  pub fn new(
    web_root: impl Into<PathBuf>,
    assets_dir: impl Into<String>,
    base_url: impl Into<String>,
  ) -> Self {
    Self {
      web_root: web_root.into(),
      assets_dir: assets_dir.into().trim_matches('/').to_string(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      refresh_threshold: Duration::from_secs(DEFAULT_REFRESH_SECS),
      directory_mode: DEFAULT_DIRECTORY_MODE,
    }
  }

  /// Override the refresh threshold.
  pub fn refresh_threshold(mut self, threshold: Duration) -> Self {
    self.refresh_threshold = threshold;
    self
  }

  /// Override the directory creation mode.
  pub fn directory_mode(mut self, mode: u32) -> Self {
    self.directory_mode = mode;
    self
  }

  /// Replace the base URL, typically with the one of the current request.
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  /// `<web_root>/<assets_dir>` on disk.
  pub fn assets_path(&self) -> PathBuf {
    self.web_root.join(&self.assets_dir)
  }

  /// `<base_url>/<assets_dir>` as served.
  pub fn assets_url(&self) -> String {
    format!("{}/{}", self.base_url, self.assets_dir)
  }

  /// Destination on disk for a namespace-stripped relative path.
  ///
  /// Empty, `.` and `..` segments are dropped, so the result always stays below
  /// [`PublishLayout::assets_path`].
  pub fn destination_for(&self, relative: &str) -> PathBuf {
    join_relative(&self.assets_path(), relative)
  }
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
  relative
    .split('/')
    .filter(|segment| !matches!(*segment, "" | "." | ".."))
    .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
