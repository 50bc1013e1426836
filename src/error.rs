//! Error types raised while resolving, ordering and publishing assets.

use std::path::PathBuf;

use thiserror::Error;

/// Failure attached to a single asset declaration.
#[derive(Debug, Error)]
pub enum AssetError {
  /// The alias namespace at the start of the path is not registered.
  #[error("unknown alias `{namespace}` in {path}")]
  UnresolvableAlias {
    /// Declared asset path.
    path: String,
    /// Namespace segment that failed to resolve, including the marker.
    namespace: String,
  },
  /// The resolved source file does not exist at copy time.
  #[error("asset source {} does not exist", .path.display())]
  SourceNotFound {
    /// Resolved absolute source path.
    path: PathBuf,
  },
  /// Creating the destination directory or copying the file failed.
  #[error("failed to write {}: {source}", .path.display())]
  DestinationWrite {
    /// Destination file or directory being written.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// The declaration was registered after the one-shot publish pass ran.
  #[error("{path} was declared after assets were published")]
  NotPublished {
    /// Declared asset path.
    path: String,
  },
  /// A `..` segment would leave the alias base or the assets directory.
  #[error("parent segment in asset path {path}")]
  PathTraversal {
    /// Declared asset path.
    path: String,
  },
  /// Two registry entries share a sequence number, so their order is undefined.
  #[error("registry holds more than one declaration with sequence {sequence}")]
  InvalidSortInput {
    /// Duplicated sequence number.
    sequence: u64,
  },
}

impl Clone for AssetError {
  fn clone(&self) -> Self {
    match self {
      Self::UnresolvableAlias { path, namespace } => Self::UnresolvableAlias {
        path: path.clone(),
        namespace: namespace.clone(),
      },
      Self::SourceNotFound { path } => Self::SourceNotFound { path: path.clone() },
      Self::DestinationWrite { path, source } => Self::DestinationWrite {
        path: path.clone(),
        source: std::io::Error::new(source.kind(), source.to_string()),
      },
      Self::NotPublished { path } => Self::NotPublished { path: path.clone() },
      Self::PathTraversal { path } => Self::PathTraversal { path: path.clone() },
      Self::InvalidSortInput { sequence } => Self::InvalidSortInput {
        sequence: *sequence,
      },
    }
  }
}

/// A per-asset failure collected during a publish pass.
#[derive(Debug, Clone)]
pub struct AssetFailure {
  /// Sequence number of the failing declaration.
  pub sequence: u64,
  /// Declared path of the failing declaration.
  pub path: String,
  /// Reason the asset could not be published.
  pub error: AssetError,
}

/// Aggregate error returned once a publish pass has visited every asset.
#[derive(Debug, Clone, Error)]
#[error("{} asset(s) failed to publish, first: {}: {}", .failures.len(), first_path(.failures), first_error(.failures))]
pub struct PublishError {
  failures: Vec<AssetFailure>,
}

impl PublishError {
  pub(crate) fn new(failures: Vec<AssetFailure>) -> Self {
    Self { failures }
  }

  /// Every failure collected during the pass, in registry order.
  pub fn failures(&self) -> &[AssetFailure] {
    &self.failures
  }

  /// Consume the error and return the failures.
  pub fn into_failures(self) -> Vec<AssetFailure> {
    self.failures
  }
}

fn first_path(failures: &[AssetFailure]) -> &str {
  failures.first().map_or("<none>", |failure| failure.path.as_str())
}

fn first_error(failures: &[AssetFailure]) -> String {
  failures
    .first()
    .map_or_else(String::new, |failure| failure.error.to_string())
}

/// Errors surfaced by the rendering entry points.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// The registry could not be ordered.
  #[error(transparent)]
  Ordering(#[from] AssetError),
  /// Assets of the rendered subset failed to publish.
  #[error(transparent)]
  Publish(#[from] PublishError),
}

/// Errors that can occur while loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn publish_error_reports_count_and_first_path() {
    let err = PublishError::new(vec![
      AssetFailure {
        sequence: 3,
        path: "@theme/missing.css".into(),
        error: AssetError::SourceNotFound {
          path: PathBuf::from("/site/theme/missing.css"),
        },
      },
      AssetFailure {
        sequence: 4,
        path: "@nope/app.js".into(),
        error: AssetError::UnresolvableAlias {
          path: "@nope/app.js".into(),
          namespace: "@nope".into(),
        },
      },
    ]);

    let message = err.to_string();
    assert!(message.starts_with("2 asset(s) failed to publish"));
    assert!(message.contains("@theme/missing.css"));
    assert!(message.contains("/site/theme/missing.css does not exist"));
    assert_eq!(err.failures()[1].sequence, 4);
  }

  #[test]
  fn cloned_write_errors_keep_kind_and_message() {
    let original = AssetError::DestinationWrite {
      path: PathBuf::from("/web/assets/site.css"),
      source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    let cloned = original.clone();
    assert_eq!(original.to_string(), cloned.to_string());
    match cloned {
      AssetError::DestinationWrite { source, .. } => {
        assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
      }
      other => panic!("unexpected error: {other}"),
    }
  }
}
