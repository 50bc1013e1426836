//! Copy declared assets into the public assets directory.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use same_file::is_same_file;

use crate::asset_paths::{AliasLookup, is_remote_reference};
use crate::error::{AssetError, AssetFailure};
use crate::freshness::needs_refresh;
use crate::models::{AssetDeclaration, PublishOutcome, PublishReport};
use crate::project::PublishLayout;

/// Publishes declarations against one layout and alias table.
pub struct Publisher<'a> {
  layout: &'a PublishLayout,
  aliases: &'a dyn AliasLookup,
}

impl<'a> Publisher<'a> {
  /// Create a publisher for the provided layout and aliases.
  pub fn new(layout: &'a PublishLayout, aliases: &'a dyn AliasLookup) -> Self {
    Self { layout, aliases }
  }

  /// Visit every declaration once, copying missing or stale files.
  ///
  /// Failures never stop the pass; they are returned alongside the report of everything
  /// that succeeded.
  pub fn publish_all(
    &self,
    declarations: &[AssetDeclaration],
    now: SystemTime,
  ) -> (PublishReport, Vec<AssetFailure>) {
    let mut report = PublishReport::default();
    let mut failures = Vec::new();

    for declaration in declarations {
      match self.publish_one(declaration, now) {
        Ok(outcome) => report.outcomes.push((declaration.sequence, outcome)),
        Err(error) => {
          log::warn!("failed to publish {}: {}", declaration.path, error);
          failures.push(AssetFailure {
            sequence: declaration.sequence,
            path: declaration.path.clone(),
            error,
          });
        }
      }
    }

    log::info!(
      "published {} of {} asset(s), {} fresh, {} failed",
      report.copied().count(),
      declarations.len(),
      report.fresh().count(),
      failures.len()
    );

    (report, failures)
  }

  /// Publish a single declaration.
  pub fn publish_one(
    &self,
    declaration: &AssetDeclaration,
    now: SystemTime,
  ) -> Result<PublishOutcome, AssetError> {
    if is_remote_reference(&declaration.path) {
      return Ok(PublishOutcome::Remote);
    }
    if declaration.raw {
      return Ok(PublishOutcome::Raw);
    }

    let resolved = self.aliases.resolve(&declaration.path)?;
    let destination = self.layout.destination_for(&resolved.destination);

    if !needs_refresh(&destination, now, self.layout.refresh_threshold) {
      log::debug!("{} is fresh", destination.display());
      return Ok(PublishOutcome::Fresh(destination));
    }

    if !resolved.source.is_file() {
      return Err(AssetError::SourceNotFound {
        path: resolved.source,
      });
    }

    if let Some(parent) = destination.parent() {
      create_destination_dir(parent, self.layout.directory_mode).map_err(|source| {
        AssetError::DestinationWrite {
          path: parent.to_path_buf(),
          source,
        }
      })?;
    }

    if destination.exists() && is_same_file(&resolved.source, &destination).unwrap_or(false) {
      return Ok(PublishOutcome::Fresh(destination));
    }

    fs::copy(&resolved.source, &destination).map_err(|source| AssetError::DestinationWrite {
      path: destination.clone(),
      source,
    })?;
    log::debug!(
      "copied {} -> {}",
      resolved.source.display(),
      destination.display()
    );

    Ok(PublishOutcome::Copied(destination))
  }
}

fn create_destination_dir(dir: &Path, mode: u32) -> io::Result<()> {
  if dir.is_dir() {
    return Ok(());
  }

  let mut builder = fs::DirBuilder::new();
  builder.recursive(true);
  #[cfg(unix)]
  {
    use std::os::unix::fs::DirBuilderExt;
    builder.mode(mode);
  }
  #[cfg(not(unix))]
  let _ = mode;
  builder.create(dir)
}
