//! Session object tying registration, ordering, publishing and rendering together.

use std::collections::BTreeSet;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};

use crate::asset_paths::{AliasLookup, build_asset_url, is_remote_reference};
use crate::error::{AssetError, AssetFailure, PipelineError, PublishError};
use crate::models::{
  AssetKind, AssetOptions, IntoAssetPaths, PublishReport, RenderedAsset, normalise_group,
};
use crate::project::PublishLayout;
use crate::publish::Publisher;
use crate::registry::AssetRegistry;
use crate::render::render_tags;

#[derive(Debug, Default)]
struct PublishState {
  published: bool,
  report: PublishReport,
  failures: Vec<AssetFailure>,
}

/// Collects declarations and renders them, sorting and publishing at most once per instance.
///
/// The one-shot flags belong to the instance. Create one pipeline per request when every
/// request should see its own sort and publish pass, or share one for the whole process and
/// call [`AssetPipeline::reset`] to start over.
pub struct AssetPipeline {
  layout: PublishLayout,
  aliases: Box<dyn AliasLookup + Send + Sync>,
  registry: RwLock<AssetRegistry>,
  publish: Mutex<PublishState>,
}

impl AssetPipeline {
  /// Create a pipeline publishing into `layout` and resolving aliases through `aliases`.
  pub fn new(layout: PublishLayout, aliases: impl AliasLookup + Send + Sync + 'static) -> Self {
    Self {
      layout,
      aliases: Box::new(aliases),
      registry: RwLock::new(AssetRegistry::new()),
      publish: Mutex::new(PublishState::default()),
    }
  }

  /// Layout the pipeline publishes into.
  pub fn layout(&self) -> &PublishLayout {
    &self.layout
  }

  /// Register one or more stylesheets sharing the same options.
  pub fn add_style(&self, paths: impl IntoAssetPaths, options: AssetOptions) -> Vec<u64> {
    self.add(AssetKind::Style, paths, options)
  }

  /// Register one or more scripts sharing the same options.
  pub fn add_script(&self, paths: impl IntoAssetPaths, options: AssetOptions) -> Vec<u64> {
    self.add(AssetKind::Script, paths, options)
  }

  /// Register every path as its own declaration and return the assigned sequence numbers.
  pub fn add(&self, kind: AssetKind, paths: impl IntoAssetPaths, options: AssetOptions) -> Vec<u64> {
    let mut registry = self.registry.write();
    paths
      .into_asset_paths()
      .into_iter()
      .map(|path| registry.register(kind, path, &options))
      .collect()
  }

  /// Sort the registry unless an earlier call already did.
  pub fn ensure_ordered(&self) -> Result<(), AssetError> {
    if self.registry.write().ensure_ordered()? {
      log::debug!("ordered {} asset declaration(s)", self.registry.read().len());
    }
    Ok(())
  }

  /// Run the publish pass unless an earlier call already did.
  ///
  /// The pass is never retried; every call reports the failures of the single pass.
  pub fn ensure_published(&self) -> Result<(), PublishError> {
    let state = self.publish_once();
    if state.failures.is_empty() {
      Ok(())
    } else {
      Err(PublishError::new(state.failures.clone()))
    }
  }

  fn publish_once(&self) -> parking_lot::MutexGuard<'_, PublishState> {
    let mut state = self.publish.lock();
    if !state.published {
      let declarations = self.registry.read().entries().to_vec();
      let publisher = Publisher::new(&self.layout, self.aliases.as_ref());
      let (report, failures) = publisher.publish_all(&declarations, SystemTime::now());
      state.report = report;
      state.failures = failures;
      state.published = true;
    }
    state
  }

  /// Report of the publish pass, if it ran.
  pub fn publish_report(&self) -> Option<PublishReport> {
    let state = self.publish.lock();
    state.published.then(|| state.report.clone())
  }

  /// Whether the one-shot sort already ran.
  pub fn is_ordered(&self) -> bool {
    self.registry.read().is_sorted()
  }

  /// Whether the one-shot publish pass already ran.
  pub fn is_published(&self) -> bool {
    self.publish.lock().published
  }

  /// Ordered stylesheets of the group with their public URLs.
  pub fn styles(&self, group: Option<&str>) -> Result<Vec<RenderedAsset>, PipelineError> {
    self.assets(AssetKind::Style, group)
  }

  /// Ordered scripts of the group with their public URLs.
  pub fn scripts(&self, group: Option<&str>) -> Result<Vec<RenderedAsset>, PipelineError> {
    self.assets(AssetKind::Script, group)
  }

  /// `<link>` tags for the group's stylesheets, one per line.
  pub fn render_styles(&self, group: Option<&str>) -> Result<String, PipelineError> {
    Ok(render_tags(&self.styles(group)?))
  }

  /// `<script>` tags for the group's scripts, one per line.
  pub fn render_scripts(&self, group: Option<&str>) -> Result<String, PipelineError> {
    Ok(render_tags(&self.scripts(group)?))
  }

  /// Order, publish, then select the `(kind, group)` subset.
  ///
  /// Fails when any asset of the subset failed to publish, or when a local asset was declared
  /// after the pass and so has no published copy. Failures of other subsets are left to the
  /// calls rendering them.
  pub fn assets(
    &self,
    kind: AssetKind,
    group: Option<&str>,
  ) -> Result<Vec<RenderedAsset>, PipelineError> {
    self.ensure_ordered()?;
    let state = self.publish_once();

    let group = normalise_group(group.map(str::to_string));
    let registry = self.registry.read();
    let selected: Vec<RenderedAsset> = registry
      .find(kind, group.as_deref())
      .map(|declaration| RenderedAsset {
        url: if declaration.raw {
          declaration.path.clone()
        } else {
          build_asset_url(&self.layout, &declaration.path)
        },
        declaration: declaration.clone(),
      })
      .collect();

    let sequences: BTreeSet<u64> = selected
      .iter()
      .map(|asset| asset.declaration.sequence)
      .collect();
    let mut failures: Vec<AssetFailure> = state
      .failures
      .iter()
      .filter(|failure| sequences.contains(&failure.sequence))
      .cloned()
      .collect();

    let visited: BTreeSet<u64> = state
      .report
      .outcomes
      .iter()
      .map(|(sequence, _)| *sequence)
      .chain(state.failures.iter().map(|failure| failure.sequence))
      .collect();
    for asset in &selected {
      let declaration = &asset.declaration;
      if declaration.raw
        || is_remote_reference(&declaration.path)
        || visited.contains(&declaration.sequence)
      {
        continue;
      }
      log::warn!("{} registered after the publish pass", declaration.path);
      failures.push(AssetFailure {
        sequence: declaration.sequence,
        path: declaration.path.clone(),
        error: AssetError::NotPublished {
          path: declaration.path.clone(),
        },
      });
    }

    if failures.is_empty() {
      Ok(selected)
    } else {
      Err(PublishError::new(failures).into())
    }
  }

  /// Forget every declaration and re-arm the sort and publish passes.
  pub fn reset(&self) {
    let mut state = self.publish.lock();
    self.registry.write().clear();
    *state = PublishState::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::path::{Path, PathBuf};
  use std::time::Duration;

  use tempfile::{TempDir, tempdir};

  use crate::asset_paths::AliasMap;

  struct Fixture {
    _dir: TempDir,
    theme: PathBuf,
    pipeline: AssetPipeline,
  }

  impl Fixture {
    fn assets_path(&self) -> PathBuf {
      self.pipeline.layout().assets_path()
    }
  }

  fn fixture(files: &[&str]) -> Fixture {
    let dir = tempdir().unwrap();
    let theme = dir.path().join("theme");
    for file in files {
      let path = theme.join(file);
      fs::create_dir_all(path.parent().unwrap()).unwrap();
      fs::write(&path, format!("/* {file} */")).unwrap();
    }

    let mut aliases = AliasMap::new();
    aliases.insert("theme", &theme);
    let layout = PublishLayout::new(dir.path().join("web"), "assets", "/site");
    Fixture {
      _dir: dir,
      theme,
      pipeline: AssetPipeline::new(layout, aliases),
    }
  }

  fn urls(assets: &[RenderedAsset]) -> Vec<&str> {
    assets.iter().map(|asset| asset.url.as_str()).collect()
  }

  fn age(path: &Path, by: Duration) {
    fs::File::options()
      .write(true)
      .open(path)
      .unwrap()
      .set_modified(SystemTime::now() - by)
      .unwrap();
  }

  #[test]
  fn renders_by_position_then_declaration_order() {
    let fx = fixture(&["a.css", "b.css", "c.css"]);
    let pipeline = &fx.pipeline;
    pipeline.add_style("@theme/a.css", AssetOptions::default().position(2));
    pipeline.add_style("@theme/b.css", AssetOptions::default().position(1));
    pipeline.add_style("@theme/c.css", AssetOptions::default().position(1));

    let rendered = pipeline.render_styles(None).unwrap();
    assert_eq!(
      rendered,
      [
        r#"<link href="/site/assets/b.css" type="text/css" rel="stylesheet">"#,
        r#"<link href="/site/assets/c.css" type="text/css" rel="stylesheet">"#,
        r#"<link href="/site/assets/a.css" type="text/css" rel="stylesheet">"#,
      ]
      .join("\n")
    );
    for file in ["a.css", "b.css", "c.css"] {
      assert!(fx.assets_path().join(file).is_file());
    }
  }

  #[test]
  fn remote_assets_pass_through_without_copy() {
    let fx = fixture(&[]);
    fx.pipeline.add_script("https://cdn/x.js", AssetOptions::default());

    assert_eq!(fx.pipeline.render_styles(None).unwrap(), "");
    assert_eq!(
      fx.pipeline.render_scripts(None).unwrap(),
      r#"<script src="https://cdn/x.js"></script>"#
    );
    assert!(!fx.assets_path().exists());
    let report = fx.pipeline.publish_report().unwrap();
    assert_eq!(report.copied().count(), 0);
  }

  #[test]
  fn groups_never_mix() {
    let fx = fixture(&["head.js", "foot.js", "plain.js"]);
    let pipeline = &fx.pipeline;
    pipeline.add_script("@theme/head.js", AssetOptions::default().group("head"));
    pipeline.add_script("@theme/foot.js", AssetOptions::default().group("footer"));
    pipeline.add_script("@theme/plain.js", AssetOptions::default());

    assert_eq!(urls(&pipeline.scripts(Some("head")).unwrap()), vec!["/site/assets/head.js"]);
    assert_eq!(urls(&pipeline.scripts(Some("footer")).unwrap()), vec![
      "/site/assets/foot.js"
    ]);
    assert_eq!(urls(&pipeline.scripts(None).unwrap()), vec!["/site/assets/plain.js"]);
    assert_eq!(urls(&pipeline.scripts(Some("")).unwrap()), vec!["/site/assets/plain.js"]);
    assert!(pipeline.styles(Some("head")).unwrap().is_empty());
  }

  #[test]
  fn multiple_paths_share_options() {
    let fx = fixture(&["one.js", "two.js"]);
    let sequences = fx.pipeline.add_script(
      ["@theme/one.js", "@theme/two.js"],
      AssetOptions::default().attribute("defer", "defer").group("footer"),
    );
    assert_eq!(sequences.len(), 2);

    let scripts = fx.pipeline.scripts(Some("footer")).unwrap();
    assert_eq!(scripts.len(), 2);
    assert!(scripts
      .iter()
      .all(|asset| asset.declaration.attributes.get("defer") == Some("defer")));
  }

  #[test]
  fn order_is_fixed_after_first_render() {
    let fx = fixture(&["a.css", "b.css"]);
    let pipeline = &fx.pipeline;
    pipeline.add_style("@theme/b.css", AssetOptions::default().position(3));
    pipeline.add_style("@theme/a.css", AssetOptions::default());

    let first = urls(&pipeline.styles(None).unwrap())
      .into_iter()
      .map(str::to_string)
      .collect::<Vec<_>>();
    assert_eq!(first, vec!["/site/assets/a.css", "/site/assets/b.css"]);

    pipeline.ensure_ordered().unwrap();
    pipeline.add_style("https://cdn/late.css", AssetOptions::default().position(0));
    assert_eq!(urls(&pipeline.styles(None).unwrap()), vec![
      "/site/assets/a.css",
      "/site/assets/b.css",
      "https://cdn/late.css"
    ]);
  }

  #[test]
  fn local_declarations_after_the_pass_fail_to_render() {
    let fx = fixture(&["a.css", "late.css"]);
    let pipeline = &fx.pipeline;
    pipeline.add_style("@theme/a.css", AssetOptions::default());
    pipeline.render_styles(None).unwrap();

    pipeline.add_style("@theme/late.css", AssetOptions::default());
    match pipeline.render_styles(None) {
      Err(PipelineError::Publish(err)) => {
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "@theme/late.css");
        assert!(matches!(failures[0].error, AssetError::NotPublished { .. }));
      }
      other => panic!("expected publish failure, got {other:?}"),
    }
    assert!(!fx.assets_path().join("late.css").exists());

    // Raw and remote declarations need no published copy.
    pipeline.add_script("@theme/late.js", AssetOptions::default().raw(true));
    pipeline.add_script("//cdn/late.js", AssetOptions::default());
    assert_eq!(urls(&pipeline.scripts(None).unwrap()), vec![
      "@theme/late.js",
      "//cdn/late.js"
    ]);
  }

  #[test]
  fn publishes_at_most_once() {
    let fx = fixture(&["site.css"]);
    fx.pipeline.add_style("@theme/site.css", AssetOptions::default());
    fx.pipeline.ensure_published().unwrap();

    let destination = fx.assets_path().join("site.css");
    fs::write(fx.theme.join("site.css"), "changed").unwrap();
    age(&destination, Duration::from_secs(86_400 * 2));

    fx.pipeline.ensure_published().unwrap();
    fx.pipeline.render_styles(None).unwrap();
    assert_eq!(fs::read_to_string(&destination).unwrap(), "/* site.css */");
    assert_eq!(fx.pipeline.publish_report().unwrap().copied().count(), 1);
  }

  #[test]
  fn reset_allows_a_new_pass() {
    let fx = fixture(&["site.css"]);
    fx.pipeline.add_style("@theme/site.css", AssetOptions::default());
    fx.pipeline.render_styles(None).unwrap();
    assert!(fx.pipeline.is_ordered() && fx.pipeline.is_published());

    let destination = fx.assets_path().join("site.css");
    fs::write(fx.theme.join("site.css"), "changed").unwrap();
    age(&destination, Duration::from_secs(86_400 * 2));

    fx.pipeline.reset();
    assert!(!fx.pipeline.is_ordered() && !fx.pipeline.is_published());
    assert!(fx.pipeline.publish_report().is_none());

    fx.pipeline.add_style("@theme/site.css", AssetOptions::default());
    fx.pipeline.render_styles(None).unwrap();
    assert_eq!(fs::read_to_string(&destination).unwrap(), "changed");
  }

  #[test]
  fn raw_assets_render_literally_and_are_not_published() {
    let fx = fixture(&["site.css"]);
    fx.pipeline.add_style("@theme/site.css", AssetOptions::default().raw(true));
    fx.pipeline.add_style("/static/legacy.css", AssetOptions::default().raw(true));

    assert_eq!(urls(&fx.pipeline.styles(None).unwrap()), vec![
      "@theme/site.css",
      "/static/legacy.css"
    ]);
    assert!(!fx.assets_path().exists());
  }

  #[test]
  fn failures_surface_only_for_the_affected_subset() {
    let fx = fixture(&["ok.css"]);
    fx.pipeline.add_style("@theme/ok.css", AssetOptions::default());
    fx.pipeline.add_script("@theme/missing.js", AssetOptions::default().group("footer"));
    fx.pipeline.add_script("@unknown/app.js", AssetOptions::default().group("footer"));

    assert!(fx.pipeline.render_styles(None).is_ok());
    match fx.pipeline.render_scripts(Some("footer")) {
      Err(PipelineError::Publish(err)) => {
        let paths: Vec<&str> = err.failures().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["@theme/missing.js", "@unknown/app.js"]);
      }
      other => panic!("expected publish failure, got {other:?}"),
    }

    let err = fx.pipeline.ensure_published().unwrap_err();
    assert_eq!(err.failures().len(), 2);
    assert!(fx.assets_path().join("ok.css").is_file());
  }

  #[test]
  fn concurrent_registration_keeps_unique_sequences() {
    let fx = fixture(&[]);
    std::thread::scope(|scope| {
      for worker in 0..4 {
        let pipeline = &fx.pipeline;
        scope.spawn(move || {
          for index in 0..25 {
            pipeline.add_script(
              format!("https://cdn/{worker}/{index}.js"),
              AssetOptions::default(),
            );
          }
        });
      }
    });

    let scripts = fx.pipeline.scripts(None).unwrap();
    assert_eq!(scripts.len(), 100);
    let sequences: BTreeSet<u64> = scripts.iter().map(|a| a.declaration.sequence).collect();
    assert_eq!(sequences.len(), 100);
    assert!(scripts
      .windows(2)
      .all(|pair| pair[0].declaration.sequence < pair[1].declaration.sequence));
  }
}
