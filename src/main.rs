use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use site_assets::PipelineConfig;
use site_assets::manifest::load_manifest;

/// Publish declared stylesheets and scripts and print their reference tags.
#[derive(Debug, Parser)]
#[command(name = "site-assets", version, about)]
struct Cli {
  /// Pipeline configuration file. Defaults to `site-assets.json` in the working directory.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// YAML or JSON manifest listing the declarations.
  #[arg(short, long, default_value = "assets.yaml")]
  manifest: PathBuf,

  /// Override the configured base URL.
  #[arg(long)]
  base_url: Option<String>,

  /// Override the configured web root.
  #[arg(long)]
  web_root: Option<PathBuf>,

  /// Render only this group instead of the default one.
  #[arg(short, long)]
  group: Option<String>,

  /// Render stylesheets only.
  #[arg(long, conflicts_with = "scripts_only")]
  styles_only: bool,

  /// Render scripts only.
  #[arg(long)]
  scripts_only: bool,

  /// Increase log verbosity (-v info, -vv debug).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let cwd = std::env::current_dir().context("failed to determine working directory")?;
  let (config, config_dir) = match &cli.config {
    Some(path) => {
      let config = PipelineConfig::from_path(path)?;
      let dir = path
        .parent()
        .map(|parent| cwd.join(parent))
        .unwrap_or_else(|| cwd.clone());
      (config, dir)
    }
    None => (PipelineConfig::discover(&cwd), cwd.clone()),
  };
  log::debug!("resolving relative paths against {}", config_dir.display());

  let mut config = config.rooted_at(&config_dir);
  if let Some(base_url) = cli.base_url {
    config.base_url = base_url;
  }
  if let Some(web_root) = cli.web_root {
    config.web_root = cwd.join(web_root);
  }

  let manifest = load_manifest(&cli.manifest)?;
  let pipeline = config.into_pipeline();
  let declared = manifest.register(&pipeline);
  log::info!("registered {declared} asset declaration(s)");

  let group = cli.group.as_deref();
  let mut sections = Vec::new();
  if !cli.scripts_only {
    sections.push(pipeline.render_styles(group)?);
  }
  if !cli.styles_only {
    sections.push(pipeline.render_scripts(group)?);
  }

  let mut stdout = std::io::stdout().lock();
  for section in sections.into_iter().filter(|section| !section.is_empty()) {
    writeln!(stdout, "{section}").context("failed to write rendered tags")?;
  }

  Ok(())
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
