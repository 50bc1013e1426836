#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod config;
pub mod error;
pub mod freshness;
pub mod manifest;
pub mod models;
pub mod ordering;
pub mod pipeline;
pub mod project;
pub mod publish;
pub mod registry;
pub mod render;

pub use asset_paths::{AliasLookup, AliasMap};
pub use config::PipelineConfig;
pub use error::{AssetError, AssetFailure, ConfigError, PipelineError, PublishError};
pub use models::{AssetDeclaration, AssetKind, AssetOptions, Attributes, RenderedAsset};
pub use pipeline::AssetPipeline;
pub use project::PublishLayout;
