//! Markup for rendered stylesheet and script references.

use std::fmt::Write;

use crate::models::{AssetKind, Attributes, RenderedAsset};

/// Render one reference tag for the asset.
pub fn render_tag(asset: &RenderedAsset) -> String {
  let attributes = render_attributes(&asset.declaration.attributes);
  match asset.declaration.kind {
    AssetKind::Style => format!(
      r#"<link href="{}" type="text/css" rel="stylesheet"{}>"#,
      escape_attribute(&asset.url),
      attributes
    ),
    AssetKind::Script => format!(
      r#"<script src="{}"{}></script>"#,
      escape_attribute(&asset.url),
      attributes
    ),
  }
}

/// Render every asset, one tag per line.
pub fn render_tags(assets: &[RenderedAsset]) -> String {
  assets
    .iter()
    .map(render_tag)
    .collect::<Vec<_>>()
    .join("\n")
}

fn render_attributes(attributes: &Attributes) -> String {
  let mut rendered = String::new();
  for (key, value) in attributes.iter() {
    if !is_valid_attribute_name(key) {
      log::warn!("skipping invalid attribute name {key:?}");
      continue;
    }
    // Writing into a String can not fail.
    let _ = write!(rendered, r#" {}="{}""#, key, escape_attribute(value));
  }
  rendered
}

/// Whether `name` can be written as an HTML attribute name without quoting.
///
/// Names must be non-empty and free of whitespace, control characters, quotes, `<`, `>`,
/// `=` and `/`.
pub fn is_valid_attribute_name(name: &str) -> bool {
  !name.is_empty()
    && !name.chars().any(|c| {
      c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '=' | '/')
    })
}

/// Escape a value for use inside a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '"' => escaped.push_str("&quot;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      other => escaped.push(other),
    }
  }
  escaped
}
