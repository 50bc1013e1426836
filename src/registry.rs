//! Append-only log of asset declarations.

use crate::error::AssetError;
use crate::models::{AssetDeclaration, AssetKind, AssetOptions};
use crate::ordering::sort_positioned;

/// Insertion-ordered declarations plus the one-shot ordering flag.
#[derive(Debug, Default)]
pub struct AssetRegistry {
  entries: Vec<AssetDeclaration>,
  next_sequence: u64,
  sorted: bool,
}

impl AssetRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a declaration and return the sequence number it was given.
  ///
  /// The path is stored as declared; invalid values surface when the asset is published.
  pub fn register(&mut self, kind: AssetKind, path: impl Into<String>, options: &AssetOptions) -> u64 {
    self.next_sequence += 1;
    let sequence = self.next_sequence;
    self.entries.push(AssetDeclaration {
      kind,
      path: path.into(),
      group: options.group.clone(),
      attributes: options.attributes.clone(),
      raw: options.raw,
      position: options.position,
      sequence,
    });
    sequence
  }

  /// Declarations of one kind in exactly the given group, in current registry order.
  pub fn find<'a>(
    &'a self,
    kind: AssetKind,
    group: Option<&'a str>,
  ) -> impl Iterator<Item = &'a AssetDeclaration> + 'a {
    self
      .entries
      .iter()
      .filter(move |entry| entry.matches(kind, group))
  }

  /// Sort the whole registry the first time it is called. Later calls leave the order alone.
  ///
  /// Returns `true` when this call performed the sort.
  pub fn ensure_ordered(&mut self) -> Result<bool, AssetError> {
    if self.sorted {
      return Ok(false);
    }
    self.sorted = true;
    sort_positioned(&mut self.entries)?;
    Ok(true)
  }

  /// Whether the one-shot sort already ran.
  pub fn is_sorted(&self) -> bool {
    self.sorted
  }

  /// Every declaration in current registry order.
  pub fn entries(&self) -> &[AssetDeclaration] {
    &self.entries
  }

  /// Number of declarations.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when nothing has been declared.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Drop every declaration and re-arm the sort. Sequence numbers keep increasing.
  pub fn clear(&mut self) {
    self.entries.clear();
    self.sorted = false;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paths<'a>(entries: impl Iterator<Item = &'a AssetDeclaration>) -> Vec<&'a str> {
    entries.map(|entry| entry.path.as_str()).collect()
  }

  #[test]
  fn sequences_increase_across_kinds_and_groups() {
    let mut registry = AssetRegistry::new();
    let a = registry.register(AssetKind::Style, "a.css", &AssetOptions::default());
    let b = registry.register(AssetKind::Script, "b.js", &AssetOptions::default().group("footer"));
    let c = registry.register(AssetKind::Style, "c.css", &AssetOptions::default().group("head"));
    assert!(a < b && b < c);
  }

  #[test]
  fn find_matches_exact_group() {
    let mut registry = AssetRegistry::new();
    registry.register(AssetKind::Style, "default.css", &AssetOptions::default());
    registry.register(AssetKind::Style, "head.css", &AssetOptions::default().group("head"));
    registry.register(AssetKind::Style, "foot.css", &AssetOptions::default().group("footer"));
    registry.register(AssetKind::Script, "head.js", &AssetOptions::default().group("head"));
    registry.register(AssetKind::Style, "empty.css", &AssetOptions::default().group(""));

    assert_eq!(paths(registry.find(AssetKind::Style, None)), vec![
      "default.css",
      "empty.css"
    ]);
    assert_eq!(paths(registry.find(AssetKind::Style, Some("head"))), vec!["head.css"]);
    assert_eq!(paths(registry.find(AssetKind::Script, Some("head"))), vec!["head.js"]);
    assert!(registry.find(AssetKind::Script, Some("footer")).next().is_none());
  }

  #[test]
  fn orders_by_position_then_sequence() {
    let mut registry = AssetRegistry::new();
    registry.register(AssetKind::Style, "@theme/a.css", &AssetOptions::default().position(2));
    registry.register(AssetKind::Style, "@theme/b.css", &AssetOptions::default().position(1));
    registry.register(AssetKind::Style, "@theme/c.css", &AssetOptions::default().position(1));

    assert!(registry.ensure_ordered().unwrap());
    assert_eq!(paths(registry.find(AssetKind::Style, None)), vec![
      "@theme/b.css",
      "@theme/c.css",
      "@theme/a.css"
    ]);
  }

  #[test]
  fn sorts_only_once() {
    let mut registry = AssetRegistry::new();
    registry.register(AssetKind::Script, "late.js", &AssetOptions::default().position(5));
    registry.register(AssetKind::Script, "early.js", &AssetOptions::default().position(1));
    assert!(registry.ensure_ordered().unwrap());

    registry.register(AssetKind::Script, "first.js", &AssetOptions::default().position(0));
    assert!(!registry.ensure_ordered().unwrap());
    assert!(!registry.ensure_ordered().unwrap());

    assert_eq!(paths(registry.find(AssetKind::Script, None)), vec![
      "early.js", "late.js", "first.js"
    ]);
  }

  #[test]
  fn clear_rearms_sort_and_keeps_counter() {
    let mut registry = AssetRegistry::new();
    let before = registry.register(AssetKind::Style, "a.css", &AssetOptions::default());
    registry.ensure_ordered().unwrap();
    registry.clear();

    assert!(registry.is_empty());
    assert!(!registry.is_sorted());
    let after = registry.register(AssetKind::Style, "b.css", &AssetOptions::default());
    assert!(after > before);
  }
}
