//! Position-then-sequence ordering shared by everything that renders in declared order.

use std::cmp::Ordering;

use crate::error::AssetError;
use crate::models::AssetDeclaration;

/// Items carrying an explicit priority and a registration counter.
pub trait Positioned {
  /// Explicit priority, lower sorts first.
  fn position(&self) -> i64;
  /// Registration counter, lower sorts first among equal positions.
  fn sequence(&self) -> u64;
}

impl Positioned for AssetDeclaration {
  fn position(&self) -> i64 {
    self.position
  }

  fn sequence(&self) -> u64 {
    self.sequence
  }
}

/// Total order: ascending position, ties broken by ascending sequence.
pub fn compare_positioned<T: Positioned>(a: &T, b: &T) -> Ordering {
  a.position()
    .cmp(&b.position())
    .then_with(|| a.sequence().cmp(&b.sequence()))
}

/// Sort the items in place, rejecting inputs whose order would be ambiguous.
///
/// Two items with the same sequence have no defined relative order, which can only happen
/// when items are not issued by one counter.
pub fn sort_positioned<T: Positioned>(items: &mut [T]) -> Result<(), AssetError> {
  items.sort_by(compare_positioned);

  let mut sequences: Vec<u64> = items.iter().map(Positioned::sequence).collect();
  sequences.sort_unstable();
  if let Some(pair) = sequences.windows(2).find(|pair| pair[0] == pair[1]) {
    return Err(AssetError::InvalidSortInput { sequence: pair[0] });
  }

  Ok(())
}
