//! Ancestor-preserving filter for tree-shaped collections.
//!
//! A match deep in a tree is useless without the chain of parents that gives
//! it context, so every direct match pulls its ancestors into the view. The
//! view keeps collection order, which for a pre-order tree listing means the
//! result still reads as a tree.

use std::time::Instant;

use crate::{
  filter::{
    FilteredEntry,
    FilteredView,
    best_position,
    for_each_candidate,
    score_item,
  },
  fuzzy::{
    FuzzyScorer,
    MatchResult,
    Scorer,
  },
  item::{
    Hierarchy,
    Item,
  },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HierarchyOptions {
  /// Item that is always included and where ancestor walks stop.
  pub root:     Option<usize>,
  /// Emit the root first regardless of its collection position.
  pub pin_root: bool,
}

/// Hierarchical filter with the builtin scorer.
pub fn filter_hierarchical<T, F>(
  items: &[Item<T>],
  query: &str,
  parent_key_of: F,
  options: HierarchyOptions,
) -> FilteredView
where
  F: for<'a> Fn(&'a Item<T>) -> Option<&'a str>,
{
  let hierarchy = Hierarchy::resolve(items, parent_key_of);
  filter_hierarchical_with(&FuzzyScorer, items, &hierarchy, None, query, options)
}

/// Hierarchical filter over pre-resolved parent links.
///
/// `candidates` restricts which items may match directly; ancestors are
/// taken from the whole collection.
pub fn filter_hierarchical_with<T>(
  scorer: &dyn Scorer,
  items: &[Item<T>],
  hierarchy: &Hierarchy,
  candidates: Option<&[usize]>,
  query: &str,
  options: HierarchyOptions,
) -> FilteredView {
  let root = options.root.filter(|&root| root < items.len());

  if query.is_empty() {
    let mut view = FilteredView::identity(items.len(), candidates);
    if let Some(root) = root {
      match view.position_of(root) {
        Some(position) if options.pin_root => {
          let entry = view.entries.remove(position);
          view.entries.insert(0, entry);
        },
        Some(_) => {},
        None => insert_root(&mut view.entries, root, None, options.pin_root),
      }
    }
    return view;
  }

  let start = tracing::enabled!(tracing::Level::DEBUG).then(Instant::now);

  let mut results = vec![None; items.len()];
  let mut direct = Vec::new();
  for_each_candidate(items.len(), candidates, |index| {
    if let Some(result) = score_item(scorer, &items[index], index, query) {
      results[index] = Some(result);
      direct.push(index);
    }
  });

  // Every visited index is included, so reaching an included index ends the
  // walk: its chain is already in, or a cycle closed.
  let mut included = vec![false; items.len()];
  for &index in &direct {
    let mut current = index;
    loop {
      if included[current] {
        break;
      }
      included[current] = true;
      match hierarchy.parent(current) {
        Some(parent) if Some(parent) != root && parent < items.len() => current = parent,
        _ => break,
      }
    }
  }

  let mut entries: Vec<FilteredEntry> = included
    .iter()
    .enumerate()
    .filter(|(index, included)| **included && Some(*index) != root)
    .map(|(index, _)| FilteredEntry {
      index,
      direct: results[index].is_some(),
      result: results[index].take(),
    })
    .collect();

  if let Some(root) = root {
    let result = results[root].take();
    insert_root(&mut entries, root, result, options.pin_root);
  }

  let best = best_position(&entries);

  if let Some(start) = start {
    tracing::debug!(
      query,
      direct = direct.len(),
      emitted = entries.len(),
      elapsed = ?start.elapsed(),
      "hierarchical filter"
    );
  }

  FilteredView { entries, best }
}

/// Inserts the root entry first when pinned, else at its collection position.
fn insert_root(
  entries: &mut Vec<FilteredEntry>,
  root: usize,
  result: Option<MatchResult>,
  pin: bool,
) {
  let position = if pin {
    0
  } else {
    entries.partition_point(|entry| entry.index < root)
  };
  entries.insert(position, FilteredEntry {
    index: root,
    direct: result.is_some(),
    result,
  });
}
