//! Applying a [`Scorer`] across a collection.
//!
//! Both filter strategies produce a [`FilteredView`]: the surviving items, as
//! indices into the collection, plus the position the cursor should land on.
//! An empty query is the identity: every item, in order, with no best index.

use std::time::Instant;

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  fuzzy::{
    FuzzyScorer,
    MatchResult,
    Scorer,
  },
  item::Item,
};

/// How a filtered view is arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
  /// Ranked (or order-preserving) list of direct matches.
  #[default]
  Flat,
  /// Direct matches plus the ancestors that keep the tree readable.
  Hierarchical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilteredEntry {
  /// Index into the collection.
  pub index:  usize,
  /// `None` for identity views and ancestor-only entries.
  pub result: Option<MatchResult>,
  /// Whether the item matched the query itself.
  pub direct: bool,
}

impl FilteredEntry {
  #[inline]
  pub fn score(&self) -> f64 {
    self.result.as_ref().map_or(0.0, |result| result.score)
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
  pub entries: Vec<FilteredEntry>,
  /// Position within `entries` the cursor should be placed on.
  pub best:    Option<usize>,
}

impl FilteredView {
  /// All candidates in collection order, unscored.
  pub fn identity(len: usize, candidates: Option<&[usize]>) -> Self {
    let mut entries = Vec::new();
    for_each_candidate(len, candidates, |index| {
      entries.push(FilteredEntry {
        index,
        result: None,
        direct: true,
      });
    });
    Self {
      entries,
      best: None,
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[inline]
  pub fn get(&self, position: usize) -> Option<&FilteredEntry> {
    self.entries.get(position)
  }

  /// Collection index of the entry at `position`.
  #[inline]
  pub fn index_at(&self, position: usize) -> Option<usize> {
    self.entries.get(position).map(|entry| entry.index)
  }

  pub fn position_of(&self, index: usize) -> Option<usize> {
    self.entries.iter().position(|entry| entry.index == index)
  }

  pub fn items<'a, T>(&'a self, items: &'a [Item<T>]) -> impl Iterator<Item = &'a Item<T>> + 'a {
    self
      .entries
      .iter()
      .filter_map(move |entry| items.get(entry.index))
  }
}

/// Calls `f` with every candidate index, or with `0..len` when there is no
/// candidate subset. Out of range indices are skipped.
pub(crate) fn for_each_candidate(len: usize, candidates: Option<&[usize]>, mut f: impl FnMut(usize)) {
  match candidates {
    Some(candidates) => {
      for &index in candidates {
        if index < len {
          f(index);
        }
      }
    },
    None => (0..len).for_each(f),
  }
}

/// Scores one item, folding invalid input (an empty text) into "no match".
pub(crate) fn score_item<T>(
  scorer: &dyn Scorer,
  item: &Item<T>,
  index: usize,
  query: &str,
) -> Option<MatchResult> {
  match scorer.score(&item.text, query) {
    Ok(result) => result,
    Err(err) => {
      tracing::trace!(%err, index, "skipping unscorable item");
      None
    },
  }
}

/// Position of the highest scoring direct entry; ties keep the first.
pub(crate) fn best_position(entries: &[FilteredEntry]) -> Option<usize> {
  let mut best: Option<(usize, f64)> = None;
  for (position, entry) in entries.iter().enumerate() {
    if !entry.direct {
      continue;
    }
    let score = entry.score();
    if best.is_none_or(|(_, best_score)| score > best_score) {
      best = Some((position, score));
    }
  }
  best.map(|(position, _)| position)
}

/// Flat filter with the builtin scorer.
pub fn filter_flat<T>(items: &[Item<T>], query: &str, preserve_order: bool) -> FilteredView {
  filter_flat_with(&FuzzyScorer, items, None, query, preserve_order)
}

/// Flat filter: keeps direct matches only.
///
/// Without `preserve_order` matches are sorted by score (descending), then by
/// text length (ascending), then by collection order, and the best index is
/// the top. With `preserve_order` collection order is kept and the best index
/// points at the first highest scoring match.
pub fn filter_flat_with<T>(
  scorer: &dyn Scorer,
  items: &[Item<T>],
  candidates: Option<&[usize]>,
  query: &str,
  preserve_order: bool,
) -> FilteredView {
  if query.is_empty() {
    return FilteredView::identity(items.len(), candidates);
  }

  let start = tracing::enabled!(tracing::Level::DEBUG).then(Instant::now);
  let mut entries = Vec::new();
  for_each_candidate(items.len(), candidates, |index| {
    if let Some(result) = score_item(scorer, &items[index], index, query) {
      entries.push(FilteredEntry {
        index,
        result: Some(result),
        direct: true,
      });
    }
  });

  let best = if entries.is_empty() {
    None
  } else if preserve_order {
    best_position(&entries)
  } else {
    entries.sort_by(|a, b| {
      b.score().total_cmp(&a.score()).then_with(|| {
        let a_len = items[a.index].text.chars().count();
        let b_len = items[b.index].text.chars().count();
        a_len.cmp(&b_len)
      })
    });
    Some(0)
  };

  if let Some(start) = start {
    tracing::debug!(
      query,
      candidates = candidates.map_or(items.len(), <[usize]>::len),
      matched = entries.len(),
      elapsed = ?start.elapsed(),
      "flat filter"
    );
  }

  FilteredView { entries, best }
}
