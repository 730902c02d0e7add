//! Memoization of filter passes.
//!
//! The cache is a plain value owned by whoever drives filtering; nothing is
//! kept in statics. Entries are keyed by the collection snapshot
//! (`collection_id`, `version`) plus everything else that influences the
//! view, and evicted least recently used first.

use std::hash::{
  DefaultHasher,
  Hash,
  Hasher,
};

use indexmap::IndexMap;

use crate::{
  filter::{
    FilteredView,
    Layout,
  },
  hierarchical::HierarchyOptions,
};

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub collection_id:  u64,
  pub version:        u64,
  pub query:          String,
  pub layout:         Layout,
  pub preserve_order: bool,
  pub hierarchy:      HierarchyOptions,
  /// Fingerprint of the candidate subset, see [`candidates_fingerprint`].
  pub candidates:     Option<u64>,
}

/// Stable hash of a candidate subset.
pub fn candidates_fingerprint(candidates: Option<&[usize]>) -> Option<u64> {
  candidates.map(|candidates| {
    let mut hasher = DefaultHasher::new();
    candidates.hash(&mut hasher);
    hasher.finish()
  })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub hits:   u64,
  pub misses: u64,
}

#[derive(Debug, Clone)]
pub struct FilterCache {
  capacity: usize,
  entries:  IndexMap<CacheKey, FilteredView>,
  stats:    CacheStats,
}

impl Default for FilterCache {
  fn default() -> Self {
    Self::new(DEFAULT_CACHE_CAPACITY)
  }
}

impl FilterCache {
  /// A capacity of zero disables caching.
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      entries: IndexMap::with_capacity(capacity),
      stats: CacheStats::default(),
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
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
  pub fn stats(&self) -> CacheStats {
    self.stats
  }

  /// Looks up `key` and marks it most recently used.
  pub fn get(&mut self, key: &CacheKey) -> Option<&FilteredView> {
    let Some(index) = self.entries.get_index_of(key) else {
      self.stats.misses += 1;
      return None;
    };
    self.stats.hits += 1;
    let last = self.entries.len() - 1;
    self.entries.move_index(index, last);
    self.entries.get_index(last).map(|(_, view)| view)
  }

  pub fn insert(&mut self, key: CacheKey, view: FilteredView) {
    if self.capacity == 0 {
      return;
    }
    self.entries.shift_remove(&key);
    while self.entries.len() >= self.capacity {
      self.entries.shift_remove_index(0);
    }
    self.entries.insert(key, view);
  }

  /// Returns the cached view for `key`, computing and storing it on a miss.
  pub fn get_or_insert_with(
    &mut self,
    key: CacheKey,
    compute: impl FnOnce() -> FilteredView,
  ) -> FilteredView {
    if let Some(view) = self.get(&key) {
      tracing::trace!(query = key.query.as_str(), "filter cache hit");
      return view.clone();
    }
    let view = compute();
    self.insert(key, view.clone());
    view
  }

  /// Drops every entry that belongs to `collection_id`.
  pub fn invalidate(&mut self, collection_id: u64) {
    self
      .entries
      .retain(|key, _| key.collection_id != collection_id);
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}
