//! Picker items and the arena that owns them for one session.
//!
//! Items are addressed by their dense index into a [`Collection`]. Parent
//! links are resolved once, from the string keys supplied by the host, into a
//! [`Hierarchy`] of `Option<usize>` parent indices; the key map is only kept
//! for lookups at the host boundary.

use std::{
  collections::{
    HashMap,
    hash_map::Entry,
  },
  sync::atomic::{
    AtomicU64,
    Ordering,
  },
};

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// One candidate row. `value` is the host payload and is never inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<T> {
  pub text:       String,
  pub value:      T,
  pub kind:       Option<String>,
  pub depth:      usize,
  pub key:        Option<String>,
  pub parent_key: Option<String>,
  pub icon:       Option<String>,
}

impl<T> Item<T> {
  pub fn new(text: impl Into<String>, value: T) -> Self {
    Self {
      text: text.into(),
      value,
      kind: None,
      depth: 0,
      key: None,
      parent_key: None,
      icon: None,
    }
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = Some(kind.into());
    self
  }

  pub fn with_depth(mut self, depth: usize) -> Self {
    self.depth = depth;
    self
  }

  pub fn with_key(mut self, key: impl Into<String>) -> Self {
    self.key = Some(key.into());
    self
  }

  pub fn with_parent(mut self, parent_key: impl Into<String>) -> Self {
    self.parent_key = Some(parent_key.into());
    self
  }

  pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
    self.icon = Some(icon.into());
    self
  }

  /// Session-unique identity: the explicit key, or the text when none was
  /// given.
  #[inline]
  pub fn key(&self) -> &str {
    self.key.as_deref().unwrap_or(&self.text)
  }
}

/// Resolved parent links for a slice of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
  parents: Vec<Option<usize>>,
  by_key:  HashMap<String, usize>,
}

impl Hierarchy {
  /// Builds the key map in a single pass, then resolves every item's parent.
  ///
  /// Duplicate keys keep their first index. Self-parenting items and parents
  /// whose key is unknown resolve to `None`.
  pub fn resolve<T, F>(items: &[Item<T>], parent_key_of: F) -> Self
  where
    F: for<'a> Fn(&'a Item<T>) -> Option<&'a str>,
  {
    let mut by_key = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
      match by_key.entry(item.key().to_owned()) {
        Entry::Vacant(entry) => {
          entry.insert(index);
        },
        Entry::Occupied(entry) => {
          tracing::debug!(
            key = entry.key().as_str(),
            first = *entry.get(),
            duplicate = index,
            "duplicate item key, keeping the first occurrence"
          );
        },
      }
    }

    let parents = items
      .iter()
      .enumerate()
      .map(|(index, item)| {
        parent_key_of(item)
          .and_then(|key| by_key.get(key).copied())
          .filter(|&parent| parent != index)
      })
      .collect();

    Self { parents, by_key }
  }

  #[inline]
  pub fn parent(&self, index: usize) -> Option<usize> {
    self.parents.get(index).copied().flatten()
  }

  #[inline]
  pub fn index_of(&self, key: &str) -> Option<usize> {
    self.by_key.get(key).copied()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.parents.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.parents.is_empty()
  }
}

/// The item arena for one picker session.
///
/// `id` identifies the collection across its lifetime and `version` is
/// bumped on every replacement, so `(id, version)` names one immutable
/// snapshot of items.
#[derive(Debug, Clone)]
pub struct Collection<T> {
  id:        u64,
  version:   u64,
  items:     Vec<Item<T>>,
  hierarchy: Hierarchy,
}

impl<T> Default for Collection<T> {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl<T> Collection<T> {
  pub fn new(items: Vec<Item<T>>) -> Self {
    let hierarchy = Hierarchy::resolve(&items, |item| item.parent_key.as_deref());
    Self {
      id: NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed),
      version: 0,
      items,
      hierarchy,
    }
  }

  #[inline]
  pub fn id(&self) -> u64 {
    self.id
  }

  #[inline]
  pub fn version(&self) -> u64 {
    self.version
  }

  #[inline]
  pub fn items(&self) -> &[Item<T>] {
    &self.items
  }

  #[inline]
  pub fn get(&self, index: usize) -> Option<&Item<T>> {
    self.items.get(index)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.items.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  #[inline]
  pub fn hierarchy(&self) -> &Hierarchy {
    &self.hierarchy
  }

  pub fn index_of(&self, key: &str) -> Option<usize> {
    self.hierarchy.index_of(key)
  }

  /// Swaps in a new snapshot of items and bumps the version.
  pub fn replace(&mut self, items: Vec<Item<T>>) {
    self.hierarchy = Hierarchy::resolve(&items, |item| item.parent_key.as_deref());
    self.items = items;
    self.version = self.version.wrapping_add(1);
  }

  pub fn into_items(self) -> Vec<Item<T>> {
    self.items
  }
}
