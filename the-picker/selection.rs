use indexmap::IndexSet;

/// Multi-selection, tracked by item key so it survives refiltering.
///
/// With a `max_items` cap set, no operation ever grows the set past it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
  keys:      IndexSet<String>,
  max_items: Option<usize>,
}

impl SelectionSet {
  pub fn new(max_items: Option<usize>) -> Self {
    Self {
      keys: IndexSet::new(),
      max_items,
    }
  }

  #[inline]
  pub fn max_items(&self) -> Option<usize> {
    self.max_items
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.keys.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  #[inline]
  pub fn contains(&self, key: &str) -> bool {
    self.keys.contains(key)
  }

  /// Keys in the order they were selected.
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.keys.iter().map(String::as_str)
  }

  #[inline]
  fn is_full(&self) -> bool {
    self.max_items.is_some_and(|max| self.keys.len() >= max)
  }

  /// Flips membership of `key`. Returns `false` when the cap refused it.
  pub fn toggle(&mut self, key: &str) -> bool {
    if self.keys.shift_remove(key) {
      return true;
    }
    self.insert(key)
  }

  pub fn insert(&mut self, key: &str) -> bool {
    if self.keys.contains(key) || self.is_full() {
      return false;
    }
    self.keys.insert(key.to_owned());
    true
  }

  pub fn remove(&mut self, key: &str) -> bool {
    self.keys.shift_remove(key)
  }

  /// Adds every key or none of them: if the union would exceed the cap the
  /// set is left untouched. Returns whether anything was added.
  pub fn insert_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> bool {
    let missing: IndexSet<&str> = keys
      .into_iter()
      .filter(|key| !self.keys.contains(*key))
      .collect();
    if missing.is_empty() {
      return false;
    }
    if let Some(max) = self.max_items
      && self.keys.len() + missing.len() > max
    {
      tracing::trace!(
        selected = self.keys.len(),
        requested = missing.len(),
        max,
        "bulk selection refused"
      );
      return false;
    }
    self.keys.extend(missing.into_iter().map(str::to_owned));
    true
  }

  pub fn remove_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> bool {
    let before = self.keys.len();
    for key in keys {
      self.keys.shift_remove(key);
    }
    self.keys.len() != before
  }

  pub fn clear(&mut self) {
    self.keys.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn toggle_flips_membership() {
    let mut selection = SelectionSet::default();
    assert!(selection.toggle("a"));
    assert!(selection.contains("a"));
    assert!(selection.toggle("a"));
    assert!(selection.is_empty());
  }

  #[test]
  fn cap_refuses_growth() {
    let mut selection = SelectionSet::new(Some(1));
    assert!(selection.toggle("a"));
    assert!(!selection.toggle("b"));
    assert_eq!(selection.iter().collect::<Vec<_>>(), ["a"]);
    // Deselecting is always allowed.
    assert!(selection.toggle("a"));
    assert!(selection.toggle("b"));
  }

  #[test]
  fn bulk_insert_is_all_or_nothing() {
    let mut selection = SelectionSet::new(Some(3));
    selection.insert("a");
    assert!(!selection.insert_all(["b", "c", "d"]));
    assert_eq!(selection.len(), 1);
    // Already selected keys do not count against the cap.
    assert!(selection.insert_all(["a", "b", "c"]));
    assert_eq!(selection.len(), 3);
    assert!(!selection.insert_all(["a"]));
  }

  #[test]
  fn remove_all_reports_change() {
    let mut selection = SelectionSet::default();
    selection.insert_all(["a", "b"]);
    assert!(selection.remove_all(["b", "z"]));
    assert!(!selection.remove_all(["z"]));
    assert_eq!(selection.len(), 1);
  }

  quickcheck::quickcheck! {
      fn toggling_twice_restores(keys: Vec<String>, key: String, max: Option<u8>) -> bool {
          let mut selection = SelectionSet::new(max.map(|max| usize::from(max) + 1));
          for key in &keys {
              selection.toggle(key);
          }
          let before = selection.clone();
          if selection.toggle(&key) {
              selection.toggle(&key);
          }
          selection.len() == before.len() && before.iter().all(|key| selection.contains(key))
      }

      fn never_exceeds_cap(ops: Vec<(bool, u8)>, max: u8) -> bool {
          let max = usize::from(max % 8) + 1;
          let mut selection = SelectionSet::new(Some(max));
          ops.iter().all(|(bulk, key)| {
              if *bulk {
                  let keys: Vec<String> = (0..*key % 5).map(|offset| key.wrapping_add(offset).to_string()).collect();
                  selection.insert_all(keys.iter().map(String::as_str));
              } else {
                  selection.toggle(&key.to_string());
              }
              selection.len() <= max
          })
      }
  }
}
