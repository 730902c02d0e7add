//! Strategies injected into a [`Picker`](crate::Picker) at construction.

use the_matcher::{
  Collection,
  Item,
};

/// Host callbacks fired on session transitions. Every method defaults to a
/// no-op.
pub trait PickerHooks<T> {
  /// The item under the cursor changed.
  fn on_move(&mut self, _item: &Item<T>) {}
  fn on_select(&mut self, _item: &Item<T>) {}
  /// Selected items, in collection order.
  fn on_multiselect(&mut self, _items: &[&Item<T>]) {}
  fn on_cancel(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl<T> PickerHooks<T> for NoopHooks {}

type ItemFn<T> = Box<dyn FnMut(&Item<T>)>;

/// [`PickerHooks`] assembled from closures.
pub struct FnHooks<T> {
  on_move:        Option<ItemFn<T>>,
  on_select:      Option<ItemFn<T>>,
  on_multiselect: Option<Box<dyn FnMut(&[&Item<T>])>>,
  on_cancel:      Option<Box<dyn FnMut()>>,
}

impl<T> Default for FnHooks<T> {
  fn default() -> Self {
    Self {
      on_move:        None,
      on_select:      None,
      on_multiselect: None,
      on_cancel:      None,
    }
  }
}

impl<T> FnHooks<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_move(mut self, f: impl FnMut(&Item<T>) + 'static) -> Self {
    self.on_move = Some(Box::new(f));
    self
  }

  pub fn with_select(mut self, f: impl FnMut(&Item<T>) + 'static) -> Self {
    self.on_select = Some(Box::new(f));
    self
  }

  pub fn with_multiselect(mut self, f: impl FnMut(&[&Item<T>]) + 'static) -> Self {
    self.on_multiselect = Some(Box::new(f));
    self
  }

  pub fn with_cancel(mut self, f: impl FnMut() + 'static) -> Self {
    self.on_cancel = Some(Box::new(f));
    self
  }
}

impl<T> PickerHooks<T> for FnHooks<T> {
  fn on_move(&mut self, item: &Item<T>) {
    if let Some(f) = self.on_move.as_mut() {
      f(item);
    }
  }

  fn on_select(&mut self, item: &Item<T>) {
    if let Some(f) = self.on_select.as_mut() {
      f(item);
    }
  }

  fn on_multiselect(&mut self, items: &[&Item<T>]) {
    if let Some(f) = self.on_multiselect.as_mut() {
      f(items);
    }
  }

  fn on_cancel(&mut self) {
    if let Some(f) = self.on_cancel.as_mut() {
      f();
    }
  }
}

/// Result of intercepting the raw query before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreFiltered {
  /// Collection indices allowed to match; `None` keeps every item.
  pub candidates: Option<Vec<usize>>,
  /// What remains of the query to be scored.
  pub query:      String,
  /// Opaque label for the host to display.
  pub metadata:   Option<String>,
}

impl PreFiltered {
  pub fn passthrough(query: &str) -> Self {
    Self {
      candidates: None,
      query:      query.to_string(),
      metadata:   None,
    }
  }
}

pub trait PreFilter<T> {
  fn pre_filter(&self, items: &Collection<T>, query: &str) -> PreFiltered;
}

/// `/kind rest` narrows the collection to items whose kind starts with
/// `kind` (ignoring case) and scores `rest` against them.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindPrefixFilter;

impl<T> PreFilter<T> for KindPrefixFilter {
  fn pre_filter(&self, items: &Collection<T>, query: &str) -> PreFiltered {
    let Some(rest) = query.strip_prefix('/') else {
      return PreFiltered::passthrough(query);
    };
    let (kind, remainder) = match rest.split_once(char::is_whitespace) {
      Some((kind, remainder)) => (kind, remainder.trim_start()),
      None => (rest, ""),
    };
    if kind.is_empty() {
      return PreFiltered::passthrough(remainder);
    }

    let kind = kind.to_lowercase();
    let candidates = items
      .items()
      .iter()
      .enumerate()
      .filter(|(_, item)| {
        item
          .kind
          .as_deref()
          .is_some_and(|item_kind| item_kind.to_lowercase().starts_with(&kind))
      })
      .map(|(index, _)| index)
      .collect();

    PreFiltered {
      candidates: Some(candidates),
      query:      remainder.to_string(),
      metadata:   Some(kind),
    }
  }
}
