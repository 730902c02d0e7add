use std::time::Instant;

use the_matcher::{
  Collection,
  FilterCache,
  FilteredEntry,
  FilteredView,
  HierarchyOptions,
  Item,
  Layout,
  Scorer,
  cache::{
    CacheKey,
    candidates_fingerprint,
  },
  filter_flat_with,
  filter_hierarchical_with,
};

use crate::{
  config::PickerConfig,
  event::{
    Event,
    Mode,
    Outcome,
  },
  hooks::{
    NoopHooks,
    PickerHooks,
    PreFilter,
    PreFiltered,
  },
  query::QueryState,
  selection::SelectionSet,
  source::{
    AsyncSource,
    Delivery,
    RequestId,
    Source,
  },
};

/// One interactive selection session.
///
/// Every mutation is synchronous: it updates the query or selection and
/// recomputes the filtered view before returning. Commands that do not apply
/// (an empty list, a full selection, a closed picker) are no-ops that return
/// `false` or `None`.
pub struct Picker<T> {
  config:      PickerConfig,
  collection:  Collection<T>,
  query:       QueryState,
  view:        FilteredView,
  selection:   SelectionSet,
  /// Position within `view`.
  cursor:      Option<usize>,
  /// Key of the item `on_move` last reported.
  last_key:    Option<String>,
  mode:        Mode,
  /// No query edit has happened yet.
  first_paint: bool,
  loading:     bool,
  closed:      bool,
  root_key:    Option<String>,
  metadata:    Option<String>,
  cache:       Option<FilterCache>,
  hooks:       Box<dyn PickerHooks<T>>,
  scorer:      Box<dyn Scorer>,
  pre_filter:  Option<Box<dyn PreFilter<T>>>,
  source:      Option<AsyncSource<T>>,
  /// Produced by an implicit confirm, waiting to be taken.
  outcome:     Option<Outcome<T>>,
}

impl<T> Picker<T> {
  pub fn new(items: Vec<Item<T>>, config: PickerConfig) -> Self {
    let cache = (config.cache_capacity > 0).then(|| FilterCache::new(config.cache_capacity));
    let mut picker = Self {
      collection: Collection::new(items),
      query: QueryState::default(),
      view: FilteredView::default(),
      selection: SelectionSet::new(config.max_items),
      cursor: None,
      last_key: None,
      mode: Mode::Insert,
      first_paint: true,
      loading: false,
      closed: false,
      root_key: None,
      metadata: None,
      cache,
      hooks: Box::new(NoopHooks),
      scorer: config.matcher.scorer(),
      pre_filter: None,
      source: None,
      outcome: None,
      config,
    };
    picker.refilter();
    picker
  }

  pub fn with_hooks(mut self, hooks: impl PickerHooks<T> + 'static) -> Self {
    self.hooks = Box::new(hooks);
    self
  }

  /// Replaces the scorer chosen by the config.
  pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
    self.scorer = Box::new(scorer);
    if let Some(cache) = self.cache.as_mut() {
      cache.clear();
    }
    self.refilter();
    self
  }

  pub fn with_pre_filter(mut self, pre_filter: impl PreFilter<T> + 'static) -> Self {
    self.pre_filter = Some(Box::new(pre_filter));
    self.refilter();
    self
  }

  /// Designates the item with `key` as the hierarchical root.
  pub fn with_root(mut self, key: impl Into<String>) -> Self {
    self.root_key = Some(key.into());
    self.refilter();
    self
  }

  /// Sets the initial query. This does not count as a keystroke.
  pub fn with_query(mut self, query: impl Into<String>) -> Self {
    self.query = QueryState::new(query);
    self.reload();
    self
  }

  /// Attaches an async source and fetches items for the current query.
  pub fn with_source(mut self, source: impl Source<T> + 'static) -> Self {
    self.source = Some(AsyncSource::new(Box::new(source)));
    self.reload();
    self
  }

  #[inline]
  pub fn config(&self) -> &PickerConfig {
    &self.config
  }

  #[inline]
  pub fn query(&self) -> &str {
    self.query.text()
  }

  #[inline]
  pub fn query_state(&self) -> &QueryState {
    &self.query
  }

  #[inline]
  pub fn collection(&self) -> &Collection<T> {
    &self.collection
  }

  #[inline]
  pub fn view(&self) -> &FilteredView {
    &self.view
  }

  #[inline]
  pub fn selection(&self) -> &SelectionSet {
    &self.selection
  }

  #[inline]
  pub fn mode(&self) -> Mode {
    self.mode
  }

  #[inline]
  pub fn is_loading(&self) -> bool {
    self.loading
  }

  #[inline]
  pub fn is_closed(&self) -> bool {
    self.closed
  }

  /// Label produced by the pre-filter for the current query.
  #[inline]
  pub fn metadata(&self) -> Option<&str> {
    self.metadata.as_deref()
  }

  /// Id of the latest fetch, if a source is attached.
  pub fn request_id(&self) -> Option<RequestId> {
    self.source.as_ref().map(AsyncSource::current)
  }

  /// Whether the list is suppressed until the first character is typed.
  pub fn is_hidden(&self) -> bool {
    self.config.start_hidden && self.query.is_empty()
  }

  /// Cursor position within the view.
  pub fn cursor(&self) -> Option<usize> {
    if self.is_hidden() {
      return None;
    }
    self.cursor
  }

  fn current_index(&self) -> Option<usize> {
    self
      .cursor()
      .and_then(|position| self.view.index_at(position))
  }

  pub fn current(&self) -> Option<&Item<T>> {
    self
      .current_index()
      .and_then(|index| self.collection.get(index))
  }

  pub fn is_selected(&self, item: &Item<T>) -> bool {
    self.selection.contains(item.key())
  }

  /// Entries to render, paired with their items. Empty while hidden.
  pub fn visible(&self) -> impl Iterator<Item = (&FilteredEntry, &Item<T>)> {
    let entries: &[FilteredEntry] = if self.is_hidden() {
      &[]
    } else {
      &self.view.entries
    };
    let collection = &self.collection;
    entries
      .iter()
      .filter_map(move |entry| collection.get(entry.index).map(|item| (entry, item)))
  }

  /// Takes the outcome of an implicit confirm (auto-accept).
  pub fn take_outcome(&mut self) -> Option<Outcome<T>> {
    self.outcome.take()
  }

  pub fn handle_event(&mut self, event: Event) -> Option<Outcome<T>> {
    if self.closed {
      return None;
    }
    match event {
      Event::Insert(ch) => {
        self.insert_char(ch);
      },
      Event::Backspace => {
        self.backspace();
      },
      Event::Delete => {
        self.delete_forward();
      },
      Event::DeleteWord => {
        self.delete_word();
      },
      Event::ClearQuery => {
        self.clear_query();
      },
      Event::MoveCursor(delta) => {
        self.move_cursor(delta);
      },
      Event::MoveWord(delta) => {
        self.move_word(delta);
      },
      Event::CursorStart => {
        self.cursor_to_start();
      },
      Event::CursorEnd => {
        self.cursor_to_end();
      },
      Event::MoveSelection(delta) => {
        self.move_selection(delta);
      },
      Event::Toggle => {
        self.toggle_selection();
      },
      Event::Untoggle => {
        self.untoggle_selection();
      },
      Event::SelectAll => {
        self.select_all();
      },
      Event::ClearAll => {
        self.clear_all();
      },
      Event::Confirm => return self.confirm(),
      Event::Cancel => return self.cancel(),
      Event::SetMode(mode) => {
        self.set_mode(mode);
      },
      Event::Tick(now) => {
        self.tick(now);
      },
    }
    self.outcome.take()
  }

  /// Ignored in [`Mode::Normal`].
  pub fn insert_char(&mut self, ch: char) -> bool {
    if self.closed || self.mode == Mode::Normal {
      return false;
    }
    self.query.insert(ch);
    self.query_edited();
    true
  }

  pub fn backspace(&mut self) -> bool {
    self.edit_query(QueryState::backspace)
  }

  pub fn delete_forward(&mut self) -> bool {
    self.edit_query(QueryState::delete_forward)
  }

  pub fn delete_word(&mut self) -> bool {
    self.edit_query(QueryState::delete_word)
  }

  pub fn clear_query(&mut self) -> bool {
    self.edit_query(QueryState::clear)
  }

  pub fn move_cursor(&mut self, delta: isize) -> bool {
    !self.closed && self.query.move_cursor(delta)
  }

  pub fn move_word(&mut self, delta: isize) -> bool {
    !self.closed && self.query.move_word(delta)
  }

  pub fn cursor_to_start(&mut self) -> bool {
    !self.closed && self.query.to_start()
  }

  pub fn cursor_to_end(&mut self) -> bool {
    !self.closed && self.query.to_end()
  }

  pub fn set_mode(&mut self, mode: Mode) -> bool {
    if self.closed || self.mode == mode {
      return false;
    }
    tracing::trace!(?mode, "picker mode changed");
    self.mode = mode;
    true
  }

  /// Moves the list cursor by `delta`, wrapping at either end.
  pub fn move_selection(&mut self, delta: isize) -> bool {
    if self.closed || self.is_hidden() || self.view.is_empty() {
      return false;
    }
    let len = self.view.len();
    let step = delta.rem_euclid(len as isize) as usize;
    let cursor = self.cursor.unwrap_or(0);
    self.cursor = Some((cursor + step) % len);
    self.notify_move();
    true
  }

  /// Flips the current item's membership and advances the cursor. A toggle
  /// refused by the selection limit leaves everything in place.
  pub fn toggle_selection(&mut self) -> bool {
    if self.closed {
      return false;
    }
    let Some(item) = self.current_index().and_then(|index| self.collection.get(index)) else {
      return false;
    };
    if !self.selection.toggle(item.key()) {
      tracing::trace!(
        max_items = self.selection.max_items(),
        "selection limit reached"
      );
      return false;
    }
    self.move_selection(1);
    true
  }

  /// Jumps back to the nearest selected item before the cursor (wrapping to
  /// search from the end) and deselects it.
  pub fn untoggle_selection(&mut self) -> bool {
    if self.closed || self.selection.is_empty() {
      return false;
    }
    let Some(cursor) = self.cursor() else {
      return false;
    };
    let selected_key = |position: usize| {
      self
        .view
        .index_at(position)
        .and_then(|index| self.collection.get(index))
        .map(Item::key)
        .filter(|key| self.selection.contains(key))
    };
    let Some((position, key)) = (0..cursor)
      .rev()
      .chain((cursor..self.view.len()).rev())
      .find_map(|position| selected_key(position).map(|key| (position, key.to_owned())))
    else {
      return false;
    };

    self.selection.remove(&key);
    self.cursor = Some(position);
    self.notify_move();
    true
  }

  /// Selects every filtered item, or nothing if that would exceed the limit.
  pub fn select_all(&mut self) -> bool {
    if self.closed || self.is_hidden() {
      return false;
    }
    let keys = self
      .view
      .entries
      .iter()
      .filter_map(|entry| self.collection.get(entry.index))
      .map(Item::key);
    self.selection.insert_all(keys)
  }

  /// Deselects every filtered item.
  pub fn clear_all(&mut self) -> bool {
    if self.closed {
      return false;
    }
    let keys = self
      .view
      .entries
      .iter()
      .filter_map(|entry| self.collection.get(entry.index))
      .map(Item::key);
    self.selection.remove_all(keys)
  }

  /// Ends the session with the selection, or with the current item when
  /// nothing is selected. Without either the picker stays open.
  pub fn confirm(&mut self) -> Option<Outcome<T>> {
    if self.closed {
      return None;
    }

    let selected: Vec<usize> = if self.selection.is_empty() {
      Vec::new()
    } else {
      self
        .collection
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| self.selection.contains(item.key()))
        .map(|(index, _)| index)
        .collect()
    };

    if !selected.is_empty() {
      let items: Vec<&Item<T>> = selected
        .iter()
        .filter_map(|&index| self.collection.get(index))
        .collect();
      self.hooks.on_multiselect(&items);
      tracing::debug!(count = selected.len(), "confirmed multi-selection");
      let picked = self
        .close()
        .into_iter()
        .enumerate()
        .filter(|(index, _)| selected.binary_search(index).is_ok())
        .map(|(_, item)| item)
        .collect();
      return Some(Outcome::MultiSelected(picked));
    }

    let index = self.current_index()?;
    let item = self.collection.get(index)?;
    self.hooks.on_select(item);
    tracing::debug!(index, "confirmed selection");
    let mut items = self.close();
    (index < items.len()).then(|| Outcome::Selected(items.swap_remove(index)))
  }

  pub fn cancel(&mut self) -> Option<Outcome<T>> {
    if self.closed {
      return None;
    }
    self.hooks.on_cancel();
    tracing::debug!("picker cancelled");
    self.close();
    Some(Outcome::Cancelled)
  }

  /// Replaces the items of a synchronous picker.
  pub fn set_items(&mut self, items: Vec<Item<T>>) {
    if self.closed {
      return;
    }
    self.replace_collection(items);
    self.refilter();
  }

  /// Dispatches a due debounced fetch and drains pending deliveries.
  pub fn tick(&mut self, now: Instant) -> bool {
    if self.closed {
      return false;
    }
    if let Some(source) = self.source.as_mut()
      && source.is_due(now)
    {
      source.dispatch(self.query.text());
    }

    let mut changed = false;
    let mut processed = 0usize;
    while processed < self.config.max_deliveries_per_tick {
      let Some(delivery) = self.source.as_ref().and_then(AsyncSource::try_recv) else {
        break;
      };
      changed |= self.deliver(delivery);
      processed += 1;
    }
    changed
  }

  /// Accepts a delivery for the latest fetch. Anything else is stale and
  /// dropped without touching the picker.
  pub fn deliver(&mut self, delivery: Delivery<T>) -> bool {
    let Some(source) = self.source.as_mut() else {
      return false;
    };
    let current = source.current();
    if delivery.request_id != current {
      tracing::debug!(
        request_id = delivery.request_id.0,
        current = current.0,
        "discarding stale delivery"
      );
      return false;
    }
    if delivery.fully_loaded {
      tracing::debug!(request_id = current.0, "source fully loaded");
      source.mark_fully_loaded();
    }
    self.loading = source.is_pending();

    self.replace_collection(delivery.items);
    tracing::trace!(
      request_id = current.0,
      items = self.collection.len(),
      "accepted delivery"
    );
    self.refilter();
    self.auto_accept();
    true
  }

  fn edit_query(&mut self, edit: impl FnOnce(&mut QueryState) -> bool) -> bool {
    if self.closed || !edit(&mut self.query) {
      return false;
    }
    self.query_edited();
    true
  }

  fn query_edited(&mut self) {
    self.first_paint = false;
    if let Some(source) = self
      .source
      .as_mut()
      .filter(|source| !source.is_fully_loaded())
    {
      self.loading = true;
      let debounce = self.config.debounce();
      if debounce.is_zero() {
        source.dispatch(self.query.text());
      } else {
        source.schedule(Instant::now(), debounce);
      }
      return;
    }
    self.refilter();
    self.auto_accept();
  }

  /// Fetches for the current query when a source still drives the items,
  /// otherwise refilters.
  fn reload(&mut self) {
    if let Some(source) = self
      .source
      .as_mut()
      .filter(|source| !source.is_fully_loaded())
    {
      self.loading = true;
      source.dispatch(self.query.text());
      return;
    }
    self.refilter();
  }

  /// Confirms the only remaining direct match. Ancestor rows and a pinned
  /// root never count.
  fn auto_accept(&mut self) {
    if !self.config.auto_accept || self.first_paint || self.loading {
      return;
    }
    let mut direct = self
      .view
      .entries
      .iter()
      .enumerate()
      .filter(|(_, entry)| entry.direct);
    let (Some((position, _)), None) = (direct.next(), direct.next()) else {
      return;
    };
    tracing::debug!(position, "auto-accepting the only remaining match");
    self.cursor = Some(position);
    self.outcome = self.confirm();
  }

  fn replace_collection(&mut self, items: Vec<Item<T>>) {
    let id = self.collection.id();
    self.collection.replace(items);
    if let Some(cache) = self.cache.as_mut() {
      cache.invalidate(id);
    }
  }

  fn refilter(&mut self) {
    self.view = self.compute_view();
    self.cursor = (!self.view.is_empty()).then(|| self.view.best.unwrap_or(0));
    self.notify_move_if_changed();
  }

  fn compute_view(&mut self) -> FilteredView {
    let PreFiltered {
      candidates,
      query,
      metadata,
    } = match self.pre_filter.as_ref() {
      Some(pre_filter) => pre_filter.pre_filter(&self.collection, self.query.text()),
      None => PreFiltered::passthrough(self.query.text()),
    };
    self.metadata = metadata;

    let collection = &self.collection;
    let scorer = &*self.scorer;
    let candidates = candidates.as_deref();
    let layout = self.config.layout;
    let preserve_order = self.config.preserve_order;
    let options = HierarchyOptions {
      root:     self
        .root_key
        .as_deref()
        .and_then(|key| collection.index_of(key)),
      pin_root: self.config.pin_root,
    };

    let compute = || match layout {
      Layout::Flat => {
        filter_flat_with(scorer, collection.items(), candidates, &query, preserve_order)
      },
      Layout::Hierarchical => {
        filter_hierarchical_with(
          scorer,
          collection.items(),
          collection.hierarchy(),
          candidates,
          &query,
          options,
        )
      },
    };

    match self.cache.as_mut() {
      Some(cache) => {
        let key = CacheKey {
          collection_id: collection.id(),
          version: collection.version(),
          query: query.clone(),
          layout,
          preserve_order,
          hierarchy: options,
          candidates: candidates_fingerprint(candidates),
        };
        cache.get_or_insert_with(key, compute)
      },
      None => compute(),
    }
  }

  /// Reports the item under the cursor to `on_move`.
  fn notify_move(&mut self) {
    let Some(item) = self.current_index().and_then(|index| self.collection.get(index)) else {
      self.last_key = None;
      return;
    };
    tracing::trace!(cursor = self.cursor, key = item.key(), "cursor moved");
    self.last_key = Some(item.key().to_owned());
    self.hooks.on_move(item);
  }

  /// After a refilter the cursor only counts as moved when it landed on a
  /// different item.
  fn notify_move_if_changed(&mut self) {
    let key = self
      .current_index()
      .and_then(|index| self.collection.get(index))
      .map(Item::key);
    if key.is_some() && key == self.last_key.as_deref() {
      return;
    }
    self.notify_move();
  }

  /// Ends the session and hands back the items.
  fn close(&mut self) -> Vec<Item<T>> {
    self.closed = true;
    self.loading = false;
    if let Some(source) = self.source.take() {
      source.close();
    }
    self.view = FilteredView::default();
    self.selection.clear();
    self.cursor = None;
    self.last_key = None;
    self.cache = None;
    std::mem::take(&mut self.collection).into_items()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use super::*;
  use crate::hooks::{
    FnHooks,
    KindPrefixFilter,
  };

  fn fruits() -> Vec<Item<u32>> {
    ["apple", "banana", "cherry", "grape", "grapefruit"]
      .into_iter()
      .zip(0..)
      .map(|(text, value)| Item::new(text, value))
      .collect()
  }

  fn visible_texts<T>(picker: &Picker<T>) -> Vec<String> {
    picker
      .visible()
      .map(|(_, item)| item.text.clone())
      .collect()
  }

  fn type_str<T>(picker: &mut Picker<T>, text: &str) {
    for ch in text.chars() {
      picker.insert_char(ch);
    }
  }

  #[test]
  fn starts_on_first_item() {
    let picker = Picker::new(fruits(), PickerConfig::default());
    assert_eq!(picker.view().len(), 5);
    assert_eq!(picker.cursor(), Some(0));
    assert_eq!(picker.current().map(|item| item.value), Some(0));
  }

  #[test]
  fn typing_refilters_and_lands_on_best() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    type_str(&mut picker, "grape");
    assert_eq!(visible_texts(&picker), ["grape", "grapefruit"]);
    assert_eq!(picker.current().map(|item| item.text.as_str()), Some("grape"));

    picker.backspace();
    assert_eq!(picker.query(), "grap");
    picker.clear_query();
    assert_eq!(picker.view().len(), 5);
  }

  #[test]
  fn cursor_movement_does_not_refilter() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    type_str(&mut picker, "an");
    let before = picker.view().clone();
    assert!(picker.move_cursor(-1));
    assert!(picker.cursor_to_start());
    assert!(!picker.cursor_to_start());
    assert_eq!(picker.view(), &before);
    picker.insert_char('b');
    assert_eq!(picker.query(), "ban");
  }

  #[test]
  fn selection_wraps() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    assert!(picker.move_selection(-1));
    assert_eq!(picker.cursor(), Some(4));
    assert!(picker.move_selection(1));
    assert_eq!(picker.cursor(), Some(0));
    assert!(picker.move_selection(7));
    assert_eq!(picker.cursor(), Some(2));
  }

  #[test]
  fn empty_list_ignores_navigation_and_confirm() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    type_str(&mut picker, "zzz");
    assert!(picker.view().is_empty());
    assert!(!picker.move_selection(1));
    assert!(!picker.toggle_selection());
    assert_eq!(picker.confirm(), None);
    assert!(!picker.is_closed());
  }

  #[test]
  fn normal_mode_ignores_characters() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    assert!(picker.set_mode(Mode::Normal));
    assert!(!picker.insert_char('a'));
    assert_eq!(picker.query(), "");
    assert!(picker.move_selection(1));
    assert!(picker.set_mode(Mode::Insert));
    assert!(picker.insert_char('a'));
  }

  #[test]
  fn toggle_advances_and_confirm_returns_collection_order() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    picker.move_selection(2);
    assert!(picker.toggle_selection());
    assert_eq!(picker.cursor(), Some(3));
    picker.move_selection(-3);
    assert!(picker.toggle_selection());
    assert_eq!(picker.selection().len(), 2);

    let Some(Outcome::MultiSelected(items)) = picker.confirm() else {
      panic!("expected a multi-selection");
    };
    let texts: Vec<&str> = items.iter().map(|item| item.text.as_str()).collect();
    assert_eq!(texts, ["apple", "cherry"]);
    assert!(picker.is_closed());
  }

  #[test]
  fn cap_blocks_toggle_without_moving() {
    let config = PickerConfig {
      max_items: Some(1),
      ..PickerConfig::default()
    };
    let mut picker = Picker::new(fruits(), config);
    assert!(picker.toggle_selection());
    assert_eq!(picker.cursor(), Some(1));
    assert!(!picker.toggle_selection());
    assert_eq!(picker.cursor(), Some(1));
    assert_eq!(picker.selection().len(), 1);
  }

  #[test]
  fn untoggle_searches_backwards_then_wraps() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    picker.move_selection(1);
    picker.toggle_selection(); // banana, cursor -> 2
    picker.move_selection(1);
    picker.toggle_selection(); // grape, cursor -> 4
    picker.move_selection(-4); // cursor -> 0

    // Nothing before position 0, so the search wraps and finds grape first.
    assert!(picker.untoggle_selection());
    assert_eq!(picker.cursor(), Some(3));
    assert!(!picker.is_selected(&Item::new("grape", 0)));

    assert!(picker.untoggle_selection());
    assert_eq!(picker.cursor(), Some(1));
    assert!(picker.selection().is_empty());
    assert!(!picker.untoggle_selection());
  }

  #[test]
  fn select_all_is_bounded_by_filter_and_cap() {
    let config = PickerConfig {
      max_items: Some(2),
      ..PickerConfig::default()
    };
    let mut picker = Picker::new(fruits(), config);
    assert!(!picker.select_all());
    assert!(picker.selection().is_empty());

    type_str(&mut picker, "grape");
    assert!(picker.select_all());
    assert_eq!(picker.selection().len(), 2);

    picker.clear_query();
    assert!(picker.clear_all());
    assert!(picker.selection().is_empty());
  }

  #[test]
  fn confirm_without_selection_picks_current() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    type_str(&mut picker, "cher");
    let outcome = picker.confirm();
    assert!(matches!(outcome, Some(Outcome::Selected(ref item)) if item.value == 2));
    assert!(picker.is_closed());
    assert!(!picker.insert_char('x'));
    assert_eq!(picker.confirm(), None);
  }

  #[test]
  fn hooks_observe_transitions() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let (moves, selects, cancels) = (log.clone(), log.clone(), log.clone());
    let hooks = FnHooks::new()
      .with_move(move |item: &Item<u32>| moves.borrow_mut().push(format!("move {}", item.text)))
      .with_select(move |item: &Item<u32>| {
        selects.borrow_mut().push(format!("select {}", item.text))
      })
      .with_cancel(move || cancels.borrow_mut().push("cancel".to_string()));

    let mut picker = Picker::new(fruits(), PickerConfig::default()).with_hooks(hooks);
    picker.move_selection(1);
    type_str(&mut picker, "b");
    // Still on banana: no second move.
    picker.insert_char('a');
    picker.confirm();
    assert_eq!(*log.borrow(), ["move banana", "select banana"]);
  }

  fn recording_moves() -> (Rc<RefCell<Vec<u32>>>, FnHooks<u32>) {
    let moves = Rc::new(RefCell::new(Vec::new()));
    let sink = moves.clone();
    let hooks = FnHooks::new().with_move(move |item: &Item<u32>| sink.borrow_mut().push(item.value));
    (moves, hooks)
  }

  #[test]
  fn every_cursor_move_reports_the_item() {
    let (moves, hooks) = recording_moves();
    let mut picker = Picker::new(vec![Item::new("only", 7u32)], PickerConfig::default())
      .with_hooks(hooks);
    assert!(picker.move_selection(1));
    assert!(picker.move_selection(-1));
    assert_eq!(*moves.borrow(), [7, 7]);

    let (moves, hooks) = recording_moves();
    let mut picker = Picker::new(
      vec![Item::new("dup", 0u32), Item::new("dup", 1)],
      PickerConfig::default(),
    )
    .with_hooks(hooks);
    picker.move_selection(1);
    picker.move_selection(1);
    assert_eq!(*moves.borrow(), [1, 0]);
  }

  #[test]
  fn auto_accept_ignores_ancestors_and_root() {
    let items = || {
      vec![
        Item::new("root", 0u32).with_key("root"),
        Item::new("alpha", 1).with_key("alpha").with_parent("root"),
      ]
    };
    let config = PickerConfig {
      layout: Layout::Hierarchical,
      pin_root: true,
      auto_accept: true,
      ..PickerConfig::default()
    };

    let mut picker = Picker::new(items(), config.clone()).with_root("root");
    assert_eq!(picker.handle_event(Event::Insert('z')), None);
    assert_eq!(visible_texts(&picker), ["root"]);
    assert!(!picker.is_closed());

    let mut picker = Picker::new(items(), config).with_root("root");
    let outcome = picker.handle_event(Event::Insert('a'));
    assert!(matches!(outcome, Some(Outcome::Selected(ref item)) if item.value == 1));
  }

  #[test]
  fn cancel_fires_hook_once() {
    let cancelled = Rc::new(RefCell::new(0));
    let counter = cancelled.clone();
    let mut picker = Picker::new(fruits(), PickerConfig::default())
      .with_hooks(FnHooks::new().with_cancel(move || *counter.borrow_mut() += 1));
    assert_eq!(picker.cancel(), Some(Outcome::Cancelled));
    assert_eq!(picker.cancel(), None);
    assert_eq!(*cancelled.borrow(), 1);
    assert!(picker.view().is_empty());
  }

  #[test]
  fn auto_accept_skips_first_paint() {
    let config = PickerConfig {
      auto_accept: true,
      ..PickerConfig::default()
    };
    let mut picker = Picker::new(vec![Item::new("only", 1u32)], config.clone());
    assert!(!picker.is_closed());
    assert_eq!(picker.take_outcome(), None);

    let mut picker = Picker::new(fruits(), config);
    assert_eq!(picker.handle_event(Event::Insert('g')), None);
    let outcome = picker.handle_event(Event::Insert('f'));
    assert!(matches!(outcome, Some(Outcome::Selected(ref item)) if item.text == "grapefruit"));
    assert!(picker.is_closed());
  }

  #[test]
  fn start_hidden_until_typing() {
    let config = PickerConfig {
      start_hidden: true,
      ..PickerConfig::default()
    };
    let mut picker = Picker::new(fruits(), config);
    assert!(picker.is_hidden());
    assert_eq!(picker.current(), None);
    assert!(!picker.move_selection(1));
    assert_eq!(picker.visible().count(), 0);
    assert_eq!(picker.confirm(), None);

    picker.insert_char('a');
    assert!(!picker.is_hidden());
    assert!(picker.current().is_some());
  }

  #[test]
  fn preserve_order_keeps_collection_order() {
    let config = PickerConfig {
      preserve_order: true,
      ..PickerConfig::default()
    };
    let mut picker = Picker::new(fruits(), config);
    type_str(&mut picker, "e");
    assert_eq!(visible_texts(&picker), [
      "apple",
      "cherry",
      "grape",
      "grapefruit",
    ]);
  }

  #[test]
  fn hierarchical_layout_keeps_parents() {
    let items = vec![
      Item::new("root", 0u32).with_key("root"),
      Item::new("Config", 1).with_key("Config").with_parent("root"),
      Item::new("load", 2).with_key("Config::load").with_parent("Config"),
      Item::new("Picker", 3).with_key("Picker").with_parent("root"),
    ];
    let config = PickerConfig {
      layout: Layout::Hierarchical,
      pin_root: true,
      ..PickerConfig::default()
    };
    let mut picker = Picker::new(items, config).with_root("root");
    type_str(&mut picker, "load");
    assert_eq!(visible_texts(&picker), ["root", "Config", "load"]);
    assert_eq!(picker.current().map(|item| item.value), Some(2));
    let direct: Vec<bool> = picker.visible().map(|(entry, _)| entry.direct).collect();
    assert_eq!(direct, [false, false, true]);
  }

  #[test]
  fn pre_filter_narrows_and_reports_metadata() {
    let items = vec![
      Item::new("Config", 0u32).with_kind("struct"),
      Item::new("config", 1).with_kind("function"),
      Item::new("Picker", 2).with_kind("struct"),
    ];
    let mut picker = Picker::new(items, PickerConfig::default()).with_pre_filter(KindPrefixFilter);
    type_str(&mut picker, "/fn");
    assert_eq!(picker.metadata(), Some("fn"));
    assert!(picker.view().is_empty());

    picker.clear_query();
    type_str(&mut picker, "/st conf");
    assert_eq!(picker.metadata(), Some("st"));
    assert_eq!(visible_texts(&picker), ["Config"]);
  }

  #[test]
  fn cache_serves_repeated_queries() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    type_str(&mut picker, "ap");
    let first = picker.view().clone();
    picker.backspace();
    picker.insert_char('p');
    assert_eq!(picker.view(), &first);
    let stats = picker.cache.as_ref().map(FilterCache::stats).unwrap();
    assert!(stats.hits >= 1);
  }

  #[test]
  fn set_items_replaces_and_refilters() {
    let mut picker = Picker::new(fruits(), PickerConfig::default());
    type_str(&mut picker, "kiwi");
    assert!(picker.view().is_empty());
    picker.set_items(vec![Item::new("kiwi", 9)]);
    assert_eq!(picker.current().map(|item| item.value), Some(9));
    assert_eq!(picker.collection().version(), 1);
  }
}
