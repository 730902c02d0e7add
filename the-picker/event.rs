use std::time::Instant;

use the_matcher::Item;

/// Whether keystrokes edit the query or only drive commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
  #[default]
  Insert,
  Normal,
}

/// Input fed to [`Picker::handle_event`](crate::Picker::handle_event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  Insert(char),
  Backspace,
  Delete,
  DeleteWord,
  ClearQuery,
  /// Moves the query cursor by this many chars.
  MoveCursor(isize),
  /// Moves the query cursor by this many words.
  MoveWord(isize),
  CursorStart,
  CursorEnd,
  /// Moves the list cursor, wrapping at either end.
  MoveSelection(isize),
  Toggle,
  Untoggle,
  SelectAll,
  ClearAll,
  Confirm,
  Cancel,
  SetMode(Mode),
  /// Lets the picker dispatch debounced fetches and drain deliveries.
  Tick(Instant),
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
  Selected(Item<T>),
  /// Selected items in collection order.
  MultiSelected(Vec<Item<T>>),
  Cancelled,
}
