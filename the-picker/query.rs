use the_core::chars::{
  next_char_boundary,
  next_word_end,
  prev_char_boundary,
  prev_word_start,
};

/// Query text plus an insertion cursor.
///
/// The cursor is a byte offset that always sits on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
  text:   String,
  cursor: usize,
}

impl QueryState {
  pub fn new(text: impl Into<String>) -> Self {
    let text = text.into();
    let cursor = text.len();
    Self { text, cursor }
  }

  #[inline]
  pub fn text(&self) -> &str {
    &self.text
  }

  #[inline]
  pub fn cursor(&self) -> usize {
    self.cursor
  }

  /// Cursor position counted in chars.
  pub fn char_cursor(&self) -> usize {
    self.text[..self.cursor].chars().count()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  pub fn insert(&mut self, ch: char) {
    self.text.insert(self.cursor, ch);
    self.cursor += ch.len_utf8();
  }

  pub fn backspace(&mut self) -> bool {
    if self.cursor == 0 {
      return false;
    }
    let start = prev_char_boundary(&self.text, self.cursor);
    self.text.replace_range(start..self.cursor, "");
    self.cursor = start;
    true
  }

  pub fn delete_forward(&mut self) -> bool {
    if self.cursor >= self.text.len() {
      return false;
    }
    let end = next_char_boundary(&self.text, self.cursor);
    self.text.replace_range(self.cursor..end, "");
    true
  }

  /// Deletes back to the start of the previous word.
  pub fn delete_word(&mut self) -> bool {
    if self.cursor == 0 {
      return false;
    }
    let start = prev_word_start(&self.text, self.cursor);
    self.text.replace_range(start..self.cursor, "");
    self.cursor = start;
    true
  }

  pub fn clear(&mut self) -> bool {
    if self.text.is_empty() {
      return false;
    }
    self.text.clear();
    self.cursor = 0;
    true
  }

  /// Moves the cursor by `delta` chars, clamping at either end.
  pub fn move_cursor(&mut self, delta: isize) -> bool {
    let before = self.cursor;
    for _ in 0..delta.unsigned_abs() {
      let next = if delta < 0 {
        prev_char_boundary(&self.text, self.cursor)
      } else {
        next_char_boundary(&self.text, self.cursor)
      };
      if next == self.cursor {
        break;
      }
      self.cursor = next;
    }
    self.cursor != before
  }

  /// Moves the cursor by `delta` words, clamping at either end.
  pub fn move_word(&mut self, delta: isize) -> bool {
    let before = self.cursor;
    for _ in 0..delta.unsigned_abs() {
      let next = if delta < 0 {
        prev_word_start(&self.text, self.cursor)
      } else {
        next_word_end(&self.text, self.cursor)
      };
      if next == self.cursor {
        break;
      }
      self.cursor = next;
    }
    self.cursor != before
  }

  pub fn to_start(&mut self) -> bool {
    let moved = self.cursor != 0;
    self.cursor = 0;
    moved
  }

  pub fn to_end(&mut self) -> bool {
    let moved = self.cursor != self.text.len();
    self.cursor = self.text.len();
    moved
  }
}
