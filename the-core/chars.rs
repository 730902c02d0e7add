//! Character classification shared by the scorer and query editing.
//!
//! Everything here operates on `char`s and UTF-8 byte offsets of `&str`
//! values. Offsets passed in are expected to lie on char boundaries; the
//! stepping helpers clamp rather than panic when they don't.

#[derive(Debug, Eq, PartialEq)]
pub enum CharCategory {
  Whitespace,
  Eol,
  Word,
  Punctuation,
  Unknown,
}

pub fn categorize_char(ch: char) -> CharCategory {
  match ch {
    c if char_is_line_ending(c) => CharCategory::Eol,
    c if c.is_whitespace() => CharCategory::Whitespace,
    c if char_is_word(c) => CharCategory::Word,
    c if char_is_punctuation(c) => CharCategory::Punctuation,
    _ => CharCategory::Unknown,
  }
}

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(
    ch,
    '\u{000A}' | '\u{000B}' | '\u{000C}' | '\u{000D}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
  )
}

#[inline]
pub fn char_is_punctuation(ch: char) -> bool {
  use unicode_general_category::{
    GeneralCategory,
    get_general_category,
  };

  matches!(
    get_general_category(ch),
    GeneralCategory::OtherPunctuation
      | GeneralCategory::OpenPunctuation
      | GeneralCategory::ClosePunctuation
      | GeneralCategory::InitialPunctuation
      | GeneralCategory::FinalPunctuation
      | GeneralCategory::ConnectorPunctuation
      | GeneralCategory::DashPunctuation
      | GeneralCategory::MathSymbol
      | GeneralCategory::CurrencySymbol
      | GeneralCategory::ModifierSymbol
  )
}

#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// A separator ends a word: anything that is not alphanumeric, `_` included.
#[inline]
pub fn char_is_separator(ch: char) -> bool {
  !ch.is_alphanumeric()
}

/// Whether `cur` starts a word given the character before it.
///
/// A word starts at the beginning of the text, after a separator, or on a
/// lowercase to uppercase transition (`fooBar`, `FooBar`).
#[inline]
pub fn is_word_boundary(prev: Option<char>, cur: char) -> bool {
  match prev {
    None => true,
    Some(prev) if char_is_separator(prev) => true,
    Some(prev) => prev.is_lowercase() && cur.is_uppercase(),
  }
}

/// Boundary that follows a separator character rather than a case change.
#[inline]
pub fn is_separator_boundary(prev: Option<char>) -> bool {
  prev.is_some_and(char_is_separator)
}

/// Smart case: a pattern with any uppercase character is matched verbatim.
#[inline]
pub fn is_case_sensitive(pattern: &str) -> bool {
  pattern.chars().any(char::is_uppercase)
}

/// Folds a single char so that folded and original texts keep the same char
/// indices. Multi-char lowercase expansions keep only their first char.
#[inline]
pub fn fold_char(ch: char, case_sensitive: bool) -> char {
  if case_sensitive {
    ch
  } else {
    ch.to_lowercase().next().unwrap_or(ch)
  }
}

/// Byte offset of the char boundary before `idx`, or 0.
pub fn prev_char_boundary(s: &str, idx: usize) -> usize {
  let mut idx = idx.min(s.len());
  while idx > 0 {
    idx -= 1;
    if s.is_char_boundary(idx) {
      break;
    }
  }
  idx
}

/// Byte offset of the char boundary after `idx`, or `s.len()`.
pub fn next_char_boundary(s: &str, idx: usize) -> usize {
  if idx >= s.len() {
    return s.len();
  }
  let mut idx = idx + 1;
  while idx < s.len() && !s.is_char_boundary(idx) {
    idx += 1;
  }
  idx
}

/// Query words are split on whitespace and punctuation, `_` included, so
/// `src/picker_state` deletes one path or identifier segment at a time.
#[inline]
fn is_query_word_break(ch: char) -> bool {
  ch == '_' || !matches!(categorize_char(ch), CharCategory::Word | CharCategory::Unknown)
}

/// Largest char boundary at or below `idx`.
pub fn floor_char_boundary(s: &str, idx: usize) -> usize {
  let mut idx = idx.min(s.len());
  while !s.is_char_boundary(idx) {
    idx -= 1;
  }
  idx
}

/// Start of the word before byte offset `idx`, skipping trailing breaks first.
pub fn prev_word_start(s: &str, idx: usize) -> usize {
  let idx = floor_char_boundary(s, idx);
  let chars: Vec<(usize, char)> = s[..idx].char_indices().collect();
  let mut pos = chars.len();

  while pos > 0 && is_query_word_break(chars[pos - 1].1) {
    pos -= 1;
  }
  while pos > 0 && !is_query_word_break(chars[pos - 1].1) {
    pos -= 1;
  }

  chars.get(pos).map_or(idx, |(offset, _)| *offset)
}

/// End of the word after byte offset `idx`, including the breaks that follow.
pub fn next_word_end(s: &str, idx: usize) -> usize {
  let idx = floor_char_boundary(s, idx);
  let mut chars = s[idx..].char_indices().peekable();

  while chars.next_if(|(_, ch)| !is_query_word_break(*ch)).is_some() {}
  while chars.next_if(|(_, ch)| is_query_word_break(*ch)).is_some() {}

  chars.peek().map_or(s.len(), |(offset, _)| idx + offset)
}
