//! Fuzzy scoring of a single `(text, query)` pair.
//!
//! The scorer tries three match kinds in priority order and returns the first
//! one that applies:
//!
//! 1. **Prefix**: the query matches the start of the text.
//! 2. **Contains**: the query appears contiguously somewhere in the text. Every
//!    occurrence is scored and the best one is kept.
//! 3. **Fuzzy**: the query characters appear in order, possibly with gaps.
//!
//! # Case Sensitivity
//!
//! Smart case matching is used: a query without uppercase characters matches
//! case-insensitively, a query containing any uppercase character matches
//! case-sensitively. Folding is done per character so reported ranges always
//! point into the original text.
//!
//! # Invalid Input
//!
//! An empty text or query is rejected with [`ScoreError`], which is distinct
//! from `Ok(None)` (valid input, no match). Callers that filter collections
//! rely on telling the two apart.
//!
//! # Examples
//!
//! ```ignore
//! use the_matcher::fuzzy::{score, MatchKind};
//!
//! let result = score("hello world", "orl")?.unwrap();
//! assert_eq!(result.kind, MatchKind::Contains);
//! assert_eq!(result.positions.as_slice(), &[7..10]);
//! ```

use std::ops::Range;

use smallvec::{
  SmallVec,
  smallvec,
};
use the_core::chars::{
  fold_char,
  is_case_sensitive,
  is_separator_boundary,
  is_word_boundary,
};
use thiserror::Error;

pub const PREFIX_BASE: f64 = 100.0;
pub const CONTAINS_BASE: f64 = 60.0;
pub const FUZZY_BASE: f64 = 25.0;
pub const EXACT_BONUS: f64 = 25.0;
pub const WORD_BOUNDARY_BONUS: f64 = 20.0;
/// Applied to [`WORD_BOUNDARY_BONUS`] when the boundary follows a separator.
pub const SEPARATOR_BOUNDARY_MULTIPLIER: f64 = 1.5;
pub const CONSECUTIVE_BONUS: f64 = 7.0;
/// Consecutive pairs rewarded per streak.
pub const MAX_CONSECUTIVE_STREAK: usize = 3;
pub const GAP_PENALTY_PER_CHAR: f64 = -3.0;
pub const MAX_GAP_PENALTY: f64 = -20.0;
pub const START_BONUS: f64 = 9.0;
/// Scaled by `1 / (start + 1)`.
pub const POSITION_BONUS: f64 = 10.0;
/// Scaled by `1 / text_len`.
pub const LENGTH_BONUS: f64 = 10.0;

/// Byte ranges into the original text.
pub type Positions = SmallVec<[Range<usize>; 4]>;

/// Result type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Inputs the scorer refuses to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
  #[error("cannot score an empty text")]
  EmptyText,
  #[error("cannot score an empty query")]
  EmptyQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
  Prefix,
  Contains,
  Fuzzy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
  /// Matched byte ranges, ascending and non-overlapping.
  pub positions:     Positions,
  pub score:         f64,
  pub kind:          MatchKind,
  /// Number of query characters matched.
  pub matched_chars: usize,
  /// Unmatched characters between the first and the last matched one.
  pub gaps:          usize,
}

/// Strategy for scoring one candidate text against a query.
pub trait Scorer {
  fn score(&self, text: &str, query: &str) -> Result<Option<MatchResult>>;
}

/// The builtin prefix/contains/fuzzy scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuzzyScorer;

impl Scorer for FuzzyScorer {
  fn score(&self, text: &str, query: &str) -> Result<Option<MatchResult>> {
    score(text, query)
  }
}

/// Scores `text` against `query` with the builtin algorithm.
pub fn score(text: &str, query: &str) -> Result<Option<MatchResult>> {
  if text.is_empty() {
    return Err(ScoreError::EmptyText);
  }
  if query.is_empty() {
    return Err(ScoreError::EmptyQuery);
  }

  let case_sensitive = is_case_sensitive(query);
  let haystack = Haystack::new(text, case_sensitive);
  let needle: Vec<char> = query
    .chars()
    .map(|ch| fold_char(ch, case_sensitive))
    .collect();

  Ok(
    prefix_match(&haystack, &needle)
      .or_else(|| contains_match(&haystack, &needle))
      .or_else(|| fuzzy_match(&haystack, &needle)),
  )
}

/// Candidate text split into chars, with folded chars and byte offsets at the
/// same indices.
struct Haystack {
  chars:   Vec<char>,
  folded:  Vec<char>,
  /// `offsets[i]` is the byte offset of char `i`; the final entry is the
  /// text length.
  offsets: Vec<usize>,
}

impl Haystack {
  fn new(text: &str, case_sensitive: bool) -> Self {
    let mut chars = Vec::with_capacity(text.len());
    let mut folded = Vec::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (offset, ch) in text.char_indices() {
      chars.push(ch);
      folded.push(fold_char(ch, case_sensitive));
      offsets.push(offset);
    }
    offsets.push(text.len());
    Self {
      chars,
      folded,
      offsets,
    }
  }

  #[inline]
  fn len(&self) -> usize {
    self.chars.len()
  }

  #[inline]
  fn prev(&self, idx: usize) -> Option<char> {
    idx.checked_sub(1).map(|prev| self.chars[prev])
  }

  #[inline]
  fn is_boundary(&self, idx: usize) -> bool {
    is_word_boundary(self.prev(idx), self.chars[idx])
  }

  #[inline]
  fn byte_range(&self, start: usize, end: usize) -> Range<usize> {
    self.offsets[start]..self.offsets[end]
  }

  fn matches_at(&self, start: usize, needle: &[char]) -> bool {
    self.folded.get(start..start + needle.len()) == Some(needle)
  }
}

#[inline]
fn position_bonus(start: usize) -> f64 {
  POSITION_BONUS / (start as f64 + 1.0)
}

#[inline]
fn length_bonus(text_len: usize) -> f64 {
  LENGTH_BONUS / text_len.max(1) as f64
}

fn prefix_match(haystack: &Haystack, needle: &[char]) -> Option<MatchResult> {
  if !haystack.matches_at(0, needle) {
    return None;
  }

  let mut score = PREFIX_BASE
    + EXACT_BONUS
    + WORD_BOUNDARY_BONUS
    + position_bonus(0)
    + length_bonus(haystack.len());
  if needle.len() == haystack.len() {
    score += 2.0 * EXACT_BONUS + LENGTH_BONUS;
  }

  Some(MatchResult {
    positions: smallvec![haystack.byte_range(0, needle.len())],
    score,
    kind: MatchKind::Prefix,
    matched_chars: needle.len(),
    gaps: 0,
  })
}

fn contains_match(haystack: &Haystack, needle: &[char]) -> Option<MatchResult> {
  if needle.len() > haystack.len() {
    return None;
  }

  let mut best: Option<(usize, f64)> = None;
  for start in 0..=haystack.len() - needle.len() {
    if !haystack.matches_at(start, needle) {
      continue;
    }

    let mut score = CONTAINS_BASE;
    if needle.len() > 1 {
      score += EXACT_BONUS;
    }
    if haystack.is_boundary(start) {
      score += if is_separator_boundary(haystack.prev(start)) {
        WORD_BOUNDARY_BONUS * SEPARATOR_BOUNDARY_MULTIPLIER
      } else {
        WORD_BOUNDARY_BONUS
      };
    }
    score += position_bonus(start) + length_bonus(haystack.len());

    if best.is_none_or(|(_, best_score)| score > best_score) {
      best = Some((start, score));
    }
  }

  let (start, score) = best?;
  Some(MatchResult {
    positions: smallvec![haystack.byte_range(start, start + needle.len())],
    score,
    kind: MatchKind::Contains,
    matched_chars: needle.len(),
    gaps: 0,
  })
}

fn fuzzy_match(haystack: &Haystack, needle: &[char]) -> Option<MatchResult> {
  let mut indices = Vec::with_capacity(needle.len());
  let mut cursor = 0;
  let mut score = FUZZY_BASE;
  let mut streak = 0;
  let mut gaps = 0;

  for (matched, &ch) in needle.iter().enumerate() {
    if haystack.len() - cursor < needle.len() - matched {
      return None;
    }
    let idx = cursor + haystack.folded[cursor..].iter().position(|&c| c == ch)?;

    if let Some(&last) = indices.last() {
      let gap = idx - last - 1;
      if gap == 0 {
        streak += 1;
        if streak <= MAX_CONSECUTIVE_STREAK {
          score += CONSECUTIVE_BONUS;
        }
      } else {
        streak = 0;
        gaps += gap;
        score += (GAP_PENALTY_PER_CHAR * gap as f64).max(MAX_GAP_PENALTY);
      }
    }
    if haystack.is_boundary(idx) {
      score += START_BONUS;
    }

    indices.push(idx);
    cursor = idx + 1;
  }

  Some(MatchResult {
    positions: coalesce(haystack, &indices),
    score,
    kind: MatchKind::Fuzzy,
    matched_chars: needle.len(),
    gaps,
  })
}

/// Merges runs of adjacent char indices into byte ranges.
fn coalesce(haystack: &Haystack, indices: &[usize]) -> Positions {
  let mut positions = Positions::new();
  let mut run: Option<(usize, usize)> = None;
  for &idx in indices {
    run = match run {
      Some((start, end)) if end == idx => Some((start, idx + 1)),
      Some((start, end)) => {
        positions.push(haystack.byte_range(start, end));
        Some((idx, idx + 1))
      },
      None => Some((idx, idx + 1)),
    };
  }
  if let Some((start, end)) = run {
    positions.push(haystack.byte_range(start, end));
  }
  positions
}
