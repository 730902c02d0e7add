//! [`Scorer`] backed by the [`nucleo`] matcher.
//!
//! Nucleo scores on its own `u16` scale, so views built with this scorer do
//! not compare with the builtin one. Positions come back as char (or, for
//! non-ASCII text, grapheme) indices and are mapped to byte ranges here.

use std::cell::RefCell;

use nucleo::{
  Config,
  Matcher,
  Utf32Str,
  pattern::{
    Atom,
    AtomKind,
    CaseMatching,
    Normalization,
  },
};
use serde::{
  Deserialize,
  Serialize,
};
use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;

use crate::fuzzy::{
  MatchKind,
  MatchResult,
  Positions,
  Result,
  ScoreError,
  Scorer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
  #[default]
  Plain,
  /// Favors path separators and file names.
  Path,
}

pub struct NucleoScorer {
  mode:    MatchMode,
  matcher: RefCell<Matcher>,
}

impl std::fmt::Debug for NucleoScorer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NucleoScorer")
      .field("mode", &self.mode)
      .finish_non_exhaustive()
  }
}

impl Default for NucleoScorer {
  fn default() -> Self {
    Self::new(MatchMode::Plain)
  }
}

impl NucleoScorer {
  pub fn new(mode: MatchMode) -> Self {
    let mut config = Config::DEFAULT;
    if mode == MatchMode::Path {
      config.set_match_paths();
    }
    Self {
      mode,
      matcher: RefCell::new(Matcher::new(config)),
    }
  }

  #[inline]
  pub fn mode(&self) -> MatchMode {
    self.mode
  }
}

impl Scorer for NucleoScorer {
  fn score(&self, text: &str, query: &str) -> Result<Option<MatchResult>> {
    if text.is_empty() {
      return Err(ScoreError::EmptyText);
    }
    if query.is_empty() {
      return Err(ScoreError::EmptyQuery);
    }

    let atom = Atom::new(
      query,
      CaseMatching::Smart,
      Normalization::Smart,
      AtomKind::Fuzzy,
      false,
    );

    let mut buf = Vec::new();
    let mut indices = Vec::new();
    let haystack = Utf32Str::new(text, &mut buf);
    let Some(score) = atom.indices(haystack, &mut self.matcher.borrow_mut(), &mut indices) else {
      return Ok(None);
    };
    indices.sort_unstable();
    indices.dedup();

    let ranges = unit_ranges(text);
    let spans: SmallVec<[Range; 8]> = indices
      .iter()
      .filter_map(|&index| ranges.get(index as usize).cloned())
      .collect();
    let (Some(first), Some(last)) = (indices.first(), indices.last()) else {
      return Ok(None);
    };

    let positions = merge(&spans);
    let kind = match positions.as_slice() {
      [only] if only.start == 0 => MatchKind::Prefix,
      [_] => MatchKind::Contains,
      _ => MatchKind::Fuzzy,
    };

    Ok(Some(MatchResult {
      positions,
      score: f64::from(score),
      kind,
      matched_chars: indices.len(),
      gaps: (last - first + 1) as usize - indices.len(),
    }))
  }
}

type Range = std::ops::Range<usize>;

/// Byte range of every unit nucleo indexes: bytes for ASCII text, extended
/// grapheme clusters otherwise.
fn unit_ranges(text: &str) -> Vec<Range> {
  if text.is_ascii() {
    return (0..text.len()).map(|idx| idx..idx + 1).collect();
  }
  text
    .grapheme_indices(true)
    .map(|(start, grapheme)| start..start + grapheme.len())
    .collect()
}

fn merge(spans: &[Range]) -> Positions {
  let mut positions = Positions::new();
  for span in spans {
    match positions.last_mut() {
      Some(last) if last.end == span.start => last.end = span.end,
      _ => positions.push(span.clone()),
    }
  }
  positions
}
