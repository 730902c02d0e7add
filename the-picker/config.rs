use std::{
  fs,
  path::Path,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use the_matcher::{
  FuzzyScorer,
  Layout,
  MatchMode,
  NucleoScorer,
  Scorer,
  cache::DEFAULT_CACHE_CAPACITY,
};
use thiserror::Error;
use toml::{
  Table,
  Value,
};

/// How deep nested tables are merged when a local config overrides a global
/// one. The picker config is flat, so one level is enough.
const MERGE_DEPTH: usize = 1;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse picker config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("failed to read picker config: {0}")]
  Io(#[from] std::io::Error),
  #[error("invalid value for `{field}`: {reason}")]
  InvalidValue {
    field:  &'static str,
    reason: String,
  },
}

/// Which [`Scorer`] a picker is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherKind {
  #[default]
  Builtin,
  Nucleo,
  NucleoPath,
}

impl MatcherKind {
  pub fn scorer(self) -> Box<dyn Scorer> {
    match self {
      Self::Builtin => Box::new(FuzzyScorer),
      Self::Nucleo => Box::new(NucleoScorer::new(MatchMode::Plain)),
      Self::NucleoPath => Box::new(NucleoScorer::new(MatchMode::Path)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PickerConfig {
  /// Keep collection order instead of ranking flat matches.
  pub preserve_order:          bool,
  pub layout:                  Layout,
  /// Emit the designated root first in hierarchical views.
  pub pin_root:                bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_items:               Option<usize>,
  /// Confirm implicitly once a query edit leaves exactly one item.
  pub auto_accept:             bool,
  /// Show nothing until the query is non-empty.
  pub start_hidden:            bool,
  /// Delay between the last query edit and an async fetch.
  pub debounce_ms:             u64,
  pub matcher:                 MatcherKind,
  /// Number of memoized views; zero disables the cache.
  pub cache_capacity:          usize,
  pub max_deliveries_per_tick: usize,
}

impl Default for PickerConfig {
  fn default() -> Self {
    Self {
      preserve_order:          false,
      layout:                  Layout::Flat,
      pin_root:                false,
      max_items:               None,
      auto_accept:             false,
      start_hidden:            false,
      debounce_ms:             0,
      matcher:                 MatcherKind::Builtin,
      cache_capacity:          DEFAULT_CACHE_CAPACITY,
      max_deliveries_per_tick: 64,
    }
  }
}

impl PickerConfig {
  pub fn from_toml(source: &str) -> Result<Self> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads a single config file.
  pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
    Self::from_toml(&fs::read_to_string(path)?)
  }

  /// Combines a global and a workspace-local config, local keys winning.
  ///
  /// An unreadable source counts as absent; a source that fails to parse is
  /// reported even when the other one is fine. With both absent the
  /// defaults are returned.
  pub fn load(global: Result<String>, local: Result<String>) -> Result<Self> {
    let parse = |source: Result<String>| -> Result<Option<Table>> {
      match source {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(ConfigError::Io(err)) => {
          tracing::debug!(%err, "picker config source unavailable");
          Ok(None)
        },
        Err(err) => Err(err),
      }
    };

    let merged = match (parse(global)?, parse(local)?) {
      (None, None) => return Ok(Self::default()),
      (Some(table), None) | (None, Some(table)) => Value::Table(table),
      (Some(global), Some(local)) => {
        merge_toml_values(Value::Table(global), Value::Table(local), MERGE_DEPTH)
      },
    };

    let config: Self = merged.try_into()?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.max_items == Some(0) {
      return Err(ConfigError::InvalidValue {
        field:  "max-items",
        reason: "must be at least 1, omit it for no limit".to_string(),
      });
    }
    if self.max_deliveries_per_tick == 0 {
      return Err(ConfigError::InvalidValue {
        field:  "max-deliveries-per-tick",
        reason: "must be at least 1".to_string(),
      });
    }
    Ok(())
  }

  #[inline]
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

/// Recursively merges `right` into `left` down to `depth` levels of tables.
/// Anything that is not a pair of tables, or lies below `depth`, takes the
/// right value.
pub fn merge_toml_values(left: Value, right: Value, depth: usize) -> Value {
  match (left, right) {
    (Value::Table(mut left), Value::Table(right)) if depth > 0 => {
      for (key, value) in right {
        let merged = match left.remove(&key) {
          Some(existing) => merge_toml_values(existing, value, depth - 1),
          None => value,
        };
        left.insert(key, merged);
      }
      Value::Table(left)
    },
    (_, right) => right,
  }
}
