//! Interactive selection session on top of `the-matcher`.
//!
//! A [`Picker`] owns the query, the filtered view, the multi-selection and
//! (optionally) an asynchronous item source. Hosts feed it [`Event`]s from
//! their own loop and receive an [`Outcome`] once the session ends.

pub mod config;
pub mod event;
pub mod hooks;
pub mod picker;
pub mod query;
pub mod selection;
pub mod source;

pub use config::{
  ConfigError,
  MatcherKind,
  PickerConfig,
};
pub use event::{
  Event,
  Mode,
  Outcome,
};
pub use hooks::{
  FnHooks,
  KindPrefixFilter,
  NoopHooks,
  PickerHooks,
  PreFilter,
  PreFiltered,
};
pub use picker::Picker;
pub use query::QueryState;
pub use selection::SelectionSet;
pub use source::{
  Delivery,
  FetchRequest,
  FnSource,
  RequestId,
  Sink,
  SinkError,
  Source,
};
pub use the_matcher::{
  Collection,
  FilteredView,
  Item,
  Layout,
};
