//! Asynchronous item sources.
//!
//! A [`Source`] is asked to fetch items for a query and answers through a
//! [`Sink`], possibly from another thread and possibly long after the query
//! changed. Every fetch carries a [`RequestId`]; the picker only accepts
//! deliveries stamped with the id of its latest fetch and drops the rest.
//! Nothing is ever interrupted: a superseded producer may keep running, it
//! just gets ignored (or can notice via [`Sink::is_stale`] and stop early).

use std::{
  sync::{
    Arc,
    atomic::{
      AtomicU64,
      Ordering,
    },
    mpsc::{
      self,
      Receiver,
      Sender,
      TryRecvError,
    },
  },
  time::{
    Duration,
    Instant,
  },
};

use the_matcher::Item;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub id:    RequestId,
  pub query: String,
}

/// One batch from a producer. Accepting it replaces the picker's items.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<T> {
  pub request_id:   RequestId,
  pub items:        Vec<Item<T>>,
  /// No further updates are expected for this session.
  pub fully_loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
  #[error("picker is closed")]
  Disconnected,
}

pub type Result<T> = std::result::Result<T, SinkError>;

pub trait Source<T> {
  /// Starts fetching for `request`. Must not block; results go to `sink`.
  fn fetch(&mut self, request: FetchRequest, sink: Sink<T>);
}

/// [`Source`] backed by a closure.
pub struct FnSource<F>(pub F);

impl<T, F> Source<T> for FnSource<F>
where
  F: FnMut(FetchRequest, Sink<T>),
{
  fn fetch(&mut self, request: FetchRequest, sink: Sink<T>) {
    (self.0)(request, sink)
  }
}

/// Delivery handle for one fetch.
pub struct Sink<T> {
  request_id: RequestId,
  current:    Arc<AtomicU64>,
  tx:         Sender<Delivery<T>>,
}

impl<T> Clone for Sink<T> {
  fn clone(&self) -> Self {
    Self {
      request_id: self.request_id,
      current:    self.current.clone(),
      tx:         self.tx.clone(),
    }
  }
}

impl<T> std::fmt::Debug for Sink<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Sink")
      .field("request_id", &self.request_id)
      .field("stale", &self.is_stale())
      .finish()
  }
}

impl<T> Sink<T> {
  #[inline]
  pub fn request_id(&self) -> RequestId {
    self.request_id
  }

  /// Whether the picker has moved on to a newer fetch or closed.
  pub fn is_stale(&self) -> bool {
    self.current.load(Ordering::Relaxed) != self.request_id.0
  }

  pub fn deliver(&self, items: Vec<Item<T>>) -> Result<()> {
    self.send(items, false)
  }

  /// Delivers the final batch and marks the source fully loaded.
  pub fn finish(&self, items: Vec<Item<T>>) -> Result<()> {
    self.send(items, true)
  }

  fn send(&self, items: Vec<Item<T>>, fully_loaded: bool) -> Result<()> {
    self
      .tx
      .send(Delivery {
        request_id: self.request_id,
        items,
        fully_loaded,
      })
      .map_err(|_| SinkError::Disconnected)
  }
}

/// Picker-side state of an attached source.
pub(crate) struct AsyncSource<T> {
  source:       Box<dyn Source<T>>,
  current:      Arc<AtomicU64>,
  tx:           Sender<Delivery<T>>,
  rx:           Receiver<Delivery<T>>,
  deadline:     Option<Instant>,
  fully_loaded: bool,
}

impl<T> AsyncSource<T> {
  pub(crate) fn new(source: Box<dyn Source<T>>) -> Self {
    let (tx, rx) = mpsc::channel();
    Self {
      source,
      current: Arc::new(AtomicU64::new(0)),
      tx,
      rx,
      deadline: None,
      fully_loaded: false,
    }
  }

  #[inline]
  pub(crate) fn current(&self) -> RequestId {
    RequestId(self.current.load(Ordering::Relaxed))
  }

  #[inline]
  pub(crate) fn is_fully_loaded(&self) -> bool {
    self.fully_loaded
  }

  pub(crate) fn mark_fully_loaded(&mut self) {
    self.fully_loaded = true;
    self.deadline = None;
  }

  /// Pushes the pending fetch out to `now + debounce`.
  pub(crate) fn schedule(&mut self, now: Instant, debounce: Duration) {
    self.deadline = Some(now + debounce);
  }

  /// A debounced fetch is waiting to be dispatched.
  #[inline]
  pub(crate) fn is_pending(&self) -> bool {
    self.deadline.is_some()
  }

  #[inline]
  pub(crate) fn is_due(&self, now: Instant) -> bool {
    self.deadline.is_some_and(|deadline| deadline <= now)
  }

  /// Stamps a new request id and hands the query to the source.
  pub(crate) fn dispatch(&mut self, query: &str) -> RequestId {
    self.deadline = None;
    let id = RequestId(self.current.fetch_add(1, Ordering::Relaxed) + 1);
    let sink = Sink {
      request_id: id,
      current:    self.current.clone(),
      tx:         self.tx.clone(),
    };
    tracing::trace!(request_id = id.0, query, "dispatching fetch");
    self.source.fetch(
      FetchRequest {
        id,
        query: query.to_string(),
      },
      sink,
    );
    id
  }

  pub(crate) fn try_recv(&self) -> Option<Delivery<T>> {
    match self.rx.try_recv() {
      Ok(delivery) => Some(delivery),
      Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
    }
  }

  /// Makes every outstanding sink stale.
  pub(crate) fn close(&self) {
    self.current.fetch_add(1, Ordering::Relaxed);
  }
}
