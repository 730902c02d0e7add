//! Pickers fed by asynchronous sources.

use std::{
  cell::RefCell,
  rc::Rc,
  thread,
  time::{
    Duration,
    Instant,
  },
};

use the_picker::{
  Delivery,
  Event,
  FetchRequest,
  FnSource,
  Item,
  Outcome,
  Picker,
  PickerConfig,
  RequestId,
  Sink,
};

type Sinks = Rc<RefCell<Vec<(FetchRequest, Sink<String>)>>>;

/// A source that parks every sink so the test decides what gets delivered.
fn parked(config: PickerConfig) -> (Picker<String>, Sinks) {
  let sinks: Sinks = Rc::new(RefCell::new(Vec::new()));
  let park = sinks.clone();
  let picker = Picker::new(Vec::new(), config).with_source(FnSource(
    move |request: FetchRequest, sink: Sink<String>| park.borrow_mut().push((request, sink)),
  ));
  (picker, sinks)
}

fn items(texts: &[&str]) -> Vec<Item<String>> {
  texts
    .iter()
    .map(|text| Item::new(*text, text.to_string()))
    .collect()
}

fn texts(picker: &Picker<String>) -> Vec<String> {
  picker
    .visible()
    .map(|(_, item)| item.text.clone())
    .collect()
}

#[test]
fn fetches_on_creation_and_on_every_edit() {
  let (mut picker, sinks) = parked(PickerConfig::default());
  assert!(picker.is_loading());
  assert_eq!(picker.request_id(), Some(RequestId(1)));

  picker.insert_char('a');
  picker.insert_char('b');
  let queries: Vec<String> = sinks
    .borrow()
    .iter()
    .map(|(request, _)| request.query.clone())
    .collect();
  assert_eq!(queries, ["", "a", "ab"]);
  assert_eq!(picker.request_id(), Some(RequestId(3)));
}

#[test]
fn stale_deliveries_are_dropped() {
  let (mut picker, sinks) = parked(PickerConfig::default());
  picker.insert_char('b');

  let stale = sinks.borrow()[0].1.clone();
  assert!(stale.is_stale());
  stale.deliver(items(&["stale"])).unwrap();
  assert!(!picker.tick(Instant::now()));
  assert!(picker.collection().is_empty());
  assert!(picker.is_loading());

  let current = sinks.borrow()[1].1.clone();
  current.deliver(items(&["apple", "banana", "blueberry"])).unwrap();
  assert!(picker.tick(Instant::now()));
  assert!(!picker.is_loading());
  // Refiltered against the current query.
  assert_eq!(texts(&picker), ["banana", "blueberry"]);
}

#[test]
fn edits_while_loading_do_not_refilter() {
  let (mut picker, sinks) = parked(PickerConfig::default());
  sinks.borrow()[0]
    .1
    .deliver(items(&["alpha", "beta"]))
    .unwrap();
  picker.tick(Instant::now());
  assert_eq!(texts(&picker), ["alpha", "beta"]);

  picker.insert_char('z');
  assert!(picker.is_loading());
  assert_eq!(texts(&picker), ["alpha", "beta"]);
}

#[test]
fn fully_loaded_source_switches_to_local_filtering() {
  let (mut picker, sinks) = parked(PickerConfig::default());
  sinks.borrow()[0]
    .1
    .finish(items(&["alpha", "beta", "gamma"]))
    .unwrap();
  picker.tick(Instant::now());

  picker.insert_char('m');
  assert!(!picker.is_loading());
  assert_eq!(sinks.borrow().len(), 1);
  assert_eq!(texts(&picker), ["gamma"]);
}

#[test]
fn debounce_defers_the_fetch() {
  let config = PickerConfig {
    debounce_ms: 60_000,
    ..PickerConfig::default()
  };
  let (mut picker, sinks) = parked(config);
  picker.insert_char('a');
  picker.insert_char('b');
  assert_eq!(sinks.borrow().len(), 1);
  assert!(picker.is_loading());

  picker.tick(Instant::now());
  assert_eq!(sinks.borrow().len(), 1);

  picker.tick(Instant::now() + Duration::from_secs(61));
  let queries: Vec<String> = sinks
    .borrow()
    .iter()
    .map(|(request, _)| request.query.clone())
    .collect();
  assert_eq!(queries, ["", "ab"]);
}

#[test]
fn direct_delivery_for_single_threaded_hosts() {
  let mut picker: Picker<String> =
    Picker::new(Vec::new(), PickerConfig::default()).with_source(FnSource(
      |_: FetchRequest, _: Sink<String>| {},
    ));
  let Some(request_id) = picker.request_id() else {
    panic!("source attached without a request");
  };

  assert!(!picker.deliver(Delivery {
    request_id:   RequestId(request_id.0 + 1),
    items:        items(&["future"]),
    fully_loaded: false,
  }));
  assert!(picker.deliver(Delivery {
    request_id,
    items: items(&["present"]),
    fully_loaded: false,
  }));
  assert_eq!(texts(&picker), ["present"]);
}

#[test]
fn closing_disconnects_producers() {
  let (mut picker, sinks) = parked(PickerConfig::default());
  assert_eq!(picker.handle_event(Event::Cancel), Some(Outcome::Cancelled));
  let sink = sinks.borrow()[0].1.clone();
  assert!(sink.is_stale());
  assert!(sink.deliver(items(&["late"])).is_err());
}

#[test]
fn threaded_producer() {
  let corpus: Vec<String> = (0..500).map(|idx| format!("entry_{idx:03}")).collect();
  let mut picker = Picker::new(Vec::new(), PickerConfig::default()).with_source(FnSource(
    move |request: FetchRequest, sink: Sink<String>| {
      let corpus = corpus.clone();
      thread::spawn(move || {
        let matches: Vec<Item<String>> = corpus
          .iter()
          .filter(|entry| entry.contains(request.query.as_str()))
          .map(|entry| Item::new(entry.clone(), entry.clone()))
          .collect();
        if !sink.is_stale() {
          let _ = sink.deliver(matches);
        }
      });
    },
  ));

  for ch in "_42".chars() {
    picker.handle_event(Event::Insert(ch));
  }
  assert_eq!(picker.request_id(), Some(RequestId(4)));

  let deadline = Instant::now() + Duration::from_secs(10);
  while picker.is_loading() && Instant::now() < deadline {
    picker.handle_event(Event::Tick(Instant::now()));
    thread::sleep(Duration::from_millis(1));
  }

  assert!(!picker.is_loading());
  // entry_042 and entry_420 through entry_429.
  assert_eq!(picker.collection().len(), 11);
  assert_eq!(picker.view().len(), 11);
  assert!(texts(&picker).iter().all(|text| text.contains("_42")));
}

mod properties {
  use super::*;

  quickcheck::quickcheck! {
      fn stale_delivery_never_mutates(offset: u64, texts: Vec<String>, edits: u8) -> bool {
          let (mut picker, _sinks) = parked(PickerConfig::default());
          for _ in 0..edits % 4 {
              picker.insert_char('x');
          }
          let Some(current) = picker.request_id() else {
              return false;
          };
          let stale = RequestId(current.0.wrapping_add(offset.max(1)));
          let version = picker.collection().version();
          let view = picker.view().clone();

          let accepted = picker.deliver(Delivery {
              request_id: stale,
              items: texts.iter().map(|text| Item::new(text.clone(), text.clone())).collect(),
              fully_loaded: true,
          });
          !accepted
            && picker.collection().version() == version
            && picker.view() == &view
            && picker.is_loading()
      }
  }
}
