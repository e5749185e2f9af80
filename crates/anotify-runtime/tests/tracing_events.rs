#![forbid(unsafe_code)]

//! Structured log events emitted by notifiers.
//!
//! A capture layer records the `message` field of every event so the tests
//! can check which lifecycle points were logged, and in what order.

use std::sync::{Arc, Mutex};

use anotify_runtime::{AsyncError, FutureHandle, Notifier, NotifierConfig, StreamHandle};
use futures::executor::LocalPool;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone, PartialEq)]
struct Captured {
    message: String,
    label: Option<String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        #[derive(Default)]
        struct Fields {
            message: Option<String>,
            label: Option<String>,
        }
        impl tracing::field::Visit for Fields {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                match field.name() {
                    "message" => self.message = Some(value.to_string()),
                    "label" => self.label = Some(value.to_string()),
                    _ => {}
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                let text = format!("{value:?}").trim_matches('"').to_string();
                match field.name() {
                    "message" => self.message = Some(text),
                    "label" => self.label = Some(text),
                    _ => {}
                }
            }
        }
        let mut fields = Fields::default();
        event.record(&mut fields);
        if let Some(message) = fields.message {
            self.events.lock().expect("capture lock").push(Captured {
                message,
                label: fields.label,
            });
        }
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Captured>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: Arc::clone(&events),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().expect("capture lock").clone();
    (result, events)
}

fn messages(events: &[Captured]) -> Vec<&str> {
    events.iter().map(|e| e.message.as_str()).collect()
}

#[test]
fn future_lifecycle_is_logged_in_order() {
    let ((), events) = capture(|| {
        let mut pool = LocalPool::new();
        let notifier: Notifier<i32> = Notifier::with_config(
            pool.spawner(),
            NotifierConfig::new().with_label("orders"),
        );
        notifier.set_future(FutureHandle::ready(1)).unwrap();
        pool.run_until_stalled();
        notifier.dispose();
    });

    assert_eq!(
        messages(&events),
        vec![
            "notifier.create",
            "notifier.attach",
            "notifier.transition",
            "notifier.transition",
            "notifier.dispose",
        ]
    );
    assert!(
        events
            .iter()
            .all(|e| e.label.as_deref() == Some("orders"))
    );
}

#[test]
fn stale_outcome_is_logged_not_applied() {
    let (value, events) = capture(|| {
        let mut pool = LocalPool::new();
        let notifier: Notifier<i32> = Notifier::new(pool.spawner());
        let (tx, rx) = futures::channel::oneshot::channel::<i32>();
        notifier
            .set_future(FutureHandle::new(async move {
                rx.await.map_err(AsyncError::new)
            }))
            .unwrap();
        notifier.set_value(2);
        tx.send(1).unwrap();
        pool.run_until_stalled();
        notifier.value()
    });

    assert_eq!(value, Some(2));
    assert!(messages(&events).contains(&"notifier.stale"));
}

#[test]
fn cancel_on_error_and_disposed_ops_are_logged() {
    let ((), events) = capture(|| {
        let mut pool = LocalPool::new();
        let notifier: Notifier<i32> = Notifier::builder(pool.spawner())
            .cancel_on_error(true)
            .build();
        notifier
            .set_stream(StreamHandle::from_stream(futures::stream::iter(vec![
                Err(AsyncError::msg("bad frame")),
                Ok(1),
            ])))
            .unwrap();
        pool.run_until_stalled();
        notifier.dispose();
        notifier.set_value(3);
    });

    let messages = messages(&events);
    assert!(messages.contains(&"notifier.cancel_on_error"));
    assert_eq!(messages.last(), Some(&"notifier.ignored"));
}

#[test]
fn relistening_single_use_stream_warns() {
    let ((), events) = capture(|| {
        let stream = StreamHandle::<i32>::from_values(vec![1]);
        drop(stream.listen());
        drop(stream.listen());
    });
    assert_eq!(messages(&events), vec!["stream.relisten"]);
}
