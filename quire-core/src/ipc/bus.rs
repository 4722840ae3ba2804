//! Scoped publish/subscribe for the window.
//!
//! Subscriptions are explicit handles owned by the bus and releasable one at
//! a time or as a batch (`release_all`), so a closing window cannot leak
//! listeners on the shared transport.
//!
//! Delivery to a given subscriber for a given topic happens in publish
//! order: envelopes are handed to [`EventBus::deliver`] one at a time by the
//! window's pump, and dispatch within one envelope walks subscribers in
//! registration order. No ordering is guaranteed across topics or across
//! subscribers.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ipc::events::{Event, EventScope};
use crate::ipc::transport::{EventEnvelope, EventTarget, Transport};

/// Handle for one registered subscriber.
#[derive(Debug)]
#[must_use = "dropping the handle does not release the subscription; call release()"]
pub struct Subscription {
    id: u64,
}

struct Entry {
    id: u64,
    event: &'static str,
    any_target: bool,
    once: bool,
    handler: Box<dyn FnMut(&Value) + Send>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    entries: Vec<Entry>,
    /// Handles released while their entries were checked out by `deliver`.
    dead: Vec<u64>,
    /// `release_all` was called while entries were checked out.
    purge_all: bool,
    dispatch_depth: usize,
}

/// One window's view of the event half of the transport.
pub struct EventBus {
    label: String,
    transport: Arc<dyn Transport>,
    inner: Mutex<BusInner>,
}

impl EventBus {
    pub fn new(label: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            label: label.into(),
            transport,
            inner: Mutex::new(BusInner::default()),
        }
    }

    /// The window this bus belongs to.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register a persistent subscriber: fires on every matching publish
    /// until released.
    pub fn subscribe<E: Event>(
        &self,
        handler: impl FnMut(E::Payload) + Send + 'static,
    ) -> Subscription {
        self.register::<E>(false, false, handler)
    }

    /// Register a one-shot subscriber: auto-releases after first delivery.
    pub fn subscribe_once<E: Event>(
        &self,
        handler: impl FnMut(E::Payload) + Send + 'static,
    ) -> Subscription {
        self.register::<E>(true, false, handler)
    }

    /// Register a subscriber that receives matching events regardless of
    /// which window they target.
    pub fn subscribe_any<E: Event>(
        &self,
        handler: impl FnMut(E::Payload) + Send + 'static,
    ) -> Subscription {
        self.register::<E>(false, true, handler)
    }

    fn register<E: Event>(
        &self,
        once: bool,
        any_target: bool,
        mut handler: impl FnMut(E::Payload) + Send + 'static,
    ) -> Subscription {
        let erased = Box::new(move |value: &Value| {
            match serde_json::from_value::<E::Payload>(value.clone()) {
                Ok(payload) => handler(payload),
                Err(e) => warn!(
                    event = E::NAME,
                    error = %e,
                    "dropping delivery with malformed payload"
                ),
            }
        });

        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            event: E::NAME,
            any_target,
            once,
            handler: erased,
        });
        Subscription { id }
    }

    /// Release one subscription.
    pub fn release(&self, subscription: Subscription) {
        let mut inner = self.inner.lock();
        if inner.dispatch_depth > 0 {
            inner.dead.push(subscription.id);
        }
        inner.entries.retain(|entry| entry.id != subscription.id);
    }

    /// Release every subscription registered through this bus.
    pub fn release_all(&self) {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        if inner.dispatch_depth > 0 {
            inner.purge_all = true;
        }
        debug!(window = %self.label, released = count, "released all subscriptions");
    }

    /// Publish an event with an explicit scope. `Current` resolves to this
    /// window's own label before the envelope reaches the transport.
    ///
    /// Fire-and-forget: a payload that fails to serialize is logged and
    /// dropped, matching the no-response contract of the event half.
    pub fn publish<E: Event>(&self, scope: EventScope, payload: &E::Payload) {
        debug_assert!(
            E::SCOPE.permits(&scope),
            "event '{}' published with a scope its registration does not permit",
            E::NAME
        );

        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(event = E::NAME, error = %e, "dropping unserializable event");
                return;
            }
        };

        let target = match scope {
            EventScope::Window(label) => EventTarget::Window(label),
            EventScope::Broadcast => EventTarget::Broadcast,
            EventScope::Current => EventTarget::Window(self.label.clone()),
        };

        self.transport.publish(EventEnvelope {
            name: E::NAME,
            target,
            payload: value,
        });
    }

    /// Dispatch one inbound envelope to matching subscribers, in
    /// registration order. Handlers may subscribe or release re-entrantly;
    /// subscriptions added during dispatch only see later envelopes.
    pub fn deliver(&self, envelope: &EventEnvelope) {
        let mut entries = {
            let mut inner = self.inner.lock();
            inner.dispatch_depth += 1;
            std::mem::take(&mut inner.entries)
        };

        let targets_this_window = match &envelope.target {
            EventTarget::Window(label) => label == &self.label,
            EventTarget::Broadcast => true,
        };

        let mut spent = Vec::new();
        for entry in entries.iter_mut() {
            if entry.event != envelope.name {
                continue;
            }
            if !entry.any_target && !targets_this_window {
                continue;
            }
            (entry.handler)(&envelope.payload);
            if entry.once {
                spent.push(entry.id);
            }
        }

        let mut inner = self.inner.lock();
        inner.dispatch_depth -= 1;
        if inner.purge_all {
            if inner.dispatch_depth == 0 {
                inner.purge_all = false;
            }
            inner.dead.clear();
            return;
        }
        entries.retain(|entry| !spent.contains(&entry.id) && !inner.dead.contains(&entry.id));
        let added = std::mem::take(&mut inner.entries);
        inner.entries = entries;
        inner.entries.extend(added);
        if inner.dispatch_depth == 0 {
            inner.dead.clear();
        }
    }
}

/// Drain a transport feed into the bus until the sending side closes.
///
/// The host (or a test harness) owns the channel; one pump per window keeps
/// per-topic delivery in publish order.
pub async fn pump(bus: Arc<EventBus>, mut feed: mpsc::UnboundedReceiver<EventEnvelope>) {
    while let Some(envelope) = feed.recv().await {
        bus.deliver(&envelope);
    }
    debug!(window = bus.label(), "event pump stopped");
}
