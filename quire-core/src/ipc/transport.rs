//! The seam between a window and the privileged backend.
//!
//! Two primitives, deliberately distinct:
//!
//! - `submit` — a correlated request/reply. Each dispatch gets its own
//!   oneshot; the reply resolves it and nothing else.
//! - `publish` — fire-and-forget event delivery with an explicit target.
//!   No reply, no ordering across topics.
//!
//! Production code injects a Tauri-backed implementation; tests inject a
//! scripted one. Nothing in this crate performs I/O directly.

use serde_json::Value;
use tokio::sync::oneshot;

/// Reply to a single command dispatch: the backend's response payload, or
/// its rejection detail.
pub type CommandReply = std::result::Result<Value, String>;

/// Delivery target carried by an event envelope on the wire.
///
/// Loopback publishes are resolved to `Window(<own label>)` before they
/// reach the transport, so the wire only knows these two forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    /// Exactly one named window.
    Window(String),
    /// Every window listening on the topic.
    Broadcast,
}

/// A published event as it crosses the transport.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub name: &'static str,
    pub target: EventTarget,
    pub payload: Value,
}

/// Backend access as seen from one window.
pub trait Transport: Send + Sync {
    /// Dispatch `command` with `payload` to the backend. The returned
    /// receiver resolves once the backend replies.
    ///
    /// No timeout is applied and none exists anywhere above this seam: a
    /// backend that never replies suspends the caller indefinitely. That is
    /// a known gap inherited from the boundary's contract, kept visible
    /// rather than silently patched.
    fn submit(&self, command: &'static str, payload: Value) -> oneshot::Receiver<CommandReply>;

    /// Put an event onto the shared transport.
    fn publish(&self, envelope: EventEnvelope);
}
