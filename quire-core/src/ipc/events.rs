//! The event registry — topic names, payload shapes, and delivery scopes.
//!
//! ## Registry
//!
//! | Event | Payload | Scope |
//! |-------|---------|-------|
//! | `watch_event` | [`WatchEvent`] | window-targeted |
//! | `watch_confirm_event` | [`WatchConfirmEvent`] | window-targeted |
//! | `grep_progress` | [`GrepProgress`](crate::grep::GrepProgress) | window-targeted |
//! | `grep_end` | [`GrepEnd`](crate::grep::GrepEnd) | window-targeted |
//! | `contextmenu_event` | [`ContextMenuEvent`] | window-targeted |
//! | `dialog` | `bool` | broadcast |
//! | `settings_changed` | [`Settings`](crate::settings::Settings) | self |
//!
//! Events have no response semantics and no cross-topic ordering; delivery
//! order is only guaranteed per subscriber per topic.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::settings::Settings;

/// The delivery scope an event is registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Delivered to exactly one named window.
    Window,
    /// Delivered to every listening window.
    Broadcast,
    /// Loopback to the publishing window only.
    Loopback,
}

/// Runtime scope chosen at publish time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// Exactly one named window.
    Window(String),
    /// Every window currently listening.
    Broadcast,
    /// The publishing window itself.
    Current,
}

impl ScopeKind {
    /// Whether a publish-time scope is legal for this registered kind.
    pub fn permits(self, scope: &EventScope) -> bool {
        match self {
            ScopeKind::Window => matches!(scope, EventScope::Window(_) | EventScope::Current),
            ScopeKind::Broadcast => matches!(scope, EventScope::Broadcast),
            ScopeKind::Loopback => matches!(scope, EventScope::Current),
        }
    }
}

/// One entry of the event registry: a topic name, its registered scope, and
/// its payload shape.
pub trait Event {
    const NAME: &'static str;
    const SCOPE: ScopeKind;
    type Payload: Serialize + DeserializeOwned + Send + 'static;
}

// ---------------------------------------------------------------------------
// Watch events
// ---------------------------------------------------------------------------

/// Emitted on `watch_event` when the watched file changed out-of-band.
/// Carries the fresh on-disk content so the window can diff against its
/// buffer before prompting the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub file_path: String,
    pub content: String,
    pub encoding: String,
}

impl Event for WatchEvent {
    const NAME: &'static str = "watch_event";
    const SCOPE: ScopeKind = ScopeKind::Window;
    type Payload = Self;
}

/// The user's decision on an external-change conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchConfirmEvent {
    /// Replace the buffer with the on-disk content.
    pub apply_change: bool,
    /// Stop prompting for further external touches of this window's target.
    pub do_not_notify: bool,
}

impl Event for WatchConfirmEvent {
    const NAME: &'static str = "watch_confirm_event";
    const SCOPE: ScopeKind = ScopeKind::Window;
    type Payload = Self;
}

// ---------------------------------------------------------------------------
// UI events
// ---------------------------------------------------------------------------

/// A context-menu item activation routed back to the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuEvent {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Event for ContextMenuEvent {
    const NAME: &'static str = "contextmenu_event";
    const SCOPE: ScopeKind = ScopeKind::Window;
    type Payload = Self;
}

/// Broadcast when a modal dialog opens (`true`) or closes (`false`) so every
/// window can gate its own input handling.
pub struct DialogVisibility;

impl Event for DialogVisibility {
    const NAME: &'static str = "dialog";
    const SCOPE: ScopeKind = ScopeKind::Broadcast;
    type Payload = bool;
}

/// Loopback rebroadcast after the settings store reloaded fresh state that
/// another window persisted.
pub struct SettingsChanged;

impl Event for SettingsChanged {
    const NAME: &'static str = "settings_changed";
    const SCOPE: ScopeKind = ScopeKind::Loopback;
    type Payload = Settings;
}
