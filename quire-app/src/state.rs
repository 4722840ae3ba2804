//! Tauri application state.
//!
//! `AppState` is the backend side: everything command handlers need. The
//! host-side coordination for the main window (settings store + marker
//! watcher) is managed separately as [`HostSettings`] because it is built on
//! top of the command boundary and only exists once dispatch works.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use quire_core::settings::SettingsStore;
use quire_core::ChangeWatcher;

use crate::bridge::EventRouter;
use crate::launch::LaunchArgs;
use crate::watcher::WatchCommand;

/// Shared backend state — available in every `#[tauri::command]`.
pub struct AppState {
    /// Feed into the filesystem watcher task.
    pub watch_tx: mpsc::UnboundedSender<WatchCommand>,
    /// Cooperative cancellation flag for the grep engine.
    pub grep_cancel: Arc<AtomicBool>,
    /// What the command line asked this window to be.
    pub launch: LaunchArgs,
    /// Whether a previous run left persisted state to restore.
    pub restore_position: bool,
    /// Event delivery to webviews and host-side taps.
    pub router: Arc<EventRouter>,
}

/// Host-side coordination for the main window, built over the same command
/// boundary the webview uses.
pub struct HostSettings {
    pub store: Arc<Mutex<SettingsStore>>,
    /// Watches the settings marker file for writes by other windows.
    pub marker_watcher: Arc<Mutex<ChangeWatcher>>,
}
