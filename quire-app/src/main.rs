//! Quire desktop application entry point.
//!
//! ## Runtime note
//!
//! Tauri v2 manages its own Tokio runtime internally. Host-side tasks use
//! `tauri::async_runtime::spawn` (not `tokio::spawn`) so they share Tauri's
//! runtime and can safely call Tauri APIs.

#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

mod bridge;
mod clipboard;
mod commands;
mod dialog;
mod launch;
mod search;
mod state;
mod textio;
mod watcher;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tauri::Manager;
use tracing::{debug, info, warn};

use quire_core::ipc::bus::{self, EventBus};
use quire_core::ipc::events::SettingsChanged;
use quire_core::settings::{Bounds, SettingsStore, SETTINGS_FILE_NAME};
use quire_core::{ChangeWatcher, EventScope, Transport, WatchEvent, WindowContext};

use bridge::{EventRouter, HostTransport};
use state::{AppState, HostSettings};

const MAIN_WINDOW: &str = "main";

/// Reload-and-rebroadcast wiring for the marker file: whenever another
/// window touches it, pull the fresh settings from disk and announce them
/// loopback as `settings_changed`.
fn spawn_settings_sync(
    bus: &Arc<EventBus>,
    store: Arc<tokio::sync::Mutex<SettingsStore>>,
    marker_path: String,
) {
    let bus_for_publish = Arc::clone(bus);
    let _marker_sub = bus.subscribe::<WatchEvent>(move |event| {
        if event.file_path != marker_path {
            return;
        }
        let store = Arc::clone(&store);
        let bus = Arc::clone(&bus_for_publish);
        tauri::async_runtime::spawn(async move {
            let mut store = store.lock().await;
            match store.reload().await {
                Ok(()) => {
                    debug!("settings reloaded after peer change");
                    bus.publish::<SettingsChanged>(EventScope::Current, store.data());
                }
                Err(e) => warn!(error = %e, "settings reload after marker change failed"),
            }
        });
    });
}

/// Capture the closing window's geometry into the settings store, persist
/// it, and signal peers through the marker file.
fn persist_geometry(window: &tauri::Window) {
    if window.label() != MAIN_WINDOW {
        return;
    }
    let app = window.app_handle();
    let Some(host) = app.try_state::<HostSettings>() else {
        return;
    };

    let maximized = window.is_maximized().unwrap_or(false);
    let position = window.outer_position().ok();
    let size = window.inner_size().ok();

    let store = Arc::clone(&host.store);
    tauri::async_runtime::block_on(async move {
        let mut store = store.lock().await;
        store.data_mut().is_maximized = maximized;
        if !maximized {
            if let (Some(position), Some(size)) = (position, size) {
                store.data_mut().bounds = Bounds {
                    width: size.width,
                    height: size.height,
                    x: position.x,
                    y: position.y,
                };
            }
        }
        if let Err(e) = store.save().await {
            warn!(error = %e, "failed to persist window settings");
            return;
        }
        if let Err(e) = store.emit().await {
            warn!(error = %e, "failed to signal settings change to peers");
        }
    });
}

/// Release the window's watch registration, its event subscriptions, and
/// its router tap.
fn teardown(window: &tauri::Window) {
    if window.label() != MAIN_WINDOW {
        return;
    }
    let app = window.app_handle();
    if let Some(host) = app.try_state::<HostSettings>() {
        let marker_watcher = Arc::clone(&host.marker_watcher);
        tauri::async_runtime::block_on(async move {
            marker_watcher.lock().await.unlisten_all().await;
        });
    }
    if let Some(app_state) = app.try_state::<AppState>() {
        app_state.router.detach(window.label());
    }
}

fn main() {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quire=info".parse().unwrap()),
        )
        .init();

    info!("Quire starting");
    let launch_args: Vec<String> = std::env::args().skip(1).collect();
    let launch_args = launch::parse_args(&launch_args);

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(move |app| {
            let app_handle = app.handle().clone();

            // ── Backend state ─────────────────────────────────────────────
            let router = Arc::new(EventRouter::new(app_handle.clone()));
            let (watch_tx, watch_rx) = tokio::sync::mpsc::unbounded_channel();
            watcher::spawn(Arc::clone(&router), watch_rx)?;

            let data_dir = app
                .path()
                .app_data_dir()?
                .to_string_lossy()
                .into_owned();
            let settings_file = Path::new(&data_dir).join("temp").join(SETTINGS_FILE_NAME);

            app.manage(AppState {
                watch_tx,
                grep_cancel: Arc::new(AtomicBool::new(false)),
                launch: launch_args,
                restore_position: settings_file.exists(),
                router: Arc::clone(&router),
            });

            // ── Host-side window coordination over the command boundary ──
            let feed = router.attach(MAIN_WINDOW);
            let transport: Arc<dyn Transport> = Arc::new(HostTransport::new(
                app_handle.clone(),
                Arc::clone(&router),
                MAIN_WINDOW,
            ));
            let ctx = WindowContext::new(MAIN_WINDOW, transport);
            tauri::async_runtime::spawn(bus::pump(Arc::clone(ctx.bus()), feed));

            let store = tauri::async_runtime::block_on(SettingsStore::init(
                ctx.channel().clone(),
                &data_dir,
            ))
            .expect("failed to initialize settings store");
            info!(
                file = store.file_path(),
                theme = ?store.data().theme,
                "settings loaded"
            );

            // ── Main window, restored from persisted geometry ─────────────
            let bounds = store.data().bounds;
            let window = tauri::WebviewWindowBuilder::new(
                app,
                MAIN_WINDOW,
                tauri::WebviewUrl::App("index.html".into()),
            )
            .title("Quire")
            .inner_size(f64::from(bounds.width), f64::from(bounds.height))
            .position(f64::from(bounds.x), f64::from(bounds.y))
            .build()?;
            if store.data().is_maximized {
                let _ = window.maximize();
            }

            // ── Cross-window settings sync via the marker file ────────────
            let mut marker_watcher = ChangeWatcher::new(&ctx);
            let marker_path = store.marker_path().to_string();
            if let Err(e) =
                tauri::async_runtime::block_on(marker_watcher.start_watch(&marker_path))
            {
                warn!(error = %e, "marker watch failed; cross-window settings sync disabled");
            }
            let store = Arc::new(tokio::sync::Mutex::new(store));
            spawn_settings_sync(ctx.bus(), Arc::clone(&store), marker_path);

            app.manage(HostSettings {
                store,
                marker_watcher: Arc::new(tokio::sync::Mutex::new(marker_watcher)),
            });

            Ok(())
        })
        .on_window_event(|window, event| match event {
            tauri::WindowEvent::CloseRequested { .. } => persist_geometry(window),
            tauri::WindowEvent::Destroyed => teardown(window),
            _ => {}
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_args,
            commands::exists,
            commands::is_file,
            commands::mkdir,
            commands::mkdir_all,
            commands::create,
            commands::read_text_file,
            commands::write_text_file,
            commands::watch,
            commands::unwatch,
            commands::run_grep,
            commands::abort_grep,
            commands::change_encoding,
            commands::message,
            commands::show_open_dialog,
            commands::show_save_dialog,
            commands::is_uris_available,
            commands::read_uris,
            commands::read_clipboard_text,
            commands::write_clipboard_text,
            commands::new_window,
        ])
        .run(tauri::generate_context!())
        .expect("error while running Tauri application");
}
