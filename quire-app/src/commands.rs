//! Tauri command handlers.
//!
//! Each function is registered with `tauri::Builder::invoke_handler` and
//! callable from the frontend via `invoke(name, { payload })`. They are thin
//! wrappers over the native modules; host-side components reach the same
//! operations through `bridge::dispatch`.

use tauri::{AppHandle, State, WebviewWindow};

use quire_core::grep::{GrepRequest, GrepResult};
use quire_core::ipc::commands::{
    ClipboardData, DialogOptions, EncodeArg, InitArgs, MessageResult, OpenFileResult, ReadResult,
    WriteFileInfo,
};

use crate::state::AppState;
use crate::watcher::WatchCommand;
use crate::{clipboard, dialog, launch, search, textio};

#[tauri::command]
pub fn get_args(app: AppHandle, state: State<'_, AppState>) -> Result<InitArgs, String> {
    launch::init_args(&app, &state)
}

#[tauri::command]
pub fn exists(payload: String) -> bool {
    textio::exists(&payload)
}

#[tauri::command]
pub fn is_file(payload: String) -> bool {
    textio::is_file(&payload)
}

#[tauri::command]
pub fn mkdir(payload: String) -> Result<(), String> {
    textio::mkdir(&payload)
}

#[tauri::command]
pub fn mkdir_all(payload: String) -> Result<(), String> {
    textio::mkdir_all(&payload)
}

#[tauri::command]
pub fn create(payload: String) -> Result<(), String> {
    textio::create(&payload)
}

#[tauri::command]
pub fn read_text_file(payload: String) -> Result<ReadResult, String> {
    textio::read_to_string(&payload)
}

#[tauri::command]
pub fn write_text_file(payload: WriteFileInfo) -> Result<(), String> {
    textio::write_text_file(payload)
}

#[tauri::command]
pub fn watch(
    window: WebviewWindow,
    state: State<'_, AppState>,
    payload: String,
) -> Result<(), String> {
    state
        .watch_tx
        .send(WatchCommand::Watch {
            path: payload,
            label: window.label().to_string(),
        })
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn unwatch(
    window: WebviewWindow,
    state: State<'_, AppState>,
    payload: String,
) -> Result<(), String> {
    state
        .watch_tx
        .send(WatchCommand::Unwatch {
            path: payload,
            label: window.label().to_string(),
        })
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn run_grep(
    window: WebviewWindow,
    state: State<'_, AppState>,
    payload: GrepRequest,
) -> Result<Vec<GrepResult>, String> {
    search::run(&state, window.label(), payload).await
}

#[tauri::command]
pub fn abort_grep(state: State<'_, AppState>) {
    search::cancel(&state.grep_cancel);
}

#[tauri::command]
pub fn change_encoding(payload: EncodeArg) -> Result<String, String> {
    textio::change_encoding(payload)
}

#[tauri::command]
pub async fn message(
    app: AppHandle,
    state: State<'_, AppState>,
    payload: DialogOptions,
) -> Result<MessageResult, String> {
    dialog::message(&app, &state.router, payload).await
}

#[tauri::command]
pub async fn show_open_dialog(
    app: AppHandle,
    state: State<'_, AppState>,
    payload: DialogOptions,
) -> Result<Option<OpenFileResult>, String> {
    dialog::show_open_dialog(&app, &state.router, payload).await
}

#[tauri::command]
pub async fn show_save_dialog(
    app: AppHandle,
    state: State<'_, AppState>,
    payload: DialogOptions,
) -> Result<Option<String>, String> {
    dialog::show_save_dialog(&app, &state.router, payload).await
}

#[tauri::command]
pub fn is_uris_available() -> bool {
    clipboard::is_uris_available()
}

#[tauri::command]
pub fn read_uris() -> Result<ClipboardData, String> {
    clipboard::read_uris()
}

#[tauri::command]
pub fn read_clipboard_text() -> Result<String, String> {
    clipboard::read_text()
}

#[tauri::command]
pub fn write_clipboard_text(payload: String) -> Result<(), String> {
    clipboard::write_text(payload)
}

#[tauri::command]
pub fn new_window(app: AppHandle, payload: Option<String>) -> Result<(), String> {
    launch::new_window(&app, payload.unwrap_or_default())
}
