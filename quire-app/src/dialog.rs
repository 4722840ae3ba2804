//! Modal dialogs.
//!
//! The blocking plugin API runs off the async executor via `spawn_blocking`.
//! Every dialog brackets itself with the broadcast `dialog` event so other
//! windows can gate their input handling while a modal is up.

use std::sync::Arc;

use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use quire_core::ipc::commands::{
    DialogKind, DialogOptions, DialogType, MessageResult, OpenFileResult,
};
use quire_core::ipc::events::DialogVisibility;

use crate::bridge::EventRouter;
use crate::textio;

fn plugin_kind(kind: DialogKind) -> MessageDialogKind {
    match kind {
        DialogKind::Info => MessageDialogKind::Info,
        DialogKind::Warning => MessageDialogKind::Warning,
        DialogKind::Error => MessageDialogKind::Error,
    }
}

/// Show a message/confirm/ask dialog and report which button closed it.
pub async fn message(
    app: &AppHandle,
    router: &Arc<EventRouter>,
    options: DialogOptions,
) -> Result<MessageResult, String> {
    let app = app.clone();
    router.emit_broadcast::<DialogVisibility>(&true);

    let result = tauri::async_runtime::spawn_blocking(move || {
        let ok_label = options.ok_label.clone().unwrap_or_else(|| "OK".to_string());
        let cancel_label = options
            .cancel_label
            .clone()
            .unwrap_or_else(|| "Cancel".to_string());

        let mut builder = app.dialog().message(&options.message);
        if let Some(title) = &options.title {
            builder = builder.title(title);
        }
        if let Some(kind) = options.kind {
            builder = builder.kind(plugin_kind(kind));
        }
        let buttons = match options.dialog_type {
            DialogType::Message => MessageDialogButtons::Ok,
            DialogType::Confirm => MessageDialogButtons::OkCancel,
            DialogType::Ask => {
                MessageDialogButtons::OkCancelCustom(ok_label.clone(), cancel_label.clone())
            }
        };

        let confirmed = builder.buttons(buttons).blocking_show();
        MessageResult {
            button: if confirmed { ok_label } else { cancel_label },
            cancelled: !confirmed,
        }
    })
    .await
    .map_err(|e| e.to_string());

    router.emit_broadcast::<DialogVisibility>(&false);
    result
}

/// Show the open dialog and read the chosen file. `None` means cancelled.
pub async fn show_open_dialog(
    app: &AppHandle,
    router: &Arc<EventRouter>,
    options: DialogOptions,
) -> Result<Option<OpenFileResult>, String> {
    let app = app.clone();
    router.emit_broadcast::<DialogVisibility>(&true);

    let picked = tauri::async_runtime::spawn_blocking(move || {
        let mut builder = app.dialog().file();
        if let Some(title) = &options.title {
            builder = builder.set_title(title);
        }
        if let Some(dir) = &options.default_path {
            builder = builder.set_directory(dir);
        }
        builder.blocking_pick_file()
    })
    .await
    .map_err(|e| e.to_string());

    router.emit_broadcast::<DialogVisibility>(&false);

    let Some(file_path) = picked? else {
        return Ok(None);
    };
    let file_path = file_path
        .into_path()
        .map_err(|e| e.to_string())?
        .to_string_lossy()
        .into_owned();
    let read = textio::read_to_string(&file_path)?;
    Ok(Some(OpenFileResult {
        file_path,
        content: read.content,
        encoding: read.encoding,
    }))
}

/// Show the save dialog. `None` means cancelled.
pub async fn show_save_dialog(
    app: &AppHandle,
    router: &Arc<EventRouter>,
    options: DialogOptions,
) -> Result<Option<String>, String> {
    let app = app.clone();
    router.emit_broadcast::<DialogVisibility>(&true);

    let picked = tauri::async_runtime::spawn_blocking(move || {
        let mut builder = app.dialog().file();
        if let Some(title) = &options.title {
            builder = builder.set_title(title);
        }
        if let Some(default_path) = &options.default_path {
            let path = std::path::Path::new(default_path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                builder = builder.set_directory(parent);
            }
            if let Some(name) = path.file_name() {
                builder = builder.set_file_name(name.to_string_lossy());
            }
        }
        builder.blocking_save_file()
    })
    .await
    .map_err(|e| e.to_string());

    router.emit_broadcast::<DialogVisibility>(&false);

    match picked? {
        Some(file_path) => Ok(Some(
            file_path
                .into_path()
                .map_err(|e| e.to_string())?
                .to_string_lossy()
                .into_owned(),
        )),
        None => Ok(None),
    }
}
