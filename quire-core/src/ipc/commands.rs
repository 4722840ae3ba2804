//! The command registry — the fixed, compile-time-checkable catalogue of
//! request/response shapes keyed by command name.
//!
//! Every call through [`CommandChannel::invoke`](crate::ipc::channel::CommandChannel::invoke)
//! must name one of the marker types below, so an unknown command name is a
//! compile error, not a runtime condition.
//!
//! Wire field casing mirrors what the backend actually speaks: most shapes
//! use snake_case, `WriteFileInfo` is camelCase.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::grep::{GrepRequest, GrepResult};

/// One entry of the command registry: a wire name plus its request and
/// response shapes.
pub trait Command {
    const NAME: &'static str;
    type Request: Serialize + Send;
    type Response: DeserializeOwned;
}

macro_rules! registry {
    ($( $(#[$doc:meta])* $marker:ident = $wire:literal : $req:ty => $res:ty ; )+) => {
        $(
            $(#[$doc])*
            pub struct $marker;

            impl Command for $marker {
                const NAME: &'static str = $wire;
                type Request = $req;
                type Response = $res;
            }
        )+

        /// Every wire name in the registry, in declaration order.
        pub const COMMAND_NAMES: &[&str] = &[$($wire),+];
    };
}

registry! {
    /// Launch arguments of this window's process.
    GetArgs = "get_args": () => InitArgs;
    /// Whether a path exists.
    Exists = "exists": String => bool;
    /// Whether a path exists and is a regular file.
    IsFile = "is_file": String => bool;
    /// Create a single directory.
    Mkdir = "mkdir": String => ();
    /// Create a directory and all missing parents.
    MkdirAll = "mkdir_all": String => ();
    /// Create an empty file, failing if it already exists.
    Create = "create": String => ();
    /// Read a text file, detecting its encoding.
    ReadTextFile = "read_text_file": String => ReadResult;
    /// Write a text file, optionally transcoding to a named encoding.
    WriteTextFile = "write_text_file": WriteFileInfo => ();
    /// Register a path with the backend filesystem watcher.
    Watch = "watch": String => ();
    /// Remove a path from the backend filesystem watcher.
    Unwatch = "unwatch": String => ();
    /// Run a recursive text search; progress streams back as events.
    RunGrep = "run_grep": GrepRequest => Vec<GrepResult>;
    /// Request cancellation of the running search (advisory).
    AbortGrep = "abort_grep": () => ();
    /// Re-decode a file (or raw content) under a named encoding.
    ChangeEncoding = "change_encoding": EncodeArg => String;
    /// Show a modal message/confirm/ask dialog.
    Message = "message": DialogOptions => MessageResult;
    /// Show a file-open dialog and read the chosen file.
    ShowOpenDialog = "show_open_dialog": DialogOptions => Option<OpenFileResult>;
    /// Show a file-save dialog.
    ShowSaveDialog = "show_save_dialog": DialogOptions => Option<String>;
    /// Whether the clipboard currently carries file URIs.
    IsUrisAvailable = "is_uris_available": () => bool;
    /// Read file URIs from the clipboard.
    ReadUris = "read_uris": () => ClipboardData;
    /// Read plain text from the clipboard.
    ReadClipboardText = "read_clipboard_text": () => String;
    /// Write plain text to the clipboard.
    WriteClipboardText = "write_clipboard_text": String => ();
    /// Spawn a new editor window (a fresh process of this binary).
    NewWindow = "new_window": String => ();
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Decoded text plus the encoding it was detected as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    pub content: String,
    pub encoding: String,
}

/// Payload of `write_text_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFileInfo {
    pub full_path: String,
    pub data: String,
    /// Target encoding label; `None` writes UTF-8 as-is.
    pub encoding: Option<String>,
}

/// Which modal flavour a dialog request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogType {
    /// One OK button.
    Message,
    /// OK / Cancel.
    Confirm,
    /// Two custom-labelled buttons.
    Ask,
}

/// Severity hint for a message dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

/// Payload of the dialog commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogOptions {
    pub dialog_type: DialogType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DialogKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
}

impl DialogOptions {
    /// A plain message dialog with the given severity.
    pub fn message(text: impl Into<String>, kind: DialogKind) -> Self {
        Self {
            dialog_type: DialogType::Message,
            message: text.into(),
            title: None,
            kind: Some(kind),
            ok_label: None,
            cancel_label: None,
            default_path: None,
        }
    }
}

/// Outcome of a message dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResult {
    /// Label of the button the user pressed.
    pub button: String,
    pub cancelled: bool,
}

/// A file chosen in the open dialog, already read and decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenFileResult {
    pub file_path: String,
    pub content: String,
    pub encoding: String,
}

/// File URIs read from the clipboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipboardData {
    pub urls: Vec<String>,
}

/// Payload of `change_encoding`. Exactly one of `file_path` / `content`
/// carries the bytes to re-decode; `file_path` wins when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodeArg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub encoding: String,
}

/// A caret position restored from the command line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Selection {
    pub column: u64,
    pub row: u64,
}

/// The file this window was launched on, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileArg {
    pub file_path: Option<String>,
    pub content: Option<String>,
    pub encoding: Option<String>,
    pub start_line: Option<Selection>,
}

/// Response of `get_args` — everything a window needs to boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitArgs {
    pub file: Option<FileArg>,
    pub grep: Option<GrepRequest>,
    pub locales: Vec<String>,
    pub restore_position: bool,
    pub app_data_dir: String,
}
