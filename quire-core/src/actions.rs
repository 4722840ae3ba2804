//! User-facing operations of one window, carrying the boundary's error
//! policy:
//!
//! - user-initiated actions (open, save, read) surface failures through a
//!   modal message dialog and degrade to "nothing happened";
//! - best-effort background probes (clipboard URIs) swallow failures
//!   silently;
//! - dialogs about failures that themselves fail are logged and dropped —
//!   there is nobody left to tell.
//!
//! Nothing here retries. A failure is terminal for the triggering call and
//! recovery is a fresh user action.

use tracing::debug;

use crate::context::WindowContext;
use crate::error::Result;
use crate::grep::GrepRequest;
use crate::ipc::channel::CommandChannel;
use crate::ipc::commands::{
    ChangeEncoding, DialogKind, DialogOptions, DialogType, EncodeArg, GetArgs, InitArgs,
    IsUrisAvailable, Message, MessageResult, NewWindow, OpenFileResult, ReadClipboardText,
    ReadTextFile, ReadUris, Selection, ShowOpenDialog, ShowSaveDialog, WriteClipboardText,
    WriteFileInfo, WriteTextFile,
};

pub struct WindowActions {
    channel: CommandChannel,
}

impl WindowActions {
    pub fn new(ctx: &WindowContext) -> Self {
        Self {
            channel: ctx.channel().clone(),
        }
    }

    /// Fetch this window's launch arguments from the backend.
    pub async fn startup_args(&self) -> Result<InitArgs> {
        self.channel.invoke::<GetArgs>(()).await
    }

    /// Show a modal error dialog. Best-effort: if even the dialog command
    /// fails there is nothing more to do than log it.
    pub async fn show_error_message(&self, text: impl Into<String>) {
        let options = DialogOptions::message(text, DialogKind::Error);
        if let Err(e) = self.channel.invoke::<Message>(options).await {
            debug!(error = %e, "error dialog could not be shown");
        }
    }

    /// Ask the user a yes/no question.
    pub async fn confirm(
        &self,
        message: impl Into<String>,
        ok_label: Option<&str>,
        cancel_label: Option<&str>,
    ) -> Result<MessageResult> {
        self.channel
            .invoke::<Message>(DialogOptions {
                dialog_type: DialogType::Ask,
                message: message.into(),
                title: None,
                kind: Some(DialogKind::Warning),
                ok_label: Some(ok_label.unwrap_or("Yes").to_string()),
                cancel_label: Some(cancel_label.unwrap_or("No").to_string()),
                default_path: None,
            })
            .await
    }

    /// Write a buffer to disk. Returns whether the write succeeded; a
    /// failure has already been shown to the user.
    pub async fn save_file(
        &self,
        full_path: impl Into<String>,
        data: impl Into<String>,
        encoding: impl Into<String>,
    ) -> bool {
        let outcome = self
            .channel
            .invoke::<WriteTextFile>(WriteFileInfo {
                full_path: full_path.into(),
                data: data.into(),
                encoding: Some(encoding.into()),
            })
            .await;
        match outcome {
            Ok(()) => true,
            Err(e) => {
                self.show_error_message(e.to_string()).await;
                false
            }
        }
    }

    /// Run the open dialog and read the chosen file. `None` on cancel or on
    /// a failure that has already been shown to the user.
    pub async fn open_file(&self) -> Option<OpenFileResult> {
        let options = DialogOptions {
            dialog_type: DialogType::Ask,
            message: String::new(),
            title: None,
            kind: None,
            ok_label: None,
            cancel_label: None,
            default_path: None,
        };
        match self.channel.invoke::<ShowOpenDialog>(options).await {
            Ok(chosen) => chosen,
            Err(e) => {
                self.show_error_message(e.to_string()).await;
                None
            }
        }
    }

    /// Read a file by path. `None` on a failure that has already been shown
    /// to the user.
    pub async fn read_file(&self, file_path: impl Into<String>) -> Option<OpenFileResult> {
        let file_path = file_path.into();
        match self
            .channel
            .invoke::<ReadTextFile>(file_path.clone())
            .await
        {
            Ok(read) => Some(OpenFileResult {
                file_path,
                content: read.content,
                encoding: read.encoding,
            }),
            Err(e) => {
                self.show_error_message(e.to_string()).await;
                None
            }
        }
    }

    /// Run the save dialog. Cancellation is `Ok(None)`; errors propagate to
    /// the caller.
    pub async fn save_dialog(
        &self,
        title: impl Into<String>,
        default_path: impl Into<String>,
    ) -> Result<Option<String>> {
        self.channel
            .invoke::<ShowSaveDialog>(DialogOptions {
                dialog_type: DialogType::Ask,
                message: String::new(),
                title: Some(title.into()),
                kind: None,
                ok_label: None,
                cancel_label: None,
                default_path: Some(default_path.into()),
            })
            .await
    }

    /// Spawn a fresh window process with the given launch arguments (see
    /// [`launch_args`]).
    pub async fn open_new_window(
        &self,
        file_path: Option<&str>,
        grep: Option<&GrepRequest>,
        start_line: Option<Selection>,
    ) -> Result<()> {
        self.channel
            .invoke::<NewWindow>(launch_args(file_path, grep, start_line))
            .await
    }

    /// Probe the clipboard for file paths. Best-effort background work: any
    /// failure yields an empty list.
    pub async fn clipboard_paths(&self) -> Vec<String> {
        match self.channel.invoke::<IsUrisAvailable>(()).await {
            Ok(true) => {}
            Ok(false) => return Vec::new(),
            Err(e) => {
                debug!(error = %e, "clipboard URI probe failed");
                return Vec::new();
            }
        }
        match self.channel.invoke::<ReadUris>(()).await {
            Ok(data) => data.urls,
            Err(e) => {
                debug!(error = %e, "clipboard URI read failed");
                Vec::new()
            }
        }
    }

    pub async fn clipboard_text(&self) -> Result<String> {
        self.channel.invoke::<ReadClipboardText>(()).await
    }

    pub async fn set_clipboard_text(&self, text: impl Into<String>) -> Result<()> {
        self.channel.invoke::<WriteClipboardText>(text.into()).await
    }

    /// Re-decode a file under a named encoding, returning the new content.
    pub async fn change_encoding(
        &self,
        file_path: impl Into<String>,
        encoding: impl Into<String>,
    ) -> Result<String> {
        self.channel
            .invoke::<ChangeEncoding>(EncodeArg {
                file_path: Some(file_path.into()),
                content: None,
                encoding: encoding.into(),
            })
            .await
    }
}

/// Format launch arguments for a new window process: an optional file path,
/// then either a `-g` grep request or a caret position. The counterpart
/// parser lives in the host binary.
pub fn launch_args(
    file_path: Option<&str>,
    grep: Option<&GrepRequest>,
    start_line: Option<Selection>,
) -> String {
    let mut args: Vec<String> = Vec::new();
    if let Some(path) = file_path {
        args.push(path.to_string());
    }
    if let Some(request) = grep {
        args.push("-g".into());
        args.push(request.condition.clone());
        args.push(request.start_directory.clone());
        args.push(if request.file_type.is_empty() {
            "*.*".into()
        } else {
            request.file_type.clone()
        });
        if request.match_by_word {
            args.push("-m".into());
        }
        if request.case_sensitive {
            args.push("-c".into());
        }
        if request.regexp {
            args.push("-r".into());
        }
        if request.recursive {
            args.push("-s".into());
        }
    } else if let Some(position) = start_line {
        args.push(position.column.to_string());
        args.push(position.row.to_string());
    }
    args.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    use crate::ipc::transport::{CommandReply, EventEnvelope, Transport};

    /// Serves replies from a queue and records every dispatch.
    struct ScriptedTransport {
        calls: Mutex<Vec<(&'static str, Value)>>,
        replies: Mutex<Vec<CommandReply>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<CommandReply>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies),
            })
        }

        fn command_names(&self) -> Vec<&'static str> {
            self.calls.lock().iter().map(|(name, _)| *name).collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn submit(&self, command: &'static str, payload: Value) -> oneshot::Receiver<CommandReply> {
            self.calls.lock().push((command, payload));
            let (tx, rx) = oneshot::channel();
            let mut replies = self.replies.lock();
            let reply = if replies.is_empty() {
                Ok(json!(null))
            } else {
                replies.remove(0)
            };
            let _ = tx.send(reply);
            rx
        }

        fn publish(&self, _envelope: EventEnvelope) {}
    }

    fn actions_over(transport: Arc<ScriptedTransport>) -> WindowActions {
        let ctx = WindowContext::new("main", transport as Arc<dyn Transport>);
        WindowActions::new(&ctx)
    }

    #[tokio::test]
    async fn failed_save_shows_an_error_dialog_and_reports_false() {
        let transport = ScriptedTransport::new(vec![
            Err("disk full".into()),
            Ok(json!({ "button": "OK", "cancelled": false })),
        ]);
        let actions = actions_over(transport.clone());

        let saved = actions.save_file("/proj/a.txt", "data", "UTF-8").await;
        assert!(!saved);

        let names = transport.command_names();
        assert_eq!(names, vec!["write_text_file", "message"]);
        let calls = transport.calls.lock();
        assert_eq!(calls[1].1["kind"], "error");
        assert!(calls[1].1["message"]
            .as_str()
            .unwrap()
            .contains("disk full"));
    }

    #[tokio::test]
    async fn successful_save_shows_nothing() {
        let transport = ScriptedTransport::new(vec![Ok(json!(null))]);
        let actions = actions_over(transport.clone());

        assert!(actions.save_file("/proj/a.txt", "data", "UTF-8").await);
        assert_eq!(transport.command_names(), vec!["write_text_file"]);
    }

    #[tokio::test]
    async fn clipboard_probe_swallows_failures_silently() {
        let transport = ScriptedTransport::new(vec![Err("no clipboard".into())]);
        let actions = actions_over(transport.clone());

        assert!(actions.clipboard_paths().await.is_empty());
        // Only the probe ran; no dialog was shown.
        assert_eq!(transport.command_names(), vec!["is_uris_available"]);
    }

    #[tokio::test]
    async fn clipboard_paths_skips_read_when_unavailable() {
        let transport = ScriptedTransport::new(vec![Ok(json!(false))]);
        let actions = actions_over(transport.clone());

        assert!(actions.clipboard_paths().await.is_empty());
        assert_eq!(transport.command_names(), vec!["is_uris_available"]);
    }

    #[tokio::test]
    async fn confirm_uses_custom_labels() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "button": "Apply",
            "cancelled": false,
        }))]);
        let actions = actions_over(transport.clone());

        let result = actions
            .confirm("Reload from disk?", Some("Apply"), Some("Keep mine"))
            .await
            .expect("confirm");
        assert_eq!(result.button, "Apply");

        let calls = transport.calls.lock();
        assert_eq!(calls[0].1["dialog_type"], "ask");
        assert_eq!(calls[0].1["ok_label"], "Apply");
        assert_eq!(calls[0].1["cancel_label"], "Keep mine");
    }

    #[test]
    fn launch_args_formats_grep_requests() {
        let request = GrepRequest {
            condition: "foo".into(),
            start_directory: "/proj".into(),
            file_type: "*.ts".into(),
            match_by_word: false,
            case_sensitive: true,
            regexp: false,
            recursive: true,
        };
        assert_eq!(
            launch_args(None, Some(&request), None),
            "-g foo /proj *.ts -c -s"
        );
    }

    #[test]
    fn launch_args_formats_file_with_caret_position() {
        let position = Selection { column: 4, row: 120 };
        assert_eq!(
            launch_args(Some("/proj/a.txt"), None, Some(position)),
            "/proj/a.txt 4 120"
        );
    }

    #[test]
    fn launch_args_defaults_empty_glob_to_match_everything() {
        let request = GrepRequest {
            condition: "x".into(),
            start_directory: "/".into(),
            file_type: String::new(),
            ..GrepRequest::default()
        };
        assert_eq!(launch_args(None, Some(&request), None), "-g x / *.* -s");
    }
}
