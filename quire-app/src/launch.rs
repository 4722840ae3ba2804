//! Launch-argument intake and window spawning.
//!
//! A window process is started either bare, on a file (optionally with a
//! caret position), or in grep mode:
//!
//! ```text
//! quire
//! quire <file> [<column> <row>]
//! quire [-g] <pattern> <start_dir> <glob> [-m] [-c] [-r] [-s]
//! ```
//!
//! The formatter producing this shape lives in `quire_core::actions` —
//! `new_window` hands its output straight back to a fresh process of this
//! binary.

use tauri::{AppHandle, Manager};
use tracing::warn;

use quire_core::grep::GrepRequest;
use quire_core::ipc::commands::{FileArg, InitArgs, Selection};

use crate::state::AppState;
use crate::textio;

/// What the command line asked this window to be.
#[derive(Debug, Clone, Default)]
pub struct LaunchArgs {
    pub file: Option<FileArg>,
    pub grep: Option<GrepRequest>,
}

/// Parse the process arguments (binary name already stripped).
pub fn parse_args(args: &[String]) -> LaunchArgs {
    if args.is_empty() {
        return LaunchArgs::default();
    }

    if args[0] == "-g" {
        if args.len() < 4 {
            warn!(?args, "grep launch is missing arguments; starting empty");
            return LaunchArgs::default();
        }
        return LaunchArgs {
            file: None,
            grep: Some(GrepRequest {
                condition: args[1].clone(),
                start_directory: args[2].clone(),
                file_type: args[3].clone(),
                match_by_word: args.iter().any(|a| a == "-m"),
                case_sensitive: args.iter().any(|a| a == "-c"),
                regexp: args.iter().any(|a| a == "-r"),
                recursive: args.iter().any(|a| a == "-s"),
            }),
        };
    }

    let start_line = if args.len() >= 3 {
        match (args[1].parse::<u64>(), args[2].parse::<u64>()) {
            (Ok(column), Ok(row)) => Some(Selection { column, row }),
            _ => {
                warn!(?args, "unparsable caret position ignored");
                None
            }
        }
    } else {
        None
    };

    LaunchArgs {
        file: Some(FileArg {
            file_path: Some(args[0].clone()),
            content: None,
            encoding: None,
            start_line,
        }),
        grep: None,
    }
}

/// Assemble the `get_args` response for this window.
pub fn init_args(app: &AppHandle, state: &AppState) -> Result<InitArgs, String> {
    let app_data_dir = app
        .path()
        .app_data_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut init = InitArgs {
        file: None,
        grep: None,
        locales: vec![system_locale()],
        restore_position: state.restore_position,
        app_data_dir,
    };

    if let Some(file) = &state.launch.file {
        let mut file = file.clone();
        if let Some(path) = &file.file_path {
            let read = textio::read_to_string(path)?;
            if !read.content.is_empty() {
                file.content = Some(read.content);
                file.encoding = Some(read.encoding);
            }
        }
        init.file = Some(file);
    } else if let Some(grep) = &state.launch.grep {
        init.grep = Some(grep.clone());
    }

    Ok(init)
}

/// Spawn a fresh window process with the given argument string.
pub fn new_window(app: &AppHandle, args: String) -> Result<(), String> {
    let binary = tauri::process::current_binary(&app.env()).map_err(|e| e.to_string())?;
    let mut command = std::process::Command::new(binary);
    if !args.trim().is_empty() {
        command.args(args.split_whitespace());
    }
    command.spawn().map_err(|e| e.to_string())?;
    Ok(())
}

/// BCP-47-ish locale from the environment, e.g. `ja_JP.UTF-8` → `ja-JP`.
fn system_locale() -> String {
    let raw = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_default();
    normalize_locale(&raw)
}

fn normalize_locale(raw: &str) -> String {
    let trimmed = raw.split('.').next().unwrap_or_default().replace('_', "-");
    if trimmed.is_empty() || trimmed == "C" || trimmed == "POSIX" {
        "en-US".to_string()
    } else {
        trimmed
    }
}
