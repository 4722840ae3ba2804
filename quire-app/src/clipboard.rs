//! Clipboard access.
//!
//! Text read/write goes straight to the system clipboard. The URI commands
//! probe the text clipboard for `file://` URIs or existing absolute paths —
//! file managers on every desktop put one path per line there.

use std::path::Path;

use arboard::Clipboard;

use quire_core::ipc::commands::ClipboardData;

pub fn read_text() -> Result<String, String> {
    Clipboard::new()
        .and_then(|mut clipboard| clipboard.get_text())
        .map_err(|e| e.to_string())
}

pub fn write_text(text: String) -> Result<(), String> {
    Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text))
        .map_err(|e| e.to_string())
}

pub fn read_uris() -> Result<ClipboardData, String> {
    let text = read_text()?;
    Ok(ClipboardData {
        urls: paths_from_text(&text),
    })
}

pub fn is_uris_available() -> bool {
    read_text()
        .map(|text| !paths_from_text(&text).is_empty())
        .unwrap_or(false)
}

fn paths_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            if let Some(stripped) = line.strip_prefix("file://") {
                return Some(stripped.to_string());
            }
            let path = Path::new(line);
            (path.is_absolute() && path.exists()).then(|| line.to_string())
        })
        .collect()
}
