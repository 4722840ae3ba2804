//! Persisted per-window settings and the store coordinating them.
//!
//! The store owns its window's `Settings` exclusively; every byte of I/O
//! goes through the command channel. Cross-window invalidation is indirect:
//! `save()` persists the object, `emit()` touches a shared marker file, and
//! other windows watching the marker react by calling `reload()`.
//!
//! Both files live under `<data_dir>/temp/`. The marker's content is a
//! decimal timestamp but is never parsed — only its mutation matters.

pub mod schema;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{QuireError, Result};
use crate::grep::GrepRequest;
use crate::ipc::channel::CommandChannel;
use crate::ipc::commands::{Exists, MkdirAll, ReadTextFile, WriteFileInfo, WriteTextFile};

pub const SETTINGS_FILE_NAME: &str = "editor.settings.json";
pub const MARKER_FILE_NAME: &str = "editor.settings.marker";

/// Most-recent-first open-file history length.
const HISTORY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Window placement, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            x: 0,
            y: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceMode {
    None,
    All,
    Boundary,
    Selection,
    Trailing,
}

/// Editor preferences, kept separately for plain-text and code buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub indent_size: u32,
    pub indent_by_spaces: bool,
    pub show_line_number: bool,
    pub auto_indent: bool,
    pub word_wrap: bool,
    pub font_size: u32,
    pub render_whitespace: WhitespaceMode,
    pub line_highlight: bool,
}

impl Preference {
    fn base(render_whitespace: WhitespaceMode) -> Self {
        Self {
            indent_size: 4,
            indent_by_spaces: true,
            show_line_number: true,
            auto_indent: true,
            word_wrap: false,
            font_size: 14,
            render_whitespace,
            line_highlight: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceBlock {
    pub plain: Preference,
    pub code: Preference,
}

impl Default for PreferenceBlock {
    fn default() -> Self {
        Self {
            plain: Preference::base(WhitespaceMode::All),
            code: Preference::base(WhitespaceMode::Selection),
        }
    }
}

/// Editor colors for one theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub background: String,
    pub foreground: String,
    pub caret: String,
    pub line_number: String,
    pub selection_background: String,
    pub link: String,
}

impl Palette {
    fn light() -> Self {
        Self {
            background: "#fffffe".into(),
            foreground: "#000000".into(),
            caret: "#000000".into(),
            line_number: "#237893".into(),
            selection_background: "#add6ff".into(),
            link: "#0000ff".into(),
        }
    }

    fn dark() -> Self {
        Self {
            background: "#1e1e1e".into(),
            foreground: "#d4d4d4".into(),
            caret: "#aeafad".into(),
            line_number: "#858585".into(),
            selection_background: "#264f78".into(),
            link: "#4e94ce".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteBlock {
    pub light: Palette,
    pub dark: Palette,
    /// Used when the theme selector follows the OS; seeded from the dark set.
    pub system: Palette,
}

impl Default for PaletteBlock {
    fn default() -> Self {
        Self {
            light: Palette::light(),
            dark: Palette::dark(),
            system: Palette::dark(),
        }
    }
}

/// The persisted settings object. Every key has a default; unknown keys in a
/// loaded file are ignored and absent keys keep their default (see
/// [`schema`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub bounds: Bounds,
    pub is_maximized: bool,
    /// Previously opened file paths, most recent first. Insertion order is
    /// significant.
    pub history: Vec<String>,
    pub theme: Theme,
    /// The last grep request, restored into the search form.
    pub grep_history: GrepRequest,
    pub preference: PreferenceBlock,
    pub palette: PaletteBlock,
}

impl Settings {
    /// Build a settings object from raw file JSON via the schema-driven
    /// merge. Fails only if the merged object still does not satisfy the
    /// typed shape (e.g. a scalar of the wrong type slipped in).
    fn merged_from(raw: Value) -> std::result::Result<Self, serde_json::Error> {
        let mut defaults = match serde_json::to_value(Settings::default()) {
            Ok(Value::Object(map)) => map,
            _ => unreachable!("default settings serialize to an object"),
        };
        if let Value::Object(raw_map) = raw {
            schema::merge(&mut defaults, &raw_map, schema::SETTINGS_FIELDS);
        }
        serde_json::from_value(Value::Object(defaults))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owner of one window's settings and of the two files backing them.
pub struct SettingsStore {
    channel: CommandChannel,
    data: Settings,
    file: String,
    marker: String,
}

impl SettingsStore {
    /// Load (or create) the settings file under `<data_dir>/temp/` and make
    /// sure the marker file exists.
    ///
    /// A file that exists but does not parse (or parses but does not fit
    /// the schema) is logged and ignored; the defaults stand. Missing files
    /// are created eagerly so later saves never race directory creation.
    pub async fn init(channel: CommandChannel, data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir).join("temp");
        let file = dir.join(SETTINGS_FILE_NAME).to_string_lossy().into_owned();
        let marker = dir.join(MARKER_FILE_NAME).to_string_lossy().into_owned();

        let mut store = Self {
            channel,
            data: Settings::default(),
            file,
            marker,
        };

        if store.channel.invoke::<Exists>(store.file.clone()).await? {
            let read = store
                .channel
                .invoke::<ReadTextFile>(store.file.clone())
                .await?;
            match serde_json::from_str::<Value>(&read.content)
                .map_err(|e| e.to_string())
                .and_then(|raw| Settings::merged_from(raw).map_err(|e| e.to_string()))
            {
                Ok(merged) => store.data = merged,
                Err(e) => {
                    warn!(file = %store.file, error = %e, "unreadable settings file, keeping defaults");
                }
            }
        } else {
            store
                .channel
                .invoke::<MkdirAll>(dir.to_string_lossy().into_owned())
                .await?;
            store.save().await?;
            debug!(file = %store.file, "created default settings file");
        }

        if !store.channel.invoke::<Exists>(store.marker.clone()).await? {
            store.write(store.marker.clone(), String::new()).await?;
        }

        Ok(store)
    }

    pub fn data(&self) -> &Settings {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Settings {
        &mut self.data
    }

    pub fn file_path(&self) -> &str {
        &self.file
    }

    pub fn marker_path(&self) -> &str {
        &self.marker
    }

    /// Replace the whole in-memory object, e.g. with state pushed from
    /// another window.
    pub fn update(&mut self, data: Settings) {
        self.data = data;
    }

    /// Re-read the settings file and replace the in-memory object.
    ///
    /// Bypasses the tolerant merge: the file was produced by a prior
    /// `save()` and is expected to be schema-correct already.
    pub async fn reload(&mut self) -> Result<()> {
        let read = self
            .channel
            .invoke::<ReadTextFile>(self.file.clone())
            .await?;
        self.data = serde_json::from_str(&read.content).map_err(QuireError::SettingsReload)?;
        Ok(())
    }

    /// Persist the in-memory object, pretty-printed.
    pub async fn save(&self) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.data)
            .expect("settings always serialize to JSON");
        self.write(self.file.clone(), body).await
    }

    /// Rewrite the marker file with the current timestamp — the sole
    /// cross-window invalidation signal. The content itself is meaningless;
    /// peers only watch the file for change.
    pub async fn emit(&self) -> Result<()> {
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        self.write(self.marker.clone(), stamp).await
    }

    /// Push a path to the front of the open-file history, deduplicating and
    /// keeping the list bounded.
    pub fn record_history(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.data.history.retain(|entry| entry != &path);
        self.data.history.insert(0, path);
        self.data.history.truncate(HISTORY_LIMIT);
    }

    async fn write(&self, full_path: String, data: String) -> Result<()> {
        self.channel
            .invoke::<WriteTextFile>(WriteFileInfo {
                full_path,
                data,
                encoding: None,
            })
            .await
    }
}
