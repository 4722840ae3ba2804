//! Native filesystem watcher task.
//!
//! One `notify` watcher serves every window of this process. Windows
//! register interest per path through [`WatchCommand`]; a modification of a
//! registered path is debounced, re-read with encoding detection, and
//! delivered as a window-targeted `watch_event` to each registered window.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use quire_core::ipc::events::WatchEvent;

use crate::bridge::EventRouter;
use crate::textio;

/// Registration changes sent by command handlers.
#[derive(Debug)]
pub enum WatchCommand {
    Watch { path: String, label: String },
    Unwatch { path: String, label: String },
}

/// Editors often fire several events per save (truncate, write, rename);
/// collapse them per path.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Spawn the watcher loop. Runs until the command channel closes.
pub fn spawn(
    router: Arc<EventRouter>,
    mut commands: UnboundedReceiver<WatchCommand>,
) -> notify::Result<()> {
    let (fs_tx, mut fs_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = fs_tx.send(res);
    })?;

    tauri::async_runtime::spawn(async move {
        let mut registrations: HashMap<PathBuf, HashSet<String>> = HashMap::new();
        let mut last_emit: HashMap<PathBuf, Instant> = HashMap::new();

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(WatchCommand::Watch { path, label }) => {
                            let path = PathBuf::from(path);
                            let windows = registrations.entry(path.clone()).or_default();
                            if windows.is_empty() {
                                if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
                                    warn!(path = %path.display(), error = %e, "watch failed");
                                }
                            }
                            windows.insert(label);
                        }
                        Some(WatchCommand::Unwatch { path, label }) => {
                            let path = PathBuf::from(path);
                            if let Some(windows) = registrations.get_mut(&path) {
                                windows.remove(&label);
                                if windows.is_empty() {
                                    registrations.remove(&path);
                                    last_emit.remove(&path);
                                    let _ = watcher.unwatch(&path);
                                }
                            }
                        }
                        None => {
                            debug!("watch command channel closed; shutting down watcher");
                            break;
                        }
                    }
                }

                event = fs_rx.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        Ok(event) if is_modification(&event.kind) => {
                            for path in &event.paths {
                                let Some(windows) = registrations.get(path.as_path()) else {
                                    continue;
                                };
                                let now = Instant::now();
                                let debounced = last_emit
                                    .get(path.as_path())
                                    .is_some_and(|t| now.duration_since(*t) < DEBOUNCE_WINDOW);
                                if debounced {
                                    continue;
                                }
                                last_emit.insert(path.clone(), now);

                                match textio::read_to_string(&path.to_string_lossy()) {
                                    Ok(read) => {
                                        let payload = WatchEvent {
                                            file_path: path.to_string_lossy().into_owned(),
                                            content: read.content,
                                            encoding: read.encoding,
                                        };
                                        for label in windows {
                                            router.emit_window::<WatchEvent>(label, &payload);
                                        }
                                    }
                                    Err(e) => {
                                        warn!(path = %path.display(), error = %e, "changed file could not be re-read");
                                    }
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "filesystem watcher error"),
                    }
                }
            }
        }
    });

    Ok(())
}

fn is_modification(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(
            ModifyKind::Any | ModifyKind::Data(_) | ModifyKind::Metadata(_) | ModifyKind::Other
        )
    )
}
