//! # quire-core
//!
//! Window-side coordination SDK for the Quire editor.
//!
//! ## Architecture
//!
//! ```text
//! WindowContext ──► CommandChannel ──► Transport::submit ──► backend
//!       │                                                      │
//!       └─────────► EventBus ◄── pump ◄── EventEnvelope ◄──────┘
//!                      │
//!        SettingsStore │ ChangeWatcher │ SearchCoordinator │ WindowActions
//! ```
//!
//! The backend is opaque: everything below the [`ipc::transport::Transport`]
//! seam (file I/O, the filesystem watcher, the grep engine, dialogs) is an
//! injected implementation. Production wires a Tauri host; tests wire a
//! scripted fake and drive the whole stack in memory.
//!
//! Coordination is single-threaded and cooperative per window: callers
//! suspend at each `invoke`/event wait. There are no timeouts anywhere —
//! a hung backend call suspends its caller indefinitely, a known gap of the
//! boundary that is documented rather than silently patched.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod actions;
pub mod context;
pub mod error;
pub mod grep;
pub mod ipc;
pub mod settings;
pub mod watch;

// Convenience re-exports for downstream crates
pub use actions::WindowActions;
pub use context::WindowContext;
pub use error::{QuireError, Result};
pub use grep::{GrepEnd, GrepProgress, GrepRequest, GrepResult, SearchCoordinator, SearchOutcome};
pub use ipc::bus::{EventBus, Subscription};
pub use ipc::channel::CommandChannel;
pub use ipc::events::{Event, EventScope, ScopeKind, WatchConfirmEvent, WatchEvent};
pub use ipc::transport::{CommandReply, EventEnvelope, EventTarget, Transport};
pub use settings::{Settings, SettingsStore, Theme};
pub use watch::ChangeWatcher;
