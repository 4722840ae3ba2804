//! Recursive text search: wire shapes and the window-side coordinator.
//!
//! The backend owns the scan. The window issues one `run_grep` command,
//! reacts to streamed `grep_progress` events, and observes one terminal
//! `grep_end` per run — it never polls. Cancellation is advisory: after
//! `abort()` the backend may still flush events and a partial result set,
//! all of which is stale and discarded here rather than surfaced.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::WindowContext;
use crate::error::Result;
use crate::ipc::bus::{EventBus, Subscription};
use crate::ipc::channel::CommandChannel;
use crate::ipc::commands::{AbortGrep, RunGrep};
use crate::ipc::events::{Event, ScopeKind};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// A search job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepRequest {
    /// Pattern — literal text unless `regexp` is set.
    pub condition: String,
    pub start_directory: String,
    /// File-name glob; `*.*` means no filtering.
    pub file_type: String,
    pub match_by_word: bool,
    pub case_sensitive: bool,
    pub regexp: bool,
    pub recursive: bool,
}

impl Default for GrepRequest {
    fn default() -> Self {
        Self {
            condition: String::new(),
            start_directory: String::new(),
            file_type: "*.*".into(),
            match_by_word: false,
            case_sensitive: false,
            regexp: false,
            recursive: true,
        }
    }
}

/// One matched line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrepResult {
    pub full_path: String,
    /// 1-based.
    pub line_number: u64,
    pub line: String,
    /// Byte offsets of each match within `line`.
    pub ranges: Vec<(usize, usize)>,
}

/// Scan progress. Transient — never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepProgress {
    /// Path currently being scanned.
    pub processing: String,
    pub current: usize,
    pub total: usize,
}

impl Event for GrepProgress {
    const NAME: &'static str = "grep_progress";
    const SCOPE: ScopeKind = ScopeKind::Window;
    type Payload = Self;
}

/// Terminal marker: the backend finished (or gave up on) the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrepEnd {}

impl Event for GrepEnd {
    const NAME: &'static str = "grep_end";
    const SCOPE: ScopeKind = ScopeKind::Window;
    type Payload = Self;
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// How a search run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The backend completed the scan; results are pre-sorted.
    Completed(Vec<GrepResult>),
    /// An abort landed while the command was in flight; whatever the
    /// backend returned is stale and was discarded.
    Aborted,
}

/// Sort contract of the boundary: path ascending (ordinal), then line
/// number ascending. Stable with respect to ties.
pub fn sort_results(results: &mut [GrepResult]) {
    results.sort_by(|a, b| {
        a.full_path
            .cmp(&b.full_path)
            .then(a.line_number.cmp(&b.line_number))
    });
}

/// Window-side driver of the search job.
pub struct SearchCoordinator {
    channel: CommandChannel,
    bus: Arc<EventBus>,
    /// Bumped by `abort()`; a run that started under an older generation
    /// discards its results.
    generation: Arc<AtomicU64>,
    /// Set by `abort()`, cleared by the next `start()`. Progress/end
    /// handlers drop deliveries while it is set — anything the backend
    /// flushes after an abort is stale, not new data.
    aborted: Arc<AtomicBool>,
}

impl SearchCoordinator {
    pub fn new(ctx: &WindowContext) -> Self {
        Self {
            channel: ctx.channel().clone(),
            bus: Arc::clone(ctx.bus()),
            generation: Arc::new(AtomicU64::new(0)),
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run one search to completion (or until aborted elsewhere).
    pub async fn start(&self, request: GrepRequest) -> Result<SearchOutcome> {
        self.aborted.store(false, Ordering::SeqCst);
        let generation = self.generation.load(Ordering::SeqCst);

        let mut results = self.channel.invoke::<RunGrep>(request).await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(stale = results.len(), "discarding results of aborted search");
            return Ok(SearchOutcome::Aborted);
        }

        sort_results(&mut results);
        Ok(SearchOutcome::Completed(results))
    }

    /// Request cancellation of the in-flight search.
    ///
    /// Advisory only: the backend stops producing output when it gets around
    /// to it, and a rejection of the abort itself is ignored.
    pub async fn abort(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.aborted.store(true, Ordering::SeqCst);
        if let Err(e) = self.channel.invoke::<AbortGrep>(()).await {
            debug!(error = %e, "abort_grep rejected; cancellation is advisory");
        }
    }

    /// Subscribe to scan progress. Deliveries flushed after an abort are
    /// dropped, not handed to `handler`.
    pub fn subscribe_progress(
        &self,
        mut handler: impl FnMut(GrepProgress) + Send + 'static,
    ) -> Subscription {
        let aborted = Arc::clone(&self.aborted);
        self.bus.subscribe::<GrepProgress>(move |progress| {
            if !aborted.load(Ordering::SeqCst) {
                handler(progress);
            }
        })
    }

    /// Subscribe to the terminal end marker, with the same staleness gate as
    /// progress.
    pub fn subscribe_end(&self, mut handler: impl FnMut() + Send + 'static) -> Subscription {
        let aborted = Arc::clone(&self.aborted);
        self.bus.subscribe::<GrepEnd>(move |_| {
            if !aborted.load(Ordering::SeqCst) {
                handler();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(path: &str, line: u64) -> GrepResult {
        GrepResult {
            full_path: path.into(),
            line_number: line,
            line: String::new(),
            ranges: vec![(0, 1)],
        }
    }

    #[test]
    fn results_sort_by_path_then_line() {
        let mut results = vec![result("b.txt", 1), result("a.txt", 5), result("a.txt", 2)];
        sort_results(&mut results);
        assert_eq!(
            results
                .iter()
                .map(|r| (r.full_path.as_str(), r.line_number))
                .collect::<Vec<_>>(),
            vec![("a.txt", 2), ("a.txt", 5), ("b.txt", 1)]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut first = result("a.txt", 1);
        first.line = "first".into();
        let mut second = result("a.txt", 1);
        second.line = "second".into();

        let mut results = vec![first, second];
        sort_results(&mut results);
        assert_eq!(results[0].line, "first");
        assert_eq!(results[1].line, "second");
    }

    #[test]
    fn default_request_scans_everything_recursively() {
        let request = GrepRequest::default();
        assert_eq!(request.file_type, "*.*");
        assert!(request.recursive);
        assert!(!request.case_sensitive);
    }
}
