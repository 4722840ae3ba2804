//! Recursive grep engine.
//!
//! Candidate files come from a directory walk filtered by the request's
//! file-name glob (`*.*` means everything). Each file is scanned with a
//! matcher built from the request flags; per-file progress streams to the
//! requesting window, and one terminal `grep_end` follows the scan.
//!
//! Cancellation is cooperative: `abort_grep` flips a flag that is checked
//! between files, so a file already being scanned still finishes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use globset::Glob;
use grep::matcher::Matcher;
use grep::regex::RegexMatcherBuilder;
use grep::searcher::sinks::Lossy;
use grep::searcher::SearcherBuilder;
use ignore::WalkBuilder;
use tracing::debug;

use quire_core::grep::{GrepEnd, GrepProgress, GrepRequest, GrepResult};

use crate::state::AppState;

/// Matches everything; skips the glob entirely.
const MATCH_ALL: &str = "*.*";

/// Run one search for `label`, streaming progress as it goes. The scan is
/// blocking work and runs off the async executor.
pub async fn run(
    state: &AppState,
    label: &str,
    request: GrepRequest,
) -> Result<Vec<GrepResult>, String> {
    state.grep_cancel.store(false, Ordering::SeqCst);

    let router = Arc::clone(&state.router);
    let end_router = Arc::clone(&state.router);
    let cancel = Arc::clone(&state.grep_cancel);
    let label = label.to_string();
    let end_label = label.clone();

    let results = tauri::async_runtime::spawn_blocking(move || {
        scan(&cancel, &request, |progress| {
            router.emit_window::<GrepProgress>(&label, &progress);
        })
    })
    .await
    .map_err(|e| e.to_string())??;

    end_router.emit_window::<GrepEnd>(&end_label, &GrepEnd {});
    Ok(results)
}

/// Request cancellation of the running scan.
pub fn cancel(flag: &AtomicBool) {
    flag.store(true, Ordering::SeqCst);
}

/// The blocking scan. Results come back in walk order; the ordering contract
/// of the boundary is imposed window-side.
fn scan(
    cancel: &AtomicBool,
    request: &GrepRequest,
    mut on_progress: impl FnMut(GrepProgress),
) -> Result<Vec<GrepResult>, String> {
    let match_all = request.file_type == MATCH_ALL || request.file_type.is_empty();
    let glob = Glob::new(&request.file_type)
        .map_err(|e| e.to_string())?
        .compile_matcher();

    let mut walker = WalkBuilder::new(&request.start_directory);
    walker.standard_filters(false).follow_links(false);
    if !request.recursive {
        walker.max_depth(Some(1));
    }

    let files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            match_all || path.file_name().is_some_and(|name| glob.is_match(name))
        })
        .collect();

    if files.is_empty() {
        return Ok(Vec::new());
    }
    let total = files.len();

    let matcher = RegexMatcherBuilder::new()
        .case_insensitive(!request.case_sensitive)
        .word(request.match_by_word)
        .fixed_strings(!request.regexp)
        .build(&request.condition)
        .map_err(|e| e.to_string())?;
    let mut searcher = SearcherBuilder::new().build();

    let mut results: Vec<GrepResult> = Vec::new();
    for (index, file) in files.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            debug!(scanned = index, total, "grep cancelled between files");
            break;
        }

        let full_path = file.to_string_lossy().into_owned();
        on_progress(GrepProgress {
            processing: full_path.clone(),
            current: index + 1,
            total,
        });

        searcher
            .search_path(
                &matcher,
                file,
                Lossy(|line_number, line| {
                    let mut ranges = Vec::new();
                    matcher.find_iter(line.as_bytes(), |found| {
                        ranges.push((found.start(), found.end()));
                        true
                    })?;
                    if !ranges.is_empty() {
                        results.push(GrepResult {
                            full_path: full_path.clone(),
                            line_number,
                            line: line.to_string(),
                            ranges,
                        });
                    }
                    Ok(true)
                }),
            )
            .map_err(|e| e.to_string())?;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    use quire_core::grep::sort_results;

    fn request_in(dir: &std::path::Path, condition: &str, file_type: &str) -> GrepRequest {
        GrepRequest {
            condition: condition.into(),
            start_directory: dir.to_string_lossy().into_owned(),
            file_type: file_type.into(),
            ..GrepRequest::default()
        }
    }

    fn project_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.ts"), "line1\nline2\nfoo here\n").expect("a.ts");
        std::fs::write(
            dir.path().join("b.ts"),
            format!("{}foo and foo again\n", "filler\n".repeat(9)),
        )
        .expect("b.ts");
        std::fs::write(dir.path().join("c.rs"), "foo in the wrong file type\n").expect("c.rs");
        dir
    }

    #[test]
    fn scenario_two_files_sorted_by_path_then_line() {
        let dir = project_tree();
        let cancel = AtomicBool::new(false);
        let mut progress = Vec::new();

        let mut results = scan(&cancel, &request_in(dir.path(), "foo", "*.ts"), |update| {
            progress.push(update)
        })
        .expect("scan");
        sort_results(&mut results);

        let keys: Vec<(String, u64)> = results
            .iter()
            .map(|r| {
                let name = std::path::Path::new(&r.full_path)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                (name, r.line_number)
            })
            .collect();
        assert_eq!(keys, vec![("a.ts".to_string(), 3), ("b.ts".to_string(), 10)]);

        // Two matches on b.ts line 10 collapse into one result with two ranges.
        assert_eq!(results[1].ranges.len(), 2);
        // The .rs file was filtered by the glob, so only two files were scanned.
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].total, 2);
    }

    #[test]
    fn case_insensitive_by_default_sensitive_on_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("x.txt"), "FOO\nfoo\n").expect("x.txt");

        let cancel = AtomicBool::new(false);
        let relaxed = scan(&cancel, &request_in(dir.path(), "foo", "*.*"), |_| {}).expect("scan");
        assert_eq!(relaxed.len(), 2);

        let mut strict_request = request_in(dir.path(), "foo", "*.*");
        strict_request.case_sensitive = true;
        let strict = scan(&cancel, &strict_request, |_| {}).expect("scan");
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].line_number, 2);
    }

    #[test]
    fn non_recursive_scan_ignores_subdirectories() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("top.txt"), "needle\n").expect("top");
        std::fs::create_dir(dir.path().join("sub")).expect("subdir");
        std::fs::write(dir.path().join("sub/deep.txt"), "needle\n").expect("deep");

        let cancel = AtomicBool::new(false);
        let mut flat_request = request_in(dir.path(), "needle", "*.*");
        flat_request.recursive = false;
        let flat = scan(&cancel, &flat_request, |_| {}).expect("scan");
        assert_eq!(flat.len(), 1);

        let deep = scan(&cancel, &request_in(dir.path(), "needle", "*.*"), |_| {}).expect("scan");
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn literal_mode_does_not_interpret_regex_metacharacters() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("x.txt"), "a.c\nabc\n").expect("x.txt");

        let cancel = AtomicBool::new(false);
        let literal = scan(&cancel, &request_in(dir.path(), "a.c", "*.*"), |_| {}).expect("scan");
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].line_number, 1);

        let mut regex_request = request_in(dir.path(), "a.c", "*.*");
        regex_request.regexp = true;
        let regex = scan(&cancel, &regex_request, |_| {}).expect("scan");
        assert_eq!(regex.len(), 2);
    }

    #[test]
    fn pre_set_cancel_flag_stops_before_any_file() {
        let dir = project_tree();
        let cancel = AtomicBool::new(true);
        let mut progress = Vec::new();

        let results = scan(&cancel, &request_in(dir.path(), "foo", "*.*"), |update| {
            progress.push(update)
        })
        .expect("scan");

        assert!(results.is_empty());
        assert!(progress.is_empty());
    }

    #[test]
    fn word_match_requires_boundaries() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("x.txt"), "foobar\nfoo bar\n").expect("x.txt");

        let cancel = AtomicBool::new(false);
        let mut word_request = request_in(dir.path(), "foo", "*.*");
        word_request.match_by_word = true;
        let results = scan(&cancel, &word_request, |_| {}).expect("scan");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].line_number, 2);
    }
}
