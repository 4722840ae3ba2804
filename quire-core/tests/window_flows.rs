//! Cross-component scenarios over a scripted in-memory backend shared by
//! two window contexts: marker-file settings sync, single-target watch
//! ordering, and search coordination including cooperative abort.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Notify};

use quire_core::grep::{GrepProgress, GrepRequest, GrepResult, SearchOutcome};
use quire_core::ipc::bus;
use quire_core::ipc::commands::WriteFileInfo;
use quire_core::settings::{SettingsStore, Theme};
use quire_core::{
    ChangeWatcher, CommandReply, EventEnvelope, EventTarget, SearchCoordinator, Transport,
    WatchEvent, WindowContext,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// The scripted backend: an in-memory filesystem, a watch registry that
/// emits `watch_event` on every write to a watched path, and a grep stub
/// that streams progress before replying.
#[derive(Default)]
struct FakeBackend {
    files: Mutex<HashMap<String, String>>,
    watch_calls: Mutex<Vec<(String, String)>>,
    watched: Mutex<HashMap<String, HashSet<String>>>,
    windows: Mutex<HashMap<String, mpsc::UnboundedSender<EventEnvelope>>>,
    grep_results: Mutex<Vec<GrepResult>>,
    /// When set, `run_grep` holds its reply until `grep_gate` is notified.
    defer_grep: AtomicBool,
    grep_gate: Notify,
    grep_cancelled: AtomicBool,
}

impl FakeBackend {
    fn register_window(self: &Arc<Self>, label: &str) -> mpsc::UnboundedReceiver<EventEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.windows.lock().insert(label.to_string(), tx);
        rx
    }

    fn route(&self, envelope: EventEnvelope) {
        match &envelope.target {
            EventTarget::Window(label) => {
                if let Some(tx) = self.windows.lock().get(label) {
                    let _ = tx.send(envelope);
                }
            }
            EventTarget::Broadcast => {
                for tx in self.windows.lock().values() {
                    let _ = tx.send(envelope.clone());
                }
            }
        }
    }

    fn emit_to(&self, label: &str, name: &'static str, payload: Value) {
        self.route(EventEnvelope {
            name,
            target: EventTarget::Window(label.to_string()),
            payload,
        });
    }

    fn notify_watchers(&self, path: &str, content: &str) {
        let labels: Vec<String> = self
            .watched
            .lock()
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        for label in labels {
            self.emit_to(
                &label,
                "watch_event",
                serde_json::to_value(WatchEvent {
                    file_path: path.to_string(),
                    content: content.to_string(),
                    encoding: "UTF-8".into(),
                })
                .unwrap(),
            );
        }
    }
}

/// One window's handle on the shared backend.
struct WindowPort {
    backend: Arc<FakeBackend>,
    label: String,
}

impl Transport for WindowPort {
    fn submit(&self, command: &'static str, payload: Value) -> oneshot::Receiver<CommandReply> {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::clone(&self.backend);
        let label = self.label.clone();

        let reply: CommandReply = match command {
            "exists" => {
                let path: String = serde_json::from_value(payload).unwrap();
                Ok(json!(backend.files.lock().contains_key(&path)))
            }
            "mkdir_all" => Ok(json!(null)),
            "read_text_file" => {
                let path: String = serde_json::from_value(payload).unwrap();
                match backend.files.lock().get(&path) {
                    Some(content) => Ok(json!({ "content": content, "encoding": "UTF-8" })),
                    None => Err(format!("no such file: {path}")),
                }
            }
            "write_text_file" => {
                let info: WriteFileInfo = serde_json::from_value(payload).unwrap();
                backend
                    .files
                    .lock()
                    .insert(info.full_path.clone(), info.data.clone());
                backend.notify_watchers(&info.full_path, &info.data);
                Ok(json!(null))
            }
            "watch" => {
                let path: String = serde_json::from_value(payload).unwrap();
                backend
                    .watch_calls
                    .lock()
                    .push(("watch".into(), path.clone()));
                backend
                    .watched
                    .lock()
                    .entry(path)
                    .or_default()
                    .insert(label);
                Ok(json!(null))
            }
            "unwatch" => {
                let path: String = serde_json::from_value(payload).unwrap();
                backend
                    .watch_calls
                    .lock()
                    .push(("unwatch".into(), path.clone()));
                if let Some(set) = backend.watched.lock().get_mut(&path) {
                    set.remove(&label);
                }
                Ok(json!(null))
            }
            "run_grep" => {
                let total = 2usize;
                backend.emit_to(
                    &label,
                    "grep_progress",
                    json!({ "processing": "/proj/a.ts", "current": 1, "total": total }),
                );
                if backend.defer_grep.load(Ordering::SeqCst) {
                    // Reply later: wait for the gate, flush one more progress
                    // event (stale by then if an abort landed), then answer.
                    tokio::spawn(async move {
                        backend.grep_gate.notified().await;
                        backend.emit_to(
                            &label,
                            "grep_progress",
                            json!({ "processing": "/proj/b.ts", "current": 2, "total": total }),
                        );
                        let results = backend.grep_results.lock().clone();
                        backend.emit_to(&label, "grep_end", json!({}));
                        let _ = tx.send(Ok(serde_json::to_value(results).unwrap()));
                    });
                    return rx;
                }
                let results = backend.grep_results.lock().clone();
                backend.emit_to(&label, "grep_end", json!({}));
                Ok(serde_json::to_value(results).unwrap())
            }
            "abort_grep" => {
                backend.grep_cancelled.store(true, Ordering::SeqCst);
                backend.grep_gate.notify_one();
                Ok(json!(null))
            }
            other => Err(format!("unexpected command '{other}'")),
        };

        let _ = tx.send(reply);
        rx
    }

    fn publish(&self, envelope: EventEnvelope) {
        self.backend.route(envelope);
    }
}

fn window(backend: &Arc<FakeBackend>, label: &str) -> WindowContext {
    let feed = backend.register_window(label);
    let ctx = WindowContext::new(
        label,
        Arc::new(WindowPort {
            backend: Arc::clone(backend),
            label: label.to_string(),
        }) as Arc<dyn Transport>,
    );
    tokio::spawn(bus::pump(Arc::clone(ctx.bus()), feed));
    ctx
}

async fn recv_with_timeout<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed unexpectedly")
}

#[tokio::test(flavor = "multi_thread")]
async fn marker_write_reaches_the_peer_window_and_reload_converges() {
    let backend = Arc::new(FakeBackend::default());
    let window_a = window(&backend, "alpha");
    let window_b = window(&backend, "beta");

    let mut store_a = SettingsStore::init(window_a.channel().clone(), "/data")
        .await
        .expect("init A");
    let mut store_b = SettingsStore::init(window_b.channel().clone(), "/data")
        .await
        .expect("init B");

    // B watches the shared marker file through its own watcher instance.
    let mut marker_watcher = ChangeWatcher::new(&window_b);
    marker_watcher
        .start_watch(store_b.marker_path())
        .await
        .expect("watch marker");

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let _sub = window_b.bus().subscribe::<WatchEvent>(move |event| {
        let _ = seen_tx.send(event);
    });

    // A persists a change and signals it.
    store_a.data_mut().theme = Theme::Light;
    store_a.record_history("/proj/notes.md");
    store_a.save().await.expect("save A");
    store_a.emit().await.expect("emit A");

    let event = recv_with_timeout(&mut seen_rx).await;
    assert_eq!(event.file_path, store_b.marker_path());
    assert!(marker_watcher.should_surface(&event));

    store_b.reload().await.expect("reload B");
    assert_eq!(store_b.data(), store_a.data());
    assert_eq!(store_b.data().theme, Theme::Light);
}

#[tokio::test(flavor = "multi_thread")]
async fn switching_watch_targets_keeps_exactly_one_registration() {
    let backend = Arc::new(FakeBackend::default());
    let ctx = window(&backend, "main");
    let mut watcher = ChangeWatcher::new(&ctx);

    watcher.start_watch("a").await.expect("watch a");
    watcher.start_watch("b").await.expect("watch b");

    let calls = backend.watch_calls.lock().clone();
    assert_eq!(
        calls,
        vec![
            ("watch".to_string(), "a".to_string()),
            ("unwatch".to_string(), "a".to_string()),
            ("watch".to_string(), "b".to_string()),
        ]
    );

    let watched = backend.watched.lock();
    assert!(watched.get("a").map_or(true, |set| set.is_empty()));
    assert_eq!(watched.get("b").map(|set| set.len()), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn completed_search_returns_sorted_results_and_streams_progress() {
    let backend = Arc::new(FakeBackend::default());
    *backend.grep_results.lock() = vec![
        GrepResult {
            full_path: "/proj/b.ts".into(),
            line_number: 10,
            line: "foo foo".into(),
            ranges: vec![(0, 3), (4, 7)],
        },
        GrepResult {
            full_path: "/proj/a.ts".into(),
            line_number: 3,
            line: "foo".into(),
            ranges: vec![(0, 3)],
        },
    ];

    let ctx = window(&backend, "main");
    let coordinator = SearchCoordinator::new(&ctx);

    let progress: Arc<Mutex<Vec<GrepProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let progress_clone = Arc::clone(&progress);
    let _progress_sub = coordinator.subscribe_progress(move |update| {
        progress_clone.lock().push(update);
    });

    let request = GrepRequest {
        condition: "foo".into(),
        start_directory: "/proj".into(),
        file_type: "*.ts".into(),
        ..GrepRequest::default()
    };
    let outcome = coordinator.start(request).await.expect("search");

    match outcome {
        SearchOutcome::Completed(results) => {
            let keys: Vec<_> = results
                .iter()
                .map(|r| (r.full_path.as_str(), r.line_number))
                .collect();
            assert_eq!(keys, vec![("/proj/a.ts", 3), ("/proj/b.ts", 10)]);
            assert_eq!(results[1].ranges.len(), 2);
        }
        SearchOutcome::Aborted => panic!("search should have completed"),
    }

    // The progress event rides the event half of the transport and may land
    // after the command reply; it must still be delivered.
    tokio::time::timeout(RECV_TIMEOUT, async {
        while progress.lock().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("progress event never arrived");
    assert_eq!(progress.lock()[0].processing, "/proj/a.ts");
}

#[tokio::test(flavor = "multi_thread")]
async fn aborted_search_discards_late_results_and_stale_progress() {
    let backend = Arc::new(FakeBackend::default());
    backend.defer_grep.store(true, Ordering::SeqCst);
    *backend.grep_results.lock() = vec![GrepResult {
        full_path: "/proj/late.ts".into(),
        line_number: 1,
        line: "stale".into(),
        ranges: vec![(0, 5)],
    }];

    let ctx = window(&backend, "main");
    let coordinator = Arc::new(SearchCoordinator::new(&ctx));

    let progress: Arc<Mutex<Vec<GrepProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let progress_clone = Arc::clone(&progress);
    let _progress_sub = coordinator.subscribe_progress(move |update| {
        progress_clone.lock().push(update);
    });

    let runner = Arc::clone(&coordinator);
    let run = tokio::spawn(async move {
        runner
            .start(GrepRequest {
                condition: "stale".into(),
                start_directory: "/proj".into(),
                ..GrepRequest::default()
            })
            .await
    });

    // Wait for the first progress event so the run is known to be in flight.
    tokio::time::timeout(RECV_TIMEOUT, async {
        while progress.lock().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first progress event never arrived");

    // Abort releases the backend gate; the backend then flushes one more
    // progress event and its (now stale) partial result set.
    coordinator.abort().await;
    assert!(backend.grep_cancelled.load(Ordering::SeqCst));

    let outcome = run.await.expect("join").expect("start");
    assert_eq!(outcome, SearchOutcome::Aborted);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        progress.lock().len(),
        1,
        "progress flushed after the abort must be discarded"
    );
}
