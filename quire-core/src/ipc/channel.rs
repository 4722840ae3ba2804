//! One-shot request/response calls against the command registry.

use std::sync::Arc;

use crate::error::{QuireError, Result};
use crate::ipc::commands::Command;
use crate::ipc::transport::Transport;

/// The window's handle on the request/reply half of the boundary.
///
/// Stateless between calls: each `invoke` is correlated only with its own
/// reply. There is no retry and no timeout — a backend that never replies
/// suspends the caller indefinitely (a documented gap of the boundary, not
/// something this layer papers over).
#[derive(Clone)]
pub struct CommandChannel {
    transport: Arc<dyn Transport>,
}

impl CommandChannel {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Dispatch a registry command and suspend until the backend replies.
    ///
    /// # Errors
    /// - `QuireError::Payload` if the request fails to serialize or the reply
    ///   does not match the registered response shape.
    /// - `QuireError::CommandRejected` with the backend's detail.
    /// - `QuireError::ReplyDropped` if the transport discards the reply.
    pub async fn invoke<C: Command>(&self, request: C::Request) -> Result<C::Response> {
        let payload = serde_json::to_value(&request).map_err(|source| QuireError::Payload {
            command: C::NAME,
            source,
        })?;

        match self.transport.submit(C::NAME, payload).await {
            Ok(Ok(value)) => {
                serde_json::from_value(value).map_err(|source| QuireError::Payload {
                    command: C::NAME,
                    source,
                })
            }
            Ok(Err(detail)) => Err(QuireError::CommandRejected {
                command: C::NAME,
                detail,
            }),
            Err(_) => Err(QuireError::ReplyDropped(C::NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    use crate::ipc::commands::{Exists, ReadResult, ReadTextFile};
    use crate::ipc::transport::{CommandReply, EventEnvelope};

    /// Replies to every command from a canned table; records dispatches.
    struct ScriptedTransport {
        calls: Mutex<Vec<(&'static str, Value)>>,
        replies: Mutex<Vec<CommandReply>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<CommandReply>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn submit(
            &self,
            command: &'static str,
            payload: Value,
        ) -> oneshot::Receiver<CommandReply> {
            self.calls.lock().push((command, payload));
            let (tx, rx) = oneshot::channel();
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                drop(tx); // simulate a transport that discards the reply
            } else {
                let _ = tx.send(replies.remove(0));
            }
            rx
        }

        fn publish(&self, _envelope: EventEnvelope) {}
    }

    #[tokio::test]
    async fn invoke_resolves_typed_response() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(json!({
            "content": "hello",
            "encoding": "UTF-8",
        }))]));
        let channel = CommandChannel::new(transport.clone());

        let read: ReadResult = channel
            .invoke::<ReadTextFile>("/tmp/a.txt".into())
            .await
            .expect("read should resolve");
        assert_eq!(read.content, "hello");
        assert_eq!(read.encoding, "UTF-8");

        let calls = transport.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "read_text_file");
        assert_eq!(calls[0].1, json!("/tmp/a.txt"));
    }

    #[tokio::test]
    async fn rejection_carries_backend_detail() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err("permission denied".into())]));
        let channel = CommandChannel::new(transport);

        let err = channel
            .invoke::<ReadTextFile>("/etc/shadow".into())
            .await
            .expect_err("rejection should surface");
        match err {
            QuireError::CommandRejected { command, detail } => {
                assert_eq!(command, "read_text_file");
                assert_eq!(detail, "permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn mismatched_reply_shape_is_a_payload_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(json!("not-a-bool-shape"))]));
        let channel = CommandChannel::new(transport);

        let err = channel
            .invoke::<Exists>("/tmp".into())
            .await
            .expect_err("shape mismatch should fail");
        assert!(matches!(err, QuireError::Payload { command: "exists", .. }));
    }

    #[tokio::test]
    async fn dropped_reply_is_reported() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let channel = CommandChannel::new(transport);

        let err = channel
            .invoke::<Exists>("/tmp".into())
            .await
            .expect_err("dropped reply should fail");
        assert!(matches!(err, QuireError::ReplyDropped("exists")));
    }
}
