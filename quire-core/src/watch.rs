//! External-change watching for one filesystem target.
//!
//! Each `ChangeWatcher` instance tracks exactly one target; switching
//! targets releases the previous backend registration before the new one is
//! issued, so the single-target invariant holds without the caller having to
//! unwatch first. A window may own more than one instance — typically one
//! for its open document and one for the settings marker file.
//!
//! When a [`WatchEvent`] arrives for the current target, policy is to let
//! the caller diff the fresh content against its buffer and prompt the user;
//! the decision comes back as a [`WatchConfirmEvent`] published loopback.
//! "Do not notify" persists as a suppression flag so repeated external
//! touches stop re-prompting until explicitly re-enabled.

use std::sync::Arc;

use tracing::debug;

use crate::context::WindowContext;
use crate::error::Result;
use crate::ipc::bus::EventBus;
use crate::ipc::channel::CommandChannel;
use crate::ipc::commands::{Unwatch, Watch};
use crate::ipc::events::{EventScope, WatchConfirmEvent, WatchEvent};

pub struct ChangeWatcher {
    channel: CommandChannel,
    bus: Arc<EventBus>,
    target: Option<String>,
    suppressed: bool,
}

impl ChangeWatcher {
    pub fn new(ctx: &WindowContext) -> Self {
        Self {
            channel: ctx.channel().clone(),
            bus: Arc::clone(ctx.bus()),
            target: None,
            suppressed: false,
        }
    }

    /// The path currently being watched, if any.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Watch `target`, releasing any previous registration first. The
    /// `unwatch` for the old target is issued and answered strictly before
    /// the `watch` for the new one.
    pub async fn start_watch(&mut self, target: impl Into<String>) -> Result<()> {
        self.abort_watch().await?;
        let target = target.into();
        self.channel.invoke::<Watch>(target.clone()).await?;
        self.target = Some(target);
        Ok(())
    }

    /// Stop watching the current target, if any.
    pub async fn abort_watch(&mut self) -> Result<()> {
        if let Some(previous) = self.target.take() {
            self.channel.invoke::<Unwatch>(previous).await?;
        }
        Ok(())
    }

    /// Whether a delivered event should be surfaced to the user: it must be
    /// for the current target and notifications must not be suppressed.
    pub fn should_surface(&self, event: &WatchEvent) -> bool {
        !self.suppressed && self.target.as_deref() == Some(event.file_path.as_str())
    }

    /// Record the user's conflict decision: publish it loopback for the rest
    /// of the window to react to, and persist the suppression choice.
    pub fn resolve_conflict(&mut self, decision: WatchConfirmEvent) {
        if decision.do_not_notify {
            self.suppressed = true;
        }
        self.bus
            .publish::<WatchConfirmEvent>(EventScope::Current, &decision);
    }

    /// Re-enable prompting after a previous "do not notify".
    pub fn resume_notifications(&mut self) {
        self.suppressed = false;
    }

    /// Window teardown: release the backend registration and every event
    /// subscription this window holds. The unwatch is best-effort — a
    /// rejection during teardown is logged and swallowed.
    pub async fn unlisten_all(&mut self) {
        if let Err(e) = self.abort_watch().await {
            debug!(error = %e, "unwatch during teardown failed");
        }
        self.bus.release_all();
    }
}
