//! Per-window context.
//!
//! One `WindowContext` is constructed per window and handed to every
//! component that talks to the backend. There is no process-wide singleton
//! state anywhere in this crate: tests construct a context around a scripted
//! transport and get the whole coordination stack against a fake backend.

use std::sync::Arc;

use crate::ipc::bus::EventBus;
use crate::ipc::channel::CommandChannel;
use crate::ipc::transport::Transport;

/// Everything a window's components need, passed as one struct.
pub struct WindowContext {
    label: String,
    channel: CommandChannel,
    bus: Arc<EventBus>,
}

impl WindowContext {
    pub fn new(label: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let label = label.into();
        let channel = CommandChannel::new(Arc::clone(&transport));
        let bus = Arc::new(EventBus::new(label.clone(), transport));
        Self {
            label,
            channel,
            bus,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }
}
