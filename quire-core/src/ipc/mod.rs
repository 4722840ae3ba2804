//! The command/event boundary between a window and the privileged backend.
//!
//! Two primitives, architecturally distinct:
//!
//! - [`channel::CommandChannel`] — correlated request/reply against the
//!   [`commands`] registry.
//! - [`bus::EventBus`] — topic + scope publish/subscribe against the
//!   [`events`] registry.
//!
//! Both ride on one injected [`transport::Transport`].

pub mod bus;
pub mod channel;
pub mod commands;
pub mod events;
pub mod transport;
