//! Real-time fanout for dispatch clients.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, with one `emit_*` helper per notification.
//! - [`DispatchEvent`]: the wire shape pushed to every connected client.
//!
//! The bus is never a source of truth. Events are published after the
//! local mutation succeeded and dropped when nobody is listening.

pub mod bus;
pub mod event;

pub use bus::EventBus;
pub use event::DispatchEvent;
