//! WebSocket infrastructure for dispatch clients.
//!
//! Connection management, heartbeat pings, and the HTTP upgrade handler.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
