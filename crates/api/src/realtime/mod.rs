//! Bridges the engine's event bus to connected dispatch clients.

mod relay;

pub use relay::EventRelay;
