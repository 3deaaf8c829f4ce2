use std::sync::Arc;

use cad_db::DispatchStore;
use cad_engine::DispatchEngine;
use cad_events::EventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or is itself a bundle of `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DispatchStore>,
    /// Engine components wired to `store` and `event_bus`.
    pub engine: DispatchEngine,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (dispatch clients).
    pub ws_manager: Arc<WsManager>,
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        config: ServerConfig,
        ws_manager: Arc<WsManager>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let engine = DispatchEngine::new(Arc::clone(&store), Arc::clone(&event_bus));
        Self {
            store,
            engine,
            config: Arc::new(config),
            ws_manager,
            event_bus,
        }
    }
}
