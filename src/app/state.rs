//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{GameEngine, GameHandle};
use crate::ws::registry::ConnectionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub game: GameHandle,
    pub connections: Arc<ConnectionRegistry>,
}

impl AppState {
    /// Build the shared state together with the engine it talks to.
    /// The caller is responsible for spawning the returned engine task.
    pub fn new(config: Config) -> (Self, GameEngine) {
        let config = Arc::new(config);

        let (engine, game) = GameEngine::new(rand::random::<u64>());
        let connections = Arc::new(ConnectionRegistry::new());

        (
            Self {
                config,
                game,
                connections,
            },
            engine,
        )
    }
}
