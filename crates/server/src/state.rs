//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use tts_playground_client::TtsBackend;
use tts_playground_config::Settings;
use tts_playground_store::{Dispatcher, PlaygroundStore};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Playground session
    pub store: Arc<PlaygroundStore>,
    /// Dispatcher bound to `store`
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Create new application state talking to `backend`
    pub fn new(config: Settings, backend: Arc<dyn TtsBackend>) -> Self {
        let store = Arc::new(PlaygroundStore::new(
            config.playground.default_text.clone(),
            config.playground.event_capacity,
        ));
        let dispatcher = Dispatcher::new(store.clone(), backend);

        Self {
            config: Arc::new(config),
            store,
            dispatcher: Arc::new(dispatcher),
        }
    }
}
