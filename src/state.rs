// Shared state handed to every handler

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;

use crate::auth::SessionKeys;
use crate::chat::StreamRegistry;
use crate::db::ChatStore;
use crate::llm::{FunctionRegistry, ProviderFactory};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub providers: Arc<dyn ProviderFactory>,
    pub tools: Arc<FunctionRegistry>,
    pub sessions: Arc<SessionKeys>,
    /// Present when resumable streams are enabled
    pub streams: Option<Arc<StreamRegistry>>,
    /// Pause between smoothed words of a reply
    pub smooth_delay: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ChatStore>,
        providers: Arc<dyn ProviderFactory>,
        sessions: SessionKeys,
    ) -> Self {
        Self {
            store,
            providers,
            tools: Arc::new(FunctionRegistry::new()),
            sessions: Arc::new(sessions),
            streams: None,
            smooth_delay: Duration::ZERO,
        }
    }

    pub fn with_tools(mut self, tools: FunctionRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn with_resumable_streams(mut self, enabled: bool) -> Self {
        self.streams = enabled.then(|| Arc::new(StreamRegistry::new()));
        self
    }

    pub fn with_smooth_delay(mut self, delay: Duration) -> Self {
        self.smooth_delay = delay;
        self
    }
}

pub fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
