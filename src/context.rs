use std::sync::Arc;

use crate::cache::KeyValueCache;
use crate::client::AssistantApi;

/// Handles every operation needs, passed explicitly instead of living in
/// process-wide statics.
#[derive(Clone)]
pub struct AppContext {
    pub cache: Arc<dyn KeyValueCache>,
    pub api: Arc<dyn AssistantApi>,
}

impl AppContext {
    pub fn new(cache: Arc<dyn KeyValueCache>, api: Arc<dyn AssistantApi>) -> Self {
        Self { cache, api }
    }
}
