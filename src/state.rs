use std::sync::Arc;
use crate::email::Mailer;
use crate::rate_limit::RateLimiter;
use crate::relay::CompletionClient;
use crate::store::ContentStore;
// app's shared state

pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>, // shared with the sweeper task
    pub store: Arc<dyn ContentStore>,
    pub completion: CompletionClient,
    pub mailer: Mailer,
}
