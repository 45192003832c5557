// Application state (AppState)

use crate::core::config::Config;
use crate::handlers::login::{JsonLoginResponder, LoginResponder};
use crate::security::rate_limiter::RateLimiter;
use crate::users::manager::UserManager;
use std::sync::Arc;

/// Shared application state
///
/// Everything handlers need, each piece behind an `Arc` so the state is
/// cheap to clone across tasks.
#[derive(Clone)]
pub struct AppState {
    /// User cache and persistence
    pub users: Arc<UserManager>,

    /// Per-IP login throttle
    pub login_limiter: Arc<RateLimiter>,

    /// Turns a login decision into an HTTP response
    pub login_responder: Arc<dyn LoginResponder>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, users: Arc<UserManager>) -> Self {
        let login_limiter = Arc::new(RateLimiter::new(config.auth.max_login_attempts_per_minute));

        Self {
            users,
            login_limiter,
            login_responder: Arc::new(JsonLoginResponder),
            config: Arc::new(config),
        }
    }

    /// Replace the default JSON login responder
    pub fn with_login_responder(mut self, responder: impl LoginResponder + 'static) -> Self {
        self.login_responder = Arc::new(responder);
        self
    }
}
