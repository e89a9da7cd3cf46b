//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Every collaborator sits behind a trait object so the form flow can run
//! against in-memory doubles in tests. The LLM and media store are optional:
//! the service starts without them and rejects the operations that need them.

use std::sync::Arc;

use crate::llm::LlmChat;
use crate::media::MediaStore;
use crate::rate_limit::RateLimiter;
use crate::services::content::ContentStore;
use crate::services::feed::ContentFeed;
use crate::services::sanitize::SanitizeConfig;
use crate::validation::FormLimits;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    /// Optional media store. `None` if `MEDIA_PROVIDER` is unset.
    pub media: Option<Arc<dyn MediaStore>>,
    pub feed: ContentFeed,
    /// In-memory rate limiter for sanitization requests.
    pub rate_limiter: RateLimiter,
    pub sanitize: SanitizeConfig,
    pub limits: FormLimits,
}

impl AppState {
    /// Build state with every tunable read from the environment.
    #[must_use]
    pub fn new(
        store: Arc<dyn ContentStore>,
        llm: Option<Arc<dyn LlmChat>>,
        media: Option<Arc<dyn MediaStore>>,
    ) -> Self {
        Self {
            store,
            llm,
            media,
            feed: ContentFeed::from_env(),
            rate_limiter: RateLimiter::new(),
            sanitize: SanitizeConfig::from_env(),
            limits: FormLimits::from_env(),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
