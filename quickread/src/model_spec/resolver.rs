//! LimitResolver: static table, then memoized metadata lookup, then default.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use model_spec_core::{static_limits, ActionType, CharacterLimits};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::metadata::{MetadataClient, MetadataError};

type Slot = Arc<OnceCell<CharacterLimits>>;

/// Resolves the character budget for a model and action.
///
/// Successful lookups are kept for the resolver's lifetime, one per model id; concurrent
/// first calls for the same model share one lookup. Failures are not kept, so the next
/// call for that model looks it up again.
pub struct LimitResolver {
    client: Arc<dyn MetadataClient>,
    fetched: Mutex<HashMap<String, Slot>>,
}

impl LimitResolver {
    pub fn new(client: Arc<dyn MetadataClient>) -> Self {
        Self {
            client,
            fetched: Mutex::new(HashMap::new()),
        }
    }

    /// Maximum input characters for `action` on `model_id`. Never fails.
    pub async fn resolve(&self, model_id: &str, action: ActionType, api_key: &str) -> usize {
        self.limits_for(model_id, api_key).await.for_action(action)
    }

    /// All per-action budgets for `model_id`; the default budgets when the lookup fails.
    pub async fn limits_for(&self, model_id: &str, api_key: &str) -> CharacterLimits {
        if let Some(limits) = static_limits(model_id) {
            return limits;
        }
        let slot = self.slot(model_id);
        let fetched = slot
            .get_or_try_init(|| self.fetch(model_id, api_key))
            .await
            .copied();
        match fetched {
            Ok(limits) => limits,
            Err(e) => {
                warn!(model_id, error = %e, "model metadata lookup failed; using default limit");
                CharacterLimits::default()
            }
        }
    }

    /// Budgets already fetched for `model_id` (table entries are not listed).
    #[cfg(test)]
    fn memoized(&self, model_id: &str) -> Option<CharacterLimits> {
        let fetched = self.fetched.lock().ok()?;
        fetched.get(model_id).and_then(|slot| slot.get().copied())
    }

    fn slot(&self, model_id: &str) -> Slot {
        match self.fetched.lock() {
            Ok(mut fetched) => fetched
                .entry(model_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone(),
            // Poisoned map: look up without memoizing.
            Err(_) => Arc::new(OnceCell::new()),
        }
    }

    async fn fetch(&self, model_id: &str, api_key: &str) -> Result<CharacterLimits, MetadataError> {
        let tokens = self.client.get_model_metadata(api_key, model_id).await?;
        let limits = tokens.to_character_limits();
        if limits.has_zero() {
            return Err(MetadataError::ZeroLimit(model_id.to_string()));
        }
        debug!(model_id, ?limits, "model limits fetched");
        Ok(limits)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use model_spec_core::{TokenLimits, DEFAULT_CHARACTER_LIMIT};

    use super::*;

    struct CountingMockClient {
        limits: Option<TokenLimits>,
        call_count: AtomicUsize,
    }

    impl CountingMockClient {
        fn new(limits: Option<TokenLimits>) -> Arc<Self> {
            Arc::new(Self {
                limits,
                call_count: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MetadataClient for CountingMockClient {
        async fn get_model_metadata(
            &self,
            _api_key: &str,
            _model_id: &str,
        ) -> Result<TokenLimits, MetadataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.limits
                .ok_or_else(|| MetadataError::Transport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn table_models_skip_lookup() {
        let client = CountingMockClient::new(None);
        let resolver = LimitResolver::new(client.clone());
        assert_eq!(
            resolver
                .resolve("gemini-2.0-flash", ActionType::Summarize, "k")
                .await,
            786_432
        );
        assert_eq!(
            resolver
                .resolve("gemini-2.0-flash", ActionType::Translate, "k")
                .await,
            8192
        );
        assert_eq!(client.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_model_derives_limits_once() {
        let client = CountingMockClient::new(Some(TokenLimits::new(1_048_576, 65_536)));
        let resolver = LimitResolver::new(client.clone());
        assert_eq!(
            resolver
                .resolve("gemini-2.5-flash", ActionType::Summarize, "k")
                .await,
            786_432
        );
        assert_eq!(
            resolver
                .resolve("gemini-2.5-flash", ActionType::Translate, "k")
                .await,
            65_536
        );
        assert_eq!(
            resolver
                .resolve("gemini-2.5-flash", ActionType::TextCustom, "k")
                .await,
            786_432
        );
        assert_eq!(client.call_count.load(Ordering::SeqCst), 1);
        assert!(resolver.memoized("gemini-2.5-flash").is_some());
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_lookup() {
        let client = CountingMockClient::new(Some(TokenLimits::new(4000, 1000)));
        let resolver = LimitResolver::new(client.clone());
        let (a, b) = tokio::join!(
            resolver.resolve("gemini-x", ActionType::Summarize, "k"),
            resolver.resolve("gemini-x", ActionType::Translate, "k"),
        );
        assert_eq!((a, b), (3000, 1000));
        assert_eq!(client.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_falls_back_and_is_retried() {
        let client = CountingMockClient::new(None);
        let resolver = LimitResolver::new(client.clone());
        for action in [ActionType::Summarize, ActionType::Translate] {
            assert_eq!(
                resolver.resolve("gemini-missing", action, "k").await,
                DEFAULT_CHARACTER_LIMIT
            );
        }
        assert_eq!(client.call_count.load(Ordering::SeqCst), 2);
        assert!(resolver.memoized("gemini-missing").is_none());
    }

    #[tokio::test]
    async fn zero_derived_limit_falls_back() {
        let client = CountingMockClient::new(Some(TokenLimits::new(1, 500)));
        let resolver = LimitResolver::new(client.clone());
        assert_eq!(
            resolver.resolve("gemini-tiny", ActionType::Translate, "k").await,
            DEFAULT_CHARACTER_LIMIT
        );
    }
}
