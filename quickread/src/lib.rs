//! # QuickRead
//!
//! Summarize and translate page content through a generative-language backend, reliably
//! and cheaply under the backend's per-model input limit.
//!
//! ## Design principles
//!
//! - **Deterministic segmentation**: [`segment()`] is a pure function of `(text, max_chars)`,
//!   so the same input always produces the same chunks and the same cache keys.
//! - **Exactly-once generation per fingerprint**: a chunk already answered under the same
//!   action, media, model and language is replayed from the [`ResponseCache`].
//! - **Fail fast**: the first chunk that errors or is blocked ends the task; later chunks are
//!   never sent and failed results are never cached.
//! - **Explicit session**: the cache and result history live in a [`Session`] passed to the
//!   runner, not in globals.
//!
//! ## Main modules
//!
//! - [`model_spec`]: [`LimitResolver`] (static table, metadata lookup, default).
//! - [`segment`](mod@segment): [`segment()`], [`BOUNDARY_MARKERS`].
//! - [`cache`]: [`CacheKey`], [`ResponseCache`].
//! - [`dispatch`]: [`Dispatcher`], [`DispatchEvent`], [`TaskOutcome`], [`TaskReport`].
//! - [`llm`]: [`GenerationBackend`] trait, [`GeminiClient`], [`MockBackend`].
//! - [`prompts`]: [`PromptTemplates`], [`PromptContext`].
//! - [`settings`], [`session`], [`task`].
//! - [`runner`]: [`QuickRead`], the whole task flow in one call.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quickread::{ActionType, MediaType, MockBackend, GeminiMetadataClient, QuickRead,
//!     Settings, TaskOptions, TaskRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let qr = QuickRead::new(
//!     Settings::default(),
//!     Arc::new(MockBackend::with_text("1. A short summary.")),
//!     Arc::new(GeminiMetadataClient::new()),
//! );
//! let request = TaskRequest::new(ActionType::Summarize, MediaType::Text, "2.0-flash", "en", "Some long article...");
//! let report = qr
//!     .run_task_to_end(request, TaskOptions::default(), CancellationToken::new())
//!     .await;
//! println!("{}", report.content());
//! # }
//! ```

pub mod cache;
pub mod dispatch;
pub mod llm;
pub mod model_spec;
pub mod prompts;
pub mod runner;
pub mod segment;
pub mod session;
pub mod settings;
pub mod task;

pub use cache::{CacheKey, ResponseCache, RESPONSE_CACHE_CAPACITY};
pub use dispatch::{
    classify, ChunkVerdict, DispatchEvent, DispatchJob, Dispatcher, TaskOutcome, TaskReport,
};
pub use llm::{
    ApiError, BackendError, Content, GeminiClient, GenerateResponse, GenerationBackend,
    GenerationResult, MockBackend, Part, PartialText,
};
pub use model_spec::{
    ActionType, CharacterLimits, GeminiMetadataClient, LimitResolver, MetadataClient,
    MetadataError, DEFAULT_CHARACTER_LIMIT,
};
pub use prompts::{PromptContext, PromptError, PromptTemplates};
pub use runner::{InitError, QuickRead};
pub use segment::{segment, BOUNDARY_MARKERS};
pub use session::{ResultHistory, ResultRecord, Session, RESULT_HISTORY_SIZE};
pub use settings::{Settings, SettingsError};
pub use task::{resolve_model_id, MediaType, TaskOptions, TaskRequest};

/// Installs a test-writer subscriber (filter from `RUST_LOG`, default `warn`) so
/// unit tests in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
