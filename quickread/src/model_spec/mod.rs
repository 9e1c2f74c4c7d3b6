//! LimitResolver: maximum input size (characters) per model and action.
//!
//! Resolution order: the built-in table in `model-spec-core`, then one metadata lookup per
//! unseen model id. Lookup failures degrade to [`DEFAULT_CHARACTER_LIMIT`] and are never
//! returned to the caller.
//!
//! # Example
//!
//! ```ignore
//! use quickread::model_spec::*;
//! use std::sync::Arc;
//!
//! let resolver = LimitResolver::new(Arc::new(GeminiMetadataClient::new()));
//! let max_chars = resolver.resolve("gemini-2.0-flash", ActionType::Translate, "key").await;
//! assert_eq!(max_chars, 8192);
//! ```

mod metadata;
mod resolver;

pub use metadata::{
    GeminiMetadataClient, HttpClient, MetadataClient, MetadataError, ReqwestHttpClient,
};
pub use model_spec_core::{
    static_limits, ActionType, CharacterLimits, TokenLimits, DEFAULT_CHARACTER_LIMIT,
};
pub use resolver::LimitResolver;
