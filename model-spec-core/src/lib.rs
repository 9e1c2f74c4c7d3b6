//! Shared model limit types and parsers.
//!
//! - [`ActionType`]: what the caller asks the model to do (summarize, translate, custom).
//! - [`TokenLimits`]: input/output token limits reported by the model metadata endpoint.
//! - [`CharacterLimits`]: per-action character budgets used to size input chunks.
//! - [`static_limits`]: built-in table for well-known model ids.
//! - [`parse_model_metadata`]: parser for the metadata endpoint body.
//!
//! Pure types and parsing only; fetching lives in the `quickread` crate.

mod action;
mod limits;
mod metadata;
mod table;

pub use action::{ActionType, ParseActionError};
pub use limits::{CharacterLimits, TokenLimits, DEFAULT_CHARACTER_LIMIT};
pub use metadata::{parse_model_metadata, MetadataParseError};
pub use table::{static_limits, STATIC_MODEL_IDS};
