//! Request fingerprint used as the cache key.

use std::fmt;

use serde::Serialize;

use crate::task::TaskRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyFields<'a> {
    action_type: &'a str,
    media_type: &'a str,
    task_input: &'a str,
    language_model: &'a str,
    language_code: &'a str,
}

/// Stable serialization of (action type, media type, chunk text, model alias, language).
///
/// Two keys are equal exactly when all five fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for one chunk of `request`.
    pub fn for_chunk(request: &TaskRequest, chunk: &str) -> Self {
        let fields = KeyFields {
            action_type: request.action_type.as_str(),
            media_type: request.media_type.as_str(),
            task_input: chunk,
            language_model: &request.language_model,
            language_code: &request.language_code,
        };
        // Plain string fields always serialize.
        let key = serde_json::to_string(&fields).unwrap_or_else(|_| format!("{:?}", fields));
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
