//! Parser for the model metadata endpoint (`GET /v1beta/models/{id}`).

use serde_json::Value;

use crate::limits::TokenLimits;

/// Why a metadata body could not be turned into [`TokenLimits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataParseError {
    InvalidJson(String),
    MissingField(&'static str),
}

impl std::fmt::Display for MetadataParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataParseError::InvalidJson(e) => write!(f, "invalid metadata json: {}", e),
            MetadataParseError::MissingField(name) => {
                write!(f, "metadata missing field: {}", name)
            }
        }
    }
}

impl std::error::Error for MetadataParseError {}

fn positive_u64(json: &Value, field: &'static str) -> Result<u64, MetadataParseError> {
    json.get(field)
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .ok_or(MetadataParseError::MissingField(field))
}

/// Parses `inputTokenLimit` and `outputTokenLimit` from a model metadata body.
///
/// Both must be positive integers; other fields are ignored.
pub fn parse_model_metadata(body: &str) -> Result<TokenLimits, MetadataParseError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| MetadataParseError::InvalidJson(e.to_string()))?;
    let input = positive_u64(&json, "inputTokenLimit")?;
    let output = positive_u64(&json, "outputTokenLimit")?;
    Ok(TokenLimits::new(input, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_limits() {
        let body = r#"{
            "name": "models/gemini-2.5-flash",
            "inputTokenLimit": 1048576,
            "outputTokenLimit": 65536,
            "supportedGenerationMethods": ["generateContent"]
        }"#;
        let limits = parse_model_metadata(body).unwrap();
        assert_eq!(limits.input_token_limit, 1_048_576);
        assert_eq!(limits.output_token_limit, 65_536);
    }

    #[test]
    fn missing_output_limit_is_an_error() {
        let err = parse_model_metadata(r#"{"inputTokenLimit": 100}"#).unwrap_err();
        assert_eq!(err, MetadataParseError::MissingField("outputTokenLimit"));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err =
            parse_model_metadata(r#"{"inputTokenLimit": 0, "outputTokenLimit": 10}"#).unwrap_err();
        assert_eq!(err, MetadataParseError::MissingField("inputTokenLimit"));
    }

    #[test]
    fn garbage_body_is_invalid_json() {
        assert!(matches!(
            parse_model_metadata("<html>"),
            Err(MetadataParseError::InvalidJson(_))
        ));
    }
}
