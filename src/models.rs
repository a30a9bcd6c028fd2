use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::error::PipelineError;

/// Upper bound on pages requested in one parallel load
pub const MAX_PAGES: u32 = 5;

/// A user record produced by the synthetic data source.
///
/// Identity is `id`; the remaining fields are display data and carry no
/// guarantees. Records are immutable once received. `age` and `email` default
/// when absent so that sparse stream records still deserialize once the
/// identity fields pass validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub email: String,
}

/// Caller-adjustable bounds for how much data is requested
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DataSettings {
    pub pages_to_fetch: u32,
    pub stream_limit: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            pages_to_fetch: 3,
            stream_limit: 10,
        }
    }
}

impl DataSettings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.pages_to_fetch == 0 || self.pages_to_fetch > MAX_PAGES {
            return Err(PipelineError::configuration(format!(
                "pages_to_fetch must be between 1 and {}, got {}",
                MAX_PAGES, self.pages_to_fetch
            )));
        }
        if self.stream_limit == 0 {
            return Err(PipelineError::configuration(
                "stream_limit must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Why a stream record was rejected
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordRejection {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("missing or zero id field")]
    MissingId,

    #[error("missing or empty name field")]
    MissingName,
}

/// Parse one newline-delimited stream line into a validated record.
///
/// A record must carry a non-zero `id` and a non-empty `name`; anything else
/// is reported with a typed rejection reason instead of a generic error.
pub fn parse_stream_record(line: &str) -> Result<User, RecordRejection> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| RecordRejection::Malformed(e.to_string()))?;

    match value.get("id").and_then(serde_json::Value::as_u64) {
        Some(id) if id > 0 => {}
        _ => return Err(RecordRejection::MissingId),
    }
    match value.get("name").and_then(serde_json::Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => return Err(RecordRejection::MissingName),
    }

    serde_json::from_value(value).map_err(|e| RecordRejection::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_record() {
        let user = parse_stream_record(
            r#"{"id":7,"name":"Grace","age":30,"email":"grace7@example.com"}"#,
        )
        .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.name, "Grace");
        assert_eq!(user.age, 30);
    }

    #[test]
    fn test_parse_sparse_record_defaults_optional_fields() {
        let user = parse_stream_record(r#"{"id":3,"name":"Bob"}"#).unwrap();
        assert_eq!(user.age, 0);
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_parse_malformed_line() {
        let err = parse_stream_record("{bad json").unwrap_err();
        assert!(matches!(err, RecordRejection::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_missing_or_zero_id() {
        assert_eq!(
            parse_stream_record(r#"{"name":"NoId"}"#).unwrap_err(),
            RecordRejection::MissingId
        );
        assert_eq!(
            parse_stream_record(r#"{"id":0,"name":"ZeroId"}"#).unwrap_err(),
            RecordRejection::MissingId
        );
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        assert_eq!(
            parse_stream_record(r#"{"id":5,"name":""}"#).unwrap_err(),
            RecordRejection::MissingName
        );
        assert_eq!(
            parse_stream_record(r#"{"id":5}"#).unwrap_err(),
            RecordRejection::MissingName
        );
    }

    #[test]
    fn test_settings_bounds() {
        assert!(DataSettings::default().validate().is_ok());

        let too_many = DataSettings {
            pages_to_fetch: MAX_PAGES + 1,
            ..Default::default()
        };
        assert!(too_many.validate().is_err());

        let zero_limit = DataSettings {
            stream_limit: 0,
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());
    }
}
