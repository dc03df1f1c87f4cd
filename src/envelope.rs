//! The JSON body written for every handled error.
//!
//! ```text
//! { "error": { "type": "NotFoundError", "code": "E_USER", "message": "...", "stack": "..." } }
//! ```
//!
//! Absent fields are left out of the output entirely, never written as
//! `null`. In sparse mode that is how `message` and `stack` disappear.

use serde::Serialize;
use serde_json::Value;

/// Outer wrapper, always keyed under `error`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// The fields describing one error.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    /// Usually a string; a bare thrown value is echoed verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorEnvelope {
    /// Body written when serialisation itself fails.
    pub(crate) const FALLBACK_JSON: &'static [u8] = br#"{"error":{"type":"Error"}}"#;

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(message: Option<Value>, stack: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                kind: "Error".to_owned(),
                code: None,
                message,
                stack: stack.map(str::to_owned),
            },
        }
    }

    #[test]
    fn absent_fields_are_omitted_not_null() {
        let json = body(None, None).to_json().expect("serialise");
        assert_eq!(json, br#"{"error":{"type":"Error"}}"#);
    }

    #[test]
    fn present_fields_are_written() {
        let envelope = body(Some(json!("boom")), Some("Error: boom"));
        let value: Value = serde_json::from_slice(&envelope.to_json().expect("serialise")).expect("parse");
        assert_eq!(value, json!({ "error": { "type": "Error", "message": "boom", "stack": "Error: boom" } }));
    }

    #[test]
    fn code_passes_through_any_json() {
        let mut envelope = body(None, None);
        envelope.error.code = Some(json!(42));
        let value: Value = serde_json::from_slice(&envelope.to_json().expect("serialise")).expect("parse");
        assert_eq!(value["error"]["code"], json!(42));
    }

    #[test]
    fn fallback_matches_sparse_shape() {
        let parsed: Value = serde_json::from_slice(ErrorEnvelope::FALLBACK_JSON).expect("parse");
        assert_eq!(parsed, json!({ "error": { "type": "Error" } }));
    }
}
