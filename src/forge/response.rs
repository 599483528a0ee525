use serde_json::Value;
use std::fmt;

pub const BACKEND_NAME: &str = "Forge";

/// A non-2xx answer from Forge, reduced to status and detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: u16,
    pub detail: String,
}

impl ErrorReport {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Uses the JSON `detail` field when there is one, the raw body otherwise.
    pub fn from_body(status: u16, body: &str) -> Self {
        let detail = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(obj)) => match obj.get("detail") {
                Some(Value::String(detail)) => detail.clone(),
                Some(Value::Null) | None => body.to_string(),
                Some(other) => other.to_string(),
            },
            _ => body.to_string(),
        };
        Self::new(status, detail)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error {}: {}", BACKEND_NAME, self.status, self.detail)
    }
}

/// Consumes a failed response. Never fails: an unreadable body just leaves
/// the detail empty.
pub async fn error_report(response: reqwest::Response) -> ErrorReport {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ErrorReport::from_body(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_detail() {
        let report = ErrorReport::from_body(404, r#"{"detail":"model not found"}"#);
        assert_eq!(report.to_string(), "Forge error 404: model not found");
    }

    #[test]
    fn test_plain_body() {
        let report = ErrorReport::from_body(500, "internal error");
        assert_eq!(report.to_string(), "Forge error 500: internal error");
    }

    #[test]
    fn test_json_without_detail_falls_back_to_body() {
        let body = r#"{"error":"boom"}"#;
        assert_eq!(
            ErrorReport::from_body(502, body).to_string(),
            format!("Forge error 502: {}", body)
        );
    }

    #[test]
    fn test_structured_detail_is_rendered_as_json() {
        let body = r#"{"detail":[{"loc":["body","prompt"],"msg":"field required"}]}"#;
        let report = ErrorReport::from_body(422, body);
        assert_eq!(report.status, 422);
        assert!(report.detail.starts_with('['));
        assert!(report.detail.contains("field required"));
    }

    #[test]
    fn test_non_object_json_uses_raw_body() {
        assert_eq!(ErrorReport::from_body(503, "\"busy\"").detail, "\"busy\"");
        assert_eq!(ErrorReport::from_body(400, "").to_string(), "Forge error 400: ");
    }
}
