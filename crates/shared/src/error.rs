use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error payloads the backend produces: `{"error": ..}` from task and voice
/// routes, `{"msg": ..}` from auth routes, `{"errors": {..}}` from schema
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl ApiErrorBody {
    pub fn message(&self) -> Option<String> {
        if let Some(error) = self.error.as_deref().filter(|s| !s.trim().is_empty()) {
            return Some(error.to_string());
        }
        if let Some(msg) = self.msg.as_deref().filter(|s| !s.trim().is_empty()) {
            return Some(msg.to_string());
        }
        self.errors.as_ref().map(|errors| errors.to_string())
    }

    pub fn into_api_error(self, status: u16) -> ApiError {
        let message = self
            .message()
            .unwrap_or_else(|| format!("request failed with status {status}"));
        ApiError::new(ErrorCode::from_status(status), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_http_status_to_error_code() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_status(400), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
    }

    #[test]
    fn prefers_error_field_then_msg_then_errors() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error":"Status required","msg":"ignored"}"#).expect("json");
        assert_eq!(body.message().as_deref(), Some("Status required"));

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"msg":"Invalid credentials"}"#).expect("json");
        assert_eq!(body.message().as_deref(), Some("Invalid credentials"));

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"errors":{"title":["Missing data"]},"success":false}"#)
                .expect("json");
        assert!(body.message().expect("message").contains("Missing data"));
    }

    #[test]
    fn empty_body_falls_back_to_status_message() {
        let err = ApiErrorBody::default().into_api_error(500);
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "request failed with status 500");
    }
}
