use serde::Deserialize;

use super::kinds::{AuthError, PorterError, QueryError, ServiceError};

/// Structured error information extracted from a search service response.
///
/// The service wraps errors as `{"error": {"code", "message", "details"}}`.
/// Bodies that do not follow that shape keep their raw text as the message.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ErrorInfo {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

/// One entry of the `details` array of a service error.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorInfo,
}

/// Which kind of request produced an error response.
///
/// The same status code means different things for a query and a write:
/// a 400 on a search is a rejected filter, a 400 on an index batch only
/// spoils that batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Query,
    Write,
}

impl ErrorInfo {
    /// Parse an error body, falling back to the raw text.
    pub fn from_body(body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            return envelope.error;
        }
        let trimmed = body.trim();
        ErrorInfo {
            message: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..Default::default()
        }
    }

    /// Message joined with the detail messages, if any.
    pub fn full_message(&self) -> Option<String> {
        let details: Vec<&str> = self
            .details
            .iter()
            .filter_map(|d| d.message.as_deref())
            .collect();
        match (&self.message, details.is_empty()) {
            (Some(msg), true) => Some(msg.clone()),
            (Some(msg), false) => Some(format!("{msg} ({})", details.join("; "))),
            (None, false) => Some(details.join("; ")),
            (None, true) => None,
        }
    }
}

/// Map an unsuccessful HTTP response onto the error taxonomy.
///
/// - 401/403: authentication, always fatal
/// - 400 on a query: rejected filter/select/orderby
/// - 404: index missing, fatal
/// - 507: storage quota exceeded, fatal
/// - 400/413/429/503 on a write: the batch failed, later batches may still go through
/// - anything else in 5xx: fatal
pub fn classify_response(status: u16, body: &str, kind: RequestKind) -> PorterError {
    let info = ErrorInfo::from_body(body);

    match status {
        401 | 403 => AuthError::Rejected {
            status,
            message: info
                .full_message()
                .unwrap_or_else(|| "access denied".to_string()),
        }
        .into(),
        400 if kind == RequestKind::Query => QueryError {
            message: info
                .full_message()
                .unwrap_or_else(|| "invalid request".to_string()),
            code: info.code,
        }
        .into(),
        400 | 413 | 429 | 503 if kind == RequestKind::Write => ServiceError {
            status,
            info,
            fatal: false,
        }
        .into(),
        _ => ServiceError {
            status,
            info,
            fatal: true,
        }
        .into(),
    }
}
