//! Failure classification for API requests.
//!
//! Every transport or server failure is reduced to a [`NormalizedError`] by
//! [`normalize`], a total function over [`RawFailure`]. Screens only ever see
//! the normalized shape.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub const NO_RESPONSE_MESSAGE: &str = "No response from server";
pub const TIMEOUT_MESSAGE: &str = "Request timed out";
pub const UNKNOWN_MESSAGE: &str = "An unknown error occurred";
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Failure category, exactly one per failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 401 or 403; the session has been cleared.
    AuthFailure,
    /// Any other non-2xx response.
    ServerError,
    /// The request went out but no response came back.
    NoResponse,
    /// The client gave up before the exchange completed.
    LocalTimeout,
    /// Local failure that is not a timeout.
    Unknown,
}

/// The single error shape consumed by callers.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub data: Option<Value>,
    pub is_network_error: bool,
    pub is_timeout: bool,
}

impl NormalizedError {
    pub fn is_auth_failure(&self) -> bool {
        self.kind == ErrorKind::AuthFailure
    }
}

/// Raw failure as observed by the HTTP layer, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// The server answered with a non-2xx status.
    Response {
        status: u16,
        status_text: Option<String>,
        body: Option<Value>,
    },
    /// The request was sent but nothing came back.
    NoResponse { timed_out: bool },
    /// The request never completed locally.
    Local { message: String },
}

/// Classify a raw failure.
pub fn normalize(failure: RawFailure) -> NormalizedError {
    match failure {
        RawFailure::Response {
            status,
            status_text,
            body,
        } => {
            let kind = if is_auth_status(status) {
                ErrorKind::AuthFailure
            } else {
                ErrorKind::ServerError
            };
            NormalizedError {
                kind,
                message: response_message(body.as_ref(), status_text.as_deref()),
                status: Some(status),
                data: body,
                is_network_error: false,
                is_timeout: false,
            }
        }
        RawFailure::NoResponse { timed_out } => NormalizedError {
            kind: ErrorKind::NoResponse,
            message: NO_RESPONSE_MESSAGE.to_string(),
            status: None,
            data: None,
            is_network_error: true,
            is_timeout: timed_out,
        },
        RawFailure::Local { message } if message.to_ascii_lowercase().contains("timeout") => {
            NormalizedError {
                kind: ErrorKind::LocalTimeout,
                message: TIMEOUT_MESSAGE.to_string(),
                status: None,
                data: None,
                is_network_error: false,
                is_timeout: true,
            }
        }
        RawFailure::Local { .. } => NormalizedError {
            kind: ErrorKind::Unknown,
            message: UNKNOWN_MESSAGE.to_string(),
            status: None,
            data: None,
            is_network_error: false,
            is_timeout: false,
        },
    }
}

pub fn is_auth_status(status: u16) -> bool {
    status == 401 || status == 403
}

/// Message precedence: body `error` → body `message` → status text →
/// "Server error". Blank strings fall through.
pub fn response_message(body: Option<&Value>, status_text: Option<&str>) -> String {
    let field = |name: &str| {
        body.and_then(|b| b.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    field("error")
        .or_else(|| field("message"))
        .or_else(|| status_text.filter(|s| !s.is_empty()))
        .unwrap_or(SERVER_ERROR_MESSAGE)
        .to_string()
}

/// Canonical reason phrase for a status code.
pub fn status_text(status: StatusCode) -> Option<String> {
    status.canonical_reason().map(str::to_string)
}

/// Map a transport error from reqwest onto a raw failure.
pub(crate) fn classify_transport_error(e: &reqwest::Error) -> RawFailure {
    if e.is_timeout() {
        RawFailure::NoResponse { timed_out: true }
    } else if e.is_builder() {
        RawFailure::Local {
            message: e.to_string(),
        }
    } else {
        RawFailure::NoResponse { timed_out: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn server(status: u16, status_text: Option<&str>, body: Option<Value>) -> NormalizedError {
        normalize(RawFailure::Response {
            status,
            status_text: status_text.map(str::to_string),
            body,
        })
    }

    #[test]
    fn test_error_field_wins() {
        let err = server(
            400,
            Some("Bad Request"),
            Some(json!({"error": "Invalid OTP", "message": "ignored"})),
        );
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message, "Invalid OTP");
        assert_eq!(err.status, Some(400));
        assert_eq!(err.data, Some(json!({"error": "Invalid OTP", "message": "ignored"})));
        assert!(!err.is_network_error);
        assert!(!err.is_timeout);
    }

    #[test]
    fn test_message_field_second() {
        let err = server(422, Some("Unprocessable Entity"), Some(json!({"message": "Phone missing"})));
        assert_eq!(err.message, "Phone missing");
    }

    #[test]
    fn test_status_text_third() {
        let err = server(500, Some("Internal Server Error"), Some(json!({"detail": "x"})));
        assert_eq!(err.message, "Internal Server Error");
    }

    #[test]
    fn test_generic_fallback_last() {
        let err = server(599, None, None);
        assert_eq!(err.message, SERVER_ERROR_MESSAGE);
        assert_eq!(err.status, Some(599));
    }

    #[test]
    fn test_blank_fields_fall_through() {
        let err = server(500, Some("Internal Server Error"), Some(json!({"error": "", "message": ""})));
        assert_eq!(err.message, "Internal Server Error");
    }

    #[test]
    fn test_non_string_error_field_is_skipped() {
        let err = server(400, None, Some(json!({"error": {"code": 7}, "message": "Bad phone"})));
        assert_eq!(err.message, "Bad phone");
    }

    #[test]
    fn test_auth_statuses() {
        for status in [401, 403] {
            let err = server(status, Some("Unauthorized"), Some(json!({"error": "Token expired"})));
            assert_eq!(err.kind, ErrorKind::AuthFailure);
            assert!(err.is_auth_failure());
            assert_eq!(err.message, "Token expired");
        }
        assert_eq!(server(404, None, None).kind, ErrorKind::ServerError);
    }

    #[test]
    fn test_no_response() {
        let err = normalize(RawFailure::NoResponse { timed_out: false });
        assert_eq!(err.kind, ErrorKind::NoResponse);
        assert_eq!(err.message, NO_RESPONSE_MESSAGE);
        assert!(err.is_network_error);
        assert!(!err.is_timeout);

        let err = normalize(RawFailure::NoResponse { timed_out: true });
        assert!(err.is_network_error);
        assert!(err.is_timeout);
    }

    #[test]
    fn test_local_timeout() {
        let err = normalize(RawFailure::Local {
            message: "timeout of 10000ms exceeded".into(),
        });
        assert_eq!(err.kind, ErrorKind::LocalTimeout);
        assert_eq!(err.message, TIMEOUT_MESSAGE);
        assert!(err.is_timeout);
        assert!(!err.is_network_error);
    }

    #[test]
    fn test_local_other() {
        let err = normalize(RawFailure::Local {
            message: "relative URL without a base".into(),
        });
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, UNKNOWN_MESSAGE);
        assert!(!err.is_timeout);
        assert!(!err.is_network_error);
    }

    #[test]
    fn test_display_is_message() {
        let err = server(400, None, Some(json!({"error": "Invalid OTP"})));
        assert_eq!(err.to_string(), "Invalid OTP");
    }

    proptest! {
        #[test]
        fn prop_error_field_is_message(
            status in (400u16..600).prop_filter("not auth", |s| !is_auth_status(*s)),
            error in "[a-zA-Z0-9 ]{1,40}",
        ) {
            let err = server(status, Some("Status"), Some(json!({"error": error.clone(), "message": "other"})));
            prop_assert_eq!(err.kind, ErrorKind::ServerError);
            prop_assert_eq!(err.message, error);
            prop_assert_eq!(err.status, Some(status));
        }
    }
}
