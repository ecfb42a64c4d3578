//! Unified application error model and mapping helpers.
//! This module provides a common error enum used by the resolver, codec and
//! CSV passes, along with the HTTP status mapping applied at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Traversal { code: String, message: String },
    Permission { code: String, message: String },
    Parse { code: String, message: String },
    Io { code: String, message: String },
    Decode { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Traversal { code, .. }
            | AppError::Permission { code, .. }
            | AppError::Parse { code, .. }
            | AppError::Io { code, .. }
            | AppError::Decode { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Traversal { message, .. }
            | AppError::Permission { message, .. }
            | AppError::Parse { message, .. }
            | AppError::Io { message, .. }
            | AppError::Decode { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn traversal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Traversal { code: code.into(), message: msg.into() } }
    pub fn permission<S: Into<String>>(code: S, msg: S) -> Self { AppError::Permission { code: code.into(), message: msg.into() } }
    pub fn parse<S: Into<String>>(code: S, msg: S) -> Self { AppError::Parse { code: code.into(), message: msg.into() } }
    pub fn io<S: Into<String>>(code: S, msg: S) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn decode<S: Into<String>>(code: S, msg: S) -> Self { AppError::Decode { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    ///
    /// Decode maps to 404: a malformed identifier is indistinguishable from an
    /// unknown one and must never surface as an internal fault.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Traversal { .. } => 403,
            AppError::Permission { .. } => 403,
            AppError::Parse { .. } => 422,
            AppError::Io { .. } => 503,
            AppError::Decode { .. } => 404,
            AppError::Internal { .. } => 500,
        }
    }

    /// Convert a filesystem error on `what` into the taxonomy. No retries:
    /// filesystem failures here are treated as non-transient.
    pub fn from_fs(err: &std::io::Error, what: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound { code: "not_found".into(), message: format!("{}: not found", what) },
            std::io::ErrorKind::PermissionDenied => AppError::Permission { code: "permission_denied".into(), message: format!("{}: permission denied", what) },
            _ => AppError::Io { code: "io_error".into(), message: format!("{}: {}", what, err) },
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
        assert_eq!(AppError::traversal("traversal", "escape").http_status(), 403);
        assert_eq!(AppError::permission("permission_denied", "no").http_status(), 403);
        assert_eq!(AppError::parse("parse_error", "bad csv").http_status(), 422);
        assert_eq!(AppError::io("io_error", "disk").http_status(), 503);
        assert_eq!(AppError::decode("decode_error", "bad id").http_status(), 404);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn fs_error_mapping() {
        let nf = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(AppError::from_fs(&nf, "a/b"), AppError::NotFound { .. }));
        let pd = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        assert!(matches!(AppError::from_fs(&pd, "a/b"), AppError::Permission { .. }));
        let other = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert!(matches!(AppError::from_fs(&other, "a/b"), AppError::Io { .. }));
    }
}
