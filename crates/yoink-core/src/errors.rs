//! The typed error taxonomy that flows out of every core component.
//!
//! Every fatal condition a caller can hit is one of these variants. The
//! Orchestrator is the single place that turns a `YoinkError` into a process
//! exit code (`exit_code`); the Retryer is the single place that decides
//! whether a variant is worth a second attempt (`is_retriable`).

use std::fmt;
use std::path::PathBuf;

/// A single error kind flowing through the retrieval pipeline.
#[derive(Debug)]
pub enum YoinkError {
    /// No profile name was available to resolve settings from.
    NoProfile,
    /// A required setting or file-spec key was missing.
    MissingSetting(String),
    /// The location service returned 404 for the given locator.
    NoLocator(String),
    /// The location service request timed out.
    LocationServiceTimeout,
    /// The location service redirected more times than is reasonable.
    LocationServiceRedirects,
    /// The location service request failed for some other reason.
    LocationServiceError(String),
    /// Local filesystem operation failed (permissions, missing file, etc).
    FileError(String),
    /// The destination already exists and `--force` was not given.
    FileExists(PathBuf),
    /// An NGAS `RETRIEVE` request timed out.
    NgasServiceTimeout { server: String },
    /// An NGAS `RETRIEVE` request redirected more times than is reasonable.
    NgasServiceRedirects { server: String },
    /// An NGAS `RETRIEVE` request came back with a non-200 status, or the
    /// connection otherwise failed.
    NgasServiceError {
        server: String,
        status_code: Option<u16>,
        message: String,
    },
    /// The file retrieved did not match the size recorded in the files
    /// report.
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl YoinkError {
    /// Whether the Retryer should give this error another attempt.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            YoinkError::NgasServiceTimeout { .. }
                | YoinkError::NgasServiceRedirects { .. }
                | YoinkError::NgasServiceError { .. }
                | YoinkError::SizeMismatch { .. }
        )
    }

    /// The process exit code this error maps to (see spec §6).
    pub fn exit_code(&self) -> u8 {
        match self {
            YoinkError::NoProfile => 1,
            YoinkError::MissingSetting(_) => 2,
            YoinkError::LocationServiceTimeout => 3,
            YoinkError::LocationServiceRedirects => 4,
            YoinkError::LocationServiceError(_) => 5,
            YoinkError::NoLocator(_) => 6,
            YoinkError::FileError(_) => 7,
            YoinkError::NgasServiceTimeout { .. } => 8,
            YoinkError::NgasServiceRedirects { .. } => 9,
            YoinkError::NgasServiceError { .. } => 10,
            YoinkError::SizeMismatch { .. } => 11,
            YoinkError::FileExists(_) => 12,
        }
    }
}

impl fmt::Display for YoinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YoinkError::NoProfile => write!(f, "no profile provided"),
            YoinkError::MissingSetting(key) => write!(f, "missing required setting: {key}"),
            YoinkError::NoLocator(locator) => {
                write!(f, "product locator not found: {locator}")
            }
            YoinkError::LocationServiceTimeout => {
                write!(f, "request to locator service timed out")
            }
            YoinkError::LocationServiceRedirects => {
                write!(f, "too many redirects on locator service")
            }
            YoinkError::LocationServiceError(detail) => {
                write!(f, "catastrophic error on locator service: {detail}")
            }
            YoinkError::FileError(detail) => write!(f, "file error: {detail}"),
            YoinkError::FileExists(path) => {
                write!(f, "destination already exists: {}", path.display())
            }
            YoinkError::NgasServiceTimeout { server } => {
                write!(f, "request to NGAS server {server} timed out")
            }
            YoinkError::NgasServiceRedirects { server } => {
                write!(f, "too many redirects on NGAS server {server}")
            }
            YoinkError::NgasServiceError {
                server,
                status_code,
                message,
            } => match status_code {
                Some(code) => write!(f, "NGAS server {server} returned {code}: {message}"),
                None => write!(f, "NGAS server {server} error: {message}"),
            },
            YoinkError::SizeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{} expected to be {} bytes, got {}",
                path.display(),
                expected,
                actual
            ),
        }
    }
}

impl std::error::Error for YoinkError {}

pub type YoinkResult<T> = std::result::Result<T, YoinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_kinds_match_spec_table() {
        assert!(YoinkError::NgasServiceTimeout {
            server: "h".into()
        }
        .is_retriable());
        assert!(YoinkError::NgasServiceRedirects {
            server: "h".into()
        }
        .is_retriable());
        assert!(YoinkError::NgasServiceError {
            server: "h".into(),
            status_code: Some(500),
            message: "boom".into()
        }
        .is_retriable());
        assert!(YoinkError::SizeMismatch {
            path: "x".into(),
            expected: 1,
            actual: 2
        }
        .is_retriable());
    }

    #[test]
    fn fatal_kinds_do_not_retry() {
        assert!(!YoinkError::NoProfile.is_retriable());
        assert!(!YoinkError::MissingSetting("x".into()).is_retriable());
        assert!(!YoinkError::FileExists("x".into()).is_retriable());
        assert!(!YoinkError::FileError("x".into()).is_retriable());
        assert!(!YoinkError::NoLocator("x".into()).is_retriable());
    }

    #[test]
    fn exit_codes_match_spec_table() {
        assert_eq!(YoinkError::NoProfile.exit_code(), 1);
        assert_eq!(YoinkError::MissingSetting("x".into()).exit_code(), 2);
        assert_eq!(YoinkError::LocationServiceTimeout.exit_code(), 3);
        assert_eq!(YoinkError::LocationServiceRedirects.exit_code(), 4);
        assert_eq!(YoinkError::LocationServiceError("x".into()).exit_code(), 5);
        assert_eq!(YoinkError::NoLocator("x".into()).exit_code(), 6);
        assert_eq!(YoinkError::FileError("x".into()).exit_code(), 7);
        assert_eq!(
            YoinkError::NgasServiceTimeout {
                server: "h".into()
            }
            .exit_code(),
            8
        );
        assert_eq!(
            YoinkError::NgasServiceRedirects {
                server: "h".into()
            }
            .exit_code(),
            9
        );
        assert_eq!(
            YoinkError::NgasServiceError {
                server: "h".into(),
                status_code: None,
                message: "x".into()
            }
            .exit_code(),
            10
        );
        assert_eq!(
            YoinkError::SizeMismatch {
                path: "x".into(),
                expected: 1,
                actual: 2
            }
            .exit_code(),
            11
        );
        assert_eq!(YoinkError::FileExists("x".into()).exit_code(), 12);
    }
}
