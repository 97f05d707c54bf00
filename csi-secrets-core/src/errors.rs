use std::time::Duration;
use thiserror::Error;

/// Whether a remote failure should stop the mount or move on to the next
/// region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Client-side failure (not found, access denied, bad request).
    Fatal,
    /// Server-side or transport failure.
    Transient,
}

impl ErrorClass {
    /// 4xx statuses are fatal. Anything else, including a missing status, is
    /// transient.
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(400..=499) => Self::Fatal,
            _ => Self::Transient,
        }
    }
}

/// A classified failure returned by one remote store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub class: ErrorClass,
    pub status: Option<u16>,
    pub message: String,
}

impl StoreError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            status: None,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Fatal, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Transient, message)
    }

    /// Classify by HTTP status.
    pub fn from_status(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::from_status(status),
            status,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class == ErrorClass::Fatal
    }

    /// Prefix the message, keeping the classification.
    pub fn context(mut self, context: impl std::fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

/// Failures of the extraction, decoding and templating steps. These never
/// trigger failover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid JSON used with jmesPath in secret: {secret}")]
    InvalidJson { secret: String },
    #[error("invalid JMES path: {path}")]
    InvalidPath { path: String },
    #[error("JMES path {path} for object alias {alias} does not point to a valid object")]
    PathNotFound { path: String, alias: String },
    #[error("invalid JMES search result type for path {path}: only string is allowed")]
    NonStringResult { path: String },
    #[error("failed to decode base64 value for JMES path {path} in secret {secret}: {reason}")]
    Decode {
        path: String,
        secret: String,
        reason: String,
    },
    #[error("invalid JSON used with objectTemplate in secret: {secret}")]
    TemplateJson { secret: String },
    #[error("failed to render objectTemplate for secret {secret}: {reason}")]
    Template { secret: String, reason: String },
}

/// Outcome of running one fetch through every configured region.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{region}: {error}")]
    Fatal { region: String, error: StoreError },
    #[error(
        "failed to fetch {subject} from all regions, verify it exists and required permissions are granted: {}",
        .errors.join("; ")
    )]
    AllRegionsFailed { subject: String, errors: Vec<String> },
}

/// The single terminal error returned for a failed mount.
#[derive(Debug, Error)]
pub enum MountError {
    #[error(transparent)]
    Config(#[from] csi_secrets_spec::Error),
    #[error("a region must be specified for the mount")]
    MissingRegion,
    #[error("{0}: failover region cannot be the same as the primary region")]
    FailoverSameAsPrimary(String),
    #[error("{region}: failed to resolve credentials: {reason:#}")]
    Identity {
        region: String,
        reason: anyhow::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("mount did not complete within {0:?}")]
    DeadlineExceeded(Duration),
}
