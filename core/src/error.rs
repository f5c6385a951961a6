//! Error types for the bookmarking API client.
//!
//! # Design
//! Validation failures are collected by the fluent builders and surfaced only
//! when the terminal call runs, so they get their own `Clone`-able enum that
//! can sit in an accumulator. Everything a public operation can return is
//! folded into `ApiError`.
//!
//! `RateLimited` and `Forbidden` get dedicated variants because callers
//! routinely branch on them. The service reports domain failures inside a
//! 200 response; those land in `OperationFailed` carrying the service's own
//! result code.

use thiserror::Error;

/// A rejected argument, recorded while a request is being configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid URL: {0:?}")]
    InvalidUrl(String),

    #[error("invalid title: {0:?}")]
    InvalidTitle(String),

    #[error("invalid tag: {0:?}")]
    InvalidTag(String),

    #[error("you cannot specify more than {limit} tags")]
    TooManyTags { limit: usize },

    #[error("you cannot get more than {limit} recent posts")]
    TooManyResults { limit: u32 },
}

/// Errors returned by `PinboardClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A builder argument was rejected; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service answered 429.
    #[error("429: Too Many Requests")]
    RateLimited,

    /// The service answered 403.
    #[error("403: Forbidden")]
    Forbidden,

    /// Any other non-200 status.
    #[error("{status}: {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    /// A 200 response whose `result_code` was not the success sentinel.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Valid JSON that does not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A standalone post representation could not be converted.
    #[error("cannot convert {0} to Post")]
    Conversion(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
