//! Error types for the cluster API client.
//!
//! # Design
//! `Request` and `EmptyResponse` are separate variants because callers
//! decide independently whether each is fatal. Listing members of an empty
//! cluster is benign, fetching a named job that returned nothing is not.
//! Neither variant is ever retried.

use thiserror::Error;

/// Errors returned by `ClusterClient` and the facades built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client configuration is incomplete or inconsistent.
    #[error("invalid client configuration: {0}")]
    Configuration(String),

    /// The server answered with a status other than the expected one.
    #[error("cluster API query failed with error {status}")]
    Request { status: u16 },

    /// The body decoded to the empty-string sentinel where content was required.
    #[error("cluster response is empty")]
    EmptyResponse,

    /// The response body was not valid JSON or had an unexpected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The HTTP round-trip itself failed before a status was received.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// Status code carried by a `Request` error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
