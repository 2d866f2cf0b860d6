//! Synchronous client for a Dkron cluster's `v1` control-plane API.
//!
//! # Overview
//! `ClusterClient` turns a logical API operation into one HTTP call against
//! `scheme://host:port/v1` and shapes the result into a `Payload` or a typed
//! `ApiError`. `Cluster` and `Jobs` layer the domain queries and the
//! idempotent job changes on top of it.
//!
//! # Design
//! - Configuration is validated once, at construction; the client holds no
//!   mutable state afterwards.
//! - Every operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), joined by a `Transport`.
//! - "No content" is an explicit `Payload::Empty`, never an exception, so
//!   callers choose per operation whether absence is fatal.
//! - Exactly one network call per operation. No retries.

pub mod client;
pub mod cluster;
pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod transport;
pub mod types;

pub use client::{ClusterClient, Payload};
pub use cluster::{Cluster, ClusterInfo, InfoKind};
pub use config::EndpointConfig;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use jobs::{JobInfo, Jobs, UpsertOptions};
pub use transport::{Transport, UreqTransport};
pub use types::{Changed, Concurrency, Execution, Executor, JobSpec, JobSummary, Member};
