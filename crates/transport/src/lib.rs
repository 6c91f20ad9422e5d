//! Fault-tolerant remote-call client
//!
//! [`TransportClient`] runs one [`RemoteOperation`](rb_types::RemoteOperation)
//! through a pluggable [`RemoteExecutor`](rb_types::RemoteExecutor) with
//! per-attempt timeouts, classified retries, auth-mode defaulting and
//! per-tag metrics. [`HttpExecutor`] is the production executor.

pub mod classifier;
pub mod client;
pub mod http;
pub mod retry;

pub use classifier::{DefaultClassifier, FailureClass, FailureClassifier};
pub use client::{ClientConfig, TransportClient};
pub use http::HttpExecutor;
pub use retry::{Backoff, RetryPolicy};
