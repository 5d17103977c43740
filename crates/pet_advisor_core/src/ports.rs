//! crates/pet_advisor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete transport used to reach the advisory backend.

use crate::domain::AskRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, HTTP).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Upstream answered with status {0}")]
    Status(u16),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The raw, incrementally delivered body of an advisory answer.
pub type ByteStream = Pin<Box<dyn Stream<Item = PortResult<Bytes>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Sends one question and opens the answer as a byte stream of event records.
    ///
    /// A non-success response must surface as `PortError::Status` rather than a stream.
    async fn ask(&self, request: &AskRequest) -> PortResult<ByteStream>;
}
