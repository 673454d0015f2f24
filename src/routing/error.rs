//! Error types for routing

use thiserror::Error;

/// Errors raised inside the routing engine.
///
/// These never reach the caller of [`Router::route`](super::Router::route);
/// the engine falls through to the next rule or to passthrough instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// A rule's target model cannot currently be used
    #[error("Model '{model}' is unavailable")]
    ModelUnavailable { model: String },
}
