//! Model availability lookup consulted before committing to a rule's target.

use std::collections::HashSet;

use super::RoutingError;

/// Answers whether a target model may be routed to right now.
///
/// Implementations must be cheap and non-blocking; they are called on the
/// request path.
pub trait ModelAvailability: Send + Sync {
    /// `Err(ModelUnavailable)` only when the model is confirmed unavailable.
    fn check(&self, model: &str) -> Result<(), RoutingError>;
}

/// Treats every model as available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllModelsAvailable;

impl ModelAvailability for AllModelsAvailable {
    fn check(&self, _model: &str) -> Result<(), RoutingError> {
        Ok(())
    }
}

/// Availability from an explicit deny list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    unavailable: HashSet<String>,
}

impl ModelCatalog {
    pub fn new(unavailable: HashSet<String>) -> Self {
        Self { unavailable }
    }

    pub fn is_empty(&self) -> bool {
        self.unavailable.is_empty()
    }

    pub fn is_available(&self, model: &str) -> bool {
        !self.unavailable.contains(model)
    }
}

impl ModelAvailability for ModelCatalog {
    fn check(&self, model: &str) -> Result<(), RoutingError> {
        if !self.is_available(model) {
            Err(RoutingError::ModelUnavailable {
                model: model.to_string(),
            })
        } else {
            Ok(())
        }
    }
}
