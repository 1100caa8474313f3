//! Error taxonomy of the marketplace core.

use crate::repository::StoreError;
use crate::types::OrderStatus;
use std::fmt;
use thiserror::Error;

/// Why an adoption request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictReason {
    /// An order on the listing already reached `sold`
    AlreadySold,
    /// Another order on the listing is pending or confirmed
    AlreadyReserved,
}

impl ConflictReason {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AlreadySold => "ALREADY_SOLD",
            Self::AlreadyReserved => "ALREADY_RESERVED",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySold => f.write_str("already sold"),
            Self::AlreadyReserved => f.write_str("already reserved"),
        }
    }
}

/// What an order transition attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderAction {
    /// Move the order to a new status
    Transition(OrderStatus),
    /// Remove the order
    Cancel,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transition(status) => write!(f, "{status}"),
            Self::Cancel => f.write_str("cancelled"),
        }
    }
}

/// Errors surfaced by marketplace operations.
#[derive(Error, Debug)]
pub enum MarketError {
    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity ("listing", "order")
        entity: &'static str,
        /// Identifier that did not resolve
        id: String,
    },

    /// The principal may not perform the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Adoption request rejected by arbitration
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// Input failed validation
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable summary
        message: String,
        /// Offending field names
        fields: Vec<String>,
    },

    /// The credential could not be verified
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The order's status does not allow the action
    #[error("Cannot move order from {from} to {action}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Attempted action
        action: OrderAction,
    },

    /// Storage failure
    #[error("Internal error: {0}")]
    Internal(#[from] StoreError),
}

impl MarketError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Builds a `Validation` error naming each missing field.
    #[must_use]
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::Validation {
            message: format!("missing required fields: {}", fields.join(", ")),
            fields: fields.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Result alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages_are_distinct() {
        let sold = MarketError::Conflict(ConflictReason::AlreadySold).to_string();
        let reserved = MarketError::Conflict(ConflictReason::AlreadyReserved).to_string();
        assert_eq!(sold, "Conflict: already sold");
        assert_eq!(reserved, "Conflict: already reserved");
    }

    #[test]
    fn test_missing_fields_message() {
        let err = MarketError::missing_fields(&["breed", "color"]);
        assert_eq!(
            err.to_string(),
            "Validation failed: missing required fields: breed, color"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = MarketError::InvalidTransition {
            from: OrderStatus::Sold,
            action: OrderAction::Cancel,
        };
        assert_eq!(err.to_string(), "Cannot move order from sold to cancelled");
    }
}
