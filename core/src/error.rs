//! Error taxonomy for the booking core.
//!
//! Every failure a caller can act on is a distinct variant - the UI layer
//! renders a specific message per kind ("invalid code" is not "expired
//! code" is not "insufficient points"), so collapsing them into a generic
//! failure is not an option.

use crate::types::{AppointmentId, AppointmentStatus, RedemptionId};
use thiserror::Error;

/// Result alias for core operations
pub type CoreResult<T> = Result<T, Error>;

/// Errors surfaced by the lifecycle engine, the reconciliation unit and
/// the loyalty ledger.
///
/// Validation and lookup failures reject the operation before any write;
/// gateway failures during refund leave local state untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any state change (bad shape, wrong tenant,
    /// start time in the past, ...
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Identifier that missed
        id: String,
    },

    /// A submitted check-in or redemption code does not match the stored one
    #[error("invalid code")]
    InvalidCode,

    /// The redemption code's validation window has closed
    #[error("code expired")]
    ExpiredCode {
        /// Redemption whose window closed
        redemption_id: RedemptionId,
    },

    /// The client's balance cannot cover the reward
    #[error("insufficient points: reward requires {required}, balance has {available}")]
    InsufficientPoints {
        /// Points the reward requires
        required: u64,
        /// Points currently on the balance
        available: u64,
    },

    /// The appointment's prepayment was already refunded
    #[error("appointment {appointment_id} already refunded")]
    AlreadyRefunded {
        /// Appointment carrying the refunded prepayment
        appointment_id: AppointmentId,
    },

    /// The charge id does not belong to the appointment it was submitted for
    #[error("charge does not match the appointment's payment")]
    PaymentMismatch,

    /// The requested status change is not allowed by the state machine
    #[error("illegal transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the appointment is in
        from: AppointmentStatus,
        /// Status the caller asked for
        to: AppointmentStatus,
    },

    /// A payment or messaging provider call failed
    #[error("gateway error: {0}")]
    Gateway(String),

    /// The ledger store failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<crate::gateways::payment::PaymentGatewayError> for Error {
    fn from(error: crate::gateways::payment::PaymentGatewayError) -> Self {
        Self::Gateway(error.to_string())
    }
}

/// Errors produced by `LedgerStore` implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row that should exist is missing
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// A row with the same identity already exists
    #[error("duplicate row: {0}")]
    Duplicate(String),

    /// Backend-specific failure (connection, serialization, ...)
    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_render_distinguishable_messages() {
        let invalid = Error::InvalidCode.to_string();
        let expired = Error::ExpiredCode {
            redemption_id: RedemptionId::new(),
        }
        .to_string();
        let insufficient = Error::InsufficientPoints {
            required: 100,
            available: 40,
        }
        .to_string();

        assert_ne!(invalid, expired);
        assert_ne!(invalid, insufficient);
        assert!(insufficient.contains("100"));
        assert!(insufficient.contains("40"));
    }

    #[test]
    fn store_errors_wrap_into_the_domain_error() {
        let err: Error = StoreError::Backend("connection reset".to_string()).into();
        assert!(matches!(err, Error::Store(_)));
    }
}
