//! Payment gateway interface.
//!
//! Abstraction over a PIX-style instant payment provider: create a charge,
//! read its settlement status, reverse it. Every call carries a
//! caller-supplied idempotency key so a retried request can never
//! double-charge or double-refund on the provider side.

use crate::types::{ContactHandle, Money};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// Errors reported by the payment provider
#[derive(Error, Debug, Clone)]
pub enum PaymentGatewayError {
    /// The provider rejected the request
    #[error("charge rejected: {reason}")]
    Rejected {
        /// Provider-supplied rejection reason
        reason: String,
    },

    /// The referenced charge does not exist on the provider side
    #[error("unknown charge: {0}")]
    UnknownCharge(String),

    /// The provider could not be reached or timed out
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Gateway-assigned charge identifier (opaque provider string)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChargeId(String);

impl ChargeId {
    /// Wraps a provider-assigned id
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChargeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ChargeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied key the provider uses to deduplicate retried requests
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derives a key from a stable external reference (e.g. the
    /// appointment id), so a retried booking reuses the same key
    #[must_use]
    pub fn from_reference(reference: &str) -> Self {
        Self(format!("ref-{reference}"))
    }

    /// Fallback key for requests without a stable reference:
    /// timestamp plus random nonce
    #[must_use]
    pub fn random<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        Self(format!("{}-{:08x}", now.timestamp_millis(), rng.r#gen::<u32>()))
    }

    /// Returns the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement status of a charge, as the provider reports it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    /// Created, waiting for the payer
    Pending,
    /// Paid and settled
    Settled,
    /// The payment window closed unpaid
    Expired,
    /// Reversed back to the payer
    Refunded,
}

/// A charge creation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCharge {
    /// Amount to collect
    pub amount: Money,
    /// Human-readable statement text
    pub description: String,
    /// Payer's contact handle, forwarded to the provider
    pub payer_contact: ContactHandle,
    /// Deduplication key for retries
    pub idempotency_key: IdempotencyKey,
}

/// A charge as the provider reports it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    /// Provider-assigned identifier
    pub id: ChargeId,
    /// Current settlement status
    pub status: ChargeStatus,
    /// Scannable payment artifact (copy-and-paste PIX payload)
    pub qr_code: String,
}

/// Status of a refund request on the provider side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Accepted, settlement in flight
    Processing,
    /// Funds returned to the payer
    Completed,
}

/// Provider acknowledgement of a refund
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Provider-assigned refund identifier
    pub refund_id: String,
    /// Refund settlement status
    pub status: RefundStatus,
}

/// Payment gateway trait.
///
/// Implementations must be `Send + Sync`; the engines hold them behind
/// `Arc<dyn PaymentGateway>`. Methods return boxed futures to stay
/// dyn-compatible.
pub trait PaymentGateway: Send + Sync {
    /// Creates a charge
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the request or cannot be
    /// reached.
    fn create_charge(
        &self,
        request: NewCharge,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Charge>> + Send + '_>>;

    /// Reads the settlement status of a charge
    ///
    /// # Errors
    ///
    /// Returns an error if the charge is unknown or the provider cannot
    /// be reached.
    fn charge_status(
        &self,
        charge_id: &ChargeId,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<ChargeStatus>> + Send + '_>>;

    /// Reverses a charge for `amount` (up to what was charged)
    ///
    /// # Errors
    ///
    /// Returns an error if the charge is unknown, the amount exceeds the
    /// charge, or the provider cannot be reached.
    fn refund(
        &self,
        charge_id: &ChargeId,
        amount: Money,
        idempotency_key: IdempotencyKey,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<RefundReceipt>> + Send + '_>>;
}
