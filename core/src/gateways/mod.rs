//! External collaborator interfaces.
//!
//! The core never talks to a provider directly; it holds a trait object
//! per collaborator and the composition root decides what stands behind
//! it (a real PIX provider, a WhatsApp bridge, or the mocks from
//! `navalha-testing`).

pub mod messaging;
pub mod payment;

pub use messaging::{MessagingError, MessagingGateway};
pub use payment::{
    Charge, ChargeId, ChargeStatus, IdempotencyKey, NewCharge, PaymentGateway,
    PaymentGatewayError, RefundReceipt, RefundStatus,
};
