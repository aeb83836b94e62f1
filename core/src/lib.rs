//! # Navalha Core
//!
//! The booking core of the Navalha barbershop platform: the appointment
//! lifecycle state machine, the prepayment/refund reconciliation path,
//! and the loyalty points ledger.
//!
//! Everything around this core - HTTP routing, UI, authentication, the
//! actual PIX provider, the actual messaging provider - is an external
//! collaborator. The core consumes a persistence interface
//! ([`store::LedgerStore`]) and two gateway interfaces
//! ([`gateways::PaymentGateway`], [`gateways::MessagingGateway`]) and
//! exposes status-changing operations back to them.
//!
//! ## The three engines
//!
//! - [`lifecycle::LifecycleEngine`] - appointment creation, code-gated
//!   check-in with a fixed grace window, explicit late-arrival
//!   resolution, direct status transitions.
//! - [`reconciliation::PaymentReconciliation`] - gateway charge creation
//!   with idempotency keys, settlement bridging, anti-double refunds.
//! - [`loyalty::LoyaltyLedger`] - per-visit / per-amount accrual,
//!   balance maintenance, redemption codes that deduct points only on
//!   validated completion.
//!
//! ## Consistency posture
//!
//! Operations are single-request read-then-write sequences; there is no
//! background scheduler, and deadlines are evaluated lazily against the
//! injected [`environment::Clock`]. Balance mutation goes exclusively
//! through the store's atomic credit/debit operations so concurrent
//! accruals and redemptions cannot lose updates. Appointment writes and
//! balance writes are separate units of mutation - accrual is a
//! best-effort side effect of completion, never a reason to fail it.
//!
//! ## Example
//!
//! ```ignore
//! use navalha_core::prelude::*;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn LedgerStore> = /* backend */;
//! let clock = Arc::new(SystemClock);
//! let messenger: Arc<dyn MessagingGateway> = /* provider */;
//! let config = EngineConfig::default();
//!
//! let loyalty = Arc::new(LoyaltyLedger::new(
//!     store.clone(), clock.clone(), messenger.clone(), config,
//! ));
//! let lifecycle = LifecycleEngine::new(
//!     store.clone(), clock.clone(), messenger, loyalty, config,
//! );
//!
//! let appointment = lifecycle.create(request).await?;
//! match lifecycle.validate_check_in(appointment.id, "0042").await? {
//!     CheckInOutcome::Completed { points_awarded, .. } => { /* done */ }
//!     CheckInOutcome::ToleranceExpired { .. } => { /* ask the shop */ }
//! }
//! ```

/// Check-in and redemption code value objects
pub mod codes;

/// Engine tunables (tolerance window, redemption TTL)
pub mod config;

/// Injected dependency traits (clock)
pub mod environment;

/// Error taxonomy
pub mod error;

/// External collaborator interfaces (payment, messaging)
pub mod gateways;

/// Appointment lifecycle engine
pub mod lifecycle;

/// Loyalty ledger
pub mod loyalty;

/// Payment reconciliation unit
pub mod reconciliation;

/// Ledger store trait
pub mod store;

/// Domain types
pub mod types;

/// Convenience re-exports for composition roots and tests
pub mod prelude {
    pub use crate::codes::{ConfirmationCode, ValidationCode};
    pub use crate::config::EngineConfig;
    pub use crate::environment::{Clock, SystemClock};
    pub use crate::error::{CoreResult, Error, StoreError};
    pub use crate::gateways::messaging::{MessagingError, MessagingGateway};
    pub use crate::gateways::payment::{
        Charge, ChargeId, ChargeStatus, IdempotencyKey, NewCharge, PaymentGateway,
        PaymentGatewayError, RefundReceipt, RefundStatus,
    };
    pub use crate::lifecycle::{
        BookingPayment, BookingRequest, CheckInOutcome, LateArrivalDecision, LifecycleEngine,
        LocalBookingStart,
    };
    pub use crate::loyalty::LoyaltyLedger;
    pub use crate::reconciliation::{PaymentReconciliation, ReconcileOutcome};
    pub use crate::store::{LedgerStore, StoreFuture, StoreResult};
    pub use crate::types::{
        Appointment, AppointmentId, AppointmentStatus, ContactHandle, LoyaltyBalance,
        LoyaltyConfig, LoyaltyReward, Money, PaymentMethod, PointsRate, PointsType, Professional,
        ProfessionalId, Redemption, RedemptionId, RedemptionStatus, RewardId, RewardType,
        ServiceId, ServiceOffering, TenantId,
    };
}
