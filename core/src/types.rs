//! Domain types for the Navalha booking core.
//!
//! Value objects and entities shared by the lifecycle engine, the payment
//! reconciliation unit and the loyalty ledger. Every entity is scoped to a
//! single tenant; cross-tenant visibility does not exist anywhere in the
//! model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::codes::{ConfirmationCode, ValidationCode};
use crate::gateways::payment::ChargeId;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a tenant (one barbershop account)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a new random `TenantId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TenantId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an appointment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentId(Uuid);

impl AppointmentId {
    /// Creates a new random `AppointmentId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an `AppointmentId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AppointmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a professional (barber)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfessionalId(Uuid);

impl ProfessionalId {
    /// Creates a new random `ProfessionalId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `ProfessionalId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProfessionalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfessionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a service offering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(Uuid);

impl ServiceId {
    /// Creates a new random `ServiceId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `ServiceId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ServiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a loyalty reward catalog entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardId(Uuid);

impl RewardId {
    /// Creates a new random `RewardId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `RewardId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RewardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a redemption
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedemptionId(Uuid);

impl RedemptionId {
    /// Creates a new random `RedemptionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `RedemptionId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RedemptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A client's contact handle (phone number in practice).
///
/// This is the key the loyalty ledger is kept under: balances and
/// redemptions belong to a (tenant, contact handle) pair, not to a user
/// account. Clients book without registering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactHandle(String);

impl ContactHandle {
    /// Creates a contact handle from its raw string form
    #[must_use]
    pub const fn new(handle: String) -> Self {
        Self(handle)
    }

    /// Returns the handle as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContactHandle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}

impl fmt::Display for ContactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money and points (integer math only)
// ============================================================================

/// A currency amount in cents (two fraction digits, never floating point)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole currency units
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (units * 100 > `u64::MAX`).
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_units(units: u64) -> Self {
        match units.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_units overflow"),
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Subtracts two amounts; `None` if the result would be negative
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        if self.0 >= other.0 {
            Some(Self(self.0 - other.0))
        } else {
            None
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Points awarded per currency unit, stored as milli-points to keep the
/// `floor(amount * rate)` accrual rule in integer arithmetic.
///
/// A rate of `1.5` points per currency unit is `PointsRate::from_milli(1500)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointsRate(u32);

impl PointsRate {
    /// Creates a rate from milli-points per currency unit
    #[must_use]
    pub const fn from_milli(milli_points: u32) -> Self {
        Self(milli_points)
    }

    /// Creates a rate from whole points per currency unit
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (points * 1000 > `u32::MAX`).
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_points(points: u32) -> Self {
        match points.checked_mul(1000) {
            Some(milli) => Self(milli),
            None => panic!("PointsRate::from_points overflow"),
        }
    }

    /// Returns the rate in milli-points per currency unit
    #[must_use]
    pub const fn as_milli(&self) -> u32 {
        self.0
    }

    /// Computes `floor(amount * rate)` for an amount in currency units.
    ///
    /// `amount` is in cents and the rate in milli-points per unit, so the
    /// product is divided by 100 * 1000; integer division provides the
    /// floor the accrual rule requires.
    #[must_use]
    pub fn points_for(&self, amount: Money) -> u64 {
        let product = u128::from(amount.cents()) * u128::from(self.0);
        u64::try_from(product / 100_000).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Appointments
// ============================================================================

/// How the client pays for an appointment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Prepaid through the payment gateway at booking time
    Online,
    /// Settled in person at the barbershop
    Local,
}

/// Appointment lifecycle status.
///
/// `Completed`, `Cancelled` and `NoShow` are terminal; rows are never
/// deleted, an appointment ends its life in one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Online booking awaiting gateway settlement
    PendingPayment,
    /// Local booking awaiting shop confirmation
    Pending,
    /// Confirmed, client expected at the scheduled start
    Confirmed,
    /// Client arrived late; shop chose to keep waiting
    Waiting,
    /// Service delivered
    Completed,
    /// Called off (by either side, or by a refund)
    Cancelled,
    /// Client never arrived
    NoShow,
}

impl AppointmentStatus {
    /// Whether this status ends the lifecycle
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether the state machine allows moving from `self` to `next`
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingPayment, Self::Confirmed | Self::Cancelled)
                | (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (
                    Self::Confirmed,
                    Self::Waiting | Self::NoShow | Self::Completed | Self::Cancelled
                )
                | (Self::Waiting, Self::Completed | Self::NoShow)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PendingPayment => "pending_payment",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        };
        write!(f, "{name}")
    }
}

/// An appointment row.
///
/// Mutated only through the lifecycle engine and the reconciliation unit;
/// both enforce the status machine before writing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique appointment identifier
    pub id: AppointmentId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Professional delivering the service
    pub professional_id: ProfessionalId,
    /// Booked service
    pub service_id: ServiceId,
    /// Scheduled start instant
    pub start: DateTime<Utc>,
    /// Client display name
    pub client_name: String,
    /// Client contact handle (loyalty ledger key)
    pub client_contact: ContactHandle,
    /// Free-text note from the booking form
    pub note: Option<String>,
    /// Current lifecycle status
    pub status: AppointmentStatus,
    /// 4-digit check-in code; present iff the booking is prepaid online
    pub confirmation_code: Option<ConfirmationCode>,
    /// End of the check-in grace window; present iff prepaid online.
    /// Immutable once set.
    pub tolerance_expires_at: Option<DateTime<Utc>>,
    /// How the client pays
    pub payment_method: PaymentMethod,
    /// Gateway charge backing the prepayment, once created
    pub pix_payment_id: Option<ChargeId>,
    /// Amount prepaid through the gateway
    pub prepaid_amount: Option<Money>,
    /// Whether the prepayment was refunded
    pub refunded: bool,
    /// When the refund settled
    pub refunded_at: Option<DateTime<Utc>>,
    /// Refunded amount (always the full prepaid amount)
    pub refund_amount: Option<Money>,
    /// Operator-supplied refund reason
    pub refund_reason: Option<String>,
    /// Set once loyalty accrual for this appointment has been applied;
    /// guards against a replayed completion awarding points twice
    pub loyalty_accrued_at: Option<DateTime<Utc>>,
    /// When the row was created
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether the check-in grace window has passed at `now`.
    ///
    /// Appointments without a tolerance window (local bookings) never
    /// expire.
    #[must_use]
    pub fn tolerance_expired(&self, now: DateTime<Utc>) -> bool {
        match self.tolerance_expires_at {
            Some(deadline) => now > deadline,
            None => false,
        }
    }
}

/// A professional (barber) record, the minimum the core needs for
/// tenant-ownership validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professional {
    /// Unique professional identifier
    pub id: ProfessionalId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Display name
    pub name: String,
}

/// A bookable service and its catalog price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    /// Unique service identifier
    pub id: ServiceId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Display name
    pub name: String,
    /// Catalog price; snapshot onto the appointment as `prepaid_amount`
    /// for online bookings
    pub price: Money,
    /// Slot length in minutes
    pub duration_minutes: u32,
}

// ============================================================================
// Loyalty
// ============================================================================

/// How a tenant awards points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsType {
    /// Flat points per completed visit
    PerVisit,
    /// Points proportional to the service price
    PerAmount,
}

/// Per-tenant loyalty program configuration.
///
/// Exactly one active configuration per tenant; a missing row or
/// `enabled = false` means zero accrual.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Whether the program is active
    pub enabled: bool,
    /// Accrual rule selector
    pub points_type: PointsType,
    /// Flat award for `PerVisit` tenants
    pub points_per_visit: u32,
    /// Rate for `PerAmount` tenants
    pub points_per_currency_unit: PointsRate,
    /// `PerAmount` services below this price award nothing
    pub minimum_amount_for_points: Money,
}

/// A client's point balance within one tenant.
///
/// Invariant: `points == total_earned - total_redeemed`, clamped at zero
/// on deduction; the counters are monotonic. The store maintains this -
/// balances are only written through its atomic credit/debit operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyBalance {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Client the balance belongs to
    pub contact: ContactHandle,
    /// Currently spendable points
    pub points: u64,
    /// Lifetime points earned
    pub total_earned: u64,
    /// Lifetime points redeemed
    pub total_redeemed: u64,
}

impl LoyaltyBalance {
    /// An empty balance for a client with no ledger history
    #[must_use]
    pub const fn empty(tenant_id: TenantId, contact: ContactHandle) -> Self {
        Self {
            tenant_id,
            contact,
            points: 0,
            total_earned: 0,
            total_redeemed: 0,
        }
    }
}

/// What a reward grants when redeemed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// A service on the house
    FreeService,
    /// A fixed discount amount
    DiscountAmount,
    /// Tenant-defined benefit described by `reward_value`
    Custom,
}

/// A tenant-defined reward catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyReward {
    /// Unique reward identifier
    pub id: RewardId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Display name
    pub name: String,
    /// Points a client must hold to claim this reward (at least 1)
    pub points_required: u64,
    /// Benefit category
    pub reward_type: RewardType,
    /// Benefit description or discount value
    pub reward_value: String,
    /// Inactive rewards cannot be claimed
    pub active: bool,
}

/// Redemption lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Issued, waiting for the client to present the code in person
    Pending,
    /// Code validated; points deducted
    Completed,
    /// Explicitly cancelled; no ledger effect
    Cancelled,
}

/// A client's claim against a reward, gated by a time-boxed single-use code.
///
/// Points leave the balance only on the transition to `Completed` - never
/// at issuance. A claim the client abandons therefore needs no
/// compensating ledger write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    /// Unique redemption identifier
    pub id: RedemptionId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Claiming client
    pub contact: ContactHandle,
    /// Claimed reward
    pub reward_id: RewardId,
    /// Snapshot of the reward's `points_required` at issuance
    pub points_spent: u64,
    /// 6-digit in-person validation code
    pub validation_code: ValidationCode,
    /// Current status
    pub status: RedemptionStatus,
    /// Validation deadline (issuance + configured TTL)
    pub expires_at: DateTime<Utc>,
    /// When the claim was issued
    pub created_at: DateTime<Utc>,
    /// When the code was validated
    pub completed_at: Option<DateTime<Utc>>,
}

impl Redemption {
    /// Whether the validation window has closed at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_allows_documented_transitions() {
        use super::AppointmentStatus::{
            Cancelled, Completed, Confirmed, NoShow, Pending, PendingPayment, Waiting,
        };

        assert!(PendingPayment.can_transition_to(Confirmed));
        assert!(PendingPayment.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Waiting));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Waiting.can_transition_to(Completed));
        assert!(Waiting.can_transition_to(NoShow));
    }

    #[test]
    fn status_machine_rejects_everything_out_of_terminal_states() {
        use super::AppointmentStatus::{
            Cancelled, Completed, Confirmed, NoShow, Pending, PendingPayment, Waiting,
        };

        for terminal in [Completed, Cancelled, NoShow] {
            for next in [
                PendingPayment,
                Pending,
                Confirmed,
                Waiting,
                Completed,
                Cancelled,
                NoShow,
            ] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} -> {next} must be rejected"
                );
            }
        }
    }

    #[test]
    fn status_machine_rejects_backwards_moves() {
        use super::AppointmentStatus::{Confirmed, Pending, PendingPayment, Waiting};

        assert!(!Confirmed.can_transition_to(PendingPayment));
        assert!(!Waiting.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Waiting));
        assert!(!PendingPayment.can_transition_to(Waiting));
    }

    #[test]
    fn points_rate_floors_fractional_awards() {
        // 1 point per currency unit
        let rate = PointsRate::from_points(1);
        assert_eq!(rate.points_for(Money::from_cents(2500)), 25);
        assert_eq!(rate.points_for(Money::from_cents(999)), 9);

        // 1.5 points per currency unit: 10.00 -> 15, 10.99 -> 16 floored
        let rate = PointsRate::from_milli(1500);
        assert_eq!(rate.points_for(Money::from_units(10)), 15);
        assert_eq!(rate.points_for(Money::from_cents(1099)), 16);
    }

    #[test]
    fn money_display_keeps_two_fraction_digits() {
        assert_eq!(Money::from_cents(999).to_string(), "9.99");
        assert_eq!(Money::from_units(25).to_string(), "25.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn tolerance_never_expires_without_a_window() {
        let appointment = Appointment {
            id: AppointmentId::new(),
            tenant_id: TenantId::new(),
            professional_id: ProfessionalId::new(),
            service_id: ServiceId::new(),
            start: Utc::now(),
            client_name: "Ana".to_string(),
            client_contact: ContactHandle::from("+5511999990000"),
            note: None,
            status: AppointmentStatus::Confirmed,
            confirmation_code: None,
            tolerance_expires_at: None,
            payment_method: PaymentMethod::Local,
            pix_payment_id: None,
            prepaid_amount: None,
            refunded: false,
            refunded_at: None,
            refund_amount: None,
            refund_reason: None,
            loyalty_accrued_at: None,
            created_at: Utc::now(),
        };
        assert!(!appointment.tolerance_expired(Utc::now() + chrono::Duration::days(365)));
    }
}
