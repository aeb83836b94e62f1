//! Ledger store trait.
//!
//! The one persistence seam of the core: a transactional row store for
//! appointments, loyalty balances, redemptions and the read-side catalog
//! rows the engines validate against. The engines never hold connections
//! or write SQL - they see this trait and nothing else.
//!
//! # Balance math is the store's job
//!
//! Concurrent requests can race on the same balance row, and a plain
//! read-then-write cycle loses updates. The trait therefore exposes
//! balance mutation only as atomic increment-style operations
//! ([`LedgerStore::credit_points`] / [`LedgerStore::debit_points`]); an
//! implementation must apply them without a read-modify-write window
//! (an `UPDATE ... SET points = points + $1`, an optimistic version check,
//! or a per-row serialization point all qualify). There is no
//! `put_balance` - handing engines a whole-row write would reopen the
//! lost-update gap.
//!
//! # Implementations
//!
//! - `InMemoryLedgerStore` (in `navalha-testing`): single-lock hash maps,
//!   deterministic, used by every test and the demo.
//!
//! # Thread safety
//!
//! Implementations must be `Send + Sync`; engines share them behind
//! `Arc<dyn LedgerStore>`. Methods return boxed futures to stay
//! dyn-compatible.

use crate::error::StoreError;
use crate::types::{
    Appointment, AppointmentId, ContactHandle, LoyaltyBalance, LoyaltyConfig, LoyaltyReward,
    Professional, ProfessionalId, Redemption, RedemptionId, RewardId, ServiceId, ServiceOffering,
    TenantId,
};
use std::future::Future;
use std::pin::Pin;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future returned by store methods
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Durable row storage for the booking core.
///
/// Rows are tenant-scoped; lookups that take a `TenantId` must never
/// return another tenant's row. Appointments and redemptions are written
/// whole-row (their operations are single-writer per row in practice);
/// balances are only ever incremented or decremented atomically.
pub trait LedgerStore: Send + Sync {
    // ------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------

    /// Inserts a freshly created appointment
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id already exists.
    fn insert_appointment(&self, appointment: Appointment) -> StoreFuture<'_, ()>;

    /// Loads an appointment by id
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; a missing row is `None`.
    fn appointment(&self, id: AppointmentId) -> StoreFuture<'_, Option<Appointment>>;

    /// Replaces an existing appointment row
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowNotFound`] if the row was never inserted.
    fn update_appointment(&self, appointment: Appointment) -> StoreFuture<'_, ()>;

    // ------------------------------------------------------------------
    // Catalog (read side for validation and pricing)
    // ------------------------------------------------------------------

    /// Loads a professional within a tenant
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure.
    fn professional(
        &self,
        tenant_id: TenantId,
        id: ProfessionalId,
    ) -> StoreFuture<'_, Option<Professional>>;

    /// Loads a service offering within a tenant
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure.
    fn service(
        &self,
        tenant_id: TenantId,
        id: ServiceId,
    ) -> StoreFuture<'_, Option<ServiceOffering>>;

    // ------------------------------------------------------------------
    // Loyalty
    // ------------------------------------------------------------------

    /// Loads the tenant's loyalty configuration
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; an unconfigured tenant
    /// is `None`.
    fn loyalty_config(&self, tenant_id: TenantId) -> StoreFuture<'_, Option<LoyaltyConfig>>;

    /// Loads a reward catalog entry within a tenant
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure.
    fn reward(&self, tenant_id: TenantId, id: RewardId) -> StoreFuture<'_, Option<LoyaltyReward>>;

    /// Loads a client's balance within a tenant
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; a client with no ledger
    /// history is `None`.
    fn balance(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
    ) -> StoreFuture<'_, Option<LoyaltyBalance>>;

    /// Atomically credits points to a balance, creating the row when
    /// absent (`points = total_earned = amount, total_redeemed = 0`).
    /// Returns the balance after the credit.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure.
    fn credit_points(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
        amount: u64,
    ) -> StoreFuture<'_, LoyaltyBalance>;

    /// Atomically debits points from a balance: `points` clamps at zero,
    /// `total_redeemed` grows by the full `amount`. A missing row is
    /// created as `points = 0, total_earned = 0, total_redeemed = amount`
    /// (defensive path for ledger drift). Returns the balance after the
    /// debit.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure.
    fn debit_points(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
        amount: u64,
    ) -> StoreFuture<'_, LoyaltyBalance>;

    // ------------------------------------------------------------------
    // Redemptions
    // ------------------------------------------------------------------

    /// Inserts a freshly issued redemption
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id already exists.
    fn insert_redemption(&self, redemption: Redemption) -> StoreFuture<'_, ()>;

    /// Loads a redemption by id
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; a missing row is `None`.
    fn redemption(&self, id: RedemptionId) -> StoreFuture<'_, Option<Redemption>>;

    /// Replaces an existing redemption row
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowNotFound`] if the row was never inserted.
    fn update_redemption(&self, redemption: Redemption) -> StoreFuture<'_, ()>;
}
