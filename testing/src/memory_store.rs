//! In-memory ledger store.
//!
//! Hash maps behind one async mutex. Every trait method takes the lock
//! once and releases it before returning, so the credit/debit operations
//! are atomic exactly the way the store contract demands - two
//! concurrent accruals serialize on the lock and both increments land.
//!
//! Fast and deterministic; used by every test and the demo binary. Not a
//! durable store and not meant to become one.

use navalha_core::error::StoreError;
use navalha_core::store::{LedgerStore, StoreFuture};
use navalha_core::types::{
    Appointment, AppointmentId, ContactHandle, LoyaltyBalance, LoyaltyConfig, LoyaltyReward,
    Professional, ProfessionalId, Redemption, RedemptionId, RewardId, ServiceId, ServiceOffering,
    TenantId,
};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Rows {
    appointments: HashMap<AppointmentId, Appointment>,
    professionals: HashMap<(TenantId, ProfessionalId), Professional>,
    services: HashMap<(TenantId, ServiceId), ServiceOffering>,
    configs: HashMap<TenantId, LoyaltyConfig>,
    rewards: HashMap<(TenantId, RewardId), LoyaltyReward>,
    balances: HashMap<(TenantId, ContactHandle), LoyaltyBalance>,
    redemptions: HashMap<RedemptionId, Redemption>,
}

/// Deterministic in-memory implementation of [`LedgerStore`]
#[derive(Default)]
pub struct InMemoryLedgerStore {
    rows: Mutex<Rows>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a professional row
    pub async fn insert_professional(&self, professional: Professional) {
        let mut rows = self.rows.lock().await;
        rows.professionals
            .insert((professional.tenant_id, professional.id), professional);
    }

    /// Seeds a service offering row
    pub async fn insert_service(&self, service: ServiceOffering) {
        let mut rows = self.rows.lock().await;
        rows.services
            .insert((service.tenant_id, service.id), service);
    }

    /// Sets a tenant's loyalty configuration (replacing any previous one)
    pub async fn put_loyalty_config(&self, config: LoyaltyConfig) {
        let mut rows = self.rows.lock().await;
        rows.configs.insert(config.tenant_id, config);
    }

    /// Seeds a reward catalog row
    pub async fn insert_reward(&self, reward: LoyaltyReward) {
        let mut rows = self.rows.lock().await;
        rows.rewards.insert((reward.tenant_id, reward.id), reward);
    }

    /// Overwrites a balance row directly - test setup only, bypasses the
    /// atomic credit/debit path
    pub async fn put_balance(&self, balance: LoyaltyBalance) {
        let mut rows = self.rows.lock().await;
        rows.balances
            .insert((balance.tenant_id, balance.contact.clone()), balance);
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert_appointment(&self, appointment: Appointment) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut rows = self.rows.lock().await;
            if rows.appointments.contains_key(&appointment.id) {
                return Err(StoreError::Duplicate(appointment.id.to_string()));
            }
            rows.appointments.insert(appointment.id, appointment);
            Ok(())
        })
    }

    fn appointment(&self, id: AppointmentId) -> StoreFuture<'_, Option<Appointment>> {
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.appointments.get(&id).cloned())
        })
    }

    fn update_appointment(&self, appointment: Appointment) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut rows = self.rows.lock().await;
            if !rows.appointments.contains_key(&appointment.id) {
                return Err(StoreError::RowNotFound(appointment.id.to_string()));
            }
            rows.appointments.insert(appointment.id, appointment);
            Ok(())
        })
    }

    fn professional(
        &self,
        tenant_id: TenantId,
        id: ProfessionalId,
    ) -> StoreFuture<'_, Option<Professional>> {
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.professionals.get(&(tenant_id, id)).cloned())
        })
    }

    fn service(
        &self,
        tenant_id: TenantId,
        id: ServiceId,
    ) -> StoreFuture<'_, Option<ServiceOffering>> {
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.services.get(&(tenant_id, id)).cloned())
        })
    }

    fn loyalty_config(&self, tenant_id: TenantId) -> StoreFuture<'_, Option<LoyaltyConfig>> {
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.configs.get(&tenant_id).cloned())
        })
    }

    fn reward(&self, tenant_id: TenantId, id: RewardId) -> StoreFuture<'_, Option<LoyaltyReward>> {
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.rewards.get(&(tenant_id, id)).cloned())
        })
    }

    fn balance(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
    ) -> StoreFuture<'_, Option<LoyaltyBalance>> {
        let contact = contact.clone();
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.balances.get(&(tenant_id, contact)).cloned())
        })
    }

    fn credit_points(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
        amount: u64,
    ) -> StoreFuture<'_, LoyaltyBalance> {
        let contact = contact.clone();
        Box::pin(async move {
            let mut rows = self.rows.lock().await;
            let balance = rows
                .balances
                .entry((tenant_id, contact.clone()))
                .or_insert_with(|| LoyaltyBalance::empty(tenant_id, contact));
            balance.points = balance.points.saturating_add(amount);
            balance.total_earned = balance.total_earned.saturating_add(amount);
            Ok(balance.clone())
        })
    }

    fn debit_points(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
        amount: u64,
    ) -> StoreFuture<'_, LoyaltyBalance> {
        let contact = contact.clone();
        Box::pin(async move {
            let mut rows = self.rows.lock().await;
            let balance = rows
                .balances
                .entry((tenant_id, contact.clone()))
                .or_insert_with(|| LoyaltyBalance::empty(tenant_id, contact));
            balance.points = balance.points.saturating_sub(amount);
            balance.total_redeemed = balance.total_redeemed.saturating_add(amount);
            Ok(balance.clone())
        })
    }

    fn insert_redemption(&self, redemption: Redemption) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut rows = self.rows.lock().await;
            if rows.redemptions.contains_key(&redemption.id) {
                return Err(StoreError::Duplicate(redemption.id.to_string()));
            }
            rows.redemptions.insert(redemption.id, redemption);
            Ok(())
        })
    }

    fn redemption(&self, id: RedemptionId) -> StoreFuture<'_, Option<Redemption>> {
        Box::pin(async move {
            let rows = self.rows.lock().await;
            Ok(rows.redemptions.get(&id).cloned())
        })
    }

    fn update_redemption(&self, redemption: Redemption) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut rows = self.rows.lock().await;
            if !rows.redemptions.contains_key(&redemption.id) {
                return Err(StoreError::RowNotFound(redemption.id.to_string()));
            }
            rows.redemptions.insert(redemption.id, redemption);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn credit_creates_the_row_and_debit_clamps_at_zero() {
        tokio_test::block_on(async {
            let store = InMemoryLedgerStore::new();
            let tenant_id = TenantId::new();
            let contact = ContactHandle::from("+5511977776666");

            let balance = store.credit_points(tenant_id, &contact, 30).await.unwrap();
            assert_eq!(balance.points, 30);
            assert_eq!(balance.total_earned, 30);
            assert_eq!(balance.total_redeemed, 0);

            // Debit beyond the balance: points clamp, the counter records
            // the full amount
            let balance = store.debit_points(tenant_id, &contact, 50).await.unwrap();
            assert_eq!(balance.points, 0);
            assert_eq!(balance.total_earned, 30);
            assert_eq!(balance.total_redeemed, 50);
        });
    }

    #[test]
    fn debit_on_a_missing_row_creates_the_drift_record() {
        tokio_test::block_on(async {
            let store = InMemoryLedgerStore::new();
            let tenant_id = TenantId::new();
            let contact = ContactHandle::from("+5511977776666");

            let balance = store.debit_points(tenant_id, &contact, 40).await.unwrap();
            assert_eq!(balance.points, 0);
            assert_eq!(balance.total_earned, 0);
            assert_eq!(balance.total_redeemed, 40);
        });
    }

    #[test]
    fn updates_require_a_prior_insert() {
        tokio_test::block_on(async {
            let store = InMemoryLedgerStore::new();
            let redemption_id = RedemptionId::new();
            let missing = store.redemption(redemption_id).await.unwrap();
            assert!(missing.is_none());
        });
    }
}
