//! Fixture builders and a pre-wired engine harness.

use crate::memory_store::InMemoryLedgerStore;
use crate::mocks::{FixedClock, MockPaymentGateway, RecordingMessenger, test_clock};
use chrono::{DateTime, Duration, Utc};
use navalha_core::config::EngineConfig;
use navalha_core::lifecycle::{BookingPayment, BookingRequest, LifecycleEngine, LocalBookingStart};
use navalha_core::loyalty::LoyaltyLedger;
use navalha_core::reconciliation::PaymentReconciliation;
use navalha_core::types::{
    ContactHandle, LoyaltyConfig, LoyaltyReward, Money, PointsRate, PointsType, Professional,
    ProfessionalId, RewardId, RewardType, ServiceId, ServiceOffering, TenantId,
};
use std::sync::Arc;

/// A seeded tenant with one professional, one service and a client
/// contact - enough to book
#[derive(Clone, Debug)]
pub struct Shop {
    /// The tenant
    pub tenant_id: TenantId,
    /// A professional belonging to the tenant
    pub professional: Professional,
    /// A service belonging to the tenant
    pub service: ServiceOffering,
    /// A client contact handle
    pub contact: ContactHandle,
}

impl Shop {
    /// A prepaid online booking request for this shop
    #[must_use]
    pub fn online_booking(&self, start: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            tenant_id: self.tenant_id,
            professional_id: self.professional.id,
            service_id: self.service.id,
            start,
            client_name: "Ana Souza".to_string(),
            client_contact: self.contact.clone(),
            note: None,
            payment: BookingPayment::Online,
        }
    }

    /// A pay-at-the-shop booking request for this shop
    #[must_use]
    pub fn local_booking(&self, start: DateTime<Utc>, begin: LocalBookingStart) -> BookingRequest {
        BookingRequest {
            tenant_id: self.tenant_id,
            professional_id: self.professional.id,
            service_id: self.service.id,
            start,
            client_name: "Ana Souza".to_string(),
            client_contact: self.contact.clone(),
            note: None,
            payment: BookingPayment::Local(begin),
        }
    }
}

/// All three engines wired over the in-memory store and the mocks.
///
/// Fields are public on purpose - tests reach into the clock to travel
/// in time, into the gateway to settle charges, and into the messenger
/// to assert on deliveries.
pub struct Harness {
    /// The shared in-memory store
    pub store: Arc<InMemoryLedgerStore>,
    /// The movable clock every engine reads
    pub clock: Arc<FixedClock>,
    /// The recording messaging gateway
    pub messenger: Arc<RecordingMessenger>,
    /// The scriptable payment gateway
    pub gateway: Arc<MockPaymentGateway>,
    /// The loyalty ledger
    pub loyalty: Arc<LoyaltyLedger>,
    /// The lifecycle engine
    pub lifecycle: LifecycleEngine,
    /// The payment reconciliation unit
    pub payments: PaymentReconciliation,
}

impl Harness {
    /// Wires engines with default configuration over fresh mocks
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Wires engines with a custom configuration
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let clock = Arc::new(test_clock());
        let messenger = Arc::new(RecordingMessenger::new());
        let gateway = Arc::new(MockPaymentGateway::new());

        let loyalty = Arc::new(LoyaltyLedger::new(
            store.clone(),
            clock.clone(),
            messenger.clone(),
            config,
        ));
        let lifecycle = LifecycleEngine::new(
            store.clone(),
            clock.clone(),
            messenger.clone(),
            loyalty.clone(),
            config,
        );
        let payments = PaymentReconciliation::new(gateway.clone(), store.clone(), clock.clone());

        Self {
            store,
            clock,
            messenger,
            gateway,
            loyalty,
            lifecycle,
            payments,
        }
    }

    /// Seeds a tenant with one professional and one 45.00 service
    pub async fn seed_shop(&self) -> Shop {
        let tenant_id = TenantId::new();
        let professional = Professional {
            id: ProfessionalId::new(),
            tenant_id,
            name: "Rafael Lima".to_string(),
        };
        let service = ServiceOffering {
            id: ServiceId::new(),
            tenant_id,
            name: "Corte degradê".to_string(),
            price: Money::from_cents(4500),
            duration_minutes: 40,
        };
        self.store.insert_professional(professional.clone()).await;
        self.store.insert_service(service.clone()).await;

        Shop {
            tenant_id,
            professional,
            service,
            contact: ContactHandle::from("+5511988887777"),
        }
    }

    /// Enables a flat points-per-visit loyalty program for the tenant
    pub async fn enable_per_visit(&self, tenant_id: TenantId, points_per_visit: u32) {
        self.store
            .put_loyalty_config(LoyaltyConfig {
                tenant_id,
                enabled: true,
                points_type: PointsType::PerVisit,
                points_per_visit,
                points_per_currency_unit: PointsRate::from_milli(0),
                minimum_amount_for_points: Money::from_cents(0),
            })
            .await;
    }

    /// Enables an amount-proportional loyalty program for the tenant
    pub async fn enable_per_amount(
        &self,
        tenant_id: TenantId,
        rate: PointsRate,
        minimum: Money,
    ) {
        self.store
            .put_loyalty_config(LoyaltyConfig {
                tenant_id,
                enabled: true,
                points_type: PointsType::PerAmount,
                points_per_visit: 0,
                points_per_currency_unit: rate,
                minimum_amount_for_points: minimum,
            })
            .await;
    }

    /// Seeds an active reward and returns it
    pub async fn seed_reward(&self, tenant_id: TenantId, points_required: u64) -> LoyaltyReward {
        let reward = LoyaltyReward {
            id: RewardId::new(),
            tenant_id,
            name: "Corte grátis".to_string(),
            points_required,
            reward_type: RewardType::FreeService,
            reward_value: "1 corte".to_string(),
            active: true,
        };
        self.store.insert_reward(reward.clone()).await;
        reward
    }

    /// A start instant comfortably in the clock's future
    #[must_use]
    pub fn tomorrow_at_ten(&self) -> DateTime<Utc> {
        use navalha_core::environment::Clock;
        (self.clock.now() + Duration::days(1))
            .date_naive()
            .and_hms_opt(10, 0, 0)
            .map_or_else(|| self.clock.now() + Duration::days(1), |naive| naive.and_utc())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
