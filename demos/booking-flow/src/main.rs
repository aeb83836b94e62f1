//! End-to-end CLI walkthrough of the booking core.
//!
//! Books an online appointment, settles the PIX charge, checks the
//! client in with the confirmation code, accrues loyalty points, claims
//! and validates a reward, then shows the refund path on a second
//! booking - all against the in-memory store and the mock gateways.
//!
//! Run with: `cargo run -p booking-flow`

use chrono::Duration;
use navalha_core::config::EngineConfig;
use navalha_core::environment::{Clock, SystemClock};
use navalha_core::lifecycle::{BookingPayment, BookingRequest, CheckInOutcome, LifecycleEngine};
use navalha_core::loyalty::LoyaltyLedger;
use navalha_core::reconciliation::PaymentReconciliation;
use navalha_core::types::{
    ContactHandle, LoyaltyConfig, LoyaltyReward, Money, PointsRate, PointsType, Professional,
    ProfessionalId, RewardId, RewardType, ServiceId, ServiceOffering, TenantId,
};
use navalha_testing::{InMemoryLedgerStore, MockPaymentGateway, RecordingMessenger};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Navalha Booking Core: full flow ===\n");

    let store = Arc::new(InMemoryLedgerStore::new());
    let clock = Arc::new(SystemClock);
    let messenger = Arc::new(RecordingMessenger::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let config = EngineConfig::default();

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

    // Seed one barbershop: a professional, a priced service, a loyalty
    // program and a reward
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
    store.insert_professional(professional.clone()).await;
    store.insert_service(service.clone()).await;
    store
        .put_loyalty_config(LoyaltyConfig {
            tenant_id,
            enabled: true,
            points_type: PointsType::PerAmount,
            points_per_visit: 0,
            points_per_currency_unit: PointsRate::from_points(1),
            minimum_amount_for_points: Money::from_units(10),
        })
        .await;
    let reward = LoyaltyReward {
        id: RewardId::new(),
        tenant_id,
        name: "Corte grátis".to_string(),
        points_required: 45,
        reward_type: RewardType::FreeService,
        reward_value: "1 corte".to_string(),
        active: true,
    };
    store.insert_reward(reward.clone()).await;

    let contact = ContactHandle::from("+5511988887777");

    // --- Book online ---------------------------------------------------
    println!("Booking {} with {}...", service.name, professional.name);
    let appointment = lifecycle
        .create(BookingRequest {
            tenant_id,
            professional_id: professional.id,
            service_id: service.id,
            start: clock.now() + Duration::days(1),
            client_name: "Ana Souza".to_string(),
            client_contact: contact.clone(),
            note: Some("primeira visita".to_string()),
            payment: BookingPayment::Online,
        })
        .await?;
    println!(
        "  created: status={}, code={}, prepay={}",
        appointment.status,
        appointment
            .confirmation_code
            .as_ref()
            .map_or("-", |code| code.as_str()),
        appointment
            .prepaid_amount
            .map_or_else(|| "-".to_string(), |amount| amount.to_string()),
    );

    // --- Charge and settle ---------------------------------------------
    let charge = payments
        .create_charge(
            service.price,
            service.name.clone(),
            contact.clone(),
            Some(&appointment.id.to_string()),
        )
        .await?;
    payments.attach_charge(appointment.id, &charge).await?;
    println!("  charge {} created, qr: {}", charge.id, charge.qr_code);

    gateway.settle(&charge.id);
    payments.reconcile(appointment.id).await?;
    println!("  charge settled, appointment confirmed\n");

    // --- Check in with the code ----------------------------------------
    let code = appointment
        .confirmation_code
        .clone()
        .ok_or_else(|| anyhow::anyhow!("online booking must carry a code"))?;
    println!("Client arrives, submits code {code}...");
    match lifecycle.validate_check_in(appointment.id, code.as_str()).await? {
        CheckInOutcome::Completed {
            appointment,
            points_awarded,
        } => println!(
            "  completed: status={}, loyalty points awarded: {points_awarded}",
            appointment.status
        ),
        CheckInOutcome::ToleranceExpired { expired_at, .. } => {
            println!("  tolerance expired at {expired_at}, shop must decide");
        }
    }

    let balance = loyalty.balance(tenant_id, &contact).await?;
    println!(
        "  balance: {} points (earned {}, redeemed {})\n",
        balance.points, balance.total_earned, balance.total_redeemed
    );

    // --- Claim and validate a reward ------------------------------------
    println!("Claiming \"{}\" for {} points...", reward.name, reward.points_required);
    let redemption = loyalty
        .issue_redemption(tenant_id, &contact, reward.id)
        .await?;
    println!(
        "  redemption {} pending, code {} valid until {}",
        redemption.id,
        redemption.validation_code,
        redemption.expires_at.format("%d/%m %H:%M")
    );
    let (redemption, balance) = loyalty
        .validate_redemption(redemption.id, redemption.validation_code.as_str())
        .await?;
    println!(
        "  validated: status={:?}, balance now {} points\n",
        redemption.status, balance.points
    );

    // --- Refund path -----------------------------------------------------
    println!("Second booking, then the barber falls ill...");
    let second = lifecycle
        .create(BookingRequest {
            tenant_id,
            professional_id: professional.id,
            service_id: service.id,
            start: clock.now() + Duration::days(2),
            client_name: "Ana Souza".to_string(),
            client_contact: contact.clone(),
            note: None,
            payment: BookingPayment::Online,
        })
        .await?;
    let charge = payments
        .create_charge(
            service.price,
            service.name.clone(),
            contact.clone(),
            Some(&second.id.to_string()),
        )
        .await?;
    payments.attach_charge(second.id, &charge).await?;
    gateway.settle(&charge.id);
    payments.reconcile(second.id).await?;

    let refunded = payments
        .refund(&charge.id, second.id, "profissional indisponível")
        .await?;
    println!(
        "  refunded {} -> status={}, reason: {}",
        refunded
            .refund_amount
            .map_or_else(|| "-".to_string(), |amount| amount.to_string()),
        refunded.status,
        refunded.refund_reason.as_deref().unwrap_or("-"),
    );

    let double = payments.refund(&charge.id, second.id, "retry").await;
    println!(
        "  refunding again: {}\n",
        double.err().map_or_else(|| "unexpectedly succeeded".to_string(), |error| error.to_string())
    );

    // --- Messages the client received ------------------------------------
    println!("Messages sent to {contact}:");
    for message in messenger.sent() {
        println!("  - {}", message.body);
    }

    Ok(())
}
