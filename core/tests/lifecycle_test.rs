//! Appointment lifecycle tests.
//!
//! Covers booking creation for both payment methods, the code-gated
//! check-in with its grace window, late-arrival resolution, and the
//! direct status-transition paths.
//!
//! Run with: `cargo test --test lifecycle_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use chrono::{Duration, TimeZone, Utc};
use navalha_core::environment::Clock;
use navalha_core::error::Error;
use navalha_core::lifecycle::{CheckInOutcome, LateArrivalDecision, LocalBookingStart};
use navalha_core::store::LedgerStore;
use navalha_core::types::AppointmentStatus;
use navalha_testing::Harness;

#[tokio::test]
async fn online_booking_gets_code_tolerance_and_price() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    let start = harness.tomorrow_at_ten();

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(start))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::PendingPayment);
    let code = appointment.confirmation_code.as_ref().unwrap();
    assert_eq!(code.as_str().len(), 4);
    assert_eq!(
        appointment.tolerance_expires_at,
        Some(start + Duration::minutes(10))
    );
    assert_eq!(appointment.prepaid_amount, Some(shop.service.price));
    assert!(!appointment.refunded);
}

#[tokio::test]
async fn online_booking_texts_the_confirmation_code() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(harness.tomorrow_at_ten()))
        .await
        .unwrap();

    let sent = harness.messenger.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, shop.contact);
    assert!(
        sent[0]
            .body
            .contains(appointment.confirmation_code.unwrap().as_str())
    );
}

#[tokio::test]
async fn messaging_failure_does_not_fail_the_booking() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    harness.messenger.fail_deliveries(true);

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(harness.tomorrow_at_ten()))
        .await
        .unwrap();

    assert!(harness.messenger.sent().is_empty());
    let stored = harness
        .store
        .appointment(appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::PendingPayment);
}

#[tokio::test]
async fn local_booking_has_no_code_and_no_tolerance() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let pending = harness
        .lifecycle
        .create(shop.local_booking(harness.tomorrow_at_ten(), LocalBookingStart::Pending))
        .await
        .unwrap();
    assert_eq!(pending.status, AppointmentStatus::Pending);
    assert!(pending.confirmation_code.is_none());
    assert!(pending.tolerance_expires_at.is_none());
    assert!(pending.prepaid_amount.is_none());

    let walk_in = harness
        .lifecycle
        .create(shop.local_booking(harness.tomorrow_at_ten(), LocalBookingStart::Confirmed))
        .await
        .unwrap();
    assert_eq!(walk_in.status, AppointmentStatus::Confirmed);
    assert!(harness.messenger.sent().is_empty());
}

#[tokio::test]
async fn create_rejects_past_start_and_foreign_references() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let past = harness.clock.now() - Duration::hours(1);
    let result = harness.lifecycle.create(shop.online_booking(past)).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    // A professional from another tenant must be invisible here
    let other_shop = harness.seed_shop().await;
    let mut request = shop.online_booking(harness.tomorrow_at_ten());
    request.professional_id = other_shop.professional.id;
    let result = harness.lifecycle.create(request).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let mut request = shop.online_booking(harness.tomorrow_at_ten());
    request.service_id = other_shop.service.id;
    let result = harness.lifecycle.create(request).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

/// The boundary case: start 10:00, tolerance ends 10:10.
/// A correct code at 10:09 completes; at 10:11 the engine refuses to
/// decide and leaves the status alone.
#[tokio::test]
async fn check_in_honors_the_tolerance_boundary() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
    harness.clock.set(start - Duration::days(1));

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(start))
        .await
        .unwrap();
    assert_eq!(
        appointment.tolerance_expires_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 15, 10, 10, 0).unwrap())
    );
    let code = appointment.confirmation_code.clone().unwrap();

    let charge = harness
        .payments
        .create_charge(
            shop.service.price,
            "Corte degradê".to_string(),
            shop.contact.clone(),
            Some(&appointment.id.to_string()),
        )
        .await
        .unwrap();
    harness
        .payments
        .attach_charge(appointment.id, &charge)
        .await
        .unwrap();
    harness.gateway.settle(&charge.id);
    harness.payments.reconcile(appointment.id).await.unwrap();

    // 10:09 - inside the window
    harness
        .clock
        .set(Utc.with_ymd_and_hms(2025, 1, 15, 10, 9, 0).unwrap());
    let outcome = harness
        .lifecycle
        .validate_check_in(appointment.id, code.as_str())
        .await
        .unwrap();
    match outcome {
        CheckInOutcome::Completed { appointment, .. } => {
            assert_eq!(appointment.status, AppointmentStatus::Completed);
        }
        CheckInOutcome::ToleranceExpired { .. } => panic!("check-in at 10:09 must complete"),
    }
}

#[tokio::test]
async fn late_check_in_returns_tolerance_expired_without_state_change() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
    harness.clock.set(start - Duration::days(1));

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(start))
        .await
        .unwrap();
    let code = appointment.confirmation_code.clone().unwrap();
    harness
        .lifecycle
        .update_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    // 10:11 - one minute past the window
    harness
        .clock
        .set(Utc.with_ymd_and_hms(2025, 1, 15, 10, 11, 0).unwrap());
    let outcome = harness
        .lifecycle
        .validate_check_in(appointment.id, code.as_str())
        .await
        .unwrap();
    match outcome {
        CheckInOutcome::ToleranceExpired { expired_at, .. } => {
            assert_eq!(
                expired_at,
                Utc.with_ymd_and_hms(2025, 1, 15, 10, 10, 0).unwrap()
            );
        }
        CheckInOutcome::Completed { .. } => panic!("check-in at 10:11 must not auto-complete"),
    }

    let stored = harness
        .store
        .appointment(appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn late_arrival_decisions_cover_all_three_paths() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();

    for (decision, expected) in [
        (LateArrivalDecision::KeepWaiting, AppointmentStatus::Waiting),
        (LateArrivalDecision::MarkNoShow, AppointmentStatus::NoShow),
        (
            LateArrivalDecision::ForceComplete,
            AppointmentStatus::Completed,
        ),
    ] {
        harness.clock.set(start - Duration::days(1));
        let appointment = harness
            .lifecycle
            .create(shop.online_booking(start))
            .await
            .unwrap();
        harness
            .lifecycle
            .update_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();
        harness.clock.set(start + Duration::minutes(25));

        let resolved = harness
            .lifecycle
            .resolve_late_check_in(appointment.id, decision)
            .await
            .unwrap();
        assert_eq!(resolved.status, expected, "decision {decision:?}");
    }
}

#[tokio::test]
async fn wrong_code_is_rejected_without_state_change() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(harness.tomorrow_at_ten()))
        .await
        .unwrap();
    let code = appointment.confirmation_code.clone().unwrap();
    harness
        .lifecycle
        .update_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    // Pick a wrong code that still has valid shape
    let wrong = if code.as_str() == "0000" { "0001" } else { "0000" };
    let result = harness
        .lifecycle
        .validate_check_in(appointment.id, wrong)
        .await;
    assert!(matches!(result, Err(Error::InvalidCode)));

    let stored = harness
        .store
        .appointment(appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn check_in_on_a_local_booking_is_a_validation_error() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let appointment = harness
        .lifecycle
        .create(shop.local_booking(harness.tomorrow_at_ten(), LocalBookingStart::Confirmed))
        .await
        .unwrap();

    let result = harness
        .lifecycle
        .validate_check_in(appointment.id, "1234")
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn completion_accrues_points_exactly_once() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    harness.enable_per_visit(shop.tenant_id, 10).await;

    let appointment = harness
        .lifecycle
        .create(shop.local_booking(harness.tomorrow_at_ten(), LocalBookingStart::Confirmed))
        .await
        .unwrap();

    let completed = harness
        .lifecycle
        .update_status(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    assert!(completed.loyalty_accrued_at.is_some());

    let balance = harness
        .loyalty
        .balance(shop.tenant_id, &shop.contact)
        .await
        .unwrap();
    assert_eq!(balance.points, 10);
    assert_eq!(balance.total_earned, 10);

    // A replayed completion is rejected by the machine and the ledger
    // keeps its single award
    let replay = harness
        .lifecycle
        .update_status(appointment.id, AppointmentStatus::Completed)
        .await;
    assert!(matches!(replay, Err(Error::InvalidTransition { .. })));
    let balance = harness
        .loyalty
        .balance(shop.tenant_id, &shop.contact)
        .await
        .unwrap();
    assert_eq!(balance.points, 10);
}

#[tokio::test]
async fn in_window_check_in_completes_and_accrues() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    harness.enable_per_visit(shop.tenant_id, 10).await;
    let start = harness.tomorrow_at_ten();

    let appointment = harness
        .lifecycle
        .create(shop.online_booking(start))
        .await
        .unwrap();
    let code = appointment.confirmation_code.clone().unwrap();
    harness
        .lifecycle
        .update_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    harness.clock.set(start + Duration::minutes(5));
    let outcome = harness
        .lifecycle
        .validate_check_in(appointment.id, code.as_str())
        .await
        .unwrap();

    match outcome {
        CheckInOutcome::Completed {
            appointment,
            points_awarded,
        } => {
            assert_eq!(appointment.status, AppointmentStatus::Completed);
            assert_eq!(points_awarded, 10);
        }
        CheckInOutcome::ToleranceExpired { .. } => panic!("in-window check-in must complete"),
    }
}

#[tokio::test]
async fn confirm_booking_accepts_only_pending() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let appointment = harness
        .lifecycle
        .create(shop.local_booking(harness.tomorrow_at_ten(), LocalBookingStart::Pending))
        .await
        .unwrap();

    let confirmed = harness
        .lifecycle
        .confirm_booking(appointment.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let again = harness.lifecycle.confirm_booking(appointment.id).await;
    assert!(matches!(again, Err(Error::InvalidTransition { .. })));
}

#[tokio::test]
async fn terminal_statuses_reject_all_transitions() {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;

    let appointment = harness
        .lifecycle
        .create(shop.local_booking(harness.tomorrow_at_ten(), LocalBookingStart::Confirmed))
        .await
        .unwrap();
    harness
        .lifecycle
        .cancel(appointment.id, "client asked")
        .await
        .unwrap();

    for target in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::Waiting,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
    ] {
        let result = harness.lifecycle.update_status(appointment.id, target).await;
        assert!(
            matches!(result, Err(Error::InvalidTransition { .. })),
            "cancelled -> {target} must be rejected"
        );
    }
}

#[tokio::test]
async fn update_status_rejects_unknown_appointments() {
    let harness = Harness::new();
    let result = harness
        .lifecycle
        .update_status(
            navalha_core::types::AppointmentId::new(),
            AppointmentStatus::Confirmed,
        )
        .await;
    assert!(matches!(result, Err(Error::NotFound { .. })));
}
