//! Appointment lifecycle engine.
//!
//! Governs an appointment from booking to a terminal state:
//!
//! ```text
//! pending_payment -> confirmed | cancelled
//! pending         -> confirmed | cancelled
//! confirmed       -> waiting | no_show | completed | cancelled
//! waiting         -> completed | no_show
//! ```
//!
//! `completed`, `cancelled` and `no_show` are terminal.
//!
//! Online bookings carry a 4-digit confirmation code and a fixed grace
//! window after the scheduled start. Inside the window a matching code
//! completes the appointment unconditionally; past it the engine refuses
//! to decide on its own and hands the choice back to the caller
//! ([`CheckInOutcome::ToleranceExpired`]).

use crate::codes::ConfirmationCode;
use crate::config::EngineConfig;
use crate::environment::Clock;
use crate::error::{CoreResult, Error};
use crate::gateways::messaging::MessagingGateway;
use crate::loyalty::LoyaltyLedger;
use crate::store::LedgerStore;
use crate::types::{
    Appointment, AppointmentId, AppointmentStatus, ContactHandle, PaymentMethod, ProfessionalId,
    ServiceId, TenantId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Initial status of a booking settled in person
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalBookingStart {
    /// Client-made booking awaiting the shop's confirmation
    Pending,
    /// Staff-entered booking (walk-in), confirmed on the spot
    Confirmed,
}

/// How the booking will be paid, with the detail each method needs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingPayment {
    /// Prepaid through the payment gateway; the appointment starts in
    /// `pending_payment` with a confirmation code and a grace window
    Online,
    /// Settled at the shop; no code, no grace window
    Local(LocalBookingStart),
}

/// A booking request from the client wizard or the admin dashboard
#[derive(Clone, Debug)]
pub struct BookingRequest {
    /// Tenant the booking belongs to
    pub tenant_id: TenantId,
    /// Professional to book
    pub professional_id: ProfessionalId,
    /// Service to book
    pub service_id: ServiceId,
    /// Scheduled start instant
    pub start: DateTime<Utc>,
    /// Client display name
    pub client_name: String,
    /// Client contact handle
    pub client_contact: ContactHandle,
    /// Free-text note
    pub note: Option<String>,
    /// Payment arrangement
    pub payment: BookingPayment,
}

/// Result of a code-gated check-in attempt
#[derive(Debug)]
pub enum CheckInOutcome {
    /// Code matched inside the grace window; the appointment is done and
    /// loyalty accrual ran best-effort
    Completed {
        /// The appointment after the transition
        appointment: Appointment,
        /// Points the loyalty ledger actually awarded (0 when the
        /// program is off or accrual failed)
        points_awarded: u64,
    },
    /// Code matched but the grace window has passed. No state was
    /// changed; the caller must follow up with
    /// [`LifecycleEngine::resolve_late_check_in`].
    ToleranceExpired {
        /// The appointment, untouched
        appointment: Appointment,
        /// When the grace window closed
        expired_at: DateTime<Utc>,
    },
}

/// The caller's explicit choice after a [`CheckInOutcome::ToleranceExpired`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LateArrivalDecision {
    /// Keep the slot open; the appointment moves to `waiting`
    KeepWaiting,
    /// Write the client off as a no-show
    MarkNoShow,
    /// Honor the late arrival anyway; completes with accrual
    ForceComplete,
}

/// State machine driver for appointments
pub struct LifecycleEngine {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    messenger: Arc<dyn MessagingGateway>,
    loyalty: Arc<LoyaltyLedger>,
    config: EngineConfig,
}

impl LifecycleEngine {
    /// Creates a lifecycle engine over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        messenger: Arc<dyn MessagingGateway>,
        loyalty: Arc<LoyaltyLedger>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            messenger,
            loyalty,
            config,
        }
    }

    /// Books an appointment.
    ///
    /// Online bookings start in `pending_payment` with a generated
    /// confirmation code, a grace window of `start + tolerance`, and the
    /// service's catalog price recorded as the amount to prepay; the code
    /// is texted to the client best-effort. Local bookings start in
    /// `pending` or `confirmed` per the request, with none of that.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when the professional or service does not
    /// belong to the tenant, or the start instant is in the past.
    pub async fn create(&self, request: BookingRequest) -> CoreResult<Appointment> {
        let now = self.clock.now();
        if request.start < now {
            return Err(Error::Validation(
                "appointment start is in the past".to_string(),
            ));
        }
        if self
            .store
            .professional(request.tenant_id, request.professional_id)
            .await?
            .is_none()
        {
            return Err(Error::Validation(
                "professional does not belong to this tenant".to_string(),
            ));
        }
        let Some(service) = self
            .store
            .service(request.tenant_id, request.service_id)
            .await?
        else {
            return Err(Error::Validation(
                "service does not belong to this tenant".to_string(),
            ));
        };

        let (status, payment_method) = match request.payment {
            BookingPayment::Online => (AppointmentStatus::PendingPayment, PaymentMethod::Online),
            BookingPayment::Local(LocalBookingStart::Pending) => {
                (AppointmentStatus::Pending, PaymentMethod::Local)
            }
            BookingPayment::Local(LocalBookingStart::Confirmed) => {
                (AppointmentStatus::Confirmed, PaymentMethod::Local)
            }
        };
        let online = payment_method == PaymentMethod::Online;

        let appointment = Appointment {
            id: AppointmentId::new(),
            tenant_id: request.tenant_id,
            professional_id: request.professional_id,
            service_id: request.service_id,
            start: request.start,
            client_name: request.client_name,
            client_contact: request.client_contact,
            note: request.note,
            status,
            confirmation_code: online
                .then(|| ConfirmationCode::generate(&mut rand::thread_rng())),
            tolerance_expires_at: online.then(|| request.start + self.config.tolerance),
            payment_method,
            pix_payment_id: None,
            prepaid_amount: online.then_some(service.price),
            refunded: false,
            refunded_at: None,
            refund_amount: None,
            refund_reason: None,
            loyalty_accrued_at: None,
            created_at: now,
        };
        self.store.insert_appointment(appointment.clone()).await?;

        tracing::info!(
            appointment_id = %appointment.id,
            tenant_id = %appointment.tenant_id,
            status = %appointment.status,
            start = %appointment.start,
            "appointment created"
        );

        if let Some(code) = &appointment.confirmation_code {
            let body = format!(
                "Seu agendamento está reservado. Código de check-in: {code}."
            );
            if let Err(error) = self
                .messenger
                .send_text(appointment.tenant_id, &appointment.client_contact, &body)
                .await
            {
                tracing::warn!(
                    appointment_id = %appointment.id,
                    %error,
                    "failed to send confirmation code, operator must relay it"
                );
            }
        }

        Ok(appointment)
    }

    /// Validates a client-submitted confirmation code at the shop.
    ///
    /// A matching code inside the grace window completes the appointment
    /// and triggers loyalty accrual best-effort. Past the window the
    /// engine changes nothing and returns
    /// [`CheckInOutcome::ToleranceExpired`] - keeping waiting, writing
    /// off the no-show, or force-completing is the caller's call.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::Validation`] when the appointment has no confirmation
    ///   code (local booking)
    /// - [`Error::InvalidTransition`] when the appointment is not in a
    ///   checkable status (`confirmed` or `waiting`)
    /// - [`Error::InvalidCode`] on mismatch; no state change
    pub async fn validate_check_in(
        &self,
        appointment_id: AppointmentId,
        submitted_code: &str,
    ) -> CoreResult<CheckInOutcome> {
        let appointment = self.load(appointment_id).await?;
        let Some(code) = appointment.confirmation_code.clone() else {
            return Err(Error::Validation(
                "appointment has no confirmation code".to_string(),
            ));
        };
        if !matches!(
            appointment.status,
            AppointmentStatus::Confirmed | AppointmentStatus::Waiting
        ) {
            return Err(Error::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Completed,
            });
        }
        if !code.matches(submitted_code) {
            tracing::debug!(appointment_id = %appointment.id, "check-in code mismatch");
            return Err(Error::InvalidCode);
        }

        let now = self.clock.now();
        if appointment.tolerance_expired(now) {
            // Deliberately undecided: the shop knows whether the chair is
            // still free, the engine does not.
            let expired_at = appointment.tolerance_expires_at.unwrap_or(now);
            tracing::info!(
                appointment_id = %appointment.id,
                %expired_at,
                "check-in after tolerance window, awaiting caller decision"
            );
            return Ok(CheckInOutcome::ToleranceExpired {
                appointment,
                expired_at,
            });
        }

        let (appointment, points_awarded) = self.complete(appointment, now).await?;
        Ok(CheckInOutcome::Completed {
            appointment,
            points_awarded,
        })
    }

    /// Applies the caller's decision after a late check-in.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::InvalidTransition`] when the appointment is not in
    ///   `confirmed` or `waiting`
    pub async fn resolve_late_check_in(
        &self,
        appointment_id: AppointmentId,
        decision: LateArrivalDecision,
    ) -> CoreResult<Appointment> {
        let appointment = self.load(appointment_id).await?;
        if !matches!(
            appointment.status,
            AppointmentStatus::Confirmed | AppointmentStatus::Waiting
        ) {
            return Err(Error::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Waiting,
            });
        }

        match decision {
            LateArrivalDecision::KeepWaiting => {
                if appointment.status == AppointmentStatus::Waiting {
                    return Ok(appointment);
                }
                self.transition(appointment, AppointmentStatus::Waiting).await
            }
            LateArrivalDecision::MarkNoShow => {
                self.transition(appointment, AppointmentStatus::NoShow).await
            }
            LateArrivalDecision::ForceComplete => {
                let now = self.clock.now();
                let (appointment, _) = self.complete(appointment, now).await?;
                Ok(appointment)
            }
        }
    }

    /// Moves an appointment to `new_status` directly, for flows that are
    /// not code-gated (the admin dashboard's "mark complete", manual
    /// cancellation, ...). A transition into `completed` runs loyalty
    /// accrual, guarded so a repeat cannot double-award.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::InvalidTransition`] when the state machine forbids it
    pub async fn update_status(
        &self,
        appointment_id: AppointmentId,
        new_status: AppointmentStatus,
    ) -> CoreResult<Appointment> {
        let appointment = self.load(appointment_id).await?;
        if new_status == AppointmentStatus::Completed {
            let now = self.clock.now();
            let (appointment, _) = self.complete(appointment, now).await?;
            return Ok(appointment);
        }
        self.transition(appointment, new_status).await
    }

    /// Accepts a local `pending` booking - the admin "confirm" action.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::InvalidTransition`] unless the appointment is `pending`
    pub async fn confirm_booking(&self, appointment_id: AppointmentId) -> CoreResult<Appointment> {
        let appointment = self.load(appointment_id).await?;
        if appointment.status != AppointmentStatus::Pending {
            return Err(Error::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Confirmed,
            });
        }
        self.transition(appointment, AppointmentStatus::Confirmed).await
    }

    /// Cancels an appointment where the machine allows it. Refund-driven
    /// cancellation lives in the reconciliation unit; this is the plain
    /// "call it off" path and does not touch payment fields.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::InvalidTransition`] when the state machine forbids it
    pub async fn cancel(
        &self,
        appointment_id: AppointmentId,
        reason: &str,
    ) -> CoreResult<Appointment> {
        let appointment = self.load(appointment_id).await?;
        let appointment = self
            .transition(appointment, AppointmentStatus::Cancelled)
            .await?;
        tracing::info!(
            appointment_id = %appointment.id,
            reason,
            "appointment cancelled"
        );
        Ok(appointment)
    }

    async fn load(&self, appointment_id: AppointmentId) -> CoreResult<Appointment> {
        self.store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "appointment",
                id: appointment_id.to_string(),
            })
    }

    async fn transition(
        &self,
        mut appointment: Appointment,
        new_status: AppointmentStatus,
    ) -> CoreResult<Appointment> {
        if !appointment.status.can_transition_to(new_status) {
            return Err(Error::InvalidTransition {
                from: appointment.status,
                to: new_status,
            });
        }
        let from = appointment.status;
        appointment.status = new_status;
        self.store.update_appointment(appointment.clone()).await?;
        tracing::info!(
            appointment_id = %appointment.id,
            %from,
            to = %new_status,
            "appointment status changed"
        );
        Ok(appointment)
    }

    /// Completes an appointment and runs accrual at most once.
    ///
    /// The accrual marker is written in the same row update as the
    /// status, so a replayed completion finds it set and skips the
    /// ledger. Accrual failure is logged and swallowed - completion is
    /// the primary effect, points are secondary.
    async fn complete(
        &self,
        appointment: Appointment,
        now: DateTime<Utc>,
    ) -> CoreResult<(Appointment, u64)> {
        let first_accrual = appointment.loyalty_accrued_at.is_none();
        let mut appointment = appointment;
        if first_accrual {
            appointment.loyalty_accrued_at = Some(now);
        }
        let appointment = self
            .transition(appointment, AppointmentStatus::Completed)
            .await?;

        if !first_accrual {
            return Ok((appointment, 0));
        }

        let points_awarded = match self
            .store
            .service(appointment.tenant_id, appointment.service_id)
            .await
        {
            Ok(Some(service)) => {
                match self
                    .loyalty
                    .accrue_on_completion(
                        appointment.tenant_id,
                        &appointment.client_contact,
                        service.price,
                    )
                    .await
                {
                    Ok(points) => points,
                    Err(error) => {
                        tracing::warn!(
                            appointment_id = %appointment.id,
                            %error,
                            "loyalty accrual failed after completion"
                        );
                        0
                    }
                }
            }
            Ok(None) => {
                tracing::warn!(
                    appointment_id = %appointment.id,
                    service_id = %appointment.service_id,
                    "service missing from catalog, skipping accrual"
                );
                0
            }
            Err(error) => {
                tracing::warn!(
                    appointment_id = %appointment.id,
                    %error,
                    "service lookup failed, skipping accrual"
                );
                0
            }
        };

        Ok((appointment, points_awarded))
    }
}
