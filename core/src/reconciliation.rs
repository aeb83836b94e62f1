//! Payment reconciliation unit.
//!
//! Bridges the payment gateway's authoritative view of a charge to
//! appointment state, and executes refunds with a hard guard against
//! paying a client back twice.
//!
//! The ordering rule for refunds is absolute: local state changes only
//! after the gateway confirms the reversal. A gateway failure leaves the
//! appointment untouched and the caller retries - there is no partial
//! refund state to clean up, and the idempotency key (derived from the
//! appointment id) makes the retry safe on the provider side.

use crate::environment::Clock;
use crate::error::{CoreResult, Error};
use crate::gateways::payment::{
    Charge, ChargeId, ChargeStatus, IdempotencyKey, NewCharge, PaymentGateway,
};
use crate::store::LedgerStore;
use crate::types::{Appointment, AppointmentId, AppointmentStatus, ContactHandle, Money};
use std::sync::Arc;

/// Result of a [`PaymentReconciliation::reconcile`] pass
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The charge settled and the appointment moved to `confirmed`
    Confirmed(Appointment),
    /// Nothing changed; the charge is in the reported state
    Unchanged {
        /// Status the gateway reported
        charge_status: ChargeStatus,
    },
}

/// Gateway-to-appointment bridge and refund executor
pub struct PaymentReconciliation {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl PaymentReconciliation {
    /// Creates a reconciliation unit over the given collaborators
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            store,
            clock,
        }
    }

    /// Creates a charge with the gateway and returns it (id, status,
    /// scannable artifact). No appointment is touched here - the booking
    /// flow calls [`Self::attach_charge`] with the result.
    ///
    /// The idempotency key is derived from `external_reference` when the
    /// caller has one (the appointment id in practice), so a retried
    /// request reuses the key and can never double-charge; without a
    /// reference a time+random key is generated.
    ///
    /// # Errors
    ///
    /// [`Error::Gateway`] when the provider rejects the charge or cannot
    /// be reached.
    pub async fn create_charge(
        &self,
        amount: Money,
        description: String,
        payer_contact: ContactHandle,
        external_reference: Option<&str>,
    ) -> CoreResult<Charge> {
        let idempotency_key = match external_reference {
            Some(reference) => IdempotencyKey::from_reference(reference),
            None => IdempotencyKey::random(self.clock.now(), &mut rand::thread_rng()),
        };
        let charge = self
            .gateway
            .create_charge(NewCharge {
                amount,
                description,
                payer_contact,
                idempotency_key,
            })
            .await?;
        tracing::info!(
            charge_id = %charge.id,
            %amount,
            "charge created"
        );
        Ok(charge)
    }

    /// Records a freshly created charge on its `pending_payment`
    /// appointment.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::Validation`] when the appointment is not an online
    ///   booking awaiting payment, or already has a charge attached
    pub async fn attach_charge(
        &self,
        appointment_id: AppointmentId,
        charge: &Charge,
    ) -> CoreResult<Appointment> {
        let mut appointment = self.load(appointment_id).await?;
        if appointment.status != AppointmentStatus::PendingPayment {
            return Err(Error::Validation(
                "appointment is not awaiting payment".to_string(),
            ));
        }
        if appointment.pix_payment_id.is_some() {
            return Err(Error::Validation(
                "appointment already has a charge attached".to_string(),
            ));
        }
        appointment.pix_payment_id = Some(charge.id.clone());
        self.store.update_appointment(appointment.clone()).await?;
        tracing::info!(
            appointment_id = %appointment.id,
            charge_id = %charge.id,
            "charge attached to appointment"
        );
        Ok(appointment)
    }

    /// Reads a charge's settlement status from the gateway. Purely a
    /// read; the caller decides whether to act on it.
    ///
    /// # Errors
    ///
    /// [`Error::Gateway`] when the provider cannot answer.
    pub async fn check_status(&self, charge_id: &ChargeId) -> CoreResult<ChargeStatus> {
        Ok(self.gateway.charge_status(charge_id).await?)
    }

    /// Reconciles an appointment with its charge: when the gateway
    /// reports the charge settled and the appointment still awaits
    /// payment, the appointment moves to `confirmed`. Every other
    /// combination changes nothing and reports the gateway's status.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::Validation`] when no charge is attached
    /// - [`Error::Gateway`] when the provider cannot answer
    pub async fn reconcile(&self, appointment_id: AppointmentId) -> CoreResult<ReconcileOutcome> {
        let mut appointment = self.load(appointment_id).await?;
        let Some(charge_id) = appointment.pix_payment_id.clone() else {
            return Err(Error::Validation(
                "appointment has no charge to reconcile".to_string(),
            ));
        };

        let charge_status = self.gateway.charge_status(&charge_id).await?;
        if charge_status == ChargeStatus::Settled
            && appointment.status == AppointmentStatus::PendingPayment
        {
            appointment.status = AppointmentStatus::Confirmed;
            self.store.update_appointment(appointment.clone()).await?;
            tracing::info!(
                appointment_id = %appointment.id,
                charge_id = %charge_id,
                "prepayment settled, appointment confirmed"
            );
            return Ok(ReconcileOutcome::Confirmed(appointment));
        }

        Ok(ReconcileOutcome::Unchanged { charge_status })
    }

    /// Refunds an appointment's prepayment in full and cancels it.
    ///
    /// Guards run before the gateway is involved: a refunded appointment
    /// can never be refunded again, and the submitted charge id must be
    /// the one recorded on the appointment. The gateway refund is always
    /// for exactly the prepaid amount - partial refunds do not exist in
    /// this flow. Only after the gateway confirms does one row update
    /// set the refund fields and the `cancelled` status; a settled
    /// refund cancels the appointment regardless of where the machine
    /// left it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the appointment does not exist
    /// - [`Error::AlreadyRefunded`] on a second refund attempt
    /// - [`Error::PaymentMismatch`] when `charge_id` is not the
    ///   appointment's recorded charge
    /// - [`Error::Validation`] when no prepayment was recorded
    /// - [`Error::Gateway`] when the provider fails; local state is left
    ///   untouched and the caller may retry
    pub async fn refund(
        &self,
        charge_id: &ChargeId,
        appointment_id: AppointmentId,
        reason: &str,
    ) -> CoreResult<Appointment> {
        let mut appointment = self.load(appointment_id).await?;
        if appointment.refunded {
            return Err(Error::AlreadyRefunded { appointment_id });
        }
        if appointment.pix_payment_id.as_ref() != Some(charge_id) {
            return Err(Error::PaymentMismatch);
        }
        let Some(amount) = appointment.prepaid_amount else {
            return Err(Error::Validation(
                "appointment has no recorded prepayment".to_string(),
            ));
        };

        let idempotency_key =
            IdempotencyKey::from_reference(&format!("refund-{appointment_id}"));
        let receipt = self
            .gateway
            .refund(charge_id, amount, idempotency_key)
            .await?;

        let now = self.clock.now();
        appointment.refunded = true;
        appointment.refunded_at = Some(now);
        appointment.refund_amount = Some(amount);
        appointment.refund_reason = Some(reason.to_string());
        appointment.status = AppointmentStatus::Cancelled;
        self.store.update_appointment(appointment.clone()).await?;

        tracing::info!(
            appointment_id = %appointment.id,
            charge_id = %charge_id,
            refund_id = %receipt.refund_id,
            %amount,
            "prepayment refunded, appointment cancelled"
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
}
