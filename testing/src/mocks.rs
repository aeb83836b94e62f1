//! Mock implementations of the core's injected dependencies.

use chrono::{DateTime, Duration, Utc};
use navalha_core::environment::Clock;
use navalha_core::gateways::messaging::{MessagingError, MessagingGateway};
use navalha_core::gateways::payment::{
    Charge, ChargeId, ChargeStatus, GatewayResult, IdempotencyKey, NewCharge, PaymentGateway,
    PaymentGatewayError, RefundReceipt, RefundStatus,
};
use navalha_core::types::{ContactHandle, Money, TenantId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Movable fixed clock for deterministic tests.
///
/// Starts at a given instant and only moves when a test says so -
/// `advance` is how tolerance-window and redemption-expiry scenarios
/// step past their deadlines.
#[derive(Debug)]
pub struct FixedClock {
    time: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock frozen at `time`
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    /// Moves the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time += delta;
    }

    /// Jumps the clock to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
///
/// # Panics
///
/// This function will panic if the hardcoded timestamp fails to parse,
/// which should never happen in practice.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

struct StoredCharge {
    charge: Charge,
    amount: Money,
}

#[derive(Default)]
struct GatewayState {
    charges: HashMap<ChargeId, StoredCharge>,
    charges_by_key: HashMap<String, ChargeId>,
    refunds_by_key: HashMap<String, RefundReceipt>,
    fail_next: Option<String>,
    refund_calls: u32,
}

/// Scriptable mock payment gateway.
///
/// Charges start `Pending`; tests drive settlement with [`Self::settle`]
/// or [`Self::expire`]. Requests are deduplicated by idempotency key the
/// way a real provider would, and [`Self::fail_next_call`] scripts a
/// one-shot provider outage.
#[derive(Default)]
pub struct MockPaymentGateway {
    state: Mutex<GatewayState>,
}

impl MockPaymentGateway {
    /// Creates an empty mock gateway
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a charge as settled (the payer paid)
    pub fn settle(&self, charge_id: &ChargeId) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stored) = state.charges.get_mut(charge_id) {
            stored.charge.status = ChargeStatus::Settled;
        }
    }

    /// Marks a charge as expired (the payment window closed)
    pub fn expire(&self, charge_id: &ChargeId) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stored) = state.charges.get_mut(charge_id) {
            stored.charge.status = ChargeStatus::Expired;
        }
    }

    /// Scripts the next gateway call to fail with `reason`
    pub fn fail_next_call(&self, reason: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.fail_next = Some(reason.to_string());
    }

    /// Number of refund calls that actually reached the provider
    /// (deduplicated retries do not count)
    #[must_use]
    pub fn refund_calls(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refund_calls
    }

    fn take_scripted_failure(state: &mut GatewayState) -> Option<PaymentGatewayError> {
        state
            .fail_next
            .take()
            .map(PaymentGatewayError::Unavailable)
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_charge(
        &self,
        request: NewCharge,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Charge>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(error) = Self::take_scripted_failure(&mut state) {
                return Err(error);
            }

            let key = request.idempotency_key.as_str().to_string();
            if let Some(existing_id) = state.charges_by_key.get(&key) {
                let existing_id = existing_id.clone();
                if let Some(stored) = state.charges.get(&existing_id) {
                    return Ok(stored.charge.clone());
                }
            }

            let id = ChargeId::new(format!("mock_pix_{}", Uuid::new_v4()));
            let charge = Charge {
                id: id.clone(),
                status: ChargeStatus::Pending,
                qr_code: format!("pix-qr-{id}"),
            };
            tracing::info!(
                charge_id = %id,
                amount = request.amount.cents(),
                "mock charge created"
            );
            state.charges.insert(
                id.clone(),
                StoredCharge {
                    charge: charge.clone(),
                    amount: request.amount,
                },
            );
            state.charges_by_key.insert(key, id);
            Ok(charge)
        })
    }

    fn charge_status(
        &self,
        charge_id: &ChargeId,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<ChargeStatus>> + Send + '_>> {
        let charge_id = charge_id.clone();
        Box::pin(async move {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(error) = Self::take_scripted_failure(&mut state) {
                return Err(error);
            }
            state
                .charges
                .get(&charge_id)
                .map(|stored| stored.charge.status)
                .ok_or_else(|| PaymentGatewayError::UnknownCharge(charge_id.to_string()))
        })
    }

    fn refund(
        &self,
        charge_id: &ChargeId,
        amount: Money,
        idempotency_key: IdempotencyKey,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<RefundReceipt>> + Send + '_>> {
        let charge_id = charge_id.clone();
        Box::pin(async move {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(error) = Self::take_scripted_failure(&mut state) {
                return Err(error);
            }

            let key = idempotency_key.as_str().to_string();
            if let Some(receipt) = state.refunds_by_key.get(&key) {
                return Ok(receipt.clone());
            }

            let Some(stored) = state.charges.get_mut(&charge_id) else {
                return Err(PaymentGatewayError::UnknownCharge(charge_id.to_string()));
            };
            if amount > stored.amount {
                return Err(PaymentGatewayError::Rejected {
                    reason: format!(
                        "refund of {amount} exceeds charged amount {}",
                        stored.amount
                    ),
                });
            }
            stored.charge.status = ChargeStatus::Refunded;

            let receipt = RefundReceipt {
                refund_id: format!("mock_refund_{}", Uuid::new_v4()),
                status: RefundStatus::Completed,
            };
            tracing::info!(
                charge_id = %charge_id,
                refund_id = %receipt.refund_id,
                "mock refund processed"
            );
            state.refunds_by_key.insert(key, receipt.clone());
            state.refund_calls += 1;
            Ok(receipt)
        })
    }
}

/// A message captured by [`RecordingMessenger`]
#[derive(Clone, Debug)]
pub struct SentMessage {
    /// Tenant channel the message went through
    pub tenant_id: TenantId,
    /// Recipient handle
    pub destination: ContactHandle,
    /// Message body
    pub body: String,
}

/// Messaging gateway that records every message instead of sending it.
///
/// Flip [`Self::fail_deliveries`] to script provider failures and assert
/// that the engines swallow them.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl RecordingMessenger {
    /// Creates a messenger with an empty outbox
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail (or succeed again)
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns a copy of every recorded message, in send order
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MessagingGateway for RecordingMessenger {
    fn send_text(
        &self,
        tenant_id: TenantId,
        destination: &ContactHandle,
        body: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), MessagingError>> + Send + '_>> {
        let destination = destination.clone();
        let body = body.to_string();
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(MessagingError("scripted delivery failure".to_string()));
            }
            let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
            sent.push(SentMessage {
                tenant_id,
                destination,
                body,
            });
            Ok(())
        })
    }
}
