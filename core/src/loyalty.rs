//! Loyalty ledger.
//!
//! Point accrual on completed services, balance reads, and the redemption
//! flow: issue a time-boxed 6-digit code, validate it in person, cancel a
//! claim that was never presented.
//!
//! Points are deducted from the balance only when a redemption code is
//! validated - never at issuance. An abandoned or cancelled claim
//! therefore needs no compensating ledger write, which keeps cancellation
//! trivially safe. The flip side: the balance check at issuance is
//! advisory, and the clamp in the store's debit keeps a raced balance
//! from going negative.

use crate::codes::ValidationCode;
use crate::config::EngineConfig;
use crate::environment::Clock;
use crate::error::{CoreResult, Error};
use crate::gateways::messaging::MessagingGateway;
use crate::store::LedgerStore;
use crate::types::{
    ContactHandle, LoyaltyBalance, Money, PointsType, Redemption, RedemptionId, RedemptionStatus,
    RewardId, TenantId,
};
use std::sync::Arc;

/// Accrual rules, balance maintenance and redemption issuance/validation
pub struct LoyaltyLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    messenger: Arc<dyn MessagingGateway>,
    config: EngineConfig,
}

impl LoyaltyLedger {
    /// Creates a loyalty ledger over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        messenger: Arc<dyn MessagingGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            messenger,
            config,
        }
    }

    /// Awards points for a completed service and returns how many were
    /// actually awarded. Zero is a normal outcome: program disabled,
    /// tenant unconfigured, or the price below the accrual minimum.
    ///
    /// The tenant's configuration is fetched fresh on every call - a
    /// config change applies to the next completion, with no cache to
    /// invalidate.
    ///
    /// # Errors
    ///
    /// Returns a store error when the configuration lookup or the credit
    /// fails. Callers completing an appointment treat that as
    /// best-effort and must not fail the completion.
    pub async fn accrue_on_completion(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
        service_price: Money,
    ) -> CoreResult<u64> {
        let Some(config) = self.store.loyalty_config(tenant_id).await? else {
            tracing::debug!(%tenant_id, "no loyalty config, skipping accrual");
            return Ok(0);
        };
        if !config.enabled {
            tracing::debug!(%tenant_id, "loyalty program disabled, skipping accrual");
            return Ok(0);
        }

        let awarded = match config.points_type {
            PointsType::PerVisit => u64::from(config.points_per_visit),
            PointsType::PerAmount => {
                if service_price >= config.minimum_amount_for_points {
                    config.points_per_currency_unit.points_for(service_price)
                } else {
                    0
                }
            }
        };

        if awarded == 0 {
            return Ok(0);
        }

        let balance = self.store.credit_points(tenant_id, contact, awarded).await?;
        tracing::info!(
            %tenant_id,
            contact = %contact,
            points = awarded,
            balance = balance.points,
            "loyalty points accrued"
        );
        Ok(awarded)
    }

    /// Reads a client's balance; clients without ledger history get the
    /// zero balance.
    ///
    /// # Errors
    ///
    /// Returns a store error when the lookup fails.
    pub async fn balance(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
    ) -> CoreResult<LoyaltyBalance> {
        Ok(self
            .store
            .balance(tenant_id, contact)
            .await?
            .unwrap_or_else(|| LoyaltyBalance::empty(tenant_id, contact.clone())))
    }

    /// Issues a redemption claim against a reward.
    ///
    /// Creates a `Pending` redemption with a fresh 6-digit code and a
    /// validation deadline. Points are **not** deducted here; they move
    /// when the code is validated. The code is texted to the client
    /// best-effort - a delivery failure is logged and the claim stands,
    /// so an operator can relay the code manually.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the reward does not exist in this tenant
    /// - [`Error::Validation`] when the reward is inactive
    /// - [`Error::InsufficientPoints`] when the balance cannot cover it
    pub async fn issue_redemption(
        &self,
        tenant_id: TenantId,
        contact: &ContactHandle,
        reward_id: RewardId,
    ) -> CoreResult<Redemption> {
        let reward = self
            .store
            .reward(tenant_id, reward_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "reward",
                id: reward_id.to_string(),
            })?;
        if !reward.active {
            return Err(Error::Validation(format!(
                "reward {} is not active",
                reward.name
            )));
        }

        let balance = self.balance(tenant_id, contact).await?;
        if balance.points < reward.points_required {
            return Err(Error::InsufficientPoints {
                required: reward.points_required,
                available: balance.points,
            });
        }

        let now = self.clock.now();
        let redemption = Redemption {
            id: RedemptionId::new(),
            tenant_id,
            contact: contact.clone(),
            reward_id,
            points_spent: reward.points_required,
            validation_code: ValidationCode::generate(&mut rand::thread_rng()),
            status: RedemptionStatus::Pending,
            expires_at: now + self.config.redemption_ttl,
            created_at: now,
            completed_at: None,
        };
        self.store.insert_redemption(redemption.clone()).await?;

        tracing::info!(
            %tenant_id,
            redemption_id = %redemption.id,
            reward = %reward.name,
            points = redemption.points_spent,
            "redemption issued"
        );

        let body = format!(
            "Seu código de resgate para \"{}\" é {}. Válido até {}.",
            reward.name,
            redemption.validation_code,
            redemption.expires_at.format("%d/%m %H:%M")
        );
        if let Err(error) = self.messenger.send_text(tenant_id, contact, &body).await {
            tracing::warn!(
                redemption_id = %redemption.id,
                %error,
                "failed to send redemption code, operator must relay it"
            );
        }

        Ok(redemption)
    }

    /// Validates a redemption code presented in person.
    ///
    /// On success the points move: the balance is debited atomically
    /// (clamping at zero) and the redemption becomes `Completed`. Returns
    /// the completed redemption and the balance after the debit.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the redemption does not exist
    /// - [`Error::ExpiredCode`] when the validation window has closed;
    ///   the redemption stays `Pending` until explicitly cancelled
    /// - [`Error::InvalidCode`] when the submitted code does not match
    /// - [`Error::Validation`] when the redemption is not `Pending`
    pub async fn validate_redemption(
        &self,
        redemption_id: RedemptionId,
        submitted_code: &str,
    ) -> CoreResult<(Redemption, LoyaltyBalance)> {
        let mut redemption =
            self.store
                .redemption(redemption_id)
                .await?
                .ok_or_else(|| Error::NotFound {
                    entity: "redemption",
                    id: redemption_id.to_string(),
                })?;

        let now = self.clock.now();
        if redemption.is_expired(now) {
            return Err(Error::ExpiredCode { redemption_id });
        }
        if !redemption.validation_code.matches(submitted_code) {
            return Err(Error::InvalidCode);
        }
        if redemption.status != RedemptionStatus::Pending {
            return Err(Error::Validation(format!(
                "redemption is already {:?}",
                redemption.status
            )));
        }

        let balance = self
            .store
            .debit_points(redemption.tenant_id, &redemption.contact, redemption.points_spent)
            .await?;

        redemption.status = RedemptionStatus::Completed;
        redemption.completed_at = Some(now);
        self.store.update_redemption(redemption.clone()).await?;

        tracing::info!(
            redemption_id = %redemption.id,
            points = redemption.points_spent,
            balance = balance.points,
            "redemption validated"
        );
        Ok((redemption, balance))
    }

    /// Cancels a pending redemption.
    ///
    /// A pure status flip: points were never deducted at issuance, so
    /// there is nothing to give back. Cancelling an already-cancelled
    /// redemption is a no-op; an expired-but-pending one may still be
    /// cancelled (that is the explicit cleanup path).
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the redemption does not exist
    /// - [`Error::Validation`] when the redemption was already completed
    pub async fn cancel_redemption(&self, redemption_id: RedemptionId) -> CoreResult<Redemption> {
        let mut redemption =
            self.store
                .redemption(redemption_id)
                .await?
                .ok_or_else(|| Error::NotFound {
                    entity: "redemption",
                    id: redemption_id.to_string(),
                })?;

        match redemption.status {
            RedemptionStatus::Cancelled => Ok(redemption),
            RedemptionStatus::Completed => Err(Error::Validation(
                "completed redemption cannot be cancelled".to_string(),
            )),
            RedemptionStatus::Pending => {
                redemption.status = RedemptionStatus::Cancelled;
                self.store.update_redemption(redemption.clone()).await?;
                tracing::info!(redemption_id = %redemption.id, "redemption cancelled");
                Ok(redemption)
            }
        }
    }
}
