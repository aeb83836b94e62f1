//! Property test for the loyalty ledger invariant.
//!
//! For any sequence of accruals, issuances, validations and
//! cancellations driven through the public operations,
//! `points == total_earned - total_redeemed` holds and the counters only
//! grow. Issuing without validating must never move points.
//!
//! Run with: `cargo test --test balance_property_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use navalha_core::error::Error;
use navalha_core::types::Money;
use navalha_testing::Harness;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum LedgerOp {
    /// Complete a service at this price (accrues per the tenant config)
    Accrue { price_cents: u64 },
    /// Claim a reward of this size, then validate the code
    RedeemAndValidate { points_required: u64 },
    /// Claim a reward of this size, then cancel the claim
    RedeemAndCancel { points_required: u64 },
    /// Claim a reward of this size and abandon it
    RedeemAndAbandon { points_required: u64 },
}

fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0..20_000_u64).prop_map(|price_cents| LedgerOp::Accrue { price_cents }),
        (1..300_u64).prop_map(|points_required| LedgerOp::RedeemAndValidate { points_required }),
        (1..300_u64).prop_map(|points_required| LedgerOp::RedeemAndCancel { points_required }),
        (1..300_u64).prop_map(|points_required| LedgerOp::RedeemAndAbandon { points_required }),
    ]
}

async fn run_sequence(ops: Vec<LedgerOp>) {
    let harness = Harness::new();
    let shop = harness.seed_shop().await;
    harness
        .enable_per_amount(
            shop.tenant_id,
            navalha_core::types::PointsRate::from_points(1),
            Money::from_units(5),
        )
        .await;

    for op in ops {
        let before = harness
            .loyalty
            .balance(shop.tenant_id, &shop.contact)
            .await
            .unwrap();

        match op {
            LedgerOp::Accrue { price_cents } => {
                harness
                    .loyalty
                    .accrue_on_completion(
                        shop.tenant_id,
                        &shop.contact,
                        Money::from_cents(price_cents),
                    )
                    .await
                    .unwrap();
            }
            LedgerOp::RedeemAndValidate { points_required }
            | LedgerOp::RedeemAndCancel { points_required }
            | LedgerOp::RedeemAndAbandon { points_required } => {
                let reward = harness.seed_reward(shop.tenant_id, points_required).await;
                let issued = harness
                    .loyalty
                    .issue_redemption(shop.tenant_id, &shop.contact, reward.id)
                    .await;
                match issued {
                    Err(Error::InsufficientPoints { .. }) => {
                        assert!(before.points < points_required);
                    }
                    Err(other) => panic!("unexpected issuance failure: {other}"),
                    Ok(redemption) => {
                        // Issuance alone never moves points
                        let after_issue = harness
                            .loyalty
                            .balance(shop.tenant_id, &shop.contact)
                            .await
                            .unwrap();
                        assert_eq!(after_issue.points, before.points);

                        match op {
                            LedgerOp::RedeemAndValidate { .. } => {
                                harness
                                    .loyalty
                                    .validate_redemption(
                                        redemption.id,
                                        redemption.validation_code.as_str(),
                                    )
                                    .await
                                    .unwrap();
                            }
                            LedgerOp::RedeemAndCancel { .. } => {
                                harness
                                    .loyalty
                                    .cancel_redemption(redemption.id)
                                    .await
                                    .unwrap();
                            }
                            LedgerOp::Accrue { .. } | LedgerOp::RedeemAndAbandon { .. } => {}
                        }
                    }
                }
            }
        }

        let after = harness
            .loyalty
            .balance(shop.tenant_id, &shop.contact)
            .await
            .unwrap();
        assert_eq!(
            after.points,
            after.total_earned - after.total_redeemed,
            "ledger identity must hold after every operation"
        );
        assert!(after.total_earned >= before.total_earned);
        assert!(after.total_redeemed >= before.total_redeemed);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn ledger_identity_survives_any_operation_sequence(
        ops in prop::collection::vec(ledger_op(), 1..24)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_sequence(ops));
    }
}
