//! Threshold sweeps of large inbound payments.
//!
//! When a payment above the threshold lands, whatever was in the account
//! before it arrived moves to the sweep goal. The pre-payment balance is
//! approximated as the effective balance minus the payment.

use tracing::{info, warn};

use super::{Decision, NoOpReason, PlanKind, TransferPlan};
use crate::bank::{BankApi, BankError};
use crate::config::PolicyConfig;
use crate::money::{Amount, format_minor};
use crate::webhook::NotificationEvent;

pub async fn decide(
    config: &PolicyConfig,
    account_uid: &str,
    bank: &dyn BankApi,
    event: &NotificationEvent,
) -> Result<Decision, BankError> {
    let Some(goal) = config.sweep_goal.as_deref() else {
        return Ok(Decision::Skip(NoOpReason::NoSweepGoal));
    };

    let threshold = config.sweep_threshold;
    let amount = event.amount.minor_units;
    if threshold <= 0 || amount < threshold {
        return Ok(Decision::Skip(NoOpReason::BelowThreshold { threshold }));
    }
    // Exactly at the threshold does not qualify and needs no balance read
    if amount == threshold {
        return Ok(Decision::Skip(NoOpReason::NothingToTransfer));
    }

    info!(threshold = %format_minor(threshold), "Payment above sweep threshold");
    let balance = bank.effective_balance(account_uid).await?;
    if balance.currency != event.amount.currency {
        warn!(
            balance_currency = %balance.currency,
            payment_currency = %event.amount.currency,
            "Currency mismatch, not sweeping"
        );
        return Ok(Decision::Skip(NoOpReason::CurrencyMismatch {
            balance: balance.currency,
            payment: event.amount.currency.clone(),
        }));
    }
    let Some(before) = balance.minor_units.checked_sub(amount) else {
        return Ok(Decision::Skip(NoOpReason::NothingToSweep {
            balance_before: i64::MIN,
        }));
    };
    info!(
        balance = %format_minor(balance.minor_units),
        balance_before = %format_minor(before),
        "Balance fetched"
    );

    if before <= 0 {
        return Ok(Decision::Skip(NoOpReason::NothingToSweep {
            balance_before: before,
        }));
    }

    Ok(Decision::Transfer(TransferPlan {
        kind: PlanKind::Sweep,
        goal_uid: goal.to_string(),
        amount: Amount::new(event.amount.currency.clone(), before),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MockBank;
    use crate::webhook::{Direction, EventSource};

    fn config(goal: Option<&str>, threshold: i64) -> PolicyConfig {
        PolicyConfig {
            round_up_goal: None,
            sweep_goal: goal.map(str::to_string),
            sweep_threshold: threshold,
        }
    }

    fn inbound(minor_units: i64) -> NotificationEvent {
        NotificationEvent {
            event_uid: "evt".to_string(),
            feed_item_uid: None,
            source: EventSource::FasterPaymentIn,
            direction: Direction::In,
            amount: Amount::new("GBP", minor_units),
            transaction_time: None,
        }
    }

    #[tokio::test]
    async fn test_sweeps_balance_before_payment() {
        let bank = MockBank::with_balance(275412);
        let decision = decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &inbound(250000))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Transfer(TransferPlan {
                kind: PlanKind::Sweep,
                goal_uid: "goal-sweep".to_string(),
                amount: Amount::new("GBP", 25412),
            })
        );
        assert_eq!(bank.balance_calls(), 1);
    }

    #[tokio::test]
    async fn test_below_threshold_skips_balance_read() {
        let bank = MockBank::with_balance(275412);
        let decision = decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &inbound(50000))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Skip(NoOpReason::BelowThreshold { threshold: 100000 })
        );
        assert_eq!(bank.balance_calls(), 0);
    }

    #[tokio::test]
    async fn test_at_threshold_is_nothing_to_transfer() {
        let bank = MockBank::with_balance(275412);
        let decision = decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &inbound(100000))
            .await
            .unwrap();

        assert_eq!(decision, Decision::Skip(NoOpReason::NothingToTransfer));
        assert_eq!(bank.balance_calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_threshold() {
        let bank = MockBank::with_balance(275412);
        for threshold in [0, -1] {
            let decision =
                decide(&config(Some("goal-sweep"), threshold), "acc", &bank, &inbound(250000))
                    .await
                    .unwrap();
            assert_eq!(
                decision,
                Decision::Skip(NoOpReason::BelowThreshold { threshold })
            );
        }
        assert_eq!(bank.balance_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_goal() {
        let bank = MockBank::with_balance(275412);
        let decision = decide(&config(None, 100000), "acc", &bank, &inbound(250000))
            .await
            .unwrap();

        assert_eq!(decision, Decision::Skip(NoOpReason::NoSweepGoal));
        assert_eq!(bank.balance_calls(), 0);
    }

    #[tokio::test]
    async fn test_overdrawn_or_zero_before() {
        for balance in [250000, 100, -275412] {
            let bank = MockBank::with_balance(balance);
            let decision =
                decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &inbound(250000))
                    .await
                    .unwrap();
            assert_eq!(
                decision,
                Decision::Skip(NoOpReason::NothingToSweep {
                    balance_before: balance - 250000
                })
            );
        }
    }

    #[tokio::test]
    async fn test_currency_mismatch_skips() {
        let bank = MockBank::with_balance(275412);
        let mut event = inbound(250000);
        event.amount = Amount::new("EUR", 250000);

        let decision = decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &event)
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Skip(NoOpReason::CurrencyMismatch {
                balance: "GBP".to_string(),
                payment: "EUR".to_string(),
            })
        );
        assert_eq!(bank.balance_calls(), 1);
    }

    #[tokio::test]
    async fn test_extreme_overdraft_does_not_underflow() {
        let bank = MockBank::with_balance(i64::MIN);
        let decision = decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &inbound(250000))
            .await
            .unwrap();

        assert!(matches!(
            decision,
            Decision::Skip(NoOpReason::NothingToSweep { .. })
        ));
    }

    #[tokio::test]
    async fn test_balance_failure_propagates() {
        let bank = MockBank::with_balance(275412);
        bank.set_fail_balance(true);
        let result =
            decide(&config(Some("goal-sweep"), 100000), "acc", &bank, &inbound(250000)).await;
        assert!(result.is_err());
    }
}
