//! Policy Engine
//!
//! Turns a classified event into a transfer plan, a no-op reason, or an
//! ignore for sources outside the closed set. Card spends go through the
//! round-up rule, large inbound payments through the threshold sweep. The
//! engine never moves money itself.

pub mod round_up;
pub mod sweep;

use std::fmt;
use std::sync::Arc;

use crate::bank::{BankApi, BankError};
use crate::config::PolicyConfig;
use crate::money::{Amount, format_minor};
use crate::webhook::{EventSource, NotificationEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    RoundUp,
    Sweep,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::RoundUp => write!(f, "round-up"),
            PlanKind::Sweep => write!(f, "sweep"),
        }
    }
}

/// A decided transfer into a savings goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub kind: PlanKind,
    pub goal_uid: String,
    pub amount: Amount,
}

/// Why a delivery ended without a transfer. Informational, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    NoRoundUpGoal,
    InboundCardTransaction,
    ZeroRoundUp,
    NoSweepGoal,
    BelowThreshold { threshold: i64 },
    NothingToTransfer,
    NothingToSweep { balance_before: i64 },
    CurrencyMismatch { balance: String, payment: String },
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::NoRoundUpGoal => write!(f, "no round-up savings goal set"),
            NoOpReason::InboundCardTransaction => write!(f, "ignoring inbound card transaction"),
            NoOpReason::ZeroRoundUp => write!(f, "round-up is zero"),
            NoOpReason::NoSweepGoal => write!(f, "no sweep savings goal set"),
            NoOpReason::BelowThreshold { threshold } if *threshold <= 0 => {
                write!(f, "sweep threshold not configured")
            }
            NoOpReason::BelowThreshold { threshold } => write!(
                f,
                "ignoring inbound transaction below sweep threshold ({})",
                format_minor(*threshold)
            ),
            NoOpReason::NothingToTransfer => write!(f, "nothing to transfer"),
            NoOpReason::NothingToSweep { balance_before } => write!(
                f,
                "nothing to transfer (balance before payment {})",
                format_minor(*balance_before)
            ),
            NoOpReason::CurrencyMismatch { balance, payment } => write!(
                f,
                "balance currency {} does not match payment currency {}",
                balance, payment
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Transfer(TransferPlan),
    Skip(NoOpReason),
    /// Source outside the closed set; no rule applies
    Ignore,
}

#[cfg(test)]
impl Decision {
    pub fn planned_amount(&self) -> Option<i64> {
        match self {
            Decision::Transfer(plan) => Some(plan.amount.minor_units),
            Decision::Skip(_) | Decision::Ignore => None,
        }
    }
}

pub struct PolicyEngine {
    config: PolicyConfig,
    account_uid: String,
    bank: Arc<dyn BankApi>,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig, account_uid: impl Into<String>, bank: Arc<dyn BankApi>) -> Self {
        Self {
            config,
            account_uid: account_uid.into(),
            bank,
        }
    }

    /// Decide what to do with one event.
    ///
    /// Only the sweep rule talks to the bank, and only for payments strictly
    /// above the threshold. A failed balance read aborts the decision.
    pub async fn decide(&self, event: &NotificationEvent) -> Result<Decision, BankError> {
        match &event.source {
            EventSource::CardSpend => Ok(round_up::decide(
                self.config.round_up_goal.as_deref(),
                event,
            )),
            source if source.is_sweepable() => {
                sweep::decide(&self.config, &self.account_uid, self.bank.as_ref(), event).await
            }
            _ => Ok(Decision::Ignore),
        }
    }
}
