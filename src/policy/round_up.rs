//! Card spend round-ups.

use super::{Decision, NoOpReason, PlanKind, TransferPlan};
use crate::money::{Amount, round_up};
use crate::webhook::{Direction, NotificationEvent};

/// Divert the spare change of an outbound card payment to `goal`.
pub fn decide(goal: Option<&str>, event: &NotificationEvent) -> Decision {
    let Some(goal) = goal else {
        return Decision::Skip(NoOpReason::NoRoundUpGoal);
    };
    if event.direction == Direction::In {
        return Decision::Skip(NoOpReason::InboundCardTransaction);
    }

    let spare = round_up(event.amount.minor_units);
    if spare == 0 {
        return Decision::Skip(NoOpReason::ZeroRoundUp);
    }

    Decision::Transfer(TransferPlan {
        kind: PlanKind::RoundUp,
        goal_uid: goal.to_string(),
        amount: Amount::new(event.amount.currency.clone(), spare),
    })
}
