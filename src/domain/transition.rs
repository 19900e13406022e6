//! Guarded transition engine.
//!
//! Evaluation is a pure function of the current state, the trigger and a small
//! guard context. It never mutates anything; the aggregate applies the returned
//! target and its side effects only after evaluation succeeds.

use super::confirmation::ConfirmationCount;
use super::status::{PaymentStatus, Trigger};
use crate::error::{PaymentError, Result, TransitionRejection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts the guards look at.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext {
    pub has_block_info: bool,
    pub confirmations: ConfirmationCount,
    pub required_confirmations: u64,
}

/// An applied state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub trigger: Trigger,
    pub at: DateTime<Utc>,
}

/// Resolves the target state for `trigger`, or the reason it cannot fire.
pub fn evaluate(current: PaymentStatus, trigger: Trigger, ctx: &GuardContext) -> Result<PaymentStatus> {
    let reject = |reason| PaymentError::InvalidTransition {
        from: current,
        trigger,
        reason,
    };

    if current.is_terminal() {
        return Err(reject(TransitionRejection::Terminal));
    }

    let target = trigger
        .target_from(current)
        .filter(|target| current.can_transition_to(*target))
        .ok_or_else(|| reject(TransitionRejection::NoEdge))?;

    match trigger {
        Trigger::Included if !ctx.has_block_info => {
            Err(reject(TransitionRejection::MissingBlockInfo))
        }
        Trigger::Confirmed if !ctx.confirmations.meets(ctx.required_confirmations) => {
            Err(PaymentError::InsufficientConfirmations {
                current: ctx.confirmations.value(),
                required: ctx.required_confirmations,
            })
        }
        _ => Ok(target),
    }
}
