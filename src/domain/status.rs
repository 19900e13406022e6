use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a tracked payment.
///
/// The set is closed: a payment can never hold a state outside of it, so a
/// lookup in the transition table below cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Detected,
    Confirming,
    Confirmed,
    Orphaned,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Detected,
        PaymentStatus::Confirming,
        PaymentStatus::Confirmed,
        PaymentStatus::Orphaned,
        PaymentStatus::Failed,
    ];

    /// Row of the static transition table for this state.
    pub fn allowed_transitions(self) -> &'static [PaymentStatus] {
        match self {
            PaymentStatus::Detected => &[PaymentStatus::Confirming, PaymentStatus::Failed],
            PaymentStatus::Confirming => &[
                PaymentStatus::Confirmed,
                PaymentStatus::Orphaned,
                PaymentStatus::Failed,
            ],
            PaymentStatus::Orphaned => &[PaymentStatus::Detected, PaymentStatus::Failed],
            PaymentStatus::Confirmed | PaymentStatus::Failed => &[],
        }
    }

    /// Pure table lookup. Guards (block info, confirmations) are not consulted here.
    pub fn can_transition_to(self, target: PaymentStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Detected => "detected",
            PaymentStatus::Confirming => "confirming",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Orphaned => "orphaned",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaymentError::ValidationError(format!("Unknown payment status: {s}")))
    }
}

/// Label of a guarded transition. Each trigger maps to exactly one table edge,
/// except `Failed`, which is accepted from every active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Included,
    Confirmed,
    Failed,
    Orphaned,
    BackToMempool,
    Dropped,
}

impl Trigger {
    pub const ALL: [Trigger; 6] = [
        Trigger::Included,
        Trigger::Confirmed,
        Trigger::Failed,
        Trigger::Orphaned,
        Trigger::BackToMempool,
        Trigger::Dropped,
    ];

    /// State every successful firing of this trigger ends in.
    pub fn destination(self) -> PaymentStatus {
        match self {
            Trigger::Included => PaymentStatus::Confirming,
            Trigger::Confirmed => PaymentStatus::Confirmed,
            Trigger::Orphaned => PaymentStatus::Orphaned,
            Trigger::BackToMempool => PaymentStatus::Detected,
            Trigger::Failed | Trigger::Dropped => PaymentStatus::Failed,
        }
    }

    /// Target reached when firing this trigger from `from`, if the edge exists.
    pub fn target_from(self, from: PaymentStatus) -> Option<PaymentStatus> {
        use PaymentStatus::*;
        match (self, from) {
            (Trigger::Included, Detected) => Some(Confirming),
            (Trigger::Confirmed, Confirming) => Some(Confirmed),
            (Trigger::Orphaned, Confirming) => Some(Orphaned),
            (Trigger::BackToMempool, Orphaned) => Some(Detected),
            (Trigger::Dropped, Orphaned) => Some(Failed),
            (Trigger::Failed, status) if status.is_active() => Some(Failed),
            _ => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trigger::Included => "included",
            Trigger::Confirmed => "confirmed",
            Trigger::Failed => "failed",
            Trigger::Orphaned => "orphaned",
            Trigger::BackToMempool => "back_to_mempool",
            Trigger::Dropped => "dropped",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::PaymentStatus::*;

    fn table_row(status: PaymentStatus) -> Vec<PaymentStatus> {
        match status {
            Detected => vec![Confirming, Failed],
            Confirming => vec![Confirmed, Orphaned, Failed],
            Orphaned => vec![Detected, Failed],
            Confirmed | Failed => vec![],
        }
    }

    #[test]
    fn test_can_transition_matches_table() {
        for from in PaymentStatus::ALL {
            let row = table_row(from);
            for to in PaymentStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    row.contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_edges() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.is_terminal(), status.allowed_transitions().is_empty());
            assert_eq!(status.is_active(), !status.is_terminal());
        }
        assert!(Confirmed.is_terminal());
        assert!(Failed.is_terminal());
    }

    #[test]
    fn test_every_trigger_edge_is_in_table() {
        for trigger in Trigger::ALL {
            for from in PaymentStatus::ALL {
                if let Some(to) = trigger.target_from(from) {
                    assert!(from.can_transition_to(to), "{trigger}: {from} -> {to}");
                    assert_eq!(to, trigger.destination());
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_no_trigger() {
        for trigger in Trigger::ALL {
            assert_eq!(trigger.target_from(Confirmed), None);
            assert_eq!(trigger.target_from(Failed), None);
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Confirming".parse::<PaymentStatus>().unwrap(), Confirming);
        assert_eq!(" orphaned ".parse::<PaymentStatus>().unwrap(), Orphaned);
        assert!(matches!(
            "pending".parse::<PaymentStatus>(),
            Err(PaymentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Confirmed).unwrap(), "\"confirmed\"");
        assert!(serde_json::from_str::<PaymentStatus>("\"unknown\"").is_err());
        assert_eq!(
            serde_json::to_string(&Trigger::BackToMempool).unwrap(),
            "\"back_to_mempool\""
        );
    }
}
