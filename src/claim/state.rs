//! The claim gate as a pure reducer.
//!
//! [`reduce`] takes the current [`ClaimState`] and one [`ClaimEvent`] and returns the
//! next state plus the [`Effect`]s the orchestrator has to run. Nothing in here touches
//! the wallet or the chain, so every transition is testable on its own.

use crate::{
    chain::{
        Address,
        TxHash,
        WalletFailure,
    },
    oracle::DayStatus,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    time::Duration,
};

pub const DEFAULT_RECONCILE_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Phase {
    #[default]
    Locked,
    Unlockable,
    Claiming,
    Claimed,
    Errored,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Locked => "locked",
            Phase::Unlockable => "unlockable",
            Phase::Claiming => "claiming",
            Phase::Claimed => "claimed",
            Phase::Errored => "errored",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClaimState {
    pub phase: Phase,
    pub address: Option<Address>,
    pub has_claimed_today: bool,
    /// Last day counters seen for `address`.
    pub day: Option<DayStatus>,
    pub pending_tx: Option<TxHash>,
    /// Chain day `pending_tx` was submitted on.
    pub submitted_on: Option<u64>,
    pub last_error: Option<String>,
}

impl ClaimState {
    pub fn can_claim(&self) -> bool {
        self.address.is_some()
            && !self.has_claimed_today
            && matches!(self.phase, Phase::Unlockable | Phase::Errored)
    }
}

/// What happens when the wallet refuses to move to the target chain.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchFailurePolicy {
    /// End the attempt and return to `Unlockable`.
    #[default]
    Abort,
    /// Submit on whatever chain the wallet is on.
    Proceed,
}

/// Which share outcomes open the claim gate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockPolicy {
    /// Any share attempt unlocks, even when no surface was opened.
    #[default]
    OnIntent,
    /// Only an outcome that opened a share surface unlocks.
    OnDelivery,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClaimPolicy {
    pub switch_failure: SwitchFailurePolicy,
    pub unlock: UnlockPolicy,
    pub reconcile_delay: Duration,
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            switch_failure: SwitchFailurePolicy::default(),
            unlock: UnlockPolicy::default(),
            reconcile_delay: DEFAULT_RECONCILE_DELAY,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClaimEvent {
    AddressChanged(Option<Address>),
    EligibilityLoaded {
        address: Address,
        status: DayStatus,
    },
    /// A read failed. State is kept as is.
    EligibilityUnavailable,
    ShareCompleted {
        delivered: bool,
    },
    ClaimRequested,
    NetworkReady,
    NetworkSwitchFailed {
        message: String,
    },
    ClaimSubmitted {
        tx: TxHash,
    },
    ClaimFailed {
        kind: WalletFailure,
        message: String,
    },
    Reconciled {
        address: Address,
        status: DayStatus,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Check the wallet's chain and ask for a switch if it differs.
    EnsureNetwork { address: Address },
    SendClaim { address: Address },
    ScheduleReconcile { address: Address, delay: Duration },
    Resync { address: Address },
    Notify(Notice),
}

/// User-facing conditions raised by the claim flow and the session around it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    ConnectWallet,
    ShareFirst,
    Claimed { tx: TxHash },
    AlreadyClaimed,
    ClaimFailed { message: String },
    ReconcileMismatch,
    NetworkSwitchFailed { message: String },
    ShareFailed,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::AlreadyClaimed
                | Notice::ClaimFailed { .. }
                | Notice::ReconcileMismatch
                | Notice::NetworkSwitchFailed { .. }
                | Notice::ShareFailed
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ConnectWallet => write!(f, "Connect a wallet to claim"),
            Notice::ShareFirst => write!(f, "Share today's quote to unlock the claim"),
            Notice::Claimed { tx } => write!(f, "Claim submitted: {tx}"),
            Notice::AlreadyClaimed => {
                write!(f, "Claim reverted. Today's claim may already be used")
            }
            Notice::ClaimFailed { message } => write!(f, "Claim failed: {message}"),
            Notice::ReconcileMismatch => {
                write!(f, "Claim did not land on chain, you can try again")
            }
            Notice::NetworkSwitchFailed { message } => {
                write!(f, "Could not switch to Base: {message}")
            }
            Notice::ShareFailed => write!(f, "Failed to open composer"),
        }
    }
}

pub fn reduce(
    state: &ClaimState,
    event: ClaimEvent,
    policy: &ClaimPolicy,
) -> (ClaimState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        ClaimEvent::AddressChanged(address) => {
            if address != state.address {
                next = ClaimState {
                    address,
                    ..ClaimState::default()
                };
                if let Some(address) = address {
                    effects.push(Effect::Resync { address });
                }
            }
        }
        ClaimEvent::EligibilityLoaded { address, status } => {
            if state.address == Some(address) {
                let new_day = state
                    .day
                    .is_some_and(|prev| status.current_day > prev.current_day);
                if holds_optimistic_claim(state, status) {
                    // the submitted claim may not be mined yet
                    next.day = Some(status);
                } else {
                    apply_status(&mut next, status);
                    if new_day {
                        next.pending_tx = None;
                        next.submitted_on = None;
                    }
                    if state.phase != Phase::Claiming {
                        next.phase = if status.has_claimed_today() {
                            Phase::Claimed
                        } else {
                            match state.phase {
                                Phase::Claimed => Phase::Locked,
                                Phase::Errored => Phase::Unlockable,
                                other => other,
                            }
                        };
                    }
                }
            }
        }
        ClaimEvent::EligibilityUnavailable => {}
        ClaimEvent::ShareCompleted { delivered } => {
            let unlocks = match policy.unlock {
                UnlockPolicy::OnIntent => true,
                UnlockPolicy::OnDelivery => delivered,
            };
            if unlocks && !state.has_claimed_today && state.phase == Phase::Locked {
                next.phase = Phase::Unlockable;
            }
        }
        ClaimEvent::ClaimRequested => match state.address {
            None => effects.push(Effect::Notify(Notice::ConnectWallet)),
            Some(_) if state.has_claimed_today => {}
            Some(_) if state.phase == Phase::Locked => {
                effects.push(Effect::Notify(Notice::ShareFirst))
            }
            Some(address) if state.can_claim() => {
                next.phase = Phase::Claiming;
                next.last_error = None;
                effects.push(Effect::EnsureNetwork { address });
            }
            Some(_) => {}
        },
        ClaimEvent::NetworkReady => {
            if let (Phase::Claiming, Some(address)) = (state.phase, state.address) {
                effects.push(Effect::SendClaim { address });
            }
        }
        ClaimEvent::NetworkSwitchFailed { message } => {
            if let (Phase::Claiming, Some(address)) = (state.phase, state.address) {
                match policy.switch_failure {
                    SwitchFailurePolicy::Abort => {
                        next.phase = Phase::Unlockable;
                        next.last_error = Some(message.clone());
                        effects.push(Effect::Notify(Notice::NetworkSwitchFailed { message }));
                    }
                    SwitchFailurePolicy::Proceed => {
                        effects.push(Effect::SendClaim { address });
                    }
                }
            }
        }
        ClaimEvent::ClaimSubmitted { tx } => {
            if let (Phase::Claiming, Some(address)) = (state.phase, state.address) {
                next.phase = Phase::Claimed;
                next.has_claimed_today = true;
                next.pending_tx = Some(tx);
                next.submitted_on = state.day.map(|day| day.current_day);
                effects.push(Effect::Notify(Notice::Claimed { tx }));
                effects.push(Effect::ScheduleReconcile {
                    address,
                    delay: policy.reconcile_delay,
                });
            }
        }
        ClaimEvent::ClaimFailed { kind, message } => {
            if let (Phase::Claiming, Some(address)) = (state.phase, state.address) {
                match kind {
                    WalletFailure::UserRejected => {
                        next.phase = Phase::Unlockable;
                    }
                    WalletFailure::Reverted => {
                        next.phase = Phase::Locked;
                        next.last_error = Some(message);
                        effects.push(Effect::Notify(Notice::AlreadyClaimed));
                        effects.push(Effect::Resync { address });
                    }
                    WalletFailure::Other => {
                        next.phase = Phase::Errored;
                        next.last_error = Some(message.clone());
                        effects.push(Effect::Notify(Notice::ClaimFailed { message }));
                    }
                }
            }
        }
        ClaimEvent::Reconciled { address, status } => {
            // stale results for another address, or racing a new attempt, are dropped
            if state.address == Some(address) && state.phase != Phase::Claiming {
                let optimistic = state.has_claimed_today;
                let landed = match state.submitted_on {
                    Some(day) => status.last_claim_day >= day,
                    None => status.has_claimed_today(),
                };
                let rolled_over = state
                    .submitted_on
                    .is_some_and(|day| status.current_day > day);
                apply_status(&mut next, status);
                if status.has_claimed_today() {
                    next.phase = Phase::Claimed;
                } else if optimistic && !landed {
                    next.phase = if rolled_over {
                        Phase::Locked
                    } else {
                        Phase::Unlockable
                    };
                    next.pending_tx = None;
                    next.submitted_on = None;
                    next.last_error = Some(Notice::ReconcileMismatch.to_string());
                    effects.push(Effect::Notify(Notice::ReconcileMismatch));
                } else if rolled_over {
                    // the claim landed on the previous day
                    next.phase = Phase::Locked;
                    next.pending_tx = None;
                    next.submitted_on = None;
                }
            }
        }
    }

    (next, effects)
}

/// True while a submitted claim is waiting for reconciliation on the day it was sent
/// and the chain does not show it yet.
fn holds_optimistic_claim(state: &ClaimState, status: DayStatus) -> bool {
    state.pending_tx.is_some()
        && state.has_claimed_today
        && !status.has_claimed_today()
        && state
            .submitted_on
            .is_none_or(|day| status.current_day <= day)
}

fn apply_status(state: &mut ClaimState, status: DayStatus) {
    state.has_claimed_today = status.has_claimed_today();
    state.day = Some(status);
}
