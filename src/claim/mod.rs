//! Share-to-claim gate for the daily `checkInAndClaim()` reward.

pub mod controller;
pub mod state;

pub use controller::ClaimController;
pub use state::{
    ClaimEvent,
    ClaimPolicy,
    ClaimState,
    Effect,
    Notice,
    Phase,
    SwitchFailurePolicy,
    UnlockPolicy,
    reduce,
};
