use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::role::Role;

/// Password reset flow. A lapsed ticket drops back to `Idle`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResetState {
    Idle,
    CodeRequested,
    CodeVerified,
    PasswordReset,
}

impl ResetState {
    pub fn valid_transitions(&self) -> &'static [ResetState] {
        match self {
            ResetState::Idle => &[ResetState::CodeRequested],
            // A new request replaces the outstanding code.
            ResetState::CodeRequested => &[
                ResetState::CodeRequested,
                ResetState::CodeVerified,
                ResetState::Idle,
            ],
            ResetState::CodeVerified => &[
                ResetState::CodeRequested,
                ResetState::PasswordReset,
                ResetState::Idle,
            ],
            ResetState::PasswordReset => &[],
        }
    }

    pub fn can_transition_to(&self, next: ResetState) -> bool {
        self.valid_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResetState::PasswordReset)
    }
}

/// Stored half of an outstanding reset: the code only ever lives here hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetTicket {
    pub account_id: Uuid,
    pub role: Role,
    pub code_hash: String,
    pub state: ResetState,
    pub failed_attempts: u32,
}
