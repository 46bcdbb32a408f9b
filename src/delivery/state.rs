//! Per-request delivery state machine.

use serde::{Deserialize, Serialize};

/// Progress of a single request's report delivery.
///
/// `Delivered` and `DeliveryFailed` are terminal; no state is revisited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    #[default]
    Pending,
    /// Acknowledgement sent to the caller (asynchronous protocol only).
    AckSent,
    /// Verification tool is running.
    Executing,
    /// Tool output has been classified.
    Classified,
    Delivered,
    DeliveryFailed,
}

impl DeliveryState {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::DeliveryFailed)
    }
}

/// Tracks delivery progress for one request.
#[derive(Debug, Clone, Default)]
pub struct DeliveryTracker {
    state: DeliveryState,
}

impl DeliveryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DeliveryState::Pending,
        }
    }

    #[must_use]
    pub fn state(&self) -> DeliveryState {
        self.state
    }

    /// Advance to a new state. Transitions out of a terminal state are
    /// ignored with a warning.
    pub fn transition(&mut self, new_state: DeliveryState) {
        if self.state.is_terminal() {
            tracing::warn!(
                from = ?self.state,
                to = ?new_state,
                "Ignoring transition out of terminal delivery state"
            );
            return;
        }
        tracing::debug!(from = ?self.state, to = ?new_state, "Delivery state transition");
        self.state = new_state;
    }
}
