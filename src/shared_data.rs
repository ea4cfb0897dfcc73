// src/shared_data.rs

use crate::control_system::signal_head::{Direction, HeadId, Phase};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// What triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// A command from the external command surface.
    Manual,
    /// The yellow-expiry timer armed by a manual yellow.
    YellowExpiry,
    /// A step of the automatic cycle.
    AutoCycle,
}

/// Published after every state change, once the render pass is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub phase: Phase,
    pub active_direction: Direction,
    pub cause: TransitionCause,
    pub timestamp: u64,
}

/// Point-in-time view of the whole controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub phase: Phase,
    pub active_direction: Direction,
    pub auto_mode: bool,
    pub yellow_timer_pending: bool,
    pub heads: Vec<(HeadId, Phase)>,
}

impl ControllerSnapshot {
    pub fn head_phase(&self, id: HeadId) -> Option<Phase> {
        self.heads
            .iter()
            .find(|(head, _)| *head == id)
            .map(|(_, phase)| *phase)
    }
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
