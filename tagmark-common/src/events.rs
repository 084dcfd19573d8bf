//! Shared event types for the attendance pipeline

use serde::{Deserialize, Serialize};

/// Outcome of an attendance toggle for a registered user.
///
/// Shared between the ingestion loop, the notifier and the display: the
/// store decides which of the two happened, everyone downstream only labels
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceAction {
    /// A new open record was created; the user is now present.
    TimeIn,
    /// The user's open record was closed; the user has left.
    TimeOut,
}

impl AttendanceAction {
    /// Label used in notices and email bodies.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceAction::TimeIn => "Time In",
            AttendanceAction::TimeOut => "Time Out",
        }
    }
}
