use chrono::{DateTime, Local};

use crate::alarm::AlarmState;

/// push notification to subscribers after an operation commits
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageType,
}

impl Message {
    #[must_use]
    pub const fn new(kind: MessageType) -> Self {
        Self { kind }
    }
}

#[derive(Debug, Clone)]
pub enum MessageType {
    /// the runtime half of the record changed
    RuntimeUpdated {
        next_alarm: Option<DateTime<Local>>,
        alarm_state: AlarmState,
    },
    /// the pending alarm came due
    AlarmRinging { at: DateTime<Local> },
}
