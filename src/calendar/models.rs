use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::slot::{TimeSlot, wall_clock};

/// Everything needed to put a meeting on the calendar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    pub summary: String,
    pub description: Option<String>,
    #[serde(rename = "start_time", with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(rename = "end_time", with = "wall_clock")]
    pub end: NaiveDateTime,
    pub timezone: String,
    /// Treated as a set. Duplicates are dropped when the event is
    /// built and addresses are passed through unvalidated.
    pub attendees: Vec<String>,
}

impl EventRequest {
    pub fn for_slot(summary: &str, slot: &TimeSlot, attendees: &[String]) -> Self {
        Self {
            summary: summary.to_string(),
            description: None,
            start: slot.start,
            end: slot.end,
            timezone: slot.timezone.clone(),
            attendees: attendees.to_vec(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Outcome of publishing an event. Provider fields that were not
/// returned stay `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum EventResult {
    #[serde(rename = "success")]
    Success {
        event_link: Option<String>,
        meet_link: Option<String>,
        event_id: Option<String>,
    },
    #[serde(rename = "error")]
    Failure {
        #[serde(rename = "error_message")]
        message: String,
    },
}

impl EventResult {
    pub fn is_success(&self) -> bool {
        matches!(self, EventResult::Success { .. })
    }
}

impl fmt::Display for EventResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());
        match self {
            EventResult::Success {
                event_link,
                meet_link,
                event_id,
            } => {
                writeln!(f, "status: success")?;
                writeln!(f, "event_link: {}", field(event_link))?;
                writeln!(f, "meet_link: {}", field(meet_link))?;
                write!(f, "event_id: {}", field(event_id))
            }
            EventResult::Failure { message } => {
                writeln!(f, "status: error")?;
                write!(f, "error_message: {}", message)
            }
        }
    }
}
