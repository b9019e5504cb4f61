use std::sync::Arc;

use anyhow::Result;

use crate::ai::crew::{Agent, Crew, CrewOutput, Task};
use crate::ai::tools::{CreateEventTool, FindSlotTool};
use crate::calendar::EventPublisher;
use crate::calendar::slot::{DEFAULT_DURATION_MINUTES, DEFAULT_TIMEZONE};
use crate::core::LlmConfig;

pub const SLOT_FINDER: &str = "Slot Finder";
pub const CALENDAR_SCHEDULER: &str = "Calendar Scheduler";

/// What the scheduling crew is asked to book.
#[derive(Clone, Debug)]
pub struct MeetingDetails {
    pub summary: String,
    pub description: Option<String>,
    pub attendees: Vec<String>,
    pub duration_minutes: u32,
    pub timezone: String,
}

impl MeetingDetails {
    pub fn new(summary: &str, attendees: &[String]) -> Self {
        Self {
            summary: summary.to_string(),
            description: None,
            attendees: attendees.to_vec(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

fn slot_finder() -> Agent {
    Agent::new(
        SLOT_FINDER,
        "Identify available time slots for meetings",
        "You are an expert at checking calendar availability and suggesting open times.",
        vec![Box::new(FindSlotTool::new())],
    )
}

fn calendar_scheduler(publisher: Arc<EventPublisher>) -> Agent {
    Agent::new(
        CALENDAR_SCHEDULER,
        "Create calendar events efficiently",
        "You are a calendar expert using tools to automate Google Calendar events.",
        vec![
            Box::new(FindSlotTool::new()),
            Box::new(CreateEventTool::new(publisher)),
        ],
    )
}

fn find_slot_task(meeting: &MeetingDetails) -> Task {
    Task::new(
        &format!(
            "Find a suitable {}-minute time slot starting one hour from now in {}.",
            meeting.duration_minutes, meeting.timezone
        ),
        "A JSON object with start_time, end_time, and timezone.",
        CALENDAR_SCHEDULER,
    )
}

fn create_event_task(meeting: &MeetingDetails) -> Task {
    let attendees = if meeting.attendees.is_empty() {
        String::from("(none)")
    } else {
        meeting.attendees.join(", ")
    };
    let description = meeting.description.as_deref().unwrap_or("(none)");

    Task::new(
        &format!(
            r#"Create a Google Calendar event with:
- Title: {}
- Description: {}
- Start and end time: the slot found in the previous task
- Timezone: {} (use from previous task)
- Attendees: {}
- Include Google Meet link
- Use default reminders
- Send email notifications to attendees"#,
            meeting.summary, description, meeting.timezone, attendees
        ),
        "A JSON object with status, event_link, meet_link, and event_id.",
        CALENDAR_SCHEDULER,
    )
}

/// Builds the two agent scheduling crew. Both tasks go to the
/// scheduler since it holds both tools.
pub fn scheduling_crew(publisher: Arc<EventPublisher>, meeting: &MeetingDetails) -> Crew {
    Crew::new(
        vec![calendar_scheduler(publisher), slot_finder()],
        vec![find_slot_task(meeting), create_event_task(meeting)],
    )
}

pub async fn schedule_meeting(
    publisher: Arc<EventPublisher>,
    meeting: &MeetingDetails,
    llm: &LlmConfig,
) -> Result<CrewOutput> {
    scheduling_crew(publisher, meeting).kickoff(llm).await
}
