pub mod scheduling;

pub use scheduling::{MeetingDetails, schedule_meeting, scheduling_crew};
