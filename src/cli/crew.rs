use std::sync::Arc;

use anyhow::Result;

use crate::ai::agents::{MeetingDetails, schedule_meeting};
use crate::core::AppConfig;

pub async fn run(
    config: &AppConfig,
    summary: &str,
    description: Option<&str>,
    attendees: &[String],
    open_browser: bool,
) -> Result<()> {
    let mut meeting = MeetingDetails::new(summary, attendees);
    meeting.description = description.map(String::from);

    let publisher = Arc::new(super::publisher(config, open_browser));
    let output = schedule_meeting(publisher, &meeting, &config.llm).await?;

    println!("\nFinal Result:\n{}", output);

    Ok(())
}
