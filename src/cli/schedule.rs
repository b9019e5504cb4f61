use anyhow::Result;

use crate::calendar::{EventRequest, find_slot};
use crate::core::AppConfig;

/// Find the next slot and publish the event into it.
pub async fn run(
    config: &AppConfig,
    summary: &str,
    description: Option<&str>,
    attendees: &[String],
    duration_minutes: u32,
    timezone: &str,
    open_browser: bool,
) -> Result<()> {
    let slot = find_slot(duration_minutes, timezone);
    tracing::info!(
        "Proposed slot {} to {} ({})",
        slot.start,
        slot.end,
        slot.timezone
    );

    let mut request = EventRequest::for_slot(summary, &slot, attendees);
    if let Some(description) = description {
        request = request.with_description(description);
    }

    let publisher = super::publisher(config, open_browser);
    let result = publisher.publish(&request).await?;

    println!("Event Result:");
    println!("{}", result);

    Ok(())
}
