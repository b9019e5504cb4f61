use anyhow::Result;

use crate::calendar::find_slot;

pub fn run(duration_minutes: u32, timezone: &str) -> Result<()> {
    let slot = find_slot(duration_minutes, timezone);
    println!("{}", serde_json::to_string_pretty(&slot)?);
    Ok(())
}
