use crate::calendar::slot::{DEFAULT_DURATION_MINUTES, DEFAULT_TIMEZONE, find_slot};
use crate::openai::{Function, Parameters, Property, ToolCall, ToolType};
use anyhow::{Context, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize)]
pub struct FindSlotProps {
    pub duration_minutes: Property,
    pub timezone: Property,
}

#[derive(Deserialize)]
pub struct FindSlotArgs {
    // Models sometimes send `60.0`
    pub duration_minutes: Option<f64>,
    pub timezone: Option<String>,
}

#[derive(Serialize)]
pub struct FindSlotTool {
    pub r#type: ToolType,
    pub function: Function<FindSlotProps>,
}

fn whole_minutes(value: Option<f64>) -> Result<u32, String> {
    match value {
        None => Ok(DEFAULT_DURATION_MINUTES),
        Some(v) if v.is_finite() && v >= 0.0 && v.round() <= f64::from(u32::MAX) => {
            Ok(v.round() as u32)
        }
        Some(v) => Err(format!(
            "duration_minutes must be a non-negative number of minutes, got {}",
            v
        )),
    }
}

#[async_trait]
impl ToolCall for FindSlotTool {
    async fn call(&self, args: &str) -> Result<String, Error> {
        let fn_args: FindSlotArgs =
            serde_json::from_str(args).with_context(|| format!("Invalid find_slot args: {}", args))?;
        let duration = match whole_minutes(fn_args.duration_minutes) {
            Ok(duration) => duration,
            // Let the model correct itself instead of ending the run
            Err(message) => {
                return Ok(json!({"status": "error", "error_message": message}).to_string());
            }
        };
        let timezone = fn_args
            .timezone
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let slot = find_slot(duration, &timezone);
        Ok(serde_json::to_string(&slot)?)
    }

    fn function_name(&self) -> String {
        self.function.name.clone()
    }
}

impl Default for FindSlotTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FindSlotTool {
    pub fn new() -> Self {
        let function = Function {
            name: String::from("find_slot"),
            description: String::from(
                "Propose a meeting slot of the given duration starting one hour from now. Returns start_time, end_time and timezone.",
            ),
            parameters: Parameters {
                r#type: String::from("object"),
                properties: FindSlotProps {
                    duration_minutes: Property::new(
                        "integer",
                        "Length of the meeting in minutes (default is 60).",
                    ),
                    timezone: Property::new(
                        "string",
                        "IANA timezone name for the slot, e.g. 'UTC' or 'Europe/Paris' (default is 'UTC').",
                    ),
                },
                required: vec![],
                additional_properties: false,
            },
            strict: false,
        };

        Self {
            r#type: ToolType::Function,
            function,
        }
    }
}
