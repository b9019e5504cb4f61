use std::sync::Arc;

use crate::calendar::slot::{DEFAULT_TIMEZONE, parse_wall_clock};
use crate::calendar::{EventPublisher, EventRequest, EventResult};
use crate::openai::{Function, Parameters, Property, ToolCall, ToolType};
use anyhow::{Context, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct CreateEventProps {
    pub summary: Property,
    pub description: Property,
    pub start_time: Property,
    pub end_time: Property,
    pub attendees: Property,
    pub timezone: Property,
}

#[derive(Deserialize)]
pub struct CreateEventArgs {
    pub summary: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub timezone: Option<String>,
}

impl CreateEventArgs {
    fn into_request(self) -> Result<EventRequest> {
        let start = parse_wall_clock(&self.start_time)
            .with_context(|| format!("Invalid start_time '{}'", self.start_time))?;
        let end = parse_wall_clock(&self.end_time)
            .with_context(|| format!("Invalid end_time '{}'", self.end_time))?;

        Ok(EventRequest {
            summary: self.summary,
            description: self.description,
            start,
            end,
            timezone: self
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            attendees: self.attendees,
        })
    }
}

/// Creates the event through the shared publisher. An authorization
/// failure is returned as an error and ends the run; everything else
/// is reported back to the model as an `EventResult`.
#[derive(Serialize)]
pub struct CreateEventTool {
    pub r#type: ToolType,
    pub function: Function<CreateEventProps>,
    #[serde(skip)]
    publisher: Arc<EventPublisher>,
}

#[async_trait]
impl ToolCall for CreateEventTool {
    async fn call(&self, args: &str) -> Result<String, Error> {
        let fn_args: CreateEventArgs = serde_json::from_str(args)
            .with_context(|| format!("Invalid create_calendar_event args: {}", args))?;

        let result = match fn_args.into_request() {
            Ok(request) => self.publisher.publish(&request).await?,
            Err(e) => EventResult::Failure {
                message: format!("{:#}", e),
            },
        };

        Ok(serde_json::to_string(&result)?)
    }

    fn function_name(&self) -> String {
        self.function.name.clone()
    }
}

impl CreateEventTool {
    pub fn new(publisher: Arc<EventPublisher>) -> Self {
        let function = Function {
            name: String::from("create_calendar_event"),
            description: String::from(
                "Create a calendar event with a Google Meet link and email invitations to every attendee. Returns status, event_link, meet_link and event_id, or status and error_message.",
            ),
            parameters: Parameters {
                r#type: String::from("object"),
                properties: CreateEventProps {
                    summary: Property::new("string", "Title of the meeting."),
                    description: Property::new("string", "Optional agenda or description."),
                    start_time: Property::new(
                        "string",
                        "Start as YYYY-MM-DDTHH:MM:SS wall clock time in the given timezone.",
                    ),
                    end_time: Property::new(
                        "string",
                        "End as YYYY-MM-DDTHH:MM:SS wall clock time in the given timezone.",
                    ),
                    attendees: Property::array_of("string", "Email addresses to invite."),
                    timezone: Property::new(
                        "string",
                        "IANA timezone name for start_time and end_time (default is 'UTC').",
                    ),
                },
                required: vec![
                    String::from("summary"),
                    String::from("start_time"),
                    String::from("end_time"),
                    String::from("attendees"),
                ],
                additional_properties: false,
            },
            strict: false,
        };

        Self {
            r#type: ToolType::Function,
            function,
            publisher,
        }
    }
}
