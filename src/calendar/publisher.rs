//! Publishes calendar events with a Meet link and attendee invites.
//!
//! Getting a usable credential goes through the cache first, then a
//! refresh, and only then asks the user for consent:
//!
//! - no cache file, or one that can't be parsed: interactive consent
//! - cached and not expired: used as is
//! - expired with a refresh token: refreshed and written back
//! - expired without a refresh token: interactive consent
//!
//! Any failure while getting a credential is returned as an
//! `AuthorizationError`. Failures talking to the provider once a
//! credential is in hand become `EventResult::Failure` instead.

use std::path::PathBuf;

use chrono::Utc;
use itertools::Itertools;
use uuid::Uuid;

use super::models::{EventRequest, EventResult};
use super::slot::WALL_CLOCK_FORMAT;
use crate::google::credentials::{CacheEntry, CachedCredential, CredentialStore};
use crate::google::gcal::{
    ConferenceData, ConferenceSolutionKey, CreateConferenceRequest, EventAttendee, EventDateTime,
    HANGOUTS_MEET, NewEvent, Reminders,
};
use crate::google::{BoxedAuthorizer, BoxedCalendarProvider};

#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("Failed to read credential cache {}: {}", .path.display(), .source)]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write credential cache {}: {}", .path.display(), .source)]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to refresh the cached credential: {0:#}")]
    Refresh(anyhow::Error),
    #[error("Interactive authorization failed: {0:#}")]
    Consent(anyhow::Error),
}

/// Identifier for the conference create request. Google uses it to
/// deduplicate retries, so every call gets a new one: the current
/// timestamp in microseconds plus a random suffix for calls landing
/// in the same clock tick.
pub fn conference_request_id() -> String {
    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "event_{}.{:06}-{}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        &suffix[..12]
    )
}

/// Build the provider payload for `request`. Attendees are
/// deduplicated keeping their first position.
pub fn new_event(request: &EventRequest, request_id: &str) -> NewEvent {
    let date_time = |dt: &chrono::NaiveDateTime| EventDateTime {
        date_time: dt.format(WALL_CLOCK_FORMAT).to_string(),
        time_zone: request.timezone.clone(),
    };

    NewEvent {
        summary: request.summary.clone(),
        description: request.description.clone(),
        start: date_time(&request.start),
        end: date_time(&request.end),
        attendees: request
            .attendees
            .iter()
            .unique()
            .map(|email| EventAttendee {
                email: email.clone(),
            })
            .collect(),
        conference_data: ConferenceData {
            create_request: CreateConferenceRequest {
                request_id: request_id.to_string(),
                conference_solution_key: ConferenceSolutionKey {
                    r#type: HANGOUTS_MEET.to_string(),
                },
            },
        },
        reminders: Reminders { use_default: true },
        guests_can_modify: true,
        guests_can_invite_others: true,
        guests_can_see_other_guests: true,
    }
}

pub struct EventPublisher {
    store: CredentialStore,
    authorizer: BoxedAuthorizer,
    provider: BoxedCalendarProvider,
    calendar_id: String,
}

impl EventPublisher {
    pub fn new(
        store: CredentialStore,
        authorizer: BoxedAuthorizer,
        provider: BoxedCalendarProvider,
        calendar_id: &str,
    ) -> Self {
        Self {
            store,
            authorizer,
            provider,
            calendar_id: calendar_id.to_string(),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Return a credential that can be used right now, refreshing or
    /// asking for consent as needed.
    pub async fn credential(&self) -> Result<CachedCredential, AuthorizationError> {
        let path = self.store.path();
        let entry = self
            .store
            .load()
            .await
            .map_err(|source| AuthorizationError::CacheRead {
                path: path.to_path_buf(),
                source,
            })?;

        let cached = match entry {
            CacheEntry::Loaded(credential) => Some(credential),
            CacheEntry::Missing => {
                tracing::info!("No cached credential at {}", path.display());
                None
            }
            CacheEntry::Malformed(reason) => {
                tracing::warn!(
                    "Ignoring unreadable credential cache {}: {}",
                    path.display(),
                    reason
                );
                None
            }
        };

        let credential = match cached {
            Some(credential) if credential.is_valid(Utc::now()) => {
                tracing::debug!("Using cached credential from {}", path.display());
                return Ok(credential);
            }
            Some(credential) if credential.can_refresh() => {
                tracing::info!("Cached credential expired, refreshing");
                self.authorizer
                    .refresh(&credential)
                    .await
                    .map_err(AuthorizationError::Refresh)?
            }
            _ => {
                tracing::info!("Starting interactive authorization");
                self.authorizer
                    .authorize()
                    .await
                    .map_err(AuthorizationError::Consent)?
            }
        };

        self.store
            .save(&credential)
            .await
            .map_err(|source| AuthorizationError::CacheWrite {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!("Saved credential to {}", path.display());

        Ok(credential)
    }

    /// Create the event on the configured calendar. Only authorization
    /// problems are returned as `Err`; anything that goes wrong with
    /// the provider call is reported in the `EventResult`. Nothing is
    /// retried.
    pub async fn publish(&self, request: &EventRequest) -> Result<EventResult, AuthorizationError> {
        let credential = self.credential().await?;

        let request_id = conference_request_id();
        let event = new_event(request, &request_id);
        tracing::debug!(
            "Inserting event '{}' into calendar {} (conference request {})",
            event.summary,
            self.calendar_id,
            request_id
        );

        let result = match self
            .provider
            .insert_event(&credential.token, &self.calendar_id, &event)
            .await
        {
            Ok(created) => {
                tracing::info!("Created event {:?}", created.id);
                EventResult::Success {
                    event_link: created.html_link,
                    meet_link: created.hangout_link,
                    event_id: created.id,
                }
            }
            Err(e) => {
                tracing::error!("Failed to create calendar event: {:#}", e);
                EventResult::Failure {
                    message: format!("{:#}", e),
                }
            }
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::calendar::slot::find_slot_from;

    fn request(attendees: &[&str]) -> EventRequest {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let slot = find_slot_from(now, 60, "Europe/Paris");
        let attendees: Vec<String> = attendees.iter().map(|s| s.to_string()).collect();
        EventRequest::for_slot("Kickoff", &slot, &attendees).with_description("Goals and timelines")
    }

    #[test]
    fn test_new_event_payload() {
        let event = new_event(&request(&["a@example.com", "b@example.com"]), "req-1");

        assert_eq!(event.summary, "Kickoff");
        assert_eq!(event.description.as_deref(), Some("Goals and timelines"));
        assert_eq!(event.start.date_time, "2025-06-01T11:00:00");
        assert_eq!(event.end.date_time, "2025-06-01T12:00:00");
        assert_eq!(event.start.time_zone, "Europe/Paris");
        assert_eq!(event.conference_data.create_request.request_id, "req-1");
        assert_eq!(
            event.conference_data.create_request.conference_solution_key.r#type,
            "hangoutsMeet"
        );
        assert!(event.reminders.use_default);
        assert!(event.guests_can_modify);
        assert!(event.guests_can_invite_others);
        assert!(event.guests_can_see_other_guests);
    }

    #[test]
    fn test_new_event_deduplicates_attendees() {
        let event = new_event(
            &request(&["b@example.com", "a@example.com", "b@example.com"]),
            "req-1",
        );
        let emails: Vec<&str> = event.attendees.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["b@example.com", "a@example.com"]);
    }

    #[test]
    fn test_new_event_allows_no_attendees() {
        let event = new_event(&request(&[]), "req-1");
        assert!(event.attendees.is_empty());
    }

    #[test]
    fn test_conference_request_ids_are_distinct() {
        let ids: Vec<String> = (0..1000).map(|_| conference_request_id()).collect();
        let unique = ids.iter().unique().count();
        assert_eq!(unique, ids.len());
        assert!(ids[0].starts_with("event_"));
    }
}
