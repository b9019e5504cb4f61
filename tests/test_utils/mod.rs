//! Test utilities for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use meet_scheduler::calendar::EventPublisher;
use meet_scheduler::google::gcal::{CalendarProvider, Event, NewEvent};
use meet_scheduler::google::{Authorizer, CachedCredential, CredentialStore};

/// Counts calls and hands out fresh credentials. Refresh and
/// authorize can be made to fail independently.
#[derive(Clone, Default)]
pub struct StubAuthorizer {
    pub refresh_calls: Arc<AtomicUsize>,
    pub authorize_calls: Arc<AtomicUsize>,
    pub fail_refresh: bool,
    pub fail_authorize: bool,
}

impl StubAuthorizer {
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for StubAuthorizer {
    async fn refresh(&self, credential: &CachedCredential) -> Result<CachedCredential> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(anyhow!("invalid_grant: Token has been revoked"));
        }
        Ok(CachedCredential {
            token: "refreshed-token".to_string(),
            expiry: Some(Utc::now() + Duration::hours(1)),
            ..credential.clone()
        })
    }

    async fn authorize(&self) -> Result<CachedCredential> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_authorize {
            return Err(anyhow!("access_denied"));
        }
        Ok(credential("consented-token", Some("1//consented"), 1))
    }
}

/// Records every payload and answers with a canned result.
#[derive(Clone)]
pub struct StubProvider {
    pub events: Arc<Mutex<Vec<NewEvent>>>,
    pub tokens: Arc<Mutex<Vec<String>>>,
    pub response: std::result::Result<Event, String>,
}

impl StubProvider {
    pub fn returning(html_link: &str, hangout_link: &str, id: &str) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            tokens: Arc::new(Mutex::new(Vec::new())),
            response: Ok(Event {
                id: Some(id.to_string()),
                html_link: Some(html_link.to_string()),
                hangout_link: Some(hangout_link.to_string()),
                status: Some("confirmed".to_string()),
            }),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            tokens: Arc::new(Mutex::new(Vec::new())),
            response: Err(message.to_string()),
        }
    }

    pub fn events(&self) -> Vec<NewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarProvider for StubProvider {
    async fn insert_event(
        &self,
        access_token: &str,
        _calendar_id: &str,
        event: &NewEvent,
    ) -> Result<Event> {
        self.tokens.lock().unwrap().push(access_token.to_string());
        self.events.lock().unwrap().push(event.clone());
        self.response.clone().map_err(|e| anyhow!(e))
    }
}

/// A credential expiring `expires_in_hours` from now (negative for
/// one that already expired).
pub fn credential(token: &str, refresh_token: Option<&str>, expires_in_hours: i64) -> CachedCredential {
    CachedCredential {
        token: token.to_string(),
        refresh_token: refresh_token.map(String::from),
        token_uri: Some("https://oauth2.googleapis.com/token".to_string()),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        scopes: vec!["https://www.googleapis.com/auth/calendar".to_string()],
        expiry: Some(Utc::now() + Duration::hours(expires_in_hours)),
    }
}

pub fn write_cache(path: &Path, credential: &CachedCredential) {
    std::fs::write(path, serde_json::to_string(credential).unwrap()).unwrap();
}

pub fn publisher(path: &Path, authorizer: &StubAuthorizer, provider: &StubProvider) -> EventPublisher {
    EventPublisher::new(
        CredentialStore::new(path),
        Box::new(authorizer.clone()),
        Box::new(provider.clone()),
        "primary",
    )
}
