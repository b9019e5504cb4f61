//! OAuth credentials for the Calendar API: the application's client
//! secret file and the cached user token.
//!
//! The token cache uses the same JSON layout as Google's Python auth
//! library (`token`, `refresh_token`, `token_uri`, `client_id`,
//! `client_secret`, `scopes`, `expiry`) so a `token.json` written by
//! either tool can be read by the other.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::oauth::OAuthToken;

pub const CALENDAR_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.events",
];
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// Tokens this close to expiry are treated as expired, matching the
// threshold used by Google's client libraries.
const REFRESH_THRESHOLD_SECS: i64 = 225;

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Application credentials issued by the provider. Only needed to
/// start an interactive authorization or to refresh a cached token
/// that doesn't carry its own client details.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        file.installed
            .or(file.web)
            .ok_or(anyhow!("Client secret has neither an 'installed' nor a 'web' section"))
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read client secret file {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Invalid client secret file {}", path.display()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedCredential {
    pub token: String,
    // Google's Python loader requires these three keys, null is fine
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl CachedCredential {
    /// Build a credential from a token endpoint response. When the
    /// response has no refresh token (the usual case for a refresh
    /// grant) `previous_refresh_token` is kept.
    pub fn from_token(
        token: OAuthToken,
        client: &ClientSecret,
        requested_scopes: &[String],
        previous_refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let scopes = match &token.scope {
            Some(scope) => scope.split_whitespace().map(String::from).collect(),
            None => requested_scopes.to_vec(),
        };
        let refresh_token = token
            .refresh_token
            .or_else(|| previous_refresh_token.map(String::from));

        Self {
            token: token.access_token,
            refresh_token,
            token_uri: Some(client.token_uri.clone()),
            client_id: Some(client.client_id.clone()),
            client_secret: Some(client.client_secret.clone()),
            scopes,
            expiry: token.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }

    /// A credential without an expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| now >= expiry - Duration::seconds(REFRESH_THRESHOLD_SECS))
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired(now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// What was found at the cache path.
#[derive(Debug)]
pub enum CacheEntry {
    Missing,
    Malformed(String),
    Loaded(CachedCredential),
}

/// The on-disk token cache. Reads and writes are not locked so only
/// one process should use a given path at a time.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> io::Result<CacheEntry> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheEntry::Missing),
            Err(e) => return Err(e),
        };

        match serde_json::from_str::<CachedCredential>(&json) {
            Ok(credential) => Ok(CacheEntry::Loaded(credential)),
            Err(e) => Ok(CacheEntry::Malformed(e.to_string())),
        }
    }

    /// Overwrites whatever is at the cache path.
    pub async fn save(&self, credential: &CachedCredential) -> io::Result<()> {
        let json = serde_json::to_string(credential).map_err(io::Error::other)?;
        tokio::fs::write(&self.path, json).await
    }
}
