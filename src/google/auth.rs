use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;

use super::credentials::{
    CALENDAR_SCOPES, CachedCredential, ClientSecret, GOOGLE_AUTH_URI, GOOGLE_TOKEN_URI,
};
use super::flow::run_local_server;
use super::oauth::refresh_access_token;

/// Produces new credentials when the cached one can't be used.
#[async_trait]
pub trait Authorizer {
    /// Exchange the credential's refresh token for a new access token.
    async fn refresh(&self, credential: &CachedCredential) -> Result<CachedCredential>;
    /// Ask the user for consent. Blocks until they respond.
    async fn authorize(&self) -> Result<CachedCredential>;
}

pub type BoxedAuthorizer = Box<dyn Authorizer + Send + Sync + 'static>;

pub struct GoogleAuthorizer {
    client_secret_path: PathBuf,
    scopes: Vec<String>,
    open_browser: bool,
}

impl GoogleAuthorizer {
    pub fn new(client_secret_path: &Path) -> Self {
        Self {
            client_secret_path: client_secret_path.to_path_buf(),
            scopes: CALENDAR_SCOPES.iter().map(|s| s.to_string()).collect(),
            open_browser: true,
        }
    }

    pub fn open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Client details for a refresh. Tokens written by this tool carry
    /// them, older caches fall back to the client secret file.
    async fn refresh_client(&self, credential: &CachedCredential) -> Result<ClientSecret> {
        let token_uri = credential
            .token_uri
            .clone()
            .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string());

        match (&credential.client_id, &credential.client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(ClientSecret {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                auth_uri: GOOGLE_AUTH_URI.to_string(),
                token_uri,
            }),
            _ => {
                let secret = ClientSecret::from_file(&self.client_secret_path).await?;
                Ok(ClientSecret { token_uri, ..secret })
            }
        }
    }
}

#[async_trait]
impl Authorizer for GoogleAuthorizer {
    async fn refresh(&self, credential: &CachedCredential) -> Result<CachedCredential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or(anyhow!("Credential has no refresh token"))?;
        let client = self.refresh_client(credential).await?;

        let token = refresh_access_token(
            &client.token_uri,
            &client.client_id,
            &client.client_secret,
            refresh_token,
        )
        .await?;

        let scopes = if credential.scopes.is_empty() {
            &self.scopes
        } else {
            &credential.scopes
        };
        Ok(CachedCredential::from_token(
            token,
            &client,
            scopes,
            Some(refresh_token),
            Utc::now(),
        ))
    }

    async fn authorize(&self) -> Result<CachedCredential> {
        let secret = ClientSecret::from_file(&self.client_secret_path).await?;
        run_local_server(&secret, &self.scopes, self.open_browser).await
    }
}
