//! Interactive "installed app" authorization. A short lived HTTP
//! listener on the loopback interface receives the redirect from the
//! consent screen, then the code is exchanged for a token.

use anyhow::{Context, Result, anyhow, bail};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::credentials::{CachedCredential, ClientSecret};
use super::oauth::{authorization_url, exchange_code_for_token};

const CALLBACK_HOST: &str = "127.0.0.1";

const COMPLETE_PAGE: &str =
    "<html><body><p>The authentication flow has completed. You may close this window.</p></body></html>";
const DENIED_PAGE: &str =
    "<html><body><p>Authorization was not granted. You may close this window.</p></body></html>";

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl AuthorizationCallback {
    /// Checks the callback against the `state` that was sent and
    /// returns the authorization code.
    pub fn into_code(self, expected_state: &str) -> Result<String> {
        if let Some(error) = self.error {
            bail!("Authorization was denied: {}", error);
        }
        if self.state.as_deref() != Some(expected_state) {
            bail!("Authorization callback state mismatch");
        }
        self.code
            .filter(|c| !c.is_empty())
            .ok_or(anyhow!("Authorization callback is missing the code"))
    }
}

type CallbackSender = mpsc::Sender<AuthorizationCallback>;

async fn callback_handler(
    State(tx): State<CallbackSender>,
    Query(callback): Query<AuthorizationCallback>,
) -> impl IntoResponse {
    // Browsers poke at the listener too, only forward real redirects
    if callback.code.is_none() && callback.error.is_none() {
        return (StatusCode::BAD_REQUEST, Html("Missing authorization code")).into_response();
    }

    let page = if callback.error.is_some() {
        DENIED_PAGE
    } else {
        COMPLETE_PAGE
    };
    if tx.try_send(callback).is_err() {
        tracing::warn!("Ignoring authorization callback received after the first one");
    }
    Html(page).into_response()
}

pub fn callback_router(tx: CallbackSender) -> Router {
    Router::new()
        .route("/", get(callback_handler))
        .with_state(tx)
}

/// Serve the callback router until the first redirect arrives.
async fn wait_for_callback(listener: TcpListener) -> Result<AuthorizationCallback> {
    let (tx, mut rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        axum::serve(listener, callback_router(tx))
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let callback = rx.recv().await;
    let _ = shutdown_tx.send(());
    server
        .await
        .context("Authorization callback listener panicked")?
        .context("Authorization callback listener failed")?;

    callback.ok_or(anyhow!(
        "Authorization callback listener stopped before a redirect arrived"
    ))
}

/// Run the consent flow and return a fresh credential. Blocks until
/// the user finishes in the browser; no timeout is applied here.
pub async fn run_local_server(
    secret: &ClientSecret,
    scopes: &[String],
    open_browser: bool,
) -> Result<CachedCredential> {
    let listener = TcpListener::bind((CALLBACK_HOST, 0))
        .await
        .context("Failed to bind the authorization callback listener")?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://{}:{}/", CALLBACK_HOST, port);

    let state = Uuid::new_v4().simple().to_string();
    let auth_url = authorization_url(
        &secret.auth_uri,
        &secret.client_id,
        &redirect_uri,
        scopes,
        &state,
    );

    println!(
        "\nPlease visit this URL to authorize this application:\n\n{}\n",
        auth_url
    );
    if open_browser {
        if let Err(e) = webbrowser::open(&auth_url) {
            tracing::warn!("Could not open a browser, open the URL manually: {}", e);
        }
    }

    tracing::info!("Waiting for authorization callback on {}", redirect_uri);
    let code = wait_for_callback(listener).await?.into_code(&state)?;

    let token = exchange_code_for_token(
        &secret.token_uri,
        &secret.client_id,
        &secret.client_secret,
        &code,
        &redirect_uri,
    )
    .await?;

    Ok(CachedCredential::from_token(
        token,
        secret,
        scopes,
        None,
        Utc::now(),
    ))
}
