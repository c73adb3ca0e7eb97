//! Outbound mail through the Gmail REST API.
//!
//! Sends as the account whose delegated-access credential is cached on disk.
//! The cached access token is refreshed with its refresh token when it is
//! about to expire, and the refreshed credential is written back to the
//! cache file.

use crate::config::MailConfig;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use lettre::{Message, message::Mailbox, message::header::ContentType};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email request: {0}")]
    InvalidRequest(String),
    #[error("mail credential error: {0}")]
    Auth(String),
    #[error("mail transport error: {0}")]
    Transport(String),
}

pub type MailResult<T> = Result<T, MailError>;

/// Anything that can deliver a plain-text message and report its id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MailResult<String>;
}

/// Authorized-user credential as stored in the token cache file.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CachedCredential {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl CachedCredential {
    /// An access token is usable if present and not within the expiry skew.
    /// Tokens without a recorded expiry are trusted until the API says no.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(_), Some(expiry)) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) > now,
        }
    }
}

/// `credentials.json` as downloaded from the provider console.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// Lazily loaded, auto-refreshing access token backed by the cache file.
pub struct TokenStore {
    http: Client,
    cache_path: PathBuf,
    client_secret_path: PathBuf,
    current: Mutex<Option<CachedCredential>>,
}

impl TokenStore {
    pub fn new(http: Client, cache_path: PathBuf, client_secret_path: PathBuf) -> Self {
        Self {
            http,
            cache_path,
            client_secret_path,
            current: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, refreshing (and persisting) it if needed.
    ///
    /// Concurrent callers serialize on the lock so one refresh serves all.
    pub async fn access_token(&self) -> MailResult<String> {
        let mut guard = self.current.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_cache().await?);
        }
        let Some(cred) = guard.as_mut() else {
            return Err(MailError::Auth("no cached credential".into()));
        };

        if cred.is_fresh(Utc::now()) {
            if let Some(token) = &cred.token {
                return Ok(token.clone());
            }
        }

        self.refresh(cred).await?;
        self.persist(cred).await;
        cred.token
            .clone()
            .ok_or_else(|| MailError::Auth("refresh returned no access token".into()))
    }

    async fn load_cache(&self) -> MailResult<CachedCredential> {
        let raw = fs::read_to_string(&self.cache_path).await.map_err(|err| {
            MailError::Auth(format!(
                "cannot read token cache {}: {}; complete the consent flow and place the authorized-user file there",
                self.cache_path.display(),
                err
            ))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            MailError::Auth(format!(
                "token cache {} is not a valid credential: {}",
                self.cache_path.display(),
                err
            ))
        })
    }

    async fn client_secret(&self) -> MailResult<ClientSecret> {
        let raw = fs::read_to_string(&self.client_secret_path)
            .await
            .map_err(|err| {
                MailError::Auth(format!(
                    "cannot read client secret {}: {}",
                    self.client_secret_path.display(),
                    err
                ))
            })?;
        let file: ClientSecretFile = serde_json::from_str(&raw)
            .map_err(|err| MailError::Auth(format!("invalid client secret file: {}", err)))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| MailError::Auth("client secret file has no `installed` or `web` section".into()))
    }

    async fn refresh(&self, cred: &mut CachedCredential) -> MailResult<()> {
        let refresh_token = cred.refresh_token.clone().ok_or_else(|| {
            MailError::Auth("cached credential expired and has no refresh token".into())
        })?;
        let (client_id, client_secret) = match (&cred.client_id, &cred.client_secret) {
            (Some(id), Some(secret)) => (id.clone(), secret.clone()),
            _ => {
                let secret = self.client_secret().await?;
                (secret.client_id, secret.client_secret)
            }
        };

        info!(token_uri = %cred.token_uri, "refreshing mail access token");
        let response = self
            .http
            .post(&cred.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| MailError::Transport(format!("token refresh request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MailError::Auth(format!(
                "token refresh rejected ({}): {}",
                status, text
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| MailError::Auth(format!("unreadable token response: {}", err)))?;

        cred.token = Some(token.access_token);
        cred.expiry = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(rotated) = token.refresh_token {
            cred.refresh_token = Some(rotated);
        }
        cred.client_id = Some(client_id);
        cred.client_secret = Some(client_secret);
        Ok(())
    }

    /// Write the credential back; failure only costs a refresh next start.
    async fn persist(&self, cred: &CachedCredential) {
        let json = match serde_json::to_string_pretty(cred) {
            Ok(json) => json,
            Err(err) => {
                warn!("could not serialize refreshed credential: {}", err);
                return;
            }
        };
        match fs::write(&self.cache_path, json).await {
            Ok(_) => debug!("updated token cache {}", self.cache_path.display()),
            Err(err) => warn!(
                "could not write token cache {}: {}",
                self.cache_path.display(),
                err
            ),
        }
    }
}

/// [`Mailer`] posting raw RFC 822 messages to the Gmail API.
pub struct GmailMailer {
    http: Client,
    api_base: String,
    sender: Option<String>,
    tokens: TokenStore,
}

impl GmailMailer {
    pub fn new(config: &MailConfig) -> MailResult<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| MailError::Transport(err.to_string()))?;
        let tokens = TokenStore::new(
            http.clone(),
            config.token_cache_path.clone(),
            config.client_secret_path.clone(),
        );

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            sender: config.sender.clone(),
            tokens,
        })
    }

    fn send_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages/send", self.api_base)
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MailResult<String> {
        let from = self.sender.as_deref().unwrap_or(to);
        let raw = build_message(to, from, subject, body)?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(self.send_url())
            .bearer_auth(token)
            .json(&json!({ "raw": general_purpose::URL_SAFE.encode(raw) }))
            .send()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = response.text().await.unwrap_or_default();
            return Err(MailError::Auth(format!("mail API refused credential ({}): {}", status, text)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MailError::Transport(format!("mail API returned {}: {}", status, text)));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|err| MailError::Transport(format!("unreadable send response: {}", err)))?;
        let id = sent
            .id
            .ok_or_else(|| MailError::Transport("send response carried no message id".into()))?;

        info!(message_id = %id, "sent email");
        Ok(id)
    }
}

/// Render a plain-text message; rejects unparseable addresses and header
/// injection through the subject.
fn build_message(to: &str, from: &str, subject: &str, body: &str) -> MailResult<Vec<u8>> {
    if subject.contains(['\r', '\n']) {
        return Err(MailError::InvalidRequest(
            "subject must not contain line breaks".into(),
        ));
    }
    let to: Mailbox = to
        .parse()
        .map_err(|err| MailError::InvalidRequest(format!("invalid recipient address: {}", err)))?;
    let from: Mailbox = from
        .parse()
        .map_err(|err| MailError::InvalidRequest(format!("invalid sender address: {}", err)))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|err| MailError::InvalidRequest(err.to_string()))?;
    Ok(message.formatted())
}
