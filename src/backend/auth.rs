//! Bearer tokens for Vertex AI

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{AppError, Result};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh this long before the provider-reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies OAuth access tokens for outbound calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// Fixed token, for local proxies and tests
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// The fields of a Google service account key file that the exchange needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    /// Decode a base64 encoded key file, as carried in `GCP_SA_KEY_STRING`
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Auth(format!("Service account key is not valid base64: {}", e)))?;

        serde_json::from_slice(&raw)
            .map_err(|e| AppError::Auth(format!("Service account key is not valid JSON: {}", e)))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a self-signed JWT for an access token and caches it until shortly
/// before expiry
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    cached: RwLock<Option<CachedToken>>,
    /// Held while exchanging so concurrent callers share one refresh
    refresh: Mutex<()>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, client: Client) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;

        info!(account = %key.client_email, "Loaded service account credentials");

        Ok(Self {
            key,
            encoding_key,
            client,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        })
    }

    fn cached_token(&self) -> Option<String> {
        let cached = self.cached.read();
        cached
            .as_ref()
            .filter(|t| t.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now())
            .map(|t| t.access_token.clone())
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    async fn exchange(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token exchange returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        debug!(expires_in = token.expires_in, "Obtained access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let fresh = self.exchange().await?;
        let token = fresh.access_token.clone();
        *self.cached.write() = Some(fresh);
        Ok(token)
    }
}
