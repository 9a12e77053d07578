//! Google OAuth2 access tokens for the Sheets, Drive and Cloud Storage adapters.
//!
//! One [`GoogleAuth`] is built at startup and shared by every adapter. Each
//! remote call asks it for a token first; the cached token is refreshed when
//! it is expired or about to expire.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

pub const SCOPE_SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";
pub const SCOPE_STORAGE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before Google says they expire.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read credentials: {0}")]
    Credentials(String),
    #[error("Failed to sign token request: {0}")]
    Signing(String),
    #[error("Token endpoint error: {0}")]
    TokenEndpoint(String),
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Where tokens come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Service account JSON key file, exchanged through a signed JWT.
    ServiceAccount(String),
    /// GCE / Cloud Run metadata server (application default credentials).
    MetadataServer,
    /// A fixed token. Used against emulators and in tests.
    Static(String),
}

pub struct GoogleAuth {
    client: Client,
    source: TokenSource,
    scopes: Vec<String>,
    token: RwLock<Option<CachedToken>>,
}

impl GoogleAuth {
    /// Build the client and fetch a first token, so bad credentials fail at startup.
    pub async fn new(source: TokenSource, scopes: &[&str]) -> Result<Self, AuthError> {
        let auth = Self::lazy(source, scopes)?;
        auth.access_token().await?;
        Ok(auth)
    }

    /// Build the client without contacting the token endpoint.
    pub fn lazy(source: TokenSource, scopes: &[&str]) -> Result<Self, AuthError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AuthError::TokenEndpoint(e.to_string()))?;

        Ok(Self {
            client,
            source,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            token: RwLock::new(None),
        })
    }

    /// Pick the service account file when configured, otherwise the metadata server.
    pub fn source_from(credentials_file: Option<&str>) -> TokenSource {
        match credentials_file {
            Some(path) => TokenSource::ServiceAccount(path.to_string()),
            None => TokenSource::MetadataServer,
        }
    }

    /// A valid access token, refreshing the cached one if it has expired.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let now = Utc::now();
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let mut lock = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = lock.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        tracing::debug!(expires_at = %fresh.expires_at, "Refreshed Google access token");
        let value = fresh.value.clone();
        *lock = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<CachedToken, AuthError> {
        let (value, expires_in) = match &self.source {
            TokenSource::ServiceAccount(path) => self.token_from_service_account(path).await?,
            TokenSource::MetadataServer => self.token_from_metadata_server().await?,
            TokenSource::Static(token) => (token.clone(), None),
        };

        let expires_at = match expires_in {
            Some(secs) => Utc::now() + Duration::seconds(secs),
            None if matches!(self.source, TokenSource::Static(_)) => DateTime::<Utc>::MAX_UTC,
            None => Utc::now() + Duration::seconds(3600),
        };

        Ok(CachedToken { value, expires_at })
    }

    async fn token_from_service_account(
        &self,
        path: &str,
    ) -> Result<(String, Option<i64>), AuthError> {
        let key_json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Credentials(format!("{path}: {e}")))?;
        let key: ServiceAccountKey = serde_json::from_str(&key_json)
            .map_err(|e| AuthError::Credentials(format!("{path}: {e}")))?;

        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "iss": key.client_email,
            "scope": self.scopes.join(" "),
            "aud": key.token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        let unsigned = format!(
            "{}.{}",
            base64_url_encode(header.to_string().as_bytes()),
            base64_url_encode(claims.to_string().as_bytes())
        );
        let signature = sign_rs256(unsigned.as_bytes(), &key.private_key)?;
        let jwt = format!("{unsigned}.{}", base64_url_encode(&signature));

        let resp = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenEndpoint(e.to_string()))?;

        parse_token_response(resp).await
    }

    async fn token_from_metadata_server(&self) -> Result<(String, Option<i64>), AuthError> {
        let resp = self
            .client
            .get(METADATA_TOKEN_URL)
            .query(&[("scopes", self.scopes.join(","))])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuthError::TokenEndpoint(e.to_string()))?;

        parse_token_response(resp).await
    }
}

async fn parse_token_response(
    resp: reqwest::Response,
) -> Result<(String, Option<i64>), AuthError> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::TokenEndpoint(format!("{status}: {body}")));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| AuthError::TokenEndpoint(e.to_string()))?;
    Ok((token.access_token, token.expires_in))
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn sign_rs256(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, AuthError> {
    use base64::Engine;

    let der_b64: String = private_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .map(str::trim)
        .collect();
    let der = base64::engine::general_purpose::STANDARD
        .decode(der_b64)
        .map_err(|e| AuthError::Credentials(format!("private key is not valid PEM: {e}")))?;

    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| AuthError::Credentials(format!("Failed to parse RSA key: {e}")))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| AuthError::Signing(e.to_string()))?;

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_window() {
        let now = Utc::now();
        let token = |secs| CachedToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(secs),
        };

        assert!(token(3600).is_fresh(now));
        assert!(!token(EXPIRY_SKEW_SECS - 1).is_fresh(now));
        assert!(!token(-10).is_fresh(now));
    }

    #[tokio::test]
    async fn test_static_token_is_cached() {
        let auth = GoogleAuth::new(TokenSource::Static("abc".into()), &[SCOPE_DRIVE])
            .await
            .unwrap();
        assert_eq!(auth.access_token().await.unwrap(), "abc");
        assert_eq!(auth.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_missing_credentials_file_fails() {
        let result = GoogleAuth::new(
            TokenSource::ServiceAccount("/nonexistent/key.json".into()),
            &[SCOPE_SPREADSHEETS],
        )
        .await;
        assert!(matches!(result, Err(AuthError::Credentials(_))));
    }

    #[test]
    fn test_source_from_credentials_file() {
        assert!(matches!(
            GoogleAuth::source_from(Some("key.json")),
            TokenSource::ServiceAccount(p) if p == "key.json"
        ));
        assert!(matches!(
            GoogleAuth::source_from(None),
            TokenSource::MetadataServer
        ));
    }
}
