use crate::config::CREDENTIALS_ENV;
use crate::domain::ports::TokenProvider;
use crate::utils::error::{BrokerError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// Service-account credential material staged by the configuration binder.
#[derive(Debug, Deserialize)]
struct DelegatedCredentials {
    client_id: String,
    client_secret: String,
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    #[serde(default)]
    expires_in: i64,
}

/// Default [`TokenProvider`]: exchanges service-account credentials for a
/// delegated access token at the credential file's token endpoint. The file
/// is re-read and the token re-fetched on every call; nothing is cached, so
/// each operation acts on a token minted for it.
#[derive(Debug, Clone)]
pub struct ServiceAccountAuth {
    credentials_path: PathBuf,
}

impl ServiceAccountAuth {
    pub fn new<P: Into<PathBuf>>(credentials_path: P) -> Self {
        Self {
            credentials_path: credentials_path.into(),
        }
    }

    /// Locate the credential file through the environment variable published
    /// at bind time.
    pub fn discover() -> Result<Self> {
        let path = std::env::var(CREDENTIALS_ENV).map_err(|_| {
            BrokerError::Auth(format!(
                "credential location not published; set {} or bind a configuration first",
                CREDENTIALS_ENV
            ))
        })?;
        Ok(Self::new(path))
    }

    fn load_credentials(&self) -> Result<DelegatedCredentials> {
        let raw = std::fs::read_to_string(&self.credentials_path).map_err(|e| {
            BrokerError::Auth(format!(
                "cannot read credential file [{}]: {}",
                self.credentials_path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            BrokerError::Auth(format!(
                "malformed credential file [{}]: {}",
                self.credentials_path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn fetch_token(&self, scopes: &[String], subject: &str) -> Result<String> {
        let credentials = self.load_credentials()?;
        let scope = scopes.join(" ");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("scope", &scope),
            // The identity the handle acts as, distinct from the service
            // account's own identity.
            ("subject", subject),
        ];

        tracing::debug!(token_uri = %credentials.token_uri, subject, "Fetching delegated token");

        let response = reqwest::Client::new()
            .post(&credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| BrokerError::Auth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Auth(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BrokerError::Auth(format!("malformed token response: {}", e)))?;

        Ok(token.access_token)
    }
}
