use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of delegated access tokens. The default implementation exchanges
/// service-account credentials at a token endpoint; tests substitute their
/// own.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain an access token for `scopes`, acting as `subject`.
    async fn fetch_token(&self, scopes: &[String], subject: &str) -> Result<String>;
}
