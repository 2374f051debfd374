// Authentication gateway trait
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub email: String,
}

/// Passwordless sign-in surface. The backend emails a magic link; the app
/// only ever observes whether a session currently exists.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn current_session(&self) -> Option<Session>;
    async fn sign_in_with_magic_link(&self, email: &str) -> anyhow::Result<()>;
    /// Complete a magic-link redirect by verifying the emailed token. On
    /// success the session becomes current.
    async fn verify_token(&self, email: &str, token: &str) -> anyhow::Result<()>;
    async fn sign_out(&self) -> anyhow::Result<()>;
}
