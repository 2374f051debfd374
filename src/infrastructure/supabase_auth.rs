// Supabase auth gateway implementation
use crate::application::auth::{AuthGateway, Session};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct OtpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<OtpUser>,
}

#[derive(Debug, Deserialize)]
struct OtpUser {
    email: String,
}

pub struct SupabaseAuth {
    url: String,
    anon_key: String,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl SupabaseAuth {
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

}

#[async_trait]
impl AuthGateway for SupabaseAuth {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn verify_token(&self, email: &str, token: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/auth/v1/verify", self.url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "type": "magiclink", "email": email, "token": token }))
            .send()
            .await
            .context("failed to send verify request")?;

        if !response.status().is_success() {
            anyhow::bail!("token verification failed with status {}", response.status());
        }

        let body: OtpResponse = response
            .json()
            .await
            .context("failed to parse verify response")?;
        let Some(access_token) = body.access_token else {
            anyhow::bail!("verify response carried no access token");
        };

        let email = body.user.map(|u| u.email).unwrap_or_else(|| email.to_string());
        *self.session.write().await = Some(Session {
            access_token,
            email,
        });
        Ok(())
    }

    async fn sign_in_with_magic_link(&self, email: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/auth/v1/otp", self.url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await
            .context("failed to send magic link request")?;

        if !response.status().is_success() {
            anyhow::bail!("magic link request failed with status {}", response.status());
        }
        tracing::info!(email, "magic link sent");
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.session.write().await.take().map(|s| s.access_token);
        if let Some(token) = token {
            let response = self
                .client
                .post(format!("{}/auth/v1/logout", self.url))
                .header("apikey", &self.anon_key)
                .header("Authorization", format!("Bearer {token}"))
                .send()
                .await
                .context("failed to send logout request")?;
            if !response.status().is_success() {
                tracing::warn!(status = %response.status(), "remote logout failed");
            }
        }
        Ok(())
    }
}
