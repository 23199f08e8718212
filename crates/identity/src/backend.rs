use crate::error::{ProviderError, ProviderResult};
use crate::types::KnownUser;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn user_by_email_url(&self, email: &str) -> String {
        let mut url = format!("{}/api/users/by-email/", self.base_url);
        url.extend(url::form_urlencoded::byte_serialize(email.as_bytes()));
        url
    }

    /// Looks up the backend record for a signed-in email. `None` when the
    /// backend has never seen this user.
    pub async fn user_by_email(&self, email: &str) -> ProviderResult<Option<KnownUser>> {
        let response = self.http.get(self.user_by_email_url(email)).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("No backend user for {}", email);
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }

        let user: KnownUser =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        info!(
            "Loaded backend user {} (onboarding complete: {})",
            user.id, user.has_completed_onboarding
        );
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_escaped_into_the_path() {
        let client = BackendClient::new("http://localhost:8000/", 10);
        assert_eq!(
            client.user_by_email_url("a+b@c.com"),
            "http://localhost:8000/api/users/by-email/a%2Bb%40c.com"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let client = BackendClient::new("http://127.0.0.1:9", 1);
        let err = client.user_by_email("a@b.com").await.expect_err("refused");
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!err.is_provider_reported());
    }
}
