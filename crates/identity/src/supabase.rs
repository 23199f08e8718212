//! Supabase Auth over its REST surface (`/auth/v1`).
//!
//! Sign-in uses the PKCE flow: [`SupabaseAuth::authorize_url`] stores a
//! verifier, the browser comes back to the redirect URL with `?code=`, and
//! the first [`IdentityProvider::get_session`] call after that exchanges the
//! code for tokens.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::IdentityProvider;
use crate::store::TokenStore;
use crate::types::{Session, SessionUser, TokenResponse};
use anyhow::Result;
use async_trait::async_trait;
use oauth2::PkceCodeChallenge;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub struct SupabaseAuth {
    http: Client,
    auth_base: String,
    anon_key: String,
    store: TokenStore,
    pending_code: Mutex<Option<String>>,
}

impl SupabaseAuth {
    pub fn new(project_url: &str, anon_key: &str, store: TokenStore) -> Self {
        let http = Client::builder()
            .user_agent("swayami/0.3")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            auth_base: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            store,
            pending_code: Mutex::new(None),
        }
    }

    /// Hands over the `code` parameter of a callback URL. It is exchanged on
    /// the next `get_session` call and then forgotten.
    pub fn with_callback_code(self, code: Option<String>) -> Self {
        if let Ok(mut pending) = self.pending_code.lock() {
            *pending = code;
        }
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<String> {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        self.store
            .update(|s| s.pkce_verifier = Some(verifier.secret().to_string()))?;

        let url = Url::parse_with_params(
            &format!("{}/authorize", self.auth_base),
            &[
                ("provider", provider),
                ("redirect_to", redirect_to),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "s256"),
            ],
        )?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(&self, code: &str) -> ProviderResult<Session> {
        let stored = self.store.load().map_err(storage_error)?;
        let verifier = stored.pkce_verifier.ok_or_else(|| ProviderError::Api {
            code: "flow_state_not_found".to_string(),
            description: "No pending sign-in matches this callback".to_string(),
        })?;

        let response = self
            .http
            .post(format!("{}/token?grant_type=pkce", self.auth_base))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "auth_code": code,
                "code_verifier": verifier,
            }))
            .send()
            .await?;

        let session = self.read_token_response(response).await?;
        info!("Exchanged authorization code for a session");
        Ok(session)
    }

    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<Session> {
        let response = self
            .http
            .post(format!("{}/token?grant_type=refresh_token", self.auth_base))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let session = self.read_token_response(response).await?;
        debug!("Refreshed access token");
        Ok(session)
    }

    pub async fn fetch_user(&self, access_token: &str) -> ProviderResult<SessionUser> {
        let response = self
            .http
            .get(format!("{}/user", self.auth_base))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    pub fn sign_out(&self) -> Result<()> {
        self.store.clear()
    }

    async fn read_token_response(&self, response: reqwest::Response) -> ProviderResult<Session> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let session = token.into_session();
        self.store
            .update(|s| {
                s.session = Some(session.clone());
                s.pkce_verifier = None;
            })
            .map_err(storage_error)?;
        Ok(session)
    }

    fn take_pending_code(&self) -> Option<String> {
        self.pending_code.lock().ok().and_then(|mut code| code.take())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn get_session(&self) -> ProviderResult<Option<Session>> {
        if let Some(code) = self.take_pending_code() {
            self.exchange_code(&code).await?;
        }

        let Some(mut session) = self.store.load().map_err(storage_error)?.session else {
            return Ok(None);
        };

        if session.is_expired() {
            match session.refresh_token.clone() {
                Some(refresh_token) => session = self.refresh(&refresh_token).await?,
                None => {
                    warn!("Stored session expired without a refresh token");
                    return Ok(None);
                }
            }
        }

        let user = self.fetch_user(&session.access_token).await?;
        session.user = Some(user);
        Ok(Some(session))
    }
}

fn storage_error(e: anyhow::Error) -> ProviderError {
    ProviderError::Storage(e.to_string())
}
