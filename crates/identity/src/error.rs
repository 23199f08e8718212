use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Auth(String),

    #[error("{description}")]
    Api { code: String, description: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Auth(_) => "Authentication failed. Please sign in again.",
            ProviderError::Api { .. } => "The identity provider rejected the request.",
            ProviderError::Network(_) => "Network error. Check your connection.",
            ProviderError::Decode(_) => "Unexpected response from the identity provider.",
            ProviderError::Storage(_) => "Could not read the saved session.",
            ProviderError::Timeout(_) => "Request timed out. Please try again.",
        }
    }

    /// True when the provider answered and reported the failure itself, as
    /// opposed to the call breaking before an answer arrived.
    pub fn is_provider_reported(&self) -> bool {
        matches!(self, ProviderError::Auth(_) | ProviderError::Api { .. })
    }

    pub fn code(&self) -> &str {
        match self {
            ProviderError::Auth(_) => "invalid_jwt",
            ProviderError::Api { code, .. } => code,
            ProviderError::Network(_) => "network_error",
            ProviderError::Decode(_) => "decode_error",
            ProviderError::Storage(_) => "storage_error",
            ProviderError::Timeout(_) => "timeout",
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| parsed.get(*k).and_then(|v| v.as_str()))
                .map(String::from)
        };
        let code = pick(&["error_code", "error"]).unwrap_or_else(|| status.as_u16().to_string());
        let description = pick(&["error_description", "msg", "message"])
            .unwrap_or_else(|| format!("HTTP {}", status));

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            ProviderError::Auth(description)
        } else if status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::GATEWAY_TIMEOUT
        {
            ProviderError::Timeout(description)
        } else {
            ProviderError::Api { code, description }
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

const SECRET_PARAMS: [&str; 3] = ["access_token=", "refresh_token=", "code="];

/// Masks bearer tokens and token-bearing query parameters before a message
/// reaches the screen or the log.
pub fn redact_sensitive(input: &str) -> String {
    let mut words = Vec::new();
    let mut after_bearer = false;
    for word in input.split(' ') {
        if after_bearer {
            words.push("[REDACTED]".to_string());
            after_bearer = false;
            continue;
        }
        after_bearer = word == "Bearer";
        words.push(redact_params(word));
    }
    words.join(" ")
}

fn redact_params(word: &str) -> String {
    word.split('&')
        .map(|pair| {
            let key_end = pair.rfind(|c| c == '?' || c == '#').map(|i| i + 1).unwrap_or(0);
            let (prefix, kv) = pair.split_at(key_end);
            match SECRET_PARAMS.iter().find(|p| kv.starts_with(**p)) {
                Some(param) => format!("{prefix}{param}[REDACTED]"),
                None => pair.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}
