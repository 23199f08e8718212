use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub supabase: SupabaseConfig,
    pub backend: BackendConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub oauth_provider: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dev_mode: bool,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            oauth_provider: "google".to_string(),
            redirect_url: "http://localhost:5173/auth/callback".to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Environment wins over the file, so a `.env` next to the binary is
    /// enough to point the client at another project.
    pub fn apply_env<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Some(key) = var("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = key;
        }
        if let Some(url) = var("SWAYAMI_API_URL") {
            self.backend.base_url = url;
        }
        if let Some(flag) = var("SWAYAMI_DEV_MODE") {
            self.app.dev_mode = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase.url.is_empty() && !self.supabase.anon_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [supabase]
            url = "https://abc.supabase.co"
            anon_key = "anon"

            [app]
            dev_mode = true
            "#,
        )
        .expect("parse");

        assert!(config.is_supabase_configured());
        assert!(config.app.dev_mode);
        assert_eq!(config.supabase.oauth_provider, "google");
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SUPABASE_URL", "https://env.supabase.co"),
            ("SWAYAMI_DEV_MODE", "TRUE"),
        ]);
        let config = Config::default().apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.supabase.url, "https://env.supabase.co");
        assert!(config.app.dev_mode);
        assert!(!config.is_supabase_configured());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load_or_default(Path::new("/nonexistent/swayami.toml"));
        assert_eq!(config.backend.timeout_seconds, 15);
    }
}
