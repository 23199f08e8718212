use crate::app::AppEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    AuthCallback,
    Onboarding,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::AuthCallback => "/auth/callback",
            Route::Onboarding => "/onboarding",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/login" => Some(Route::Login),
            "/auth/callback" => Some(Route::AuthCallback),
            "/onboarding" => Some(Route::Onboarding),
            "/dashboard" => Some(Route::Dashboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    url: Option<String>,
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw.trim())?;
        let pairs = url.query_pairs().into_owned().collect();
        Ok(Self {
            url: Some(url.to_string()),
            pairs,
        })
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            url: None,
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `key`. Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn origin(&self) -> Option<String> {
        let url = Url::parse(self.url.as_deref()?).ok()?;
        Some(url.origin().ascii_serialization())
    }

    pub fn route(&self) -> Option<Route> {
        let url = Url::parse(self.url.as_deref()?).ok()?;
        Route::from_path(url.path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

pub trait Router: Send + Sync {
    fn navigate(&self, route: Route);

    fn current_params(&self) -> Arc<QueryParams>;
}

#[derive(Clone)]
pub struct ChannelRouter {
    tx: mpsc::UnboundedSender<AppEvent>,
    params: Arc<QueryParams>,
}

impl ChannelRouter {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>, params: Arc<QueryParams>) -> Self {
        Self { tx, params }
    }
}

impl Router for ChannelRouter {
    fn navigate(&self, route: Route) {
        if self.tx.send(AppEvent::Navigate(route)).is_err() {
            tracing::debug!("Dropped navigation to {}: app loop closed", route.path());
        }
    }

    fn current_params(&self) -> Arc<QueryParams> {
        Arc::clone(&self.params)
    }
}
