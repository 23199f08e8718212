use super::trace::DebugTrace;
use crate::router::{QueryParams, Route};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use swayami_identity::error::redact_sensitive;
use swayami_identity::{IdentityProvider, KnownUser, ProviderError, Session, SessionUser};
use thiserror::Error;
use tracing::{info, warn};

pub const PROVIDER_FAILURE_DELAY: Duration = Duration::from_millis(3000);
pub const NO_SESSION_DELAY: Duration = Duration::from_millis(2000);
pub const UNEXPECTED_DELAY: Duration = Duration::from_millis(3000);
pub const SUCCESS_DELAY: Duration = Duration::from_millis(1500);

pub const LOADING_MESSAGE: &str = "Completing sign-in...";
pub const SUCCESS_MESSAGE: &str = "Authentication successful! Redirecting...";
pub const NO_SESSION_MESSAGE: &str = "No valid session found. Please try logging in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallbackStatus {
    pub state: CallbackState,
    pub message: String,
    /// Only collected in developer mode.
    pub trace: Option<DebugTrace>,
}

impl CallbackStatus {
    pub fn loading() -> Self {
        Self {
            state: CallbackState::Loading,
            message: LOADING_MESSAGE.to_string(),
            trace: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{0}")]
    ProviderQueryFailure(String),

    #[error("{}", no_session_text(.error, .description))]
    NoSessionFound {
        error: Option<String>,
        description: Option<String>,
    },

    #[error("{0}")]
    UnexpectedException(String),
}

fn no_session_text(error: &Option<String>, description: &Option<String>) -> String {
    match description.as_deref().or(error.as_deref()) {
        Some(reason) => format!("Authentication failed: {reason}"),
        None => NO_SESSION_MESSAGE.to_string(),
    }
}

impl ResolveError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn redirect_delay(&self) -> Duration {
        match self {
            ResolveError::ProviderQueryFailure(_) => PROVIDER_FAILURE_DELAY,
            ResolveError::NoSessionFound { .. } => NO_SESSION_DELAY,
            ResolveError::UnexpectedException(_) => UNEXPECTED_DELAY,
        }
    }

    fn from_provider(error: ProviderError) -> Self {
        let text = redact_sensitive(&error.to_string());
        if error.is_provider_reported() {
            ResolveError::ProviderQueryFailure(text)
        } else {
            ResolveError::UnexpectedException(text)
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let text = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Unexpected error during sign-in".to_string());
        ResolveError::UnexpectedException(text)
    }

    fn from_params(params: &QueryParams) -> Self {
        ResolveError::NoSessionFound {
            error: params.get("error").map(String::from),
            description: params.get("error_description").map(String::from),
        }
    }
}

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The known user already finished onboarding. Nothing is rendered and
    /// nothing is scheduled; the shell routes them upstream.
    AlreadyResolved,
    Redirect {
        status: CallbackStatus,
        target: Route,
        delay: Duration,
    },
}

pub fn onboarding_done(known_user: Option<&KnownUser>) -> bool {
    known_user.map_or(false, |u| u.has_completed_onboarding)
}

/// Where a signed-in user goes next. The session's own metadata counts as
/// well, for users whose backend record has not been loaded yet.
pub fn success_target(known_user: Option<&KnownUser>, user: &SessionUser) -> Route {
    if onboarding_done(known_user) || user.onboarding_complete() {
        Route::Dashboard
    } else {
        Route::Onboarding
    }
}

/// Decides the outcome of a callback visit. The only side effect is the
/// single provider query, which is skipped entirely when the known user
/// already completed onboarding.
pub async fn resolve(
    provider: &dyn IdentityProvider,
    params: &QueryParams,
    known_user: Option<&KnownUser>,
    dev_mode: bool,
) -> Resolution {
    if onboarding_done(known_user) {
        info!("Known user already onboarded, callback has nothing to do");
        return Resolution::AlreadyResolved;
    }

    let outcome = AssertUnwindSafe(provider.get_session())
        .catch_unwind()
        .await;

    let checked: Result<Session, ResolveError> = match outcome {
        Err(payload) => Err(ResolveError::from_panic(payload)),
        Ok(Err(error)) => Err(ResolveError::from_provider(error)),
        Ok(Ok(Some(session))) if session.user.is_some() => Ok(session),
        Ok(Ok(_)) => Err(ResolveError::from_params(params)),
    };

    let (status, target, delay, session) = match checked {
        Ok(session) => {
            let target = match &session.user {
                Some(user) => success_target(known_user, user),
                None => Route::Onboarding,
            };
            info!("Sign-in confirmed, redirecting to {}", target.path());
            let status = CallbackStatus {
                state: CallbackState::Success,
                message: SUCCESS_MESSAGE.to_string(),
                trace: None,
            };
            (status, target, SUCCESS_DELAY, Some(session))
        }
        Err(error) => {
            warn!("Sign-in callback failed: {}", error);
            let status = CallbackStatus {
                state: CallbackState::Error,
                message: error.message(),
                trace: None,
            };
            (status, Route::Login, error.redirect_delay(), None)
        }
    };

    let trace = dev_mode.then(|| {
        let error = (status.state == CallbackState::Error).then_some(status.message.as_str());
        DebugTrace::build(params, session.as_ref(), error, target.path())
    });

    Resolution::Redirect {
        status: CallbackStatus { trace, ..status },
        target,
        delay,
    }
}
