//! The authentication-callback screen.
//!
//! When mounted it asks the identity provider who is signed in, shows the
//! outcome, and schedules exactly one redirect. The resolution is re-run
//! only when one of its inputs is replaced, and every re-run or teardown
//! cancels the redirect that is still pending.

mod navigation;
mod resolve;
mod trace;

pub use navigation::ScheduledNavigation;

pub use resolve::{
    onboarding_done, resolve, success_target, CallbackState, CallbackStatus, Resolution,
    ResolveError, LOADING_MESSAGE, NO_SESSION_DELAY, NO_SESSION_MESSAGE, PROVIDER_FAILURE_DELAY,
    SUCCESS_DELAY, SUCCESS_MESSAGE, UNEXPECTED_DELAY,
};
pub use trace::DebugTrace;

use crate::router::{QueryParams, Route, Router};
use std::sync::Arc;
use std::time::Duration;
use swayami_identity::{IdentityProvider, KnownUser};
use tokio::sync::watch;

/// Everything a resolution depends on. Two sets of inputs are the same
/// when each part is the same allocation.
#[derive(Clone)]
pub struct CallbackInputs {
    pub provider: Arc<dyn IdentityProvider>,
    pub params: Arc<QueryParams>,
    pub known_user: Option<Arc<KnownUser>>,
}

impl CallbackInputs {
    pub fn same_as(&self, other: &CallbackInputs) -> bool {
        let same_provider =
            Arc::as_ptr(&self.provider) as *const () == Arc::as_ptr(&other.provider) as *const ();
        let same_user = match (&self.known_user, &other.known_user) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_provider && Arc::ptr_eq(&self.params, &other.params) && same_user
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading,
    AlreadyResolved,
    Settled {
        status: CallbackStatus,
        target: Route,
        delay: Duration,
    },
}

impl Phase {
    /// What the screen shows. `None` renders nothing.
    pub fn status(&self) -> Option<CallbackStatus> {
        match self {
            Phase::Idle | Phase::AlreadyResolved => None,
            Phase::Loading => Some(CallbackStatus::loading()),
            Phase::Settled { status, .. } => Some(status.clone()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Phase::AlreadyResolved | Phase::Settled { .. })
    }
}

pub struct AuthCallback {
    router: Arc<dyn Router>,
    dev_mode: bool,
    inputs: Option<CallbackInputs>,
    phase: Arc<watch::Sender<Phase>>,
    pending: Option<ScheduledNavigation>,
}

impl AuthCallback {
    pub fn new(router: Arc<dyn Router>, dev_mode: bool) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            router,
            dev_mode,
            inputs: None,
            phase: Arc::new(phase),
            pending: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.phase.borrow().clone()
    }

    pub fn mount(&mut self, inputs: CallbackInputs) {
        self.start(inputs);
    }

    /// Re-runs the resolution if any input changed identity. Returns whether
    /// it did.
    pub fn update(&mut self, inputs: CallbackInputs) -> bool {
        if self.inputs.as_ref().is_some_and(|current| current.same_as(&inputs)) {
            return false;
        }
        self.start(inputs);
        true
    }

    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.inputs = None;
        self.phase.send_replace(Phase::Idle);
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.pending.as_ref().is_some_and(ScheduledNavigation::is_pending)
    }

    fn cancel_pending(&mut self) {
        if let Some(nav) = self.pending.take() {
            nav.cancel();
        }
    }

    fn start(&mut self, inputs: CallbackInputs) {
        self.cancel_pending();
        self.phase.send_replace(Phase::Loading);

        let phase = Arc::clone(&self.phase);
        let dev_mode = self.dev_mode;
        let run_inputs = inputs.clone();

        let nav = ScheduledNavigation::spawn_with(Arc::clone(&self.router), move |token| async move {
            let CallbackInputs {
                provider,
                params,
                known_user,
            } = run_inputs;

            let resolution = resolve(provider.as_ref(), &params, known_user.as_deref(), dev_mode).await;
            let (next, scheduled) = match resolution {
                Resolution::AlreadyResolved => (Phase::AlreadyResolved, None),
                Resolution::Redirect {
                    status,
                    target,
                    delay,
                } => (
                    Phase::Settled {
                        status,
                        target,
                        delay,
                    },
                    Some((target, delay)),
                ),
            };

            // Checked under the channel lock: a newer run cancels this token
            // before publishing its own phase.
            let published = phase.send_if_modified(|current| {
                if token.is_cancelled() {
                    return false;
                }
                *current = next;
                true
            });
            scheduled.filter(|_| published)
        });

        self.inputs = Some(inputs);
        self.pending = Some(nav);
    }
}

impl Drop for AuthCallback {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use swayami_identity::{ProviderError, ProviderResult, Session, SessionUser};
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    enum Outcome {
        Session(Option<Session>),
        Rejected(&'static str),
        Broken(&'static str),
        Panic(&'static str),
    }

    struct FakeProvider {
        outcome: Outcome,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn get_session(&self) -> ProviderResult<Option<Session>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Session(session) => Ok(session.clone()),
                Outcome::Rejected(msg) => Err(ProviderError::Auth(msg.to_string())),
                Outcome::Broken(msg) => Err(ProviderError::Storage(msg.to_string())),
                Outcome::Panic(msg) => panic!("{}", msg),
            }
        }
    }

    struct RecordingRouter {
        tx: mpsc::UnboundedSender<(Route, Instant)>,
    }

    impl Router for RecordingRouter {
        fn navigate(&self, route: Route) {
            let _ = self.tx.send((route, Instant::now()));
        }

        fn current_params(&self) -> Arc<QueryParams> {
            Arc::new(QueryParams::default())
        }
    }

    fn harness(dev_mode: bool) -> (AuthCallback, mpsc::UnboundedReceiver<(Route, Instant)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let router: Arc<dyn Router> = Arc::new(RecordingRouter { tx });
        (AuthCallback::new(router, dev_mode), rx)
    }

    fn signed_in(email: &str) -> Outcome {
        Outcome::Session(Some(Session {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
            user: Some(SessionUser {
                id: "sb-1".to_string(),
                email: Some(email.to_string()),
                user_metadata: serde_json::Value::Null,
            }),
        }))
    }

    fn known(onboarded: bool) -> Arc<KnownUser> {
        Arc::new(KnownUser {
            id: "665f".to_string(),
            email: "a@b.com".to_string(),
            name: "A".to_string(),
            has_completed_onboarding: onboarded,
        })
    }

    fn inputs(
        provider: &Arc<FakeProvider>,
        params: QueryParams,
        known_user: Option<Arc<KnownUser>>,
    ) -> CallbackInputs {
        let provider: Arc<dyn IdentityProvider> = provider.clone();
        CallbackInputs {
            provider,
            params: Arc::new(params),
            known_user,
        }
    }

    async fn settled(callback: &AuthCallback) -> Phase {
        let mut rx = callback.subscribe();
        let phase = rx.wait_for(Phase::is_resolved).await.expect("phase channel");
        phase.clone()
    }

    fn assert_fired_after(elapsed: Duration, delay: Duration) {
        assert!(elapsed >= delay, "fired early: {elapsed:?} < {delay:?}");
        assert!(
            elapsed <= delay + Duration::from_millis(1),
            "fired late: {elapsed:?} for {delay:?}"
        );
    }

    async fn assert_no_navigation(rx: &mut mpsc::UnboundedReceiver<(Route, Instant)>) {
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err(), "unexpected navigation");
    }

    #[tokio::test(start_paused = true)]
    async fn onboarded_known_user_short_circuits() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(signed_in("a@b.com"));

        callback.mount(inputs(&provider, QueryParams::default(), Some(known(true))));

        assert_eq!(settled(&callback).await, Phase::AlreadyResolved);
        assert_eq!(callback.phase().status(), None);
        assert_no_navigation(&mut nav).await;
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_rejection_redirects_to_login_after_three_seconds() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Rejected("X"));
        let started = Instant::now();

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.state, CallbackState::Error);
        assert!(status.message.contains('X'));

        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Login);
        assert_fired_after(at - started, PROVIDER_FAILURE_DELAY);
        assert_no_navigation(&mut nav).await;
    }

    #[tokio::test(start_paused = true)]
    async fn url_error_is_reported_and_redirects_after_two_seconds() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Session(None));
        let params = QueryParams::parse(
            "http://localhost:5173/auth/callback?error=access_denied&error_description=User%20cancelled",
        )
        .expect("url");
        let started = Instant::now();

        callback.mount(inputs(&provider, params, None));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.state, CallbackState::Error);
        assert_eq!(status.message, "Authentication failed: User cancelled");

        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Login);
        assert_fired_after(at - started, NO_SESSION_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_session_uses_generic_message() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Session(None));
        let started = Instant::now();

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.message, NO_SESSION_MESSAGE);

        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Login);
        assert_fired_after(at - started, NO_SESSION_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn session_without_user_counts_as_missing() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Session(Some(Session {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
            user: None,
        })));

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.state, CallbackState::Error);
        assert_eq!(nav.recv().await.map(|(r, _)| r), Some(Route::Login));
    }

    #[tokio::test(start_paused = true)]
    async fn signed_in_user_without_onboarding_goes_to_onboarding() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(signed_in("a@b.com"));
        let started = Instant::now();

        callback.mount(inputs(&provider, QueryParams::default(), Some(known(false))));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.state, CallbackState::Success);
        assert_eq!(status.message, SUCCESS_MESSAGE);

        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Onboarding);
        assert_fired_after(at - started, SUCCESS_DELAY);
        assert_no_navigation(&mut nav).await;
    }

    #[tokio::test(start_paused = true)]
    async fn onboarded_session_goes_to_dashboard() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Session(Some(Session {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
            user: Some(SessionUser {
                id: "sb-1".to_string(),
                email: Some("a@b.com".to_string()),
                user_metadata: serde_json::json!({ "has_completed_onboarding": true }),
            }),
        })));
        let started = Instant::now();

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.state, CallbackState::Success);
        assert_eq!(status.message, SUCCESS_MESSAGE);

        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Dashboard);
        assert_fired_after(at - started, SUCCESS_DELAY);
        assert_no_navigation(&mut nav).await;
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failure_is_unexpected() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Broken("disk unplugged"));
        let started = Instant::now();

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert!(status.message.contains("disk unplugged"));
        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Login);
        assert_fired_after(at - started, UNEXPECTED_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_provider_is_caught() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Panic("sdk exploded"));
        let started = Instant::now();

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert_eq!(status.state, CallbackState::Error);
        assert_eq!(status.message, "sdk exploded");
        let (route, at) = nav.recv().await.expect("navigation");
        assert_eq!(route, Route::Login);
        assert_fired_after(at - started, UNEXPECTED_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_redirect() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Session(None));

        callback.mount(inputs(&provider, QueryParams::default(), None));
        settled(&callback).await;
        assert!(callback.has_pending_navigation());

        callback.teardown();
        assert!(!callback.has_pending_navigation());
        assert_eq!(callback.phase(), Phase::Idle);
        assert_no_navigation(&mut nav).await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_screen_cancels_pending_redirect() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(signed_in("a@b.com"));

        callback.mount(inputs(&provider, QueryParams::default(), None));
        settled(&callback).await;
        drop(callback);

        assert_no_navigation(&mut nav).await;
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_inputs_do_not_rerun() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(signed_in("a@b.com"));
        let first = inputs(&provider, QueryParams::default(), None);

        callback.mount(first.clone());
        settled(&callback).await;
        assert!(!callback.update(first));

        assert_eq!(nav.recv().await.map(|(r, _)| r), Some(Route::Onboarding));
        assert_no_navigation(&mut nav).await;
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_known_user_reruns_and_drops_stale_redirect() {
        let (mut callback, mut nav) = harness(false);
        let provider = FakeProvider::new(signed_in("a@b.com"));
        let first = inputs(&provider, QueryParams::default(), Some(known(false)));

        callback.mount(first.clone());
        settled(&callback).await;

        let replaced = CallbackInputs {
            known_user: Some(known(true)),
            ..first
        };
        assert!(callback.update(replaced));
        assert_eq!(settled(&callback).await, Phase::AlreadyResolved);

        assert_no_navigation(&mut nav).await;
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dev_mode_collects_trace() {
        let (mut callback, _nav) = harness(true);
        let provider = FakeProvider::new(Outcome::Rejected("expired"));
        let params = QueryParams::parse("http://localhost:5173/auth/callback?state=s1").expect("url");

        callback.mount(inputs(&provider, params, None));

        let status = settled(&callback).await.status().expect("status");
        let trace = status.trace.expect("trace in dev mode");
        assert_eq!(trace.get("origin"), Some("http://localhost:5173"));
        assert_eq!(trace.get("params"), Some("{state=s1}"));
        assert_eq!(trace.get("error"), Some("expired"));
        assert_eq!(trace.get("outcome"), Some("/login"));
    }

    #[tokio::test(start_paused = true)]
    async fn trace_is_skipped_outside_dev_mode() {
        let (mut callback, _nav) = harness(false);
        let provider = FakeProvider::new(Outcome::Rejected("expired"));

        callback.mount(inputs(&provider, QueryParams::default(), None));

        let status = settled(&callback).await.status().expect("status");
        assert!(status.trace.is_none());
    }
}
