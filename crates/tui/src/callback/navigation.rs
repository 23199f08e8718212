use crate::router::{Route, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

async fn navigate_after(
    router: &dyn Router,
    route: Route,
    delay: Duration,
    cancel: &CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            debug!("Cancelled pending redirect to {}", route.path());
        }
        _ = tokio::time::sleep(delay) => router.navigate(route),
    }
}

/// A redirect that fires once after a delay unless cancelled. Dropping it
/// cancels it.
pub struct ScheduledNavigation {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledNavigation {
    /// Runs `decide` first and schedules whatever it returns. `decide` gets
    /// the cancellation token; cancelling during it schedules nothing.
    pub fn spawn_with<F, Fut>(router: Arc<dyn Router>, decide: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Option<(Route, Duration)>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let decision = decide(cancel.clone());
        let handle = tokio::spawn(async move {
            let scheduled = tokio::select! {
                _ = token.cancelled() => return,
                scheduled = decision => scheduled,
            };
            if let Some((route, delay)) = scheduled {
                navigate_after(router.as_ref(), route, delay, &token).await;
            }
        });
        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn is_pending(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }
}

impl Drop for ScheduledNavigation {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
