use crate::error::ProviderResult;
use crate::types::Session;
use async_trait::async_trait;

/// `Ok(None)` means no session. A session whose `user` is `None` is treated
/// the same way by callers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_session(&self) -> ProviderResult<Option<Session>>;
}
