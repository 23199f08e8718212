use crate::router::Route;
use swayami_identity::KnownUser;

pub enum AppEvent {
    Navigate(Route),
    KnownUserLoaded {
        email: String,
        user: Option<KnownUser>,
        error: Option<String>,
    },
}
