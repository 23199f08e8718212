use crate::callback::{AuthCallback, CallbackInputs, CallbackState, Phase};
use crate::input::InputState;
use crate::router::{ChannelRouter, QueryParams, Route, Router};
use crate::Config;
use anyhow::Result;
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::future::Future;
use std::sync::Arc;
use swayami_identity::error::redact_sensitive;
use swayami_identity::{
    BackendClient, IdentityProvider, KnownUser, ProviderResult, SupabaseAuth, TokenStore,
};
use tokio::sync::mpsc;

mod effects;
mod input;
mod render;
mod state;
mod types;

pub use state::App;
pub use types::AppEvent;

impl App {
    pub(super) fn report_error(&mut self, context: &str, error: impl std::fmt::Display) {
        let message = format!("{context}: {}", redact_sensitive(&error.to_string()));
        self.last_error = Some(message.clone());
        tracing::warn!("{message}");
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(super) fn spawn_app_task<F>(&self, future: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = future.await;
            let _ = tx.send(event);
        });
    }
}
