use super::*;

impl App {
    pub fn init(&mut self, callback_url: Option<&str>) {
        if let Some(url) = callback_url {
            if let Err(e) = self.open_callback_url(url) {
                self.report_error("Invalid callback URL", e);
                self.navigate(Route::Login);
            }
        } else {
            self.navigate(Route::Login);
        }
    }

    pub fn open_callback_url(&mut self, raw: &str) -> Result<()> {
        let params = QueryParams::parse(raw)?;
        if params.route() != Some(Route::AuthCallback) {
            tracing::warn!("Callback URL does not point at {}", Route::AuthCallback.path());
        }
        self.params = Arc::new(params);
        self.navigate(Route::AuthCallback);
        Ok(())
    }

    pub fn navigate(&mut self, route: Route) {
        if self.route == Route::AuthCallback && route != Route::AuthCallback {
            self.unmount_callback();
        }

        tracing::info!("Navigating to {}", route.path());
        self.route = route;

        match route {
            Route::AuthCallback => self.mount_callback(),
            Route::Login => self.prepare_login(),
            Route::Onboarding | Route::Dashboard => {}
        }
    }

    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Navigate(route) => self.navigate(route),
                AppEvent::KnownUserLoaded { email, user, error } => {
                    if let Some(error) = error {
                        self.report_error(&format!("Could not load profile for {email}"), error);
                    }
                    self.apply_known_user(user.map(Arc::new));
                }
            }
        }

        self.poll_callback();
    }

    pub fn sign_out(&mut self) {
        if let Err(e) = self.supabase().sign_out() {
            self.report_error("Failed to sign out", e);
            return;
        }
        self.known_user = None;
        self.navigate(Route::Login);
    }

    fn mount_callback(&mut self) {
        self.unmount_callback();
        self.clear_error();

        if !self.config.is_supabase_configured() {
            tracing::warn!("Supabase is not configured; only a stored session can be used");
        }

        let code = self.params.get("code").map(String::from);
        let provider: Arc<dyn IdentityProvider> = Arc::new(self.supabase().with_callback_code(code));
        let router: Arc<dyn Router> =
            Arc::new(ChannelRouter::new(self.event_tx.clone(), Arc::clone(&self.params)));

        let inputs = CallbackInputs {
            provider,
            params: router.current_params(),
            known_user: self.known_user.clone(),
        };

        let mut callback = AuthCallback::new(router, self.config.app.dev_mode);
        callback.mount(inputs.clone());
        self.callback = Some(callback);
        self.callback_inputs = Some(inputs);
        self.known_user_requested = false;
    }

    fn unmount_callback(&mut self) {
        if let Some(mut callback) = self.callback.take() {
            callback.teardown();
        }
        self.callback_inputs = None;
    }

    fn prepare_login(&mut self) {
        if !self.config.is_supabase_configured() {
            self.authorize_url = None;
            self.last_error
                .get_or_insert_with(|| "Set SUPABASE_URL and SUPABASE_ANON_KEY to sign in".to_string());
            return;
        }

        let supabase = self.supabase();
        match supabase.authorize_url(
            &self.config.supabase.oauth_provider,
            &self.config.supabase.redirect_url,
        ) {
            Ok(url) => self.authorize_url = Some(url),
            Err(e) => self.report_error("Failed to prepare sign-in", e),
        }
    }

    fn supabase(&self) -> SupabaseAuth {
        SupabaseAuth::new(
            &self.config.supabase.url,
            &self.config.supabase.anon_key,
            self.store.clone(),
        )
    }

    fn apply_known_user(&mut self, user: Option<Arc<KnownUser>>) {
        self.known_user = user;
        if self.route != Route::AuthCallback {
            return;
        }

        if crate::callback::onboarding_done(self.known_user.as_deref()) {
            self.navigate(Route::Dashboard);
            return;
        }

        if let (Some(callback), Some(current)) = (self.callback.as_mut(), self.callback_inputs.as_ref()) {
            let inputs = CallbackInputs {
                known_user: self.known_user.clone(),
                ..current.clone()
            };
            if callback.update(inputs.clone()) {
                self.callback_inputs = Some(inputs);
            }
        }
    }

    fn poll_callback(&mut self) {
        if self.route != Route::AuthCallback {
            return;
        }
        let Some(phase) = self.callback.as_ref().map(AuthCallback::phase) else {
            return;
        };

        match phase {
            Phase::AlreadyResolved => self.navigate(Route::Dashboard),
            Phase::Settled { status, .. }
                if status.state == CallbackState::Success && !self.known_user_requested =>
            {
                self.request_known_user();
            }
            _ => {}
        }
    }

    fn request_known_user(&mut self) {
        self.known_user_requested = true;

        let email = match self.store.load() {
            Ok(stored) => stored.session.and_then(|s| s.email().map(String::from)),
            Err(e) => {
                self.report_error("Failed to read saved session", e);
                None
            }
        };
        let Some(email) = email else {
            tracing::debug!("Signed-in session has no email; skipping profile lookup");
            return;
        };

        let backend = self.backend.clone();
        self.spawn_app_task(async move {
            let result = backend.user_by_email(&email).await;
            known_user_loaded(email, result)
        });
    }
}

fn known_user_loaded(email: String, result: ProviderResult<Option<KnownUser>>) -> AppEvent {
    match result {
        Ok(user) => AppEvent::KnownUserLoaded {
            email,
            user,
            error: None,
        },
        Err(e) => {
            tracing::debug!("Profile lookup for {email} failed: {e}");
            AppEvent::KnownUserLoaded {
                email,
                user: None,
                error: Some(e.user_message().to_string()),
            }
        }
    }
}
