use super::*;

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub store: TokenStore,
    pub backend: BackendClient,
    pub route: Route,
    pub params: Arc<QueryParams>,
    pub callback: Option<AuthCallback>,
    pub callback_inputs: Option<CallbackInputs>,
    pub known_user: Option<Arc<KnownUser>>,
    pub known_user_requested: bool,
    pub authorize_url: Option<String>,
    pub input: InputState,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
    pub event_rx: mpsc::UnboundedReceiver<AppEvent>,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(config: Config, store: TokenStore) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let backend = BackendClient::new(&config.backend.base_url, config.backend.timeout_seconds);

        Self {
            should_quit: false,
            config,
            store,
            backend,
            route: Route::Login,
            params: Arc::new(QueryParams::default()),
            callback: None,
            callback_inputs: None,
            known_user: None,
            known_user_requested: false,
            authorize_url: None,
            input: InputState::new(),
            event_tx,
            event_rx,
            last_error: None,
        }
    }
}
