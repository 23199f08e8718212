use anyhow::{Context, Result};
use directories::ProjectDirs;
use ratatui::crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use ratatui::crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use swayami::app::App;
use swayami::Config;
use swayami_identity::TokenStore;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "swayami.log";

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("app", "swayami", "swayami") {
        proj_dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config/default.toml")
    }
}

/// The terminal owns stdout, so logs go to a file next to the session store.
fn init_logging(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
        .with_context(|| format!("Failed to open {}", dir.join(LOG_FILE).display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load_or_default(&get_config_path()).apply_env(|key| std::env::var(key).ok());
    let store = TokenStore::new()?;
    if let Err(e) = init_logging(store.dir()) {
        eprintln!("Logging disabled: {e}");
    }

    let callback_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SWAYAMI_CALLBACK_URL").ok())
        .filter(|url| !url.trim().is_empty());

    terminal::enable_raw_mode()?;
    let mut terminal = ratatui::init();
    ratatui::crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;

    let result = run(&mut terminal, config, store, callback_url.as_deref());

    let _ = ratatui::crossterm::execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    ratatui::restore();

    result
}

fn run(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
    config: Config,
    store: TokenStore,
    callback_url: Option<&str>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    tracing::info!("Starting swayami (dev mode: {})", config.app.dev_mode);
    let mut app = App::new(config, store);
    app.init(callback_url);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;
            if let Ok(should_quit) = app.handle_event(event) {
                if should_quit {
                    break;
                }
            }
        }

        app.process_events();

        if app.should_quit {
            break;
        }
    }

    drop(app);
    tracing::info!("Shutting down");
    Ok(())
}
