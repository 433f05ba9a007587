mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lettora::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    dictionary::DatamuseClient,
    effects::Effects,
    high_score::{HighScoreStore, MemoryHighScoreStore, SqliteHighScoreStore},
    letters::{daily_letters, seed_for, DailyLetters},
    lexicon::Lexicon,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::{Game, PendingSubmission, Phase, SessionEvent, Submission},
    validator::{ValidationResult, WordValidator},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;
const TICKS_PER_SECOND: u64 = 1000 / TICK_RATE_MS;
const MESSAGE_TTL: Duration = Duration::from_secs(2);

/// daily two-letter word game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Two letters a day, one clock. Type as many words containing both letters as you can before time runs out."
)]
pub struct Cli {
    /// number of seconds per session
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// seconds remaining when the timer turns into a warning
    #[clap(long)]
    warning_secs: Option<u32>,

    /// practice with fixed letters instead of today's, e.g. "at"
    #[clap(short = 'l', long)]
    letters: Option<DailyLetters>,

    /// dictionary endpoint used to confirm words
    #[clap(long)]
    dictionary_url: Option<String>,

    /// word list (JSON) to use instead of the bundled one
    #[clap(long)]
    lexicon: Option<PathBuf>,

    /// print the letters and exit
    #[clap(long)]
    print_letters: bool,

    /// forget the stored high score and exit
    #[clap(long)]
    reset_high_score: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command-line flags on top of the stored config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(secs) = self.secs {
            config.session_secs = secs;
        }
        if let Some(warning_secs) = self.warning_secs {
            config.warning_secs = warning_secs;
        }
        if let Some(ref url) = self.dictionary_url {
            config.dictionary_url = url.clone();
        }
        if let Some(ref path) = self.lexicon {
            config.lexicon_path = Some(path.clone());
        }
        config
    }
}

#[derive(Debug)]
pub struct App {
    pub game: Game,
    pub session_events: Receiver<SessionEvent>,
    pub validator: Arc<WordValidator>,
    pub input: String,
    pub message: Option<(String, Instant)>,
    pub effects: Effects,
    pub pending_lookups: usize,
    frames: u64,
}

impl App {
    pub fn new(
        game: Game,
        session_events: Receiver<SessionEvent>,
        validator: Arc<WordValidator>,
    ) -> Self {
        Self {
            game,
            session_events,
            validator,
            input: String::new(),
            message: None,
            effects: Effects::new(),
            pending_lookups: 0,
            frames: 0,
        }
    }

    fn start(&mut self) {
        if self.game.start() {
            self.input.clear();
            self.message = None;
            self.pending_lookups = 0;
            self.frames = 0;
        }
    }

    /// Advance one animation frame; every TICKS_PER_SECOND frames the game clock moves.
    fn on_frame(&mut self) {
        if self.game.is_running() {
            self.frames += 1;
            if self.frames % TICKS_PER_SECOND == 0 {
                self.game.tick();
            }
        }
        self.effects.maybe_burst(Instant::now());
        self.effects.update();
    }

    fn submit(&mut self, runtime: &tokio::runtime::Runtime, tx: Sender<GameEvent>) {
        let raw = std::mem::take(&mut self.input);
        if let Submission::Pending(pending) = self.game.begin_submission(&raw) {
            self.pending_lookups += 1;
            let validator = Arc::clone(&self.validator);
            runtime.spawn(async move {
                let result = pending.validate(&validator).await;
                let _ = tx.send(GameEvent::Resolved(pending, result));
            });
        }
    }

    fn on_resolved(&mut self, pending: PendingSubmission, result: ValidationResult) {
        // stale results belong to a session whose counter was already reset
        if self.game.complete_submission(pending, result).is_some() {
            self.pending_lookups = self.pending_lookups.saturating_sub(1);
        }
    }

    /// React to whatever the game reported since the last call.
    fn drain_session_events(&mut self) {
        while let Ok(event) = self.session_events.try_recv() {
            match event {
                SessionEvent::WordRejected { result, .. } => {
                    self.message = Some((result.to_string(), Instant::now()));
                }
                SessionEvent::WordAccepted { .. } => {
                    self.message = None;
                }
                SessionEvent::NewHighScore { score } => {
                    info!(score, "new high score");
                    self.effects.confetti();
                }
                SessionEvent::SessionFinished { .. } => {
                    self.input.clear();
                    self.pending_lookups = 0;
                }
                SessionEvent::Started { .. } | SessionEvent::Tick { .. } => {}
            }
        }
    }

    pub fn visible_message(&self) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|(_, shown_at)| shown_at.elapsed() < MESSAGE_TTL)
            .map(|(text, _)| text.as_str())
    }

    fn share(&self) {
        if Browser::is_available() {
            let session = self.game.session();
            let text = format!(
                "I scored {} with {} words on today's Lettora ({})",
                session.score,
                session.words.len(),
                session.letters
            )
            .replace(' ', "%20");
            webbrowser::open(&format!("https://twitter.com/intent/tweet?text={text}"))
                .unwrap_or_default();
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn open_high_score_store() -> Box<dyn HighScoreStore> {
    match SqliteHighScoreStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "high score database unavailable, keeping scores in memory");
            Box::new(MemoryHighScoreStore::default())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let config = cli.apply_to(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        println!("saved config to {}", config_store.path().display());
    }

    if cli.print_letters {
        match cli.letters {
            Some(letters) => println!("{letters}"),
            None => {
                let now = chrono::Utc::now();
                println!("{} {}", seed_for(now), daily_letters(now));
            }
        }
        return Ok(());
    }

    let mut store = open_high_score_store();
    if cli.reset_high_score {
        store.reset()?;
        println!("high score reset");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let lexicon = match config.lexicon_path {
        Some(ref path) => Lexicon::from_path(path)?,
        None => Lexicon::common()?,
    };
    let dictionary = DatamuseClient::new(config.dictionary_url.clone(), config.lookup_timeout())?;
    info!(dictionary = dictionary.base_url(), "dictionary configured");
    let validator = Arc::new(WordValidator::new(Arc::new(lexicon), Arc::new(dictionary)));
    info!(
        lexicon = validator.lexicon().name(),
        words = validator.lexicon().len(),
        "lexicon loaded"
    );

    let (tx, rx) = mpsc::channel();
    let mut game = Game::new(config.session_config(), store, tx);
    if let Some(letters) = cli.letters {
        game = game.with_letters(letters);
    }
    info!(letters = %game.session().letters, "lettora starting");

    let runtime = tokio::runtime::Runtime::new()?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(game, rx, validator);
    let result = start_tui(&mut terminal, &mut app, &runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runtime: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let size = terminal.size()?;
    app.effects.resize(size.width, size.height);
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick => app.on_frame(),
            GameEvent::Resize => {
                let size = terminal.size()?;
                app.effects.resize(size.width, size.height);
            }
            GameEvent::Resolved(pending, result) => app.on_resolved(pending, result),
            GameEvent::Key(key) => {
                if should_quit(&key) {
                    break;
                }
                if handle_key(app, key, runtime, &runner) {
                    runner.reset_clock();
                }
            }
        }

        app.drain_session_events();
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

fn should_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

/// Returns true when a new session was started.
fn handle_key(
    app: &mut App,
    key: KeyEvent,
    runtime: &tokio::runtime::Runtime,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> bool {
    if app.game.is_running() {
        match key.code {
            KeyCode::Enter => app.submit(runtime, runner.sender()),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Tab => {
                app.game.end();
            }
            KeyCode::Char(c) if c.is_alphabetic() => app.input.push(c),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Enter | KeyCode::Char('r') => {
            app.start();
            app.game.is_running()
        }
        KeyCode::Char('t') if app.game.phase() == Phase::Ended => {
            app.share();
            false
        }
        _ => false,
    }
}
