pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod records;
pub mod runtime;
pub mod scorer;
pub mod session;
pub mod stimulus;
pub mod storage;
pub mod ui;
pub mod util;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use crate::{
    celebration::Confetti,
    clock::MonotonicClock,
    config::{CalendarSettings, CardSettings, DigitSettings, GlobalSettings, Language, LetterPairSettings},
    export::{export_snapshot, import_snapshot},
    records::{CommitOutcome, RecordStore},
    runtime::{AppEvent, EventPump, TermEventSource, TICK_RATE_MS},
    scorer::{Category, SessionRecord},
    session::{Exercise, Phase, Session, SessionConfig, Stimulus},
    stimulus::{Card, DateRange, Discipline, LetterPairMaster, Rank, Suit, TrainingMode},
    storage::{KvStore, MemoryKvStore, SqliteKvStore},
};

/// memory training drills for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Memory training drills in the terminal: calendar day-of-week recall, \
digit sequences, card order, kana letter pairs, and a mod-7 arithmetic drill, \
with per-discipline best records kept across runs."
)]
pub struct Cli {
    /// discipline to train
    #[clap(value_enum, default_value_t = Discipline::Digits)]
    discipline: Discipline,

    /// date range for the calendar drill
    #[clap(short, long, value_enum, default_value_t = DateRange::Competition)]
    range: DateRange,

    /// run the mod-7 arithmetic drill instead of date recall (calendar only)
    #[clap(long)]
    math: bool,

    /// loop the stimuli with answers shown instead of running a scored session
    #[clap(short, long)]
    conversion: bool,

    /// total digits to memorize
    #[clap(short, long)]
    digits: Option<usize>,

    /// digits shown per group
    #[clap(short, long)]
    group: Option<usize>,

    /// number of decks in the shoe
    #[clap(long)]
    decks: Option<usize>,

    /// countdown seconds before the run starts
    #[clap(short = 's', long)]
    countdown: Option<u32>,

    /// rng seed for a reproducible sequence
    #[clap(long)]
    seed: Option<u64>,

    /// keep this run's settings and records in memory only
    #[clap(long)]
    ephemeral: bool,

    /// print the persisted store as json and exit
    #[clap(long)]
    export: bool,

    /// replace the persisted store with a json snapshot and exit
    #[clap(long, value_name = "FILE")]
    import: Option<PathBuf>,
}

impl Cli {
    fn exercise(&self) -> Exercise {
        match self.discipline {
            Discipline::Calendar if self.math => Exercise::Math,
            Discipline::Calendar => Exercise::Days(self.range),
            Discipline::Digits => Exercise::Digits,
            Discipline::Cards => Exercise::Cards,
            Discipline::Letters => Exercise::Letters,
        }
    }

    fn mode(&self) -> TrainingMode {
        if self.conversion {
            TrainingMode::Conversion
        } else {
            TrainingMode::Memory
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Training,
    History,
}

/// In-progress edit of the letter-pair association words, walking the runs'
/// missed pairs one at a time from the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterEdit {
    pub queue: Vec<(String, String)>,
    pub pos: usize,
    pub input: String,
}

impl MasterEdit {
    pub fn current_pair(&self) -> &str {
        &self.queue[self.pos].1
    }
}

pub struct App {
    pub session: Session,
    pub state: AppState,
    pub global: GlobalSettings,
    pub confetti: Confetti,
    pub outcome: Option<CommitOutcome>,
    pub last_record: Option<SessionRecord>,
    pub best: Option<SessionRecord>,
    pub history: Vec<SessionRecord>,
    pub history_scroll: usize,
    pub pending_suit: Option<Suit>,
    pub master_edit: Option<MasterEdit>,
    store: Box<dyn KvStore>,
    rng: StdRng,
}

impl App {
    pub fn new(cli: &Cli, store: Box<dyn KvStore>) -> crate::error::Result<Self> {
        let mut global = GlobalSettings::load(store.as_ref());
        let calendar = CalendarSettings::load(store.as_ref());
        let mut digits = DigitSettings::load(store.as_ref());
        let mut cards = CardSettings::load(store.as_ref());
        let letters = LetterPairSettings::load(store.as_ref());
        let master = LetterPairMaster::load(store.as_ref());

        if let Some(n) = cli.digits {
            digits.total_digits = n.max(1);
        }
        if let Some(n) = cli.group {
            digits.digits_per_group = n.max(1);
        }
        if let Some(n) = cli.decks {
            cards.deck_count = n.max(1);
        }
        if let Some(n) = cli.countdown {
            global.countdown_seconds = n;
        }

        let config = SessionConfig {
            exercise: cli.exercise(),
            mode: cli.mode(),
            lang: global.lang,
            countdown_seconds: global.countdown_seconds,
            calendar,
            digits,
            cards,
            letters,
            master,
        };
        let rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session = Session::new(config, rng, Box::new(MonotonicClock::new()))?;

        Ok(Self {
            session,
            state: AppState::Training,
            global,
            confetti: Confetti::new(),
            outcome: None,
            last_record: None,
            best: None,
            history: vec![],
            history_scroll: 0,
            pending_suit: None,
            master_edit: None,
            store,
            rng: StdRng::from_entropy(),
        })
    }

    /// Opens the association-word edit flow over the pairs this run missed.
    /// Only a scored letters run has anything to edit.
    fn start_master_edit(&mut self) {
        let Stimulus::Letters(questions) = &self.session.stimulus else {
            return;
        };
        let queue: Vec<(String, String)> = questions
            .iter()
            .zip(self.session.word_answers.iter())
            .filter(|(q, typed)| typed.as_str() != q.answer)
            .map(|(q, _)| (q.row.clone(), q.pair.clone()))
            .collect();
        if !queue.is_empty() {
            self.master_edit = Some(MasterEdit {
                queue,
                pos: 0,
                input: String::new(),
            });
        }
    }

    /// Saves the typed word for the current missed pair and moves on; an
    /// empty submit skips the pair without touching its stored word.
    fn save_master_edit(&mut self) {
        let Some(mut edit) = self.master_edit.take() else {
            return;
        };
        let (row, pair) = edit.queue[edit.pos].clone();
        let word = std::mem::take(&mut edit.input);
        if !word.trim().is_empty() {
            self.session
                .config
                .master
                .set_answer(self.store.as_mut(), &row, &pair, &word)
                .ok();
        }
        edit.pos += 1;
        if edit.pos < edit.queue.len() {
            self.master_edit = Some(edit);
        }
    }

    fn category(&self) -> Category {
        match self.session.config.exercise {
            Exercise::Days(range) => Category::Calendar(range),
            Exercise::Math => Category::Math,
            Exercise::Digits => Category::Digits,
            Exercise::Cards => Category::Cards,
            Exercise::Letters => Category::Letters,
        }
    }

    /// Commits a freshly scored run: persist it, look up the surviving best,
    /// and fire the confetti burst on a new record.
    fn finalize_scored(&mut self, width: u16, height: u16) {
        if self.session.phase != Phase::Scored || self.last_record.is_some() {
            return;
        }
        let Some(record) = self.session.take_record() else {
            return;
        };
        let outcome = RecordStore::new(self.store.as_mut())
            .commit(record.clone())
            .ok();
        let category = self.category();
        self.best = RecordStore::new(self.store.as_mut()).best(category);
        self.last_record = Some(record);
        self.outcome = outcome;
        if outcome.is_some_and(|o| o.is_new_best) {
            self.confetti.fire(width, height, &mut self.rng);
        }
    }

    fn retry(&mut self) -> crate::error::Result<()> {
        self.session.retry()?;
        self.outcome = None;
        self.last_record = None;
        self.best = None;
        self.pending_suit = None;
        self.master_edit = None;
        self.confetti = Confetti::new();
        Ok(())
    }

    fn open_history(&mut self) {
        let category = self.category();
        self.history = RecordStore::new(self.store.as_mut()).history(category);
        self.history_scroll = 0;
        self.state = AppState::History;
    }
}

fn open_store() -> Box<dyn KvStore> {
    match SqliteKvStore::open_default() {
        Ok(store) => Box::new(store),
        Err(_) => Box::new(MemoryKvStore::new()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut store: Box<dyn KvStore> = if cli.ephemeral {
        Box::new(MemoryKvStore::new())
    } else {
        open_store()
    };

    if cli.export {
        println!("{}", export_snapshot(store.as_ref())?);
        return Ok(());
    }
    if let Some(path) = &cli.import {
        let raw = std::fs::read_to_string(path)?;
        import_snapshot(store.as_mut(), &raw)?;
        eprintln!("imported {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(&cli, store)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let pump = EventPump::new(
        TermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        let Some(event) = pump.next() else {
            break;
        };
        match event {
            AppEvent::Tick => {
                let was_scored = app.session.phase == Phase::Scored;
                app.session.on_tick();
                app.confetti.on_tick(TICK_RATE_MS as f64 / 1000.0);
                let size = terminal.size().unwrap_or_default();
                app.finalize_scored(size.width, size.height);
                let redraw = app.confetti.is_active()
                    || (!was_scored && app.session.phase == Phase::Scored)
                    || !matches!(app.session.phase, Phase::Idle | Phase::Scored);
                if redraw {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize(_, _) => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if is_ctrl_c(key) {
                    break;
                }
                if !handle_key(app, key) {
                    break;
                }
                let size = terminal.size().unwrap_or_default();
                app.finalize_scored(size.width, size.height);
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Routes one key press; returns false when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::History => match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                app.state = AppState::Training;
            }
            KeyCode::Up => {
                app.history_scroll = app.history_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                if app.history_scroll + 1 < app.history.len() {
                    app.history_scroll += 1;
                }
            }
            _ => {}
        },
        AppState::Training => match app.session.phase {
            Phase::Idle => match key.code {
                KeyCode::Esc => return false,
                KeyCode::Enter => app.session.start(),
                _ => {}
            },
            Phase::Countdown => {
                if key.code == KeyCode::Esc {
                    app.session.exit();
                }
            }
            Phase::Presenting => match key.code {
                KeyCode::Esc => app.session.exit(),
                KeyCode::Right | KeyCode::Char(' ') => app.session.next_item(),
                KeyCode::Left => app.session.prev_item(),
                KeyCode::Home => app.session.first_item(),
                _ => {}
            },
            Phase::Recalling => handle_recall_key(app, key),
            Phase::Scored if app.master_edit.is_some() => handle_master_edit_key(app, key),
            Phase::Scored => match key.code {
                KeyCode::Esc => return false,
                KeyCode::Char('r') => {
                    let _ = app.retry();
                }
                KeyCode::Char('h') => app.open_history(),
                KeyCode::Char('e') => app.start_master_edit(),
                _ => {}
            },
        },
    }
    true
}

fn handle_recall_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.session.exit();
        app.pending_suit = None;
        return;
    }
    match &app.session.stimulus {
        Stimulus::Digits { .. } => match key.code {
            KeyCode::Char(c) => app.session.type_char(c),
            KeyCode::Backspace => app.session.backspace(),
            KeyCode::Enter => app.session.submit_recall(),
            _ => {}
        },
        Stimulus::Cards(_) => match key.code {
            KeyCode::Char(c) => {
                if let Some(suit) = app.pending_suit {
                    if let Some(rank) = rank_from_key(c) {
                        app.session.push_card(Card::new(suit, rank));
                        app.pending_suit = None;
                    }
                } else {
                    app.pending_suit = suit_from_key(c);
                }
            }
            KeyCode::Backspace => {
                if app.pending_suit.take().is_none() {
                    app.session.backspace();
                }
            }
            KeyCode::Enter => {
                app.pending_suit = None;
                app.session.submit_recall();
            }
            _ => {}
        },
        Stimulus::Dates(_) => {
            if let KeyCode::Char(c @ '0'..='6') = key.code {
                app.session.answer_day(c as usize - '0' as usize);
            }
        }
        Stimulus::Math(_) => {
            if let KeyCode::Char(c @ '0'..='6') = key.code {
                app.session.answer_math(c as u32 - '0' as u32);
            }
        }
        Stimulus::Letters(_) => match key.code {
            KeyCode::Char(c) => app.session.type_char(c),
            KeyCode::Backspace => app.session.backspace(),
            KeyCode::Enter => app.session.submit_word(),
            _ => {}
        },
    }
}

fn handle_master_edit_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.master_edit = None,
        KeyCode::Enter => app.save_master_edit(),
        KeyCode::Backspace => {
            if let Some(edit) = &mut app.master_edit {
                edit.input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(edit) = &mut app.master_edit {
                edit.input.push(c);
            }
        }
        _ => {}
    }
}

fn suit_from_key(c: char) -> Option<Suit> {
    match c.to_ascii_lowercase() {
        's' => Some(Suit::Spade),
        'h' => Some(Suit::Heart),
        'd' => Some(Suit::Diamond),
        'c' => Some(Suit::Club),
        _ => None,
    }
}

fn rank_from_key(c: char) -> Option<Rank> {
    match c.to_ascii_lowercase() {
        'a' | '1' => Some(Rank::Ace),
        '2' => Some(Rank::Two),
        '3' => Some(Rank::Three),
        '4' => Some(Rank::Four),
        '5' => Some(Rank::Five),
        '6' => Some(Rank::Six),
        '7' => Some(Rank::Seven),
        '8' => Some(Rank::Eight),
        '9' => Some(Rank::Nine),
        't' | '0' => Some(Rank::Ten),
        'j' => Some(Rank::Jack),
        'q' => Some(Rank::Queen),
        'k' => Some(Rank::King),
        _ => None,
    }
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
impl App {
    /// Test constructor on an in-memory store with a deterministic sequence
    /// and a manually driven clock.
    pub fn headless(exercise: Exercise, mode: TrainingMode, seed: u64) -> App {
        let config = SessionConfig {
            exercise,
            mode,
            lang: Language::Ja,
            countdown_seconds: 3,
            calendar: CalendarSettings::default(),
            digits: DigitSettings::default(),
            cards: CardSettings::default(),
            letters: LetterPairSettings::default(),
            master: LetterPairMaster::builtin(),
        };
        let session = Session::new(
            config,
            StdRng::seed_from_u64(seed),
            Box::new(crate::clock::ManualClock::new()),
        )
        .unwrap();
        App {
            session,
            state: AppState::Training,
            global: GlobalSettings::default(),
            confetti: Confetti::new(),
            outcome: None,
            last_record: None,
            best: None,
            history: vec![],
            history_scroll: 0,
            pending_suit: None,
            master_edit: None,
            store: Box::new(MemoryKvStore::new()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Drives the session through the countdown into its first live phase.
    pub fn begin_for_test(&mut self) {
        self.session.start();
        let ticks_per_sec = (1000 / TICK_RATE_MS) as usize;
        for _ in 0..(4 * ticks_per_sec + 1) {
            self.session.on_tick();
        }
    }
}
