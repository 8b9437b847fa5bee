use std::env;
use std::io;
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use gridiron_paths::autocomplete::{Autocomplete, AutocompleteState, HighlightMove};
use gridiron_paths::cache::TtlCache;
use gridiron_paths::config::{GameConfig, SourceKind};
use gridiron_paths::espn::EspnSource;
use gridiron_paths::fake_source::FakeSource;
use gridiron_paths::game::GamePhase;
use gridiron_paths::model::{CareerStop, StopKind};
use gridiron_paths::service::PlayerService;
use gridiron_paths::session::{GameSession, RoundHandle};
use gridiron_paths::source::PlayerDataSource;
use gridiron_paths::store::{DurableStore, MemoryStore, SqliteStore};

mod app;
mod worker;

use crate::app::{AppState, Delta, SessionCommand, apply_delta};

struct App {
    state: AppState,
    input: String,
    search: Autocomplete,
    round: RoundHandle,
    cmd_tx: mpsc::Sender<SessionCommand>,
    should_quit: bool,
}

impl App {
    fn new(search: Autocomplete, round: RoundHandle, cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self {
            state: AppState::new(),
            input: String::new(),
            search,
            round,
            cmd_tx,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => self.should_quit = true,
            KeyCode::Char('s') if ctrl => self.skip(),
            KeyCode::Char('d') if ctrl => self.cycle_difficulty(),
            KeyCode::Char('r') if ctrl => self.retry(),
            KeyCode::Esc => self.clear_input(),
            KeyCode::Up => self.search.move_highlight(HighlightMove::Up),
            KeyCode::Down => self.search.move_highlight(HighlightMove::Down),
            KeyCode::Enter => self.on_enter(),
            KeyCode::Backspace => {
                if self.accepts_input() {
                    self.input.pop();
                    self.search.search(&self.input);
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if self.accepts_input() {
                    self.input.push(c);
                    self.search.search(&self.input);
                }
            }
            _ => {}
        }
    }

    fn accepts_input(&self) -> bool {
        !self.state.busy && self.state.phase() == GamePhase::Guessing
    }

    fn on_enter(&mut self) {
        match self.state.phase() {
            GamePhase::Guessing => self.guess(),
            GamePhase::Correct | GamePhase::Incorrect => self.next_round(),
            GamePhase::Loading => self.retry(),
        }
    }

    fn guess(&mut self) {
        if self.state.busy {
            return;
        }
        let pick = self.search.selected().or_else(|| self.search.settled_top_result());
        let Some(pick) = pick else {
            self.state.push_log("[INFO] Pick a player from the suggestions");
            return;
        };
        self.state.last_guess = Some(pick.full_name.clone());
        self.clear_input();
        self.send(SessionCommand::Guess { player_id: pick.id }, "Guess");
    }

    fn skip(&mut self) {
        if self.state.busy || self.state.phase() != GamePhase::Guessing {
            return;
        }
        self.clear_input();
        self.send(SessionCommand::Skip, "Skip");
    }

    fn next_round(&mut self) {
        self.round.supersede();
        self.clear_input();
        self.send(SessionCommand::NewRound, "Next round");
    }

    fn cycle_difficulty(&mut self) {
        self.round.supersede();
        self.clear_input();
        self.send(SessionCommand::CycleDifficulty, "Difficulty change");
    }

    fn retry(&mut self) {
        if self.state.phase() != GamePhase::Loading || self.state.session.game.load_error.is_none() {
            return;
        }
        self.round.supersede();
        self.send(SessionCommand::Retry, "Retry");
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.search.clear();
    }

    fn send(&mut self, cmd: SessionCommand, what: &str) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
        } else {
            self.state.command_sent();
        }
    }
}

/// Forwards `log` records into the console pane.
struct ConsoleLogger {
    tx: Mutex<mpsc::Sender<Delta>>,
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().starts_with("gridiron_paths")
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}", record.level(), record.args());
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(Delta::Log(line));
        }
    }

    fn flush(&self) {}
}

fn install_logger(tx: mpsc::Sender<Delta>) {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|val| val.trim().parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let logger: &'static ConsoleLogger = Box::leak(Box::new(ConsoleLogger { tx: Mutex::new(tx) }));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn open_store(config: &GameConfig) -> Arc<dyn DurableStore> {
    if let Some(path) = &config.store_path {
        match SqliteStore::open(path) {
            Ok(store) => return Arc::new(store),
            Err(err) => log::warn!("Progress will not be saved: {err:#}"),
        }
    }
    Arc::new(MemoryStore::new())
}

fn build_source(config: &GameConfig) -> Arc<dyn PlayerDataSource> {
    match config.source {
        SourceKind::Fake => {
            log::info!("Using the offline league");
            Arc::new(FakeSource::seeded())
        }
        SourceKind::Espn => match EspnSource::from_config(config) {
            Ok(source) => Arc::new(source),
            Err(err) => {
                log::warn!("ESPN client unavailable, using the offline league: {err:#}");
                Arc::new(FakeSource::seeded())
            }
        },
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = GameConfig::from_env();
    let (tx, rx) = mpsc::channel();
    install_logger(tx.clone());

    let store = open_store(&config);
    let cache = Arc::new(TtlCache::new(Arc::clone(&store)));
    let service = Arc::new(PlayerService::new(build_source(&config), cache, &config));
    let session = GameSession::new(Arc::clone(&service), store);
    let round = session.round_handle();
    let search = Autocomplete::new(service, config.search_debounce);

    let (cmd_tx, cmd_rx) = mpsc::channel();
    worker::spawn_session_worker(session, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(search, round, cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        let suggestions = app.search.snapshot();
        terminal.draw(|f| ui(f, app, &suggestions))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App, suggestions: &AutocompleteState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let career = Paragraph::new(career_text(&app.state))
        .style(Style::default().fg(phase_color(&app.state)))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Career path").borders(Borders::ALL));
    frame.render_widget(career, chunks[1]);

    let title = if suggestions.is_searching {
        "Guess (searching...)"
    } else {
        "Guess"
    };
    let input = Paragraph::new(format!("> {}", app.input))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(input, chunks[2]);

    let list = Paragraph::new(suggestion_lines(suggestions))
        .block(Block::default().title("Suggestions").borders(Borders::ALL));
    frame.render_widget(list, chunks[3]);

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[4]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[5]);
}

fn header_text(state: &AppState) -> String {
    let session = &state.session;
    format!(
        "GRIDIRON PATHS | {} | Streak {} (best {}) | Pool {}",
        session.difficulty.label(),
        session.streak.current,
        session.streak.best,
        session.pool_size
    )
}

fn phase_color(state: &AppState) -> Color {
    match state.phase() {
        GamePhase::Correct => Color::Green,
        GamePhase::Incorrect => Color::Red,
        GamePhase::Loading if state.session.game.load_error.is_some() => Color::Yellow,
        _ => Color::Reset,
    }
}

fn career_text(state: &AppState) -> String {
    let game = &state.session.game;
    if game.phase == GamePhase::Loading {
        return match &game.load_error {
            Some(err) if !state.busy => format!("Could not load a player: {err}\n\nCtrl+R to retry"),
            _ => "Loading next player...".to_string(),
        };
    }
    let Some(player) = &game.current_player else {
        return "Loading next player...".to_string();
    };

    let mut lines = vec![format!("Position: {}", player.position), String::new()];
    lines.extend(player.career_path.iter().map(format_stop));

    match game.phase {
        GamePhase::Correct => {
            lines.push(String::new());
            lines.push(format!("Correct! It was {}.", player.full_name));
        }
        GamePhase::Incorrect => {
            lines.push(String::new());
            match (&game.guessed_player_id, &state.last_guess) {
                (Some(_), Some(name)) => {
                    lines.push(format!("Incorrect: not {name}. It was {}.", player.full_name));
                }
                (Some(_), None) => lines.push(format!("Incorrect. It was {}.", player.full_name)),
                (None, _) => lines.push(format!("Skipped. It was {}.", player.full_name)),
            }
        }
        _ => {}
    }
    if game.phase.is_resolved() {
        lines.push("Enter for the next player".to_string());
    }
    lines.join("\n")
}

fn format_stop(stop: &CareerStop) -> String {
    match stop.kind {
        StopKind::College => format!("{:<11} {} (college)", "College", stop.name),
        StopKind::Affiliation => format!("{:<11} {}", stop.seasons, stop.name),
    }
}

fn suggestion_lines(suggestions: &AutocompleteState) -> Vec<Line<'static>> {
    if suggestions.results.is_empty() {
        let hint = if suggestions.query.trim().chars().count() < 2 {
            "Type at least 2 letters"
        } else if suggestions.is_searching {
            ""
        } else {
            "No players found"
        };
        return vec![Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::DarkGray),
        ))];
    }
    suggestions
        .results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let text = if result.team_name.is_empty() {
                format!("{} ({})", result.full_name, result.position)
            } else {
                format!("{} ({}, {})", result.full_name, result.position, result.team_name)
            };
            if suggestions.highlight == Some(idx) {
                Line::from(Span::styled(
                    format!("> {text}"),
                    Style::default().add_modifier(Modifier::REVERSED),
                ))
            } else {
                Line::from(format!("  {text}"))
            }
        })
        .collect()
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(4);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(state: &AppState) -> String {
    match state.phase() {
        GamePhase::Guessing => {
            "Type to search | ↑/↓ Move | Enter Guess | Esc Clear | Ctrl+S Skip | Ctrl+D Difficulty | Ctrl+Q Quit".to_string()
        }
        GamePhase::Correct | GamePhase::Incorrect => {
            "Enter Next player | Ctrl+D Difficulty | Ctrl+Q Quit".to_string()
        }
        GamePhase::Loading => "Ctrl+R Retry | Ctrl+D Difficulty | Ctrl+Q Quit".to_string(),
    }
}
