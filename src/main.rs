use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing_subscriber::EnvFilter;

use roster_terminal::api::{ApiClient, ApiError};
use roster_terminal::attendance::AttendanceBus;
use roster_terminal::config::Config;
use roster_terminal::evaluation_view::{EvaluationView, Mode, ViewKey};
use roster_terminal::feed;
use roster_terminal::month::Month;
use roster_terminal::player_view::PlayerView;
use roster_terminal::rating::PLACEHOLDER;
use roster_terminal::roster::GroupView;
use roster_terminal::skills::SkillCategory;
use roster_terminal::state::{
    AppState, Delta, InputPurpose, ProviderCommand, Screen, TextInput, apply_delta, watch_tab,
};

#[derive(Debug, Parser)]
#[command(name = "roster_terminal", about = "Terminal admin screens for the club roster API")]
struct Cli {
    /// Group to open on the group screen.
    #[arg(long)]
    group: Option<u64>,
    /// Player to open in a tab right away.
    #[arg(long)]
    player: Option<u64>,
    /// Month to show, as YYYY-MM. Defaults to the current month.
    #[arg(long)]
    month: Option<Month>,
}

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    delta_tx: mpsc::Sender<Delta>,
    bus: AttendanceBus,
    month: Month,
    api_url: String,
}

impl App {
    fn new(
        cmd_tx: mpsc::Sender<ProviderCommand>,
        delta_tx: mpsc::Sender<Delta>,
        bus: AttendanceBus,
        month: Month,
        api_url: String,
    ) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            delta_tx,
            bus,
            month,
            api_url,
        }
    }

    fn send(&mut self, cmd: ProviderCommand) -> bool {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Background worker is gone");
            return false;
        }
        true
    }

    fn open_group(&mut self, group_id: u64) {
        self.state.group = Some(GroupView::new(group_id));
        self.state.group_selected = 0;
        self.state.picker = None;
        self.send(ProviderCommand::FetchGroup { group_id });
    }

    /// Opens another tab on the player, even if one is already open.
    fn open_player(&mut self, player_id: u64) {
        let key = ViewKey::new(player_id, self.month);
        let tab_id = self.state.open_player_tab(key, &self.bus, &self.delta_tx);
        self.send(ProviderCommand::FetchPlayer { tab_id, key });
    }

    fn focus_or_open_player(&mut self, player_id: u64) {
        if !self.state.focus_player(player_id) {
            self.open_player(player_id);
        }
    }

    fn shift_month(&mut self, forward: bool) {
        let idx = self.state.active_tab;
        let Some(view) = self.state.tabs.get_mut(idx) else {
            return;
        };
        if view.evaluation.mode().is_editing() {
            self.state
                .push_log("[INFO] Save or cancel the current edit before switching month");
            return;
        }
        let current = view.key().month;
        let month = if forward { current.next() } else { current.prev() };
        view.set_month(month);
        watch_tab(view, &self.bus, &self.delta_tx);
        let (tab_id, key) = (view.tab_id(), view.key());
        self.month = month;
        self.send(ProviderCommand::FetchPlayer { tab_id, key });
    }

    fn reload(&mut self) {
        match self.state.screen {
            Screen::Group => {
                if let Some(group_id) = self.state.group.as_ref().map(|g| g.group_id) {
                    self.open_group(group_id);
                }
            }
            Screen::Player => {
                if let Some((tab_id, key)) = self
                    .state
                    .active_player()
                    .map(|t| (t.tab_id(), t.key()))
                {
                    self.send(ProviderCommand::FetchPlayer { tab_id, key });
                }
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input.is_some() {
            self.on_input_key(key);
            return;
        }
        if self.state.help_overlay {
            self.state.help_overlay = false;
            return;
        }
        match self.state.screen {
            Screen::Group => self.on_group_key(key),
            Screen::Player => self.on_player_key(key),
        }
    }

    fn on_group_key(&mut self, key: KeyEvent) {
        if self.state.picker.is_some() {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
                KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
                KeyCode::Enter => self.add_picked_player(),
                KeyCode::Esc => self.state.picker = None,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => {
                if let Some(id) = self.state.selected_group_player().map(|p| p.id) {
                    self.open_player(id);
                }
            }
            KeyCode::Char('o') => {
                if let Some(id) = self.state.selected_group_player().map(|p| p.id) {
                    self.focus_or_open_player(id);
                }
            }
            KeyCode::Tab if !self.state.tabs.is_empty() => self.state.screen = Screen::Player,
            KeyCode::Char('l') => self.reload(),
            KeyCode::Char('r') => {
                if !self.state.is_staff() {
                    self.state.push_log("[INFO] Only staff can rename groups");
                    return;
                }
                let seed = self
                    .state
                    .group
                    .as_ref()
                    .and_then(|g| g.group.as_ref())
                    .map(|g| g.name.clone())
                    .unwrap_or_default();
                self.state.input = Some(TextInput::new(InputPurpose::RenameGroup, seed));
            }
            KeyCode::Char('a') => {
                let candidates = self.state.group.as_ref().map_or(0, |g| g.candidates().len());
                if candidates == 0 {
                    self.state
                        .push_log("[INFO] Every known player is already in this group");
                } else {
                    self.state.picker = Some(0);
                }
            }
            KeyCode::Char('x') => {
                let Some(group_id) = self.state.group.as_ref().map(|g| g.group_id) else {
                    return;
                };
                if let Some(player_id) = self.state.selected_group_player().map(|p| p.id) {
                    self.send(ProviderCommand::DeletePlayer {
                        group_id,
                        player_id,
                    });
                }
            }
            KeyCode::Char('R') => {
                if let Some(group_id) = self.state.group.as_ref().map(|g| g.group_id) {
                    self.send(ProviderCommand::ResetEvaluations { group_id });
                }
            }
            KeyCode::Char('p') => {
                if let Some(group_id) = self.state.group.as_ref().map(|g| g.group_id) {
                    self.state.push_log("[INFO] Group PDF requested");
                    self.send(ProviderCommand::DownloadGroupPdf { group_id });
                }
            }
            _ => {}
        }
    }

    fn add_picked_player(&mut self) {
        let Some(group) = self.state.group.as_ref() else {
            return;
        };
        let group_id = group.group_id;
        let selected = self
            .state
            .picker
            .and_then(|idx| group.candidates().get(idx).map(|p| p.id));
        match GroupView::validate_selection(selected) {
            Ok(player_id) => {
                self.send(ProviderCommand::AssignPlayer {
                    group_id,
                    player_id,
                });
            }
            Err(err) => self.state.push_log(format!("[WARN] {err}")),
        }
    }

    fn on_player_key(&mut self, key: KeyEvent) {
        let Some(mode) = self.state.active_player().map(|t| t.evaluation.mode()) else {
            self.state.screen = Screen::Group;
            return;
        };
        match mode {
            Mode::EditingNotes => self.on_notes_key(key),
            Mode::Creating | Mode::EditingSkills => self.on_skills_key(key, mode),
            _ => self.on_viewing_key(key),
        }
    }

    fn on_viewing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('g') | KeyCode::Esc => self.state.screen = Screen::Group,
            KeyCode::Tab => self.state.next_tab(),
            KeyCode::Char('w') => {
                self.state.close_active_tab();
            }
            KeyCode::Char('[') => self.shift_month(false),
            KeyCode::Char(']') => self.shift_month(true),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('c') => self.with_evaluation(|v| v.begin_create()),
            KeyCode::Char('e') => self.with_evaluation(|v| v.begin_edit_skills()),
            KeyCode::Char('n') => self.with_evaluation(|v| v.begin_edit_notes()),
            KeyCode::Char('u') => {
                let uploading = self.state.active_player().is_some_and(|t| t.photo_uploading);
                if !uploading {
                    self.state.input = Some(TextInput::new(InputPurpose::PhotoPath, ""));
                }
            }
            KeyCode::Char('p') => {
                if let Some(key) = self.state.active_player().map(PlayerView::key) {
                    self.state.push_log("[INFO] Player PDF requested");
                    self.send(ProviderCommand::DownloadPlayerPdf { key });
                }
            }
            _ => {}
        }
    }

    fn on_skills_key(&mut self, key: KeyEvent, mode: Mode) {
        let skill = self.state.selected_skill();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(c @ '1'..='5') => {
                let value = f64::from(c.to_digit(10).unwrap_or(1));
                self.with_evaluation(|v| v.set_skill(skill, Some(value)));
                self.state.select_next();
            }
            KeyCode::Char('0') | KeyCode::Backspace | KeyCode::Delete => {
                self.with_evaluation(|v| v.set_skill(skill, None));
            }
            KeyCode::Char('n') if mode == Mode::Creating => {
                let seed = self
                    .state
                    .active_player()
                    .and_then(|t| t.evaluation.draft())
                    .map(|d| d.notes.clone())
                    .unwrap_or_default();
                self.state.input = Some(TextInput::new(InputPurpose::CreateNotes, seed));
            }
            KeyCode::Enter | KeyCode::Char('s') => self.save(),
            KeyCode::Esc => self.with_evaluation(|v| v.cancel()),
            _ => {}
        }
    }

    fn on_notes_key(&mut self, key: KeyEvent) {
        let Some(mut notes) = self
            .state
            .active_player()
            .and_then(|t| t.evaluation.draft())
            .map(|d| d.notes.clone())
        else {
            return;
        };
        match key.code {
            KeyCode::Enter => self.save(),
            KeyCode::Esc => self.with_evaluation(|v| v.cancel()),
            KeyCode::Backspace => {
                notes.pop();
                self.with_evaluation(|v| v.set_notes(notes));
            }
            KeyCode::Char(c) => {
                notes.push(c);
                self.with_evaluation(|v| v.set_notes(notes));
            }
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.state.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.input = None,
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Char(c) => input.buffer.push(c),
            KeyCode::Enter => self.submit_input(),
            _ => {}
        }
    }

    fn submit_input(&mut self) {
        let Some(input) = self.state.input.clone() else {
            return;
        };
        match input.purpose {
            InputPurpose::RenameGroup => {
                let Some(group) = self.state.group.as_ref() else {
                    self.state.input = None;
                    return;
                };
                let group_id = group.group_id;
                match group.validate_rename(&input.buffer) {
                    Ok(name) => {
                        self.state.input = None;
                        self.send(ProviderCommand::RenameGroup { group_id, name });
                    }
                    // Keep the prompt open so the name can be fixed.
                    Err(err) => self.state.push_log(format!("[WARN] {err}")),
                }
            }
            InputPurpose::CreateNotes => {
                self.state.input = None;
                self.with_evaluation(|v| v.set_notes(input.buffer));
            }
            InputPurpose::PhotoPath => {
                let raw = input.buffer.trim();
                if raw.is_empty() {
                    self.state.push_log("[WARN] Enter a file path");
                    return;
                }
                let path = PathBuf::from(raw);
                self.state.input = None;
                let Some(tab) = self.state.active_player_mut() else {
                    return;
                };
                tab.photo_uploading = true;
                let player_id = tab.key().player_id;
                self.send(ProviderCommand::UploadPhoto { player_id, path });
            }
        }
    }

    fn with_evaluation<E: std::fmt::Display>(
        &mut self,
        action: impl FnOnce(&mut EvaluationView) -> Result<(), E>,
    ) {
        let Some(tab) = self.state.active_player_mut() else {
            return;
        };
        if let Err(err) = action(&mut tab.evaluation) {
            self.state.push_log(format!("[INFO] {err}"));
        }
    }

    fn save(&mut self) {
        let Some(tab) = self.state.active_player_mut() else {
            return;
        };
        let key = tab.key();
        match tab.evaluation.prepare_save() {
            Ok(request) => {
                if !self.send(ProviderCommand::SaveEvaluation { key, request }) {
                    let err = ApiError::Transport("worker unavailable".to_string());
                    apply_delta(
                        &mut self.state,
                        Delta::EvaluationSaved {
                            key,
                            result: Err(err),
                        },
                    );
                }
            }
            Err(err) => self.state.push_log(format!("[INFO] {err}")),
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(config.log_file.as_deref())?;

    let client = ApiClient::from_config(&config)?;
    let bus = AttendanceBus::new();
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(
        client,
        bus.clone(),
        config.download_dir.clone(),
        tx.clone(),
        cmd_rx,
    );

    let month = cli.month.unwrap_or_else(Month::current);
    let mut app = App::new(cmd_tx, tx, bus, month, config.api_url.clone());
    app.send(ProviderCommand::FetchMe);
    if let Some(group_id) = cli.group {
        app.open_group(group_id);
    }
    if let Some(player_id) = cli.player {
        app.open_player(player_id);
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("terminal loop failed")
}

fn init_tracing(path: Option<&Path>) -> Result<()> {
    // The terminal belongs to the UI; diagnostics only go to a file.
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ROSTER_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(6),
            Constraint::Length(2),
        ])
        .split(area);

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Group => render_group(frame, chunks[1], &app.state),
        Screen::Player => render_player(frame, chunks[1], &app.state, &app.api_url),
    }

    render_logs(frame, chunks[2], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.picker.is_some() && app.state.screen == Screen::Group {
        render_picker(frame, area, &app.state);
    }
    if let Some(input) = app.state.input.as_ref() {
        render_input(frame, area, input);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, area);
    }
}

fn header_text(state: &AppState) -> String {
    match state.screen {
        Screen::Group => match state.group.as_ref().and_then(|g| g.group.as_ref()) {
            Some(group) => format!(
                "ROSTER | Group: {} | Coach: {}",
                group.name,
                group.coach_display()
            ),
            None => "ROSTER | Group".to_string(),
        },
        Screen::Player => match state.active_player() {
            Some(tab) => format!("ROSTER | {}", tab.title()),
            None => "ROSTER | Player".to_string(),
        },
    }
}

fn footer_text(state: &AppState) -> String {
    if state.input.is_some() {
        return "Type | Enter Confirm | Esc Cancel".to_string();
    }
    match state.screen {
        Screen::Group if state.picker.is_some() => {
            "j/k Move | Enter Add player | Esc Close".to_string()
        }
        Screen::Group => {
            "Enter New tab | o Focus | r Rename | a Add | x Delete | R Reset evals | p PDF | l Reload | Tab Players | ? Help | q Quit".to_string()
        }
        Screen::Player => match state.active_player().map(|t| t.evaluation.mode()) {
            Some(Mode::Creating) => {
                "j/k Skill | 1-5 Rate | 0 Clear | n Notes | Enter Save | Esc Cancel".to_string()
            }
            Some(Mode::EditingSkills) => {
                "j/k Skill | 1-5 Rate | 0 Clear | Enter Save | Esc Cancel".to_string()
            }
            Some(Mode::EditingNotes) => "Type notes | Enter Save | Esc Cancel".to_string(),
            _ => {
                "[/] Month | c Create | e Skills | n Notes | u Photo | p PDF | r Reload | Tab Next | w Close | g Group | q Quit".to_string()
            }
        },
    }
}

fn render_group(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(view) = state.group.as_ref() else {
        let empty = Paragraph::new("No group selected. Start with --group <id>.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };
    if let Some(err) = view.error.as_ref() {
        let msg = Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red));
        frame.render_widget(msg, area);
        return;
    }
    if view.loading {
        frame.render_widget(Paragraph::new("Loading group..."), area);
        return;
    }
    if view.players.is_empty() {
        let empty = Paragraph::new("No players in this group")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let lines: Vec<Line> = view
        .players
        .iter()
        .enumerate()
        .map(|(idx, player)| {
            let style = if idx == state.group_selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!(" {:<28}", player.name), style),
                Span::styled(format!(" {}", player.contact_line()), style.fg(Color::Gray)),
            ])
        })
        .collect();
    let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Players"));
    frame.render_widget(list, area);
}

fn render_player(frame: &mut Frame, area: Rect, state: &AppState, api_url: &str) {
    let Some(tab) = state.active_player() else {
        return;
    };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(1),
        ])
        .split(area);

    let titles: Vec<Span> = state
        .tabs
        .iter()
        .enumerate()
        .flat_map(|(idx, t)| {
            let style = if idx == state.active_tab {
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(Color::Gray)
            };
            [Span::styled(format!(" {} ", t.title()), style), Span::raw(" ")]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(titles)), sections[0]);

    let profile = match (tab.player.as_ref(), tab.error.as_ref()) {
        (_, Some(err)) => vec![Line::styled(err.clone(), Style::default().fg(Color::Red))],
        (None, None) => vec![Line::raw("Loading player...")],
        (Some(player), None) => {
            let photo = if tab.photo_uploading {
                "Uploading…".to_string()
            } else {
                player
                    .photo_url(api_url)
                    .unwrap_or_else(|| "No Photo".to_string())
            };
            vec![
                Line::styled(
                    player.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Line::raw(player.profile_line()),
                Line::styled(format!("Photo: {photo}"), Style::default().fg(Color::Gray)),
            ]
        }
    };
    frame.render_widget(
        Paragraph::new(profile).block(Block::default().borders(Borders::BOTTOM)),
        sections[1],
    );

    frame.render_widget(
        Paragraph::new(evaluation_lines(state, tab))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Evaluation · Month {}", tab.key().month)),
            ),
        sections[2],
    );
}

fn evaluation_lines<'a>(state: &AppState, tab: &'a PlayerView) -> Vec<Line<'a>> {
    let eval = &tab.evaluation;
    let mode = eval.mode();
    let mut lines = Vec::new();
    match mode {
        Mode::Loading => lines.push(Line::raw("Loading evaluation...")),
        Mode::NoEvaluation => {
            lines.push(Line::raw("No evaluation recorded for this month."));
            lines.push(Line::styled(
                "Press c to create one.",
                Style::default().fg(Color::DarkGray),
            ));
        }
        _ => {
            let editing_skills = matches!(mode, Mode::Creating | Mode::EditingSkills);
            let cursor = state.selected_skill();
            for category in SkillCategory::ALL {
                lines.push(Line::styled(
                    category.title(),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ));
                for skill in category.skills() {
                    let selected = editing_skills && skill == cursor;
                    let marker = if selected { ">" } else { " " };
                    let style = if selected {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    lines.push(Line::styled(
                        format!("{marker} {:<28} {}", format!("{}:", skill.label()), eval.skill_line(skill)),
                        style,
                    ));
                }
            }
            if mode != Mode::Creating {
                lines.push(Line::raw(format!(
                    "Average level: {}   Monthly attendance: {}",
                    eval.average_label(),
                    tab.attendance_summary()
                )));
            }
            let notes = match (mode, eval.draft()) {
                (Mode::Creating | Mode::EditingNotes, Some(draft)) => format!("{}_", draft.notes),
                _ => eval
                    .confirmed()
                    .and_then(|e| e.notes.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            };
            lines.push(Line::raw(format!("Notes: {notes}")));
        }
    }
    if eval.is_saving() {
        lines.push(Line::styled("Saving…", Style::default().fg(Color::Yellow)));
    }
    if let Some(err) = eval.error() {
        lines.push(Line::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        ));
    }
    lines
}

fn render_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|line| {
            let color = if line.starts_with("[WARN]") {
                Color::Red
            } else {
                Color::Gray
            };
            Line::styled(line.clone(), Style::default().fg(color))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log")),
        area,
    );
}

fn render_picker(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(group) = state.group.as_ref() else {
        return;
    };
    let selected = state.picker.unwrap_or(0);
    let lines: Vec<Line> = group
        .candidates()
        .iter()
        .enumerate()
        .map(|(idx, player)| {
            let style = if idx == selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::styled(player.option_label(), style)
        })
        .collect();
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Add Existing Player"),
        ),
        popup,
    );
}

fn render_input(frame: &mut Frame, area: Rect, input: &TextInput) {
    let popup = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(format!("{}_", input.buffer))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(input.prompt())),
        popup,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help = [
        "Group screen",
        "  j/k        move selection",
        "  Enter      open player in a new tab",
        "  o          focus the player's open tab",
        "  r          rename group (staff)",
        "  a          add an existing player",
        "  x          delete selected player",
        "  R          reset group evaluations",
        "  p          download group PDF",
        "",
        "Player screen",
        "  [ ]        previous / next month",
        "  c          create evaluation",
        "  e / n      edit skills / notes",
        "  1-5, 0     rate / clear selected skill",
        "  Enter, Esc save / cancel",
        "  u / p      upload photo / download PDF",
        "  Tab / w    next tab / close tab",
        "",
        "Any key closes this help",
    ];
    let popup = centered_rect(50, 70, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(help.join("\n"))
            .block(Block::default().borders(Borders::ALL).title("Help")),
        popup,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
