use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::FocusConfig;
use crate::domain::{format_countdown, resolve_category, HistoryEntry, Session};
use crate::review::{Review, ReviewEffect, ReviewInput};
use crate::state::FocusApp;

const ACTIVE_CHIP_COLOR: Color = Color::Yellow;
const DIM_COLOR: Color = Color::DarkGray;
const RECENT_LIMIT: usize = 3;

pub fn run_dashboard(app: &mut FocusApp, config: &FocusConfig) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, app, config);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	app: &mut FocusApp,
	config: &FocusConfig,
) -> Result<(), Box<dyn Error>> {
	let mut ui = Ui::default();

	loop {
		let now_ms = Utc::now().timestamp_millis();
		let view = build_view(app);

		if ui.screen == Screen::Timer && ui.review.is_none() {
			match &view.session {
				Some(session) if session.remaining_ms(now_ms) == 0 => open_review(&mut ui, app),
				Some(_) => {}
				None => ui.screen = Screen::Today,
			}
		}

		terminal.draw(|frame| draw_dashboard(frame, &ui, &view, config))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = if ui.review.is_some() {
					handle_review_key(&mut ui, app, key.code);
					false
				} else {
					match ui.screen {
						Screen::Today => handle_today_key(&mut ui, app, config, key.code),
						Screen::Timer => handle_timer_key(&mut ui, app, key.code),
					}
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn handle_today_key(ui: &mut Ui, app: &mut FocusApp, config: &FocusConfig, code: KeyCode) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Left | KeyCode::Char('h') => {
			ui.move_chip(-1, config);
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			ui.move_chip(1, config);
			false
		}
		KeyCode::Enter => {
			if let Some(category) = config.categories.get(ui.chip_index) {
				ui.status = match app.set_current_category(category) {
					Ok(()) => format!("category: {category}"),
					Err(err) => format!("error: {err}"),
				};
			}
			false
		}
		KeyCode::Char('c') => {
			ui.status = match app.set_current_category("") {
				Ok(()) => "category cleared".to_string(),
				Err(err) => format!("error: {err}"),
			};
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			ui.move_preset(-1, config);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			ui.move_preset(1, config);
			false
		}
		KeyCode::Char('s') | KeyCode::Char(' ') => {
			let minutes = ui.selected_duration(app, config);
			match app.start_focus(f64::from(minutes), Utc::now().timestamp_millis()) {
				Ok(session) => {
					ui.screen = Screen::Timer;
					ui.status = format!("focusing for {} min", session.duration_min);
				}
				Err(err) => ui.status = format!("error: {err}"),
			}
			false
		}
		KeyCode::Char('t') => {
			if app.current_session().is_some() {
				ui.screen = Screen::Timer;
			} else {
				ui.status = "no active session".to_string();
			}
			false
		}
		_ => false,
	}
}

fn handle_timer_key(ui: &mut Ui, app: &mut FocusApp, code: KeyCode) -> bool {
	match code {
		// Leaving the timer view does not touch the session; it keeps
		// ticking and can be picked up again from Today with 't'.
		KeyCode::Char('q') | KeyCode::Esc => {
			ui.screen = Screen::Today;
			false
		}
		KeyCode::Char(' ') => {
			if let Some(mut session) = app.current_session() {
				let now_ms = Utc::now().timestamp_millis();
				if session.is_paused() {
					session.resume(now_ms);
				} else {
					session.pause(now_ms);
				}
				ui.status = match app.save_session(&session) {
					Ok(()) if session.is_paused() => "paused".to_string(),
					Ok(()) => "running".to_string(),
					Err(err) => format!("error: {err}"),
				};
			}
			false
		}
		KeyCode::Char('f') => {
			open_review(ui, app);
			false
		}
		_ => false,
	}
}

fn handle_review_key(ui: &mut Ui, app: &mut FocusApp, code: KeyCode) {
	let Some(review) = &mut ui.review else {
		return;
	};

	let input = match code {
		KeyCode::Enter => ReviewInput::Save,
		KeyCode::Esc => ReviewInput::Skip,
		KeyCode::Backspace => ReviewInput::Backspace,
		KeyCode::Char(value) => ReviewInput::Type(value),
		_ => return,
	};

	if let Some(effect) = review.handle(input) {
		ui.review = None;
		apply_review_effect(ui, app, effect);
	}
}

fn open_review(ui: &mut Ui, app: &mut FocusApp) {
	let (review, effect) = Review::open(app.current_session(), &app.current_category(), true);
	match effect {
		Some(effect) => apply_review_effect(ui, app, effect),
		None => ui.review = Some(review),
	}
}

fn apply_review_effect(ui: &mut Ui, app: &mut FocusApp, effect: ReviewEffect) {
	match effect {
		ReviewEffect::ShowSummary => {
			ui.screen = Screen::Today;
		}
		ReviewEffect::Finalize { session, note } => {
			let today = Local::now().date_naive();
			ui.status = match app.finalize(&session, &note, today) {
				Ok(()) => format!("recorded {} min", session.duration_min),
				Err(err) => format!("error: {err}"),
			};
			ui.screen = Screen::Today;
		}
	}
}

fn build_view(app: &FocusApp) -> ViewModel {
	let today = Local::now().date_naive();
	ViewModel {
		today,
		today_minutes: app.minutes_for_day(today),
		current_category: app.current_category(),
		recent: app.history().into_iter().take(RECENT_LIMIT).collect(),
		session: app.current_session(),
	}
}

fn draw_dashboard(frame: &mut Frame, ui: &Ui, view: &ViewModel, config: &FocusConfig) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(10), Constraint::Length(4)])
		.split(frame.area());

	match ui.screen {
		Screen::Today => render_today(frame, layout[0], ui, view, config),
		Screen::Timer => render_timer(frame, layout[0], view),
	}
	render_footer(frame, layout[1], ui);

	if let Some(review) = &ui.review {
		if review.is_open() {
			render_review_popup(frame, review);
		}
	}
}

fn render_today(frame: &mut Frame, area: Rect, ui: &Ui, view: &ViewModel, config: &FocusConfig) {
	let body = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(3),
			Constraint::Length(3),
			Constraint::Length(3),
			Constraint::Min(4),
		])
		.split(area);

	let header = Paragraph::new(Line::from(format!(
		"{} | {} focus minutes",
		view.today.format("%A, %d %B %Y"),
		view.today_minutes
	)))
	.block(Block::default().borders(Borders::ALL).title("Today"));
	frame.render_widget(header, body[0]);

	render_chips(frame, body[1], ui, view, config);
	render_duration_row(frame, body[2], ui, config);
	render_recent(frame, body[3], view);
}

fn render_chips(frame: &mut Frame, area: Rect, ui: &Ui, view: &ViewModel, config: &FocusConfig) {
	let mut spans = Vec::new();
	for (index, category) in config.categories.iter().enumerate() {
		let mut style = Style::default();
		if *category == view.current_category {
			style = style.fg(ACTIVE_CHIP_COLOR).add_modifier(Modifier::BOLD);
		}
		if index == ui.chip_index {
			style = style.add_modifier(Modifier::UNDERLINED);
		}
		spans.push(Span::styled(format!(" {category} "), style));
		spans.push(Span::raw(" "));
	}
	if config.categories.is_empty() {
		spans.push(Span::styled("(no categories configured)", Style::default().fg(DIM_COLOR)));
	}

	let title = if view.current_category.is_empty() {
		"Category: (none)".to_string()
	} else {
		format!("Category: {}", view.current_category)
	};
	let chips = Paragraph::new(Line::from(spans))
		.block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(chips, area);
}

fn render_duration_row(frame: &mut Frame, area: Rect, ui: &Ui, config: &FocusConfig) {
	let mut spans = Vec::new();
	for (index, minutes) in config.duration_presets_min.iter().enumerate() {
		let style = if ui.preset_index == Some(index) {
			Style::default().fg(ACTIVE_CHIP_COLOR).add_modifier(Modifier::BOLD)
		} else {
			Style::default()
		};
		spans.push(Span::styled(format!(" {minutes} "), style));
	}
	if ui.preset_index.is_none() {
		spans.push(Span::styled(" (last used) ", Style::default().fg(DIM_COLOR)));
	}

	let row = Paragraph::new(Line::from(spans))
		.block(Block::default().borders(Borders::ALL).title("Duration (min)"));
	frame.render_widget(row, area);
}

fn render_recent(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let mut lines = Vec::new();
	for entry in &view.recent {
		lines.push(history_line(entry));
	}
	if lines.is_empty() {
		lines.push(Line::from(Span::styled(
			"no sessions recorded yet",
			Style::default().fg(DIM_COLOR),
		)));
	}

	let recent = Paragraph::new(lines)
		.block(Block::default().borders(Borders::ALL).title("Recent sessions"));
	frame.render_widget(recent, area);
}

fn history_line(entry: &HistoryEntry) -> Line<'static> {
	let time = Local
		.timestamp_millis_opt(entry.start_at)
		.single()
		.map(|started| started.format("%H:%M").to_string())
		.unwrap_or_else(|| "--:--".to_string());
	let note = if entry.note.is_empty() {
		Span::styled("(no note)".to_string(), Style::default().fg(DIM_COLOR))
	} else {
		Span::raw(entry.note.clone())
	};

	Line::from(vec![
		Span::raw(format!("{time} · {} · {} min | ", entry.category, entry.duration_min)),
		note,
	])
}

fn render_timer(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let now_ms = Utc::now().timestamp_millis();
	let mut lines = vec![Line::from("")];

	match &view.session {
		Some(session) => {
			let category = resolve_category(&session.category, &view.current_category);
			lines.push(Line::from(format!("{category} | {} min", session.duration_min)));
			lines.push(Line::from(""));
			lines.push(Line::from(Span::styled(
				format_countdown(session.remaining_ms(now_ms)),
				Style::default().add_modifier(Modifier::BOLD),
			)));
			if session.is_paused() {
				lines.push(Line::from(Span::styled(
					"paused",
					Style::default().fg(DIM_COLOR),
				)));
			}
		}
		None => lines.push(Line::from("no active session")),
	}

	let timer = Paragraph::new(lines)
		.alignment(ratatui::layout::Alignment::Center)
		.block(Block::default().borders(Borders::ALL).title("Focus"));
	frame.render_widget(timer, area);
}

fn render_footer(frame: &mut Frame, area: Rect, ui: &Ui) {
	let shortcuts = if ui.review.is_some() {
		"type note | Enter save | Esc skip (still recorded)"
	} else {
		match ui.screen {
			Screen::Today => {
				"h/l chip | Enter set category | c clear | j/k duration | s start | t timer | q quit"
			}
			Screen::Timer => "space pause/resume | f finish now | q back",
		}
	};

	let footer = Paragraph::new(vec![Line::from(shortcuts), Line::from(ui.status.clone())])
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_review_popup(frame: &mut Frame, review: &Review) {
	let area = centered_rect(60, 40, frame.area());
	frame.render_widget(Clear, area);

	let lines = vec![
		Line::from(format!("Category: {}", review.category().unwrap_or(""))),
		Line::from(format!("Duration: {} min", review.duration_min().unwrap_or(0))),
		Line::from(""),
		Line::from(format!("Note> {}", review.note().unwrap_or(""))),
		Line::from(""),
		Line::from(Span::styled(
			"Enter save | Esc skip (still recorded)",
			Style::default().fg(DIM_COLOR),
		)),
	];

	let popup = Paragraph::new(lines)
		.block(Block::default().borders(Borders::ALL).title("Session review"));
	frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
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
		.split(popup_layout[1])[1]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
	Today,
	Timer,
}

struct Ui {
	screen: Screen,
	chip_index: usize,
	preset_index: Option<usize>,
	review: Option<Review>,
	status: String,
}

impl Default for Ui {
	fn default() -> Self {
		Self {
			screen: Screen::Today,
			chip_index: 0,
			preset_index: None,
			review: None,
			status: "Ready".to_string(),
		}
	}
}

impl Ui {
	fn move_chip(&mut self, delta: i32, config: &FocusConfig) {
		if config.categories.is_empty() {
			self.chip_index = 0;
			return;
		}

		if delta > 0 {
			self.chip_index = (self.chip_index + delta as usize).min(config.categories.len() - 1);
		} else {
			self.chip_index = self.chip_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn move_preset(&mut self, delta: i32, config: &FocusConfig) {
		if config.duration_presets_min.is_empty() {
			self.preset_index = None;
			return;
		}

		self.preset_index = Some(match self.preset_index {
			None => {
				if delta > 0 {
					0
				} else {
					config.duration_presets_min.len() - 1
				}
			}
			Some(index) if delta > 0 => {
				(index + delta as usize).min(config.duration_presets_min.len() - 1)
			}
			Some(index) => index.saturating_sub(delta.unsigned_abs() as usize),
		});
	}

	fn selected_duration(&self, app: &FocusApp, config: &FocusConfig) -> u32 {
		self.preset_index
			.and_then(|index| config.duration_presets_min.get(index).copied())
			.unwrap_or_else(|| app.last_duration_min())
	}
}

struct ViewModel {
	today: NaiveDate,
	today_minutes: u32,
	current_category: String,
	recent: Vec<HistoryEntry>,
	session: Option<Session>,
}
