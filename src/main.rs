mod config;
mod domain;
mod review;
mod state;
mod store;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};

use crate::config::load_config;
use crate::domain::{format_countdown, resolve_category};
use crate::review::{Review, ReviewEffect};
use crate::state::FocusApp;
use crate::store::{resolve_state_dir, Store};

#[derive(Debug, Parser)]
#[command(name = "focus-night", about = "Terminal-first focus timer")]
struct Cli {
	#[arg(long)]
	state_dir: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	Start {
		#[arg(long)]
		minutes: Option<f64>,
		#[arg(long)]
		category: Option<String>,
	},
	Finish {
		#[arg(long)]
		note: Option<String>,
	},
	Status,
	Summary {
		#[arg(long)]
		day: Option<String>,
	},
	History {
		#[arg(long, default_value_t = 10)]
		limit: usize,
	},
	Category {
		#[arg(long)]
		set: Option<String>,
		#[arg(long, default_value_t = false)]
		clear: bool,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let state_dir = resolve_state_dir(cli.state_dir);
	let config = load_config(&state_dir);
	let mut app = FocusApp::new(Store::open(state_dir));

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Dashboard => {
			ui::run_dashboard(&mut app, &config)?;
		}
		Command::Start { minutes, category } => {
			if let Some(category) = category {
				app.set_current_category(&category)?;
			}
			let minutes = minutes.unwrap_or_else(|| f64::from(app.last_duration_min()));
			let session = app.start_focus(minutes, Utc::now().timestamp_millis())?;
			println!(
				"started {} min focus | {}",
				session.duration_min,
				resolve_category(&session.category, "")
			);
		}
		Command::Finish { note } => {
			finish_headless(&mut app, note.as_deref())?;
		}
		Command::Status => {
			print_status(&app);
		}
		Command::Summary { day } => {
			print_summary(&app, day.as_deref())?;
		}
		Command::History { limit } => {
			print_history(&app, limit);
		}
		Command::Category { set, clear } => {
			if clear {
				app.set_current_category("")?;
				println!("category cleared");
			} else if let Some(category) = set {
				app.set_current_category(&category)?;
				println!("category: {category}");
			} else {
				let current = app.current_category();
				if current.is_empty() {
					println!("(none)");
				} else {
					println!("{current}");
				}
			}
		}
	}

	Ok(())
}

/// Headless review path: no prompt surface is available, so the session
/// is finalized directly with the note given on the command line.
fn finish_headless(app: &mut FocusApp, note: Option<&str>) -> Result<(), Box<dyn Error>> {
	let (_, effect) = Review::open(app.current_session(), &app.current_category(), false);

	match effect {
		Some(ReviewEffect::Finalize { session, .. }) => {
			let today = Local::now().date_naive();
			app.finalize(&session, note.unwrap_or(""), today)?;
			println!(
				"recorded {} min for {}",
				session.duration_min,
				today.format("%Y-%m-%d")
			);
		}
		Some(ReviewEffect::ShowSummary) | None => {
			println!("no active session");
			print_summary(app, None)?;
		}
	}

	Ok(())
}

fn print_status(app: &FocusApp) {
	match app.current_session() {
		Some(session) => {
			let now_ms = Utc::now().timestamp_millis();
			let state = if session.is_paused() { "paused" } else { "running" };
			println!(
				"{state} | {} | {} remaining",
				resolve_category(&session.category, ""),
				format_countdown(session.remaining_ms(now_ms))
			);
		}
		None => println!("no active session"),
	}
}

fn print_summary(app: &FocusApp, day: Option<&str>) -> Result<(), Box<dyn Error>> {
	let day = parse_day(day)?;
	println!(
		"{}: {} focus minutes",
		day.format("%Y-%m-%d"),
		app.minutes_for_day(day)
	);
	Ok(())
}

fn print_history(app: &FocusApp, limit: usize) {
	let history = app.history();
	if history.is_empty() {
		println!("no sessions recorded yet");
		return;
	}

	for entry in history.iter().take(limit) {
		let started = Local
			.timestamp_millis_opt(entry.start_at)
			.single()
			.map(|started| started.format("%Y-%m-%d %H:%M").to_string())
			.unwrap_or_else(|| "(unknown time)".to_string());
		let note = if entry.note.is_empty() {
			"(no note)".to_string()
		} else {
			entry.note.clone()
		};
		println!(
			"{started} | {} | {} min | {note}",
			entry.category, entry.duration_min
		);
	}
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(Local::now().date_naive())
	}
}
