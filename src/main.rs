//! Desktop multi-timer for the terminal. Every timer counts down on a
//! shared one-second pulse and can cycle between a work duration and a
//! break duration. Definitions are kept in SQLite between runs.

mod app;
mod config;
mod notify;
mod store;
mod timer;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use app::{App, InputMode};
use config::AppConfig;
use notify::DesktopAlert;
use store::TimerStore;
use timer::{Alert, format_time};

#[derive(Parser)]
#[command(name = "timer-tui")]
#[command(version = "0.1.0")]
#[command(about = "Run several countdown timers side by side, each with an optional break cycle")]
struct Args {
    /// Path to the timer database (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a timer to the store
    Add {
        name: String,
        /// Work duration in seconds
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        duration: i64,
        /// Optional break duration in seconds
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        alternate: Option<i64>,
    },
    /// List all stored timers
    List,
    /// Remove a timer by id
    Remove { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Args = Args::parse();
    let config: AppConfig = AppConfig::load().unwrap_or_default();

    let db_path: PathBuf = args
        .database
        .clone()
        .or_else(|| config.database_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(store::default_database_path);
    let store = TimerStore::open(&db_path).await?;

    match args.command {
        Some(Commands::Add {
            name,
            duration,
            alternate,
        }) => {
            let def = store
                .create(&name, duration as u64, alternate.map(|secs| secs as u64))
                .await?;
            println!("Added timer {} ({})", def.id, def.name);
        }
        Some(Commands::List) => {
            for def in store.list().await? {
                let alternate: String = match def.alternate_duration {
                    Some(secs) => format!(", break {}", format_time(secs)),
                    None => String::new(),
                };
                println!(
                    "{:>4}  {:>8}  {}{}",
                    def.id,
                    format_time(def.primary_duration),
                    def.name,
                    alternate
                );
            }
        }
        Some(Commands::Remove { id }) => {
            store.delete(id).await?;
            println!("Removed timer {id}");
        }
        None => {
            run_tui(store, &config).await?;
        }
    }

    Ok(())
}

async fn run_tui(store: TimerStore, config: &AppConfig) -> Result<()> {
    let mut app = App::new(store, config).await?;
    let mut alert = DesktopAlert;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &mut alert).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    alert: &mut DesktopAlert,
) -> io::Result<()> {
    let tick_rate: Duration = Duration::from_secs(1);
    let mut last_tick: Instant = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Wait for a key only until the next pulse is due, so timers keep
        // counting while a prompt is open.
        let timeout: Duration = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(key, app, alert).await {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick_all(alert);
            last_tick = Instant::now();
        }
    }
}

/// Returns true when the app should quit.
async fn handle_key(key: KeyEvent, app: &mut App, alert: &mut dyn Alert) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    app.clear_status();

    match app.input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => app.next(),
            KeyCode::Char('k') | KeyCode::Up => app.previous(),
            KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(alert),
            KeyCode::Char('r') => app.reset_selected(),
            KeyCode::Char('s') => app.toggle_sound_selected(),
            KeyCode::Char('t') => app.toggle_repeat_selected(),
            KeyCode::Char('a') => app.begin_add(),
            KeyCode::Char('p') => app.add_pomodoro().await,
            KeyCode::Char('e') => app.add_eye_care().await,
            KeyCode::Char('c') => app.begin_change(),
            KeyCode::Char('n') => app.begin_rename(),
            KeyCode::Char('d') => app.delete_selected().await,
            _ => {}
        },
        InputMode::AskingAlternate => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_alternate(true).await,
            KeyCode::Char('n') | KeyCode::Char('N') => app.answer_alternate(false).await,
            KeyCode::Esc => app.cancel_input().await,
            _ => {}
        },
        _ => match key.code {
            KeyCode::Enter => app.submit_input().await,
            KeyCode::Char(c) => app.push_input(c),
            KeyCode::Backspace => app.pop_input(),
            KeyCode::Esc => app.cancel_input().await,
            _ => {}
        },
    }

    false
}
