use clap::Parser;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use daytimer::{
    Config, Defaults, DesktopAlertCenter, NotificationGateway, Preferences, SystemClock,
    TaskStore, TimerEngine,
    config::{self, DEFAULTS_FILE},
    logging,
};
use ratatui::prelude::*;
use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::info;

mod ui;

use ui::{App, handle_input, render_ui};

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const FRAME_RATE: Duration = Duration::from_millis(50);

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Clone)]
#[command(author, version, about = "⏱ daytimer - countdown timer with a daily checklist")]
struct Args {
    /// Where settings, tasks and logs are kept
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Local hour at which the checklist clears (0-23)
    #[arg(long)]
    reset_hour: Option<u32>,
    /// Seconds added or removed per +/- press
    #[arg(long)]
    step: Option<i64>,
    /// Preset the timer to this many minutes before starting
    #[arg(short, long, value_parser = parse_minutes)]
    minutes: Option<u64>,
    #[arg(long)]
    no_sound: bool,
    #[arg(long)]
    no_notifications: bool,
}

fn parse_minutes(s: &str) -> std::result::Result<u64, String> {
    let m: f64 = s.trim().parse().map_err(|_| "Invalid minutes")?;
    if m.is_finite() && m >= 0.0 {
        Ok((m * 60.0).round() as u64)
    } else {
        Err("Minutes must be >= 0".into())
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let dir = config::data_dir(args.data_dir.clone());
    let _log_guard = logging::init(&dir)?;

    let mut config = Config::load(&dir);
    // CLI overrides
    if let Some(h) = args.reset_hour { config.reset_hour = h; }
    if let Some(s) = args.step { config.adjust_step_secs = s; }
    if args.no_sound { config.sound_enabled = false; }
    if args.no_notifications { config.notifications = Some(false); }
    config.validate()?;

    info!(data_dir = %dir.display(), reset_hour = config.reset_hour, "starting");

    let defaults = Defaults::open(dir.join(DEFAULTS_FILE));
    let alerts = NotificationGateway::new(DesktopAlertCenter::new(
        config.notifications,
        config.sound_enabled,
    ));
    let clock = SystemClock;

    let mut timer = TimerEngine::new(Preferences::new(&defaults), &alerts);
    if let Some(secs) = args.minutes {
        timer.set_duration(secs);
    }
    let tasks = TaskStore::new(&defaults, &clock, config.reset_hour);
    let mut app = App::new(timer, tasks, config.adjust_step_secs);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);
    app.shutdown();
    info!("exiting");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;
    terminal.show_cursor()?;

    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|f| render_ui(f, app))?;

        let timeout = FRAME_RATE.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_input(key, app) {
                        return Ok(());
                    }
                }
                Event::FocusGained => app.focus_gained(),
                _ => {}
            }
        }

        if last_frame.elapsed() >= FRAME_RATE {
            app.update(Instant::now());
            last_frame = Instant::now();
        }
    }
}
