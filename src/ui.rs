// ============================================================================
// Terminal front end: key handling and drawing over TimerEngine + TaskStore
// ============================================================================

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use daytimer::{TaskStore, TimerEngine, clock};
use ratatui::{prelude::*, widgets::*};

const BORDER: Color = Color::Rgb(0, 200, 255);
const ACCENT: Color = Color::Rgb(255, 100, 0);
const FACE: Color = Color::Rgb(100, 181, 246);

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum InputMode {
    Normal,
    Adding,
    Editing(uuid::Uuid),
}

pub struct App<'a> {
    pub timer: TimerEngine<'a>,
    pub tasks: TaskStore<'a>,
    pub step_secs: i64,
    pub selected: usize,
    pub mode: InputMode,
    pub input: String,
    pub animation_frame: u8,
}

impl<'a> App<'a> {
    pub fn new(timer: TimerEngine<'a>, tasks: TaskStore<'a>, step_secs: i64) -> Self {
        Self {
            timer,
            tasks,
            step_secs,
            selected: 0,
            mode: InputMode::Normal,
            input: String::new(),
            animation_frame: 0,
        }
    }

    /// One event-loop turn without input.
    pub fn update(&mut self, now: std::time::Instant) {
        self.timer.poll(now);
        if self.tasks.poll() {
            self.selected = 0;
        }
        self.animation_frame = self.animation_frame.wrapping_add(1) % 20;
    }

    pub fn focus_gained(&mut self) {
        if self.tasks.resume() {
            self.selected = 0;
        }
    }

    /// Runs once the event loop has ended, before the terminal is handed back.
    pub fn shutdown(&mut self) {
        self.timer.prepare_for_termination();
    }

    fn clamp_selection(&mut self) {
        let len = self.tasks.total_count();
        self.selected = if len == 0 { 0 } else { self.selected.min(len - 1) };
    }

    fn selected_id(&self) -> Option<uuid::Uuid> {
        self.tasks.tasks().get(self.selected).map(|t| t.id)
    }
}

/// Returns `true` when the user asked to quit.
pub fn handle_input(key: KeyEvent, app: &mut App) -> bool {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    if control && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.mode != InputMode::Normal {
        match key.code {
            KeyCode::Char(c) if !control => app.input.push(c),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Enter => {
                match app.mode {
                    InputMode::Editing(id) => app.tasks.rename(id, &app.input),
                    _ => {
                        if app.tasks.add(&app.input).is_some() {
                            app.selected = app.tasks.total_count() - 1;
                        }
                    }
                }
                app.input.clear();
                app.mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                app.input.clear();
                app.mode = InputMode::Normal;
            }
            _ => {}
        }
        return false;
    }

    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        return true;
    }

    match key.code {
        KeyCode::Char(' ') => app.timer.toggle(),
        KeyCode::Char('r') => app.timer.reset(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.timer.adjust_time(app.step_secs),
        KeyCode::Char('-') | KeyCode::Char('_') => app.timer.adjust_time(-app.step_secs),
        KeyCode::Char('a') => {
            app.mode = InputMode::Adding;
            app.input.clear();
        }
        KeyCode::Enter | KeyCode::Char('x') => {
            if let Some(id) = app.selected_id() {
                app.tasks.toggle(id);
            }
        }
        KeyCode::Char('e') => {
            if let Some(task) = app.tasks.tasks().get(app.selected) {
                app.input = task.title.clone();
                app.mode = InputMode::Editing(task.id);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = app.selected_id() {
                app.tasks.remove(id);
            }
        }
        KeyCode::Char('c') => app.tasks.remove_completed(),
        KeyCode::Down | KeyCode::Char('j') => app.selected = app.selected.saturating_add(1),
        KeyCode::Up | KeyCode::Char('k') => app.selected = app.selected.saturating_sub(1),
        _ => {}
    }
    app.clamp_selection();
    false
}

// ============================================================================
// Rendering
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(f.size());

    let header = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            " ⏱ DAYTIMER ",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ));
    f.render_widget(header, chunks[0]);

    render_timer(f, app, chunks[1]);
    render_tasks(f, app, chunks[2]);
    render_controls(f, app, chunks[3]);
}

fn render_timer(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.timer.snapshot();
    let status = if snapshot.is_running {
        format!("{} RUNNING", if app.animation_frame < 10 { "●" } else { "○" })
    } else {
        "⏸  STOPPED".to_string()
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            snapshot.time_string,
            Style::default().fg(FACE).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            status,
            Style::default()
                .fg(if snapshot.is_running { Color::Green } else { Color::Yellow })
                .add_modifier(Modifier::BOLD),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER)),
        ),
        area,
    );
}

fn render_tasks(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    if app.tasks.tasks().is_empty() && app.mode == InputMode::Normal {
        lines.push(Line::from(Span::styled(
            "  Nothing planned yet! Press 'a' to add a task.",
            Style::default().fg(Color::Gray),
        )));
    }

    for (idx, task) in app.tasks.tasks().iter().enumerate() {
        if app.mode == InputMode::Editing(task.id) {
            lines.push(input_line(&app.input));
            continue;
        }
        let selected = idx == app.selected && app.mode == InputMode::Normal;
        let prefix = if selected { "► " } else { "  " };
        let check = if task.is_completed { "[x] " } else { "[ ] " };
        let style = match (selected, task.is_completed) {
            (true, _) => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            (false, true) => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            (false, false) => Style::default().fg(Color::Gray),
        };
        lines.push(Line::from(vec![
            Span::styled(prefix, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::styled(check, style),
            Span::styled(&task.title, style),
        ]));
    }

    if app.mode == InputMode::Adding {
        lines.push(input_line(&app.input));
    }

    let title = format!(
        " Done: {}/{} • clears at {} ",
        app.tasks.completed_count(),
        app.tasks.total_count(),
        clock::format_boundary(app.tasks.next_reset()),
    );
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER)),
        ),
        area,
    );
}

fn input_line(input: &str) -> Line<'_> {
    Line::from(vec![
        Span::raw("  ✏️  "),
        Span::styled(input, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled("█", Style::default().fg(Color::Green)),
    ])
}

fn render_controls(f: &mut Frame, app: &App, area: Rect) {
    let controls = if app.mode != InputMode::Normal {
        vec![Line::from(vec![
            span_key("Enter"),
            Span::raw(" Save  •  "),
            span_key("Esc"),
            Span::raw(" Cancel"),
        ])]
    } else {
        vec![
            Line::from(vec![
                span_key("Space"),
                Span::raw(" Start/Pause  •  "),
                span_key("R"),
                Span::raw(" Reset  •  "),
                span_key("+/-"),
                Span::raw(format!(" ±{}s", app.step_secs)),
            ]),
            Line::from(vec![
                span_key("A"),
                Span::raw(" Add  •  "),
                span_key("X"),
                Span::raw(" Check  •  "),
                span_key("E"),
                Span::raw(" Edit  •  "),
                span_key("D"),
                Span::raw(" Delete  •  "),
                span_key("C"),
                Span::raw(" Clear done  •  "),
                span_key("Q"),
                Span::raw(" Quit"),
            ]),
        ]
    };
    f.render_widget(
        Paragraph::new(controls)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn span_key(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use daytimer::{
        Authorization, Clock, Defaults, NotificationGateway, Preferences, error::NotifyError,
        notify::{Alert, AlertCenter},
    };
    use std::time::Duration;

    struct Silent;

    impl AlertCenter for Silent {
        fn authorization_status(&self) -> Authorization {
            Authorization::Denied
        }
        fn request_authorization(&self) -> Result<bool, NotifyError> {
            Ok(false)
        }
        fn schedule(&self, _: &Alert, _: Duration) -> Result<(), NotifyError> {
            Ok(())
        }
        fn cancel_all(&self) {}
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_task(app: &mut App, title: &str) {
        handle_input(key(KeyCode::Char('a')), app);
        for c in title.chars() {
            handle_input(key(KeyCode::Char(c)), app);
        }
        handle_input(key(KeyCode::Enter), app);
    }

    #[test]
    fn keys_drive_timer_and_tasks() {
        let defaults = Defaults::in_memory();
        let clock = daytimer::SystemClock;
        let alerts = NotificationGateway::new(Silent);
        // keep the reset check from wiping mid-test
        defaults.set(
            daytimer::defaults::LAST_RESET_KEY,
            &clock.now().with_timezone(&chrono::Utc),
        );
        let timer = TimerEngine::new(Preferences::new(&defaults), &alerts);
        let tasks = TaskStore::new(&defaults, &clock, 6);
        let mut app = App::new(timer, tasks, 60);

        handle_input(key(KeyCode::Char('+')), &mut app);
        handle_input(key(KeyCode::Char('+')), &mut app);
        handle_input(key(KeyCode::Char('-')), &mut app);
        assert_eq!(app.timer.time_string(), "01:00");

        handle_input(key(KeyCode::Char(' ')), &mut app);
        assert!(app.timer.is_running());
        handle_input(key(KeyCode::Char('r')), &mut app);
        assert!(!app.timer.is_running());
        assert_eq!(app.timer.remaining_secs(), 0);

        type_task(&mut app, "write report");
        type_task(&mut app, "   ");
        type_task(&mut app, "call bank");
        assert_eq!(app.tasks.total_count(), 2);
        assert_eq!(app.selected, 1);

        handle_input(key(KeyCode::Char('x')), &mut app);
        assert_eq!(app.tasks.completed_count(), 1);
        handle_input(key(KeyCode::Char('c')), &mut app);
        assert_eq!(app.tasks.total_count(), 1);
        assert_eq!(app.selected, 0);

        assert!(handle_input(key(KeyCode::Char('q')), &mut app));
    }

    #[test]
    fn edit_renames_selected_task() {
        let defaults = Defaults::in_memory();
        let clock = daytimer::SystemClock;
        let alerts = NotificationGateway::new(Silent);
        let timer = TimerEngine::new(Preferences::new(&defaults), &alerts);
        let tasks = TaskStore::new(&defaults, &clock, 6);
        let mut app = App::new(timer, tasks, 60);
        type_task(&mut app, "draft");

        handle_input(key(KeyCode::Char('e')), &mut app);
        assert_eq!(app.input, "draft");
        handle_input(key(KeyCode::Backspace), &mut app);
        handle_input(key(KeyCode::Char('!')), &mut app);
        handle_input(key(KeyCode::Enter), &mut app);

        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.tasks.total_count(), 1);
        assert_eq!(app.tasks.tasks()[0].title, "draf!");
    }

    #[test]
    fn ctrl_c_quits_while_typing() {
        let defaults = Defaults::in_memory();
        let clock = daytimer::SystemClock;
        let alerts = NotificationGateway::new(Silent);
        let timer = TimerEngine::new(Preferences::new(&defaults), &alerts);
        let tasks = TaskStore::new(&defaults, &clock, 6);
        let mut app = App::new(timer, tasks, 60);

        handle_input(key(KeyCode::Char('a')), &mut app);
        handle_input(key(KeyCode::Char('h')), &mut app);
        assert!(!handle_input(
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
            &mut app
        ));
        assert_eq!(app.input, "h");

        assert!(handle_input(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut app
        ));
        assert_eq!(app.input, "h");
    }

    #[test]
    fn quitting_mid_countdown_saves_remaining() {
        let defaults = Defaults::in_memory();
        let prefs = Preferences::new(&defaults);
        let clock = daytimer::SystemClock;
        let alerts = NotificationGateway::new(Silent);
        let timer = TimerEngine::new(prefs, &alerts);
        let tasks = TaskStore::new(&defaults, &clock, 6);
        let mut app = App::new(timer, tasks, 60);

        handle_input(key(KeyCode::Char('+')), &mut app);
        let t0 = std::time::Instant::now();
        app.timer.toggle_at(t0);
        app.update(t0 + Duration::from_secs(15));
        assert!(handle_input(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut app
        ));

        app.shutdown();
        assert_eq!(prefs.last_timer_duration(), 45.0);
    }
}
