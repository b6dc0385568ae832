//! Countdown state machine.
//!
//! The engine has no thread of its own. Starting it arms a one-second tick
//! deadline and the event loop calls [`TimerEngine::poll`]; every whole
//! second that has elapsed since the deadline is delivered to the tick
//! handler, so a slow loop never loses time.
//!
//! ```text
//! Stopped --toggle (remaining > 0)--> Running
//! Running --toggle | reset | reaches 0--> Stopped
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::{notify::NotificationGateway, prefs::Preferences};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

/// What the front end needs to draw the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub time_string: String,
    pub is_running: bool,
    pub remaining_secs: u64,
}

pub struct TimerEngine<'a> {
    remaining: u64,
    state: TimerState,
    /// Pending tick; `None` means the tick is cancelled.
    next_tick: Option<Instant>,
    prefs: Preferences<'a>,
    alerts: &'a NotificationGateway,
}

impl<'a> TimerEngine<'a> {
    /// Starts stopped, at the last persisted duration.
    pub fn new(prefs: Preferences<'a>, alerts: &'a NotificationGateway) -> Self {
        let saved = prefs.last_timer_duration();
        let remaining = if saved.is_finite() && saved > 0.0 {
            saved as u64
        } else {
            0
        };
        debug!(remaining, "timer restored");
        Self {
            remaining,
            state: TimerState::Stopped,
            next_tick: None,
            prefs,
            alerts,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining
    }

    pub fn time_string(&self) -> String {
        format_mm_ss(self.remaining)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            time_string: self.time_string(),
            is_running: self.is_running(),
            remaining_secs: self.remaining,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now());
    }

    /// Pauses a running timer, or starts a stopped one that has time left.
    pub fn toggle_at(&mut self, now: Instant) {
        match self.state {
            TimerState::Running => {
                self.next_tick = None;
                self.alerts.cancel_pending();
                self.state = TimerState::Stopped;
                self.persist();
                debug!(remaining = self.remaining, "timer paused");
            }
            TimerState::Stopped if self.remaining > 0 => {
                self.next_tick = Some(now + TICK_INTERVAL);
                self.state = TimerState::Running;
                debug!(remaining = self.remaining, "timer started");
            }
            TimerState::Stopped => {}
        }
    }

    /// Tick handler. Ignored unless running.
    pub fn tick(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.next_tick = None;
            self.state = TimerState::Stopped;
            info!("timer finished");
            self.alerts.schedule_finished_alert(0.0);
        }
    }

    /// Delivers every tick that fell due at or before `now`; returns how many ran.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let mut fired = 0;
        while let Some(deadline) = self.next_tick {
            if deadline > now {
                break;
            }
            self.tick();
            fired += 1;
            if self.next_tick.is_some() {
                self.next_tick = Some(deadline + TICK_INTERVAL);
            }
        }
        fired
    }

    pub fn reset(&mut self) {
        self.next_tick = None;
        self.state = TimerState::Stopped;
        self.remaining = 0;
        self.alerts.cancel_pending();
        self.persist();
        debug!("timer reset");
    }

    /// Adds `delta_secs` (may be negative, floors at zero). Ignored while running.
    pub fn adjust_time(&mut self, delta_secs: i64) {
        if self.is_running() {
            return;
        }
        self.remaining = if delta_secs >= 0 {
            self.remaining.saturating_add(delta_secs as u64)
        } else {
            self.remaining.saturating_sub(delta_secs.unsigned_abs())
        };
        self.persist();
        debug!(delta_secs, remaining = self.remaining, "timer adjusted");
    }

    /// Sets the stopped timer to `secs`. Ignored while running.
    pub fn set_duration(&mut self, secs: u64) {
        if self.is_running() {
            return;
        }
        self.remaining = secs;
        self.persist();
    }

    /// Saves a running countdown before exit. Leaves the state as is.
    pub fn prepare_for_termination(&mut self) {
        if self.is_running() {
            self.next_tick = None;
            self.persist();
            info!(remaining = self.remaining, "running timer saved for exit");
        }
    }

    fn persist(&self) {
        self.prefs.save_timer_duration(self.remaining as f64);
    }
}

/// `MM:SS`; minutes keep growing past two digits.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
