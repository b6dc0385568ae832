use crate::defaults::{Defaults, LAST_TIMER_DURATION_KEY};

/// Last timer duration, in seconds, kept across restarts.
#[derive(Clone, Copy)]
pub struct Preferences<'a> {
    defaults: &'a Defaults,
}

impl<'a> Preferences<'a> {
    pub fn new(defaults: &'a Defaults) -> Self {
        Self { defaults }
    }

    /// `0.0` when nothing was ever saved.
    pub fn last_timer_duration(&self) -> f64 {
        self.defaults.get(LAST_TIMER_DURATION_KEY).unwrap_or(0.0)
    }

    pub fn save_timer_duration(&self, secs: f64) {
        self.defaults.set(LAST_TIMER_DURATION_KEY, &secs);
    }
}
