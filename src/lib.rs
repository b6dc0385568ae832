//! Countdown timer with a daily self-clearing checklist.
//!
//! The application root owns a [`Defaults`] store and a
//! [`NotificationGateway`] and lends them to the [`TimerEngine`] and
//! [`TaskStore`]. Everything runs on one thread; the front end polls both
//! and redraws from their read-only state.

pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod notify;
pub mod prefs;
pub mod tasks;
pub mod timer;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use defaults::Defaults;
pub use notify::{AlertCenter, Authorization, DesktopAlertCenter, NotificationGateway};
pub use prefs::Preferences;
pub use tasks::{Task, TaskStore};
pub use timer::{TimerEngine, TimerSnapshot, TimerState};
