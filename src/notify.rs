//! "Timer finished" alerts.
//!
//! [`NotificationGateway`] owns the permission dance and the fixed alert
//! content; the platform side sits behind [`AlertCenter`]. The desktop
//! implementation delivers through notify-rust after a delay, and a
//! generation counter voids deliveries that were cancelled while waiting.

use notify_rust::Notification;
use std::{
    cell::Cell,
    path::Path,
    process::{Command, Stdio},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};
use tracing::{debug, info, warn};

use crate::error::NotifyError;

pub const FINISHED_TITLE: &str = "Timer finished";
pub const FINISHED_BODY: &str = "Your timer is done!";

/// Scheduling with no delay is unreliable on some backends.
pub const MIN_ALERT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    NotDetermined,
    Authorized,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
}

impl Alert {
    pub fn timer_finished() -> Self {
        Self {
            title: FINISHED_TITLE.into(),
            body: FINISHED_BODY.into(),
        }
    }
}

/// Platform notification API.
pub trait AlertCenter {
    fn authorization_status(&self) -> Authorization;

    /// Asks for permission. Only called while the status is undetermined.
    fn request_authorization(&self) -> Result<bool, NotifyError>;

    /// Delivers `alert` once, `delay` from now.
    fn schedule(&self, alert: &Alert, delay: Duration) -> Result<(), NotifyError>;

    /// Drops every alert that has not been delivered yet.
    fn cancel_all(&self);
}

pub struct NotificationGateway {
    center: Box<dyn AlertCenter>,
}

impl NotificationGateway {
    pub fn new(center: impl AlertCenter + 'static) -> Self {
        Self {
            center: Box::new(center),
        }
    }

    /// Calls `callback` with whether alerts may be shown, prompting first
    /// when the user has not decided yet.
    pub fn ensure_authorized(&self, callback: impl FnOnce(bool)) {
        let granted = match self.center.authorization_status() {
            Authorization::Authorized => true,
            Authorization::Denied => false,
            Authorization::NotDetermined => match self.center.request_authorization() {
                Ok(granted) => {
                    info!(granted, "notification permission decided");
                    granted
                }
                Err(err) => {
                    warn!(error = %err, "notification permission request failed");
                    false
                }
            },
        };
        callback(granted);
    }

    /// Schedules the one-shot finished alert. Dropped silently (logged) when
    /// permission is missing or the backend refuses it.
    pub fn schedule_finished_alert(&self, delay_secs: f64) {
        self.ensure_authorized(|authorized| {
            if !authorized {
                warn!("cannot schedule alert: notifications not authorized");
                return;
            }
            let delay = Duration::try_from_secs_f64(delay_secs)
                .unwrap_or(Duration::ZERO)
                .max(MIN_ALERT_DELAY);
            match self.center.schedule(&Alert::timer_finished(), delay) {
                Ok(()) => debug!(delay_ms = delay.as_millis() as u64, "finished alert scheduled"),
                Err(err) => warn!(error = %err, "failed to schedule finished alert"),
            }
        });
    }

    pub fn cancel_pending(&self) {
        self.center.cancel_all();
    }
}

// ============================================================================
// Desktop backend
// ============================================================================

pub struct DesktopAlertCenter {
    configured: Option<bool>,
    decided: Cell<Option<bool>>,
    sound: bool,
    generation: Arc<AtomicU64>,
}

impl DesktopAlertCenter {
    /// `configured` is the user's explicit choice from config, if any.
    pub fn new(configured: Option<bool>, sound: bool) -> Self {
        Self {
            configured,
            decided: Cell::new(None),
            sound,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl AlertCenter for DesktopAlertCenter {
    fn authorization_status(&self) -> Authorization {
        match self.configured.or(self.decided.get()) {
            Some(true) => Authorization::Authorized,
            Some(false) => Authorization::Denied,
            None => Authorization::NotDetermined,
        }
    }

    fn request_authorization(&self) -> Result<bool, NotifyError> {
        match query_notification_service() {
            Ok(granted) => {
                self.decided.set(Some(granted));
                Ok(granted)
            }
            Err(err) => {
                self.decided.set(Some(false));
                Err(err)
            }
        }
    }

    fn schedule(&self, alert: &Alert, delay: Duration) -> Result<(), NotifyError> {
        let ticket = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let alert = alert.clone();
        let sound = self.sound;

        thread::Builder::new()
            .name("daytimer-alert".into())
            .spawn(move || {
                thread::sleep(delay);
                if generation.load(Ordering::SeqCst) != ticket {
                    debug!("alert cancelled before delivery");
                    return;
                }
                if let Err(err) = show(&alert) {
                    warn!(error = %err, "failed to deliver alert");
                }
                if sound {
                    play_sound();
                }
            })
            .map(|_| ())
            .map_err(|err| NotifyError::Backend(err.to_string()))
    }

    fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

fn show(alert: &Alert) -> Result<(), NotifyError> {
    let mut notification = Notification::new();
    notification
        .summary(&alert.title)
        .body(&alert.body)
        .appname("daytimer")
        .icon("alarm-clock");
    #[cfg(all(unix, not(target_os = "macos")))]
    notification.urgency(notify_rust::Urgency::Critical);
    notification.show()?;
    Ok(())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn query_notification_service() -> Result<bool, NotifyError> {
    match notify_rust::get_server_information() {
        Ok(info) => {
            debug!(server = %info.name, "notification service found");
            Ok(true)
        }
        Err(err) => {
            warn!(error = %err, "no notification service on the session bus");
            Err(NotifyError::Unavailable)
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn query_notification_service() -> Result<bool, NotifyError> {
    Ok(true)
}

fn play_sound() {
    for (cmd, file) in [
        ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
        ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
        ("aplay", "/usr/share/sounds/generic.wav"),
    ] {
        if Path::new(file).exists() {
            let _ = Command::new(cmd)
                .arg(file)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            break;
        }
    }
}
