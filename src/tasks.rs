//! Daily checklist.
//!
//! The whole list is written back to the defaults store after every change.
//! Once per day, after the reset boundary (06:00 local by default), the list
//! is wiped. The check runs at construction, on [`TaskStore::resume`] and on
//! [`TaskStore::poll`] once the armed boundary has passed; comparing wall-clock
//! time means a boundary slept through fires on the first poll after wake.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clock::{self, Clock},
    defaults::{Defaults, LAST_RESET_KEY, SAVED_TASKS_KEY},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub date_created: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: false,
            date_created: created,
        }
    }
}

pub struct TaskStore<'a> {
    tasks: Vec<Task>,
    defaults: &'a Defaults,
    clock: &'a dyn Clock,
    reset_hour: u32,
    next_reset: DateTime<Local>,
}

impl<'a> TaskStore<'a> {
    pub fn new(defaults: &'a Defaults, clock: &'a dyn Clock, reset_hour: u32) -> Self {
        let tasks = load_tasks(defaults);
        let now = clock.now();
        let mut store = Self {
            tasks,
            defaults,
            clock,
            reset_hour,
            next_reset: clock::next_reset_after(now, reset_hour),
        };
        store.check_and_reset();
        store
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed).count()
    }

    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }

    /// Boundary at which `poll` will next run the reset check.
    pub fn next_reset(&self) -> DateTime<Local> {
        self.next_reset
    }

    pub fn last_reset(&self) -> Option<DateTime<Utc>> {
        self.defaults.get(LAST_RESET_KEY)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Appends a task. Blank titles are ignored and yield `None`.
    pub fn add(&mut self, title: &str) -> Option<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let task = Task::new(title, self.clock.now().with_timezone(&Utc));
        let id = task.id;
        self.tasks.push(task);
        debug!(%id, "task added");
        self.save();
        Some(id)
    }

    pub fn toggle(&mut self, id: Uuid) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        task.is_completed = !task.is_completed;
        debug!(%id, completed = task.is_completed, "task toggled");
        self.save();
    }

    pub fn rename(&mut self, id: Uuid, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        task.title = title.to_owned();
        self.save();
    }

    pub fn remove(&mut self, id: Uuid) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() != before {
            self.save();
        }
    }

    pub fn remove_completed(&mut self) {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.is_completed);
        debug!(removed = before - self.tasks.len(), "completed tasks removed");
        self.save();
    }

    // ── Daily reset ──────────────────────────────────────────────────

    /// Re-validates the reset condition, e.g. after the process was suspended.
    pub fn resume(&mut self) -> bool {
        let wiped = self.check_and_reset();
        self.next_reset = clock::next_reset_after(self.clock.now(), self.reset_hour);
        wiped
    }

    /// Runs the reset check once the armed boundary has passed, then re-arms.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        if now < self.next_reset {
            return false;
        }
        let wiped = self.check_and_reset();
        self.next_reset = clock::next_reset_after(now, self.reset_hour);
        wiped
    }

    fn check_and_reset(&mut self) -> bool {
        let now = self.clock.now();
        // never reset: treat as the epoch
        let last_reset = self.last_reset().unwrap_or_default().with_timezone(&Local);

        if !clock::is_reset_due(last_reset, now, self.reset_hour) {
            return false;
        }

        let dropped = self.tasks.len();
        self.tasks.clear();
        self.save();
        self.defaults.set(LAST_RESET_KEY, &now.with_timezone(&Utc));
        info!(dropped, "daily reset cleared task list");
        true
    }

    fn save(&self) {
        self.defaults.set(SAVED_TASKS_KEY, &self.tasks);
    }
}

fn load_tasks(defaults: &Defaults) -> Vec<Task> {
    if !defaults.contains(SAVED_TASKS_KEY) {
        return Vec::new();
    }
    defaults.get(SAVED_TASKS_KEY).unwrap_or_else(|| {
        warn!("saved tasks could not be decoded, starting with an empty list");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use std::cell::Cell;

    struct ManualClock(Cell<DateTime<Local>>);

    impl ManualClock {
        fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Self {
            Self(Cell::new(local(y, m, d, h, min)))
        }

        fn set(&self, t: DateTime<Local>) {
            self.0.set(t);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Local> {
            self.0.get()
        }
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, min, 0)
                    .unwrap(),
            )
            .earliest()
            .unwrap()
    }

    fn seeded(defaults: &Defaults, last_reset: DateTime<Local>) {
        defaults.set(LAST_RESET_KEY, &last_reset.with_timezone(&Utc));
    }

    #[test]
    fn blank_titles_are_rejected() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 9, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 5));
        let mut store = TaskStore::new(&defaults, &clock, 6);

        assert_eq!(store.add(""), None);
        assert_eq!(store.add("   "), None);
        assert_eq!(store.total_count(), 0);

        let id = store.add("  Buy milk ").unwrap();
        assert_eq!(store.total_count(), 1);
        let task = store.get(id).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert!(!task.is_completed);
    }

    #[test]
    fn toggle_flips_only_target() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 9, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 5));
        let mut store = TaskStore::new(&defaults, &clock, 6);
        let a = store.add("a").unwrap();
        let b = store.add("b").unwrap();

        store.toggle(a);
        assert!(store.get(a).unwrap().is_completed);
        assert!(!store.get(b).unwrap().is_completed);
        assert_eq!(store.completed_count(), 1);

        let saved: Vec<Task> = defaults.get(SAVED_TASKS_KEY).unwrap();
        assert!(saved[0].is_completed);

        let before = store.tasks().to_vec();
        store.toggle(Uuid::new_v4());
        assert_eq!(store.tasks(), &before[..]);
    }

    #[test]
    fn remove_completed_keeps_order() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 9, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 5));
        let mut store = TaskStore::new(&defaults, &clock, 6);
        let ids: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| store.add(t).unwrap())
            .collect();
        store.toggle(ids[1]);
        store.toggle(ids[3]);

        store.remove_completed();

        let titles: Vec<_> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "c"]);
        assert_eq!(store.completed_count(), 0);
    }

    #[test]
    fn rename_and_remove() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 9, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 5));
        let mut store = TaskStore::new(&defaults, &clock, 6);
        let id = store.add("draft").unwrap();

        store.rename(id, "  ");
        assert_eq!(store.get(id).unwrap().title, "draft");
        store.rename(id, "final");
        assert_eq!(store.get(id).unwrap().title, "final");

        store.remove(id);
        assert_eq!(store.total_count(), 0);
        let saved: Vec<Task> = defaults.get(SAVED_TASKS_KEY).unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn first_launch_after_boundary_wipes_and_records() {
        let defaults = Defaults::in_memory();
        defaults.set(SAVED_TASKS_KEY, &vec![Task::new("old", Utc::now())]);
        let clock = ManualClock::at(2025, 6, 10, 6, 1);
        seeded(&defaults, local(2025, 6, 9, 7, 0));

        let store = TaskStore::new(&defaults, &clock, 6);

        assert_eq!(store.total_count(), 0);
        assert_eq!(
            store.last_reset().unwrap(),
            local(2025, 6, 10, 6, 1).with_timezone(&Utc)
        );
    }

    #[test]
    fn never_reset_wipes_once_boundary_passed() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 8, 0);
        let store = TaskStore::new(&defaults, &clock, 6);
        assert!(store.last_reset().is_some());
    }

    #[test]
    fn poll_waits_for_boundary_then_rearms() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 20, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 1));
        let mut store = TaskStore::new(&defaults, &clock, 6);
        store.add("carry").unwrap();
        assert_eq!(store.next_reset(), local(2025, 6, 11, 6, 0));

        clock.set(local(2025, 6, 11, 5, 59));
        assert!(!store.poll());
        assert_eq!(store.total_count(), 1);

        clock.set(local(2025, 6, 11, 6, 0));
        assert!(store.poll());
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.next_reset(), local(2025, 6, 12, 6, 0));

        store.add("new").unwrap();
        clock.set(local(2025, 6, 11, 18, 0));
        assert!(!store.poll());
        assert!(!store.resume());
        assert_eq!(store.total_count(), 1);
    }

    #[test]
    fn resume_wipes_after_overnight_suspend() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 20, 0);
        seeded(&defaults, local(2025, 6, 10, 7, 0));
        let mut store = TaskStore::new(&defaults, &clock, 6);
        store.add("evening task").unwrap();

        clock.set(local(2025, 6, 11, 9, 0));
        assert!(store.resume());
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.next_reset(), local(2025, 6, 12, 6, 0));
        assert_eq!(
            store.last_reset().unwrap(),
            local(2025, 6, 11, 9, 0).with_timezone(&Utc)
        );
    }

    #[test]
    fn missed_boundary_fires_after_sleep() {
        let defaults = Defaults::in_memory();
        let clock = ManualClock::at(2025, 6, 10, 22, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 1));
        let mut store = TaskStore::new(&defaults, &clock, 6);
        store.add("x").unwrap();

        // woke up two days later in the afternoon
        clock.set(local(2025, 6, 12, 15, 0));
        assert!(store.poll());
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.next_reset(), local(2025, 6, 13, 6, 0));
    }

    #[test]
    fn undecodable_list_starts_empty() {
        let defaults = Defaults::in_memory();
        defaults.set(SAVED_TASKS_KEY, "garbage");
        let clock = ManualClock::at(2025, 6, 10, 9, 0);
        seeded(&defaults, local(2025, 6, 10, 6, 5));

        let store = TaskStore::new(&defaults, &clock, 6);
        assert_eq!(store.total_count(), 0);
    }
}
