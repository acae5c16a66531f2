//! Store subscriptions owned by the dashboard.
//!
//! # Invariants
//! - Baseline listeners (`students`, `subjects`, `activeSession`) are attached
//!   at most once per signed-in session.
//! - At most one `attendance/{subject}/{date}` and one `attendance/{subject}`
//!   subscription are live at any time.
//! - A replaced subscription is always unsubscribed before its successor is
//!   subscribed.

use crate::error::StoreError;
use crate::store::{DataStore, StorePath, SubscriptionHandle};
use log::{debug, info};

pub const STUDENTS_PATH: &str = "students";
pub const SUBJECTS_PATH: &str = "subjects";
pub const ACTIVE_SESSION_PATH: &str = "activeSession";
pub const ATTENDANCE_PATH: &str = "attendance";

/// Which derived state a push feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Students,
    Subjects,
    ActiveSession,
    Today,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceKey {
    pub subject: String,
    pub date: String,
}

impl AttendanceKey {
    pub fn today_path(&self) -> Result<StorePath, StoreError> {
        subject_path(&self.subject)?.child(&self.date)
    }
}

fn subject_path(subject: &str) -> Result<StorePath, StoreError> {
    StorePath::root().child(ATTENDANCE_PATH)?.child(subject)
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    students: SubscriptionHandle,
    subjects: SubscriptionHandle,
    active_session: SubscriptionHandle,
}

#[derive(Debug, Clone)]
struct Bound<K> {
    key: K,
    handle: SubscriptionHandle,
}

/// Attendance-for-date subscription state.
#[derive(Debug, Clone, Default)]
enum TodaySubscription {
    #[default]
    Unsubscribed,
    Subscribed(Bound<AttendanceKey>),
}

/// What [`ListenerManager::retarget`] replaced, so the caller can drop state
/// that belonged to the old target.
///
/// A `*_error` means that listener's path could not be built and it is left
/// unsubscribed; the other listener is unaffected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retarget {
    pub today_changed: bool,
    pub history_changed: bool,
    pub today_error: Option<StoreError>,
    pub history_error: Option<StoreError>,
}

#[derive(Debug, Default)]
pub struct ListenerManager {
    baseline: Option<Baseline>,
    today: TodaySubscription,
    history: Option<Bound<String>>,
}

impl ListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_baseline(&mut self, store: &mut dyn DataStore) -> Result<(), StoreError> {
        if self.baseline.is_some() {
            return Ok(());
        }
        let students = StorePath::parse(STUDENTS_PATH)?;
        let subjects = StorePath::parse(SUBJECTS_PATH)?;
        let active_session = StorePath::parse(ACTIVE_SESSION_PATH)?;
        self.baseline = Some(Baseline {
            students: store.subscribe(&students),
            subjects: store.subscribe(&subjects),
            active_session: store.subscribe(&active_session),
        });
        info!("event=listeners_attached paths=students,subjects,activeSession");
        Ok(())
    }

    /// Drops every subscription, dynamic ones first.
    pub fn detach_all(&mut self, store: &mut dyn DataStore) {
        self.drop_today(store);
        self.drop_history(store);
        if let Some(b) = self.baseline.take() {
            store.unsubscribe(b.students);
            store.unsubscribe(b.subjects);
            store.unsubscribe(b.active_session);
            info!("event=listeners_detached");
        }
    }

    /// Points the attendance subscriptions at `key`, or at nothing.
    ///
    /// An unchanged target keeps its live subscription. The two listeners are
    /// handled independently: an invalid date only affects the today listener.
    pub fn retarget(&mut self, store: &mut dyn DataStore, key: Option<&AttendanceKey>) -> Retarget {
        let mut out = Retarget::default();

        let today_same = match (&self.today, key) {
            (TodaySubscription::Subscribed(bound), Some(k)) => bound.key == *k,
            (TodaySubscription::Unsubscribed, None) => true,
            _ => false,
        };
        let history_same = match (&self.history, key) {
            (Some(bound), Some(k)) => bound.key == k.subject,
            (None, None) => true,
            _ => false,
        };

        if !today_same {
            self.drop_today(store);
            out.today_changed = true;
        }
        if !history_same {
            self.drop_history(store);
            out.history_changed = true;
        }

        let Some(key) = key else {
            return out;
        };

        if !history_same {
            match subject_path(&key.subject) {
                Ok(path) => {
                    let handle = store.subscribe(&path);
                    debug!("event=subscribe handle={} path={}", handle, path);
                    self.history = Some(Bound {
                        key: key.subject.clone(),
                        handle,
                    });
                }
                Err(e) => out.history_error = Some(e),
            }
        }
        if !today_same {
            match key.today_path() {
                Ok(path) => {
                    let handle = store.subscribe(&path);
                    debug!("event=subscribe handle={} path={}", handle, path);
                    self.today = TodaySubscription::Subscribed(Bound {
                        key: key.clone(),
                        handle,
                    });
                }
                Err(e) => out.today_error = Some(e),
            }
        }
        out
    }

    pub fn classify(&self, handle: SubscriptionHandle) -> Option<Channel> {
        if let Some(b) = &self.baseline {
            if handle == b.students {
                return Some(Channel::Students);
            }
            if handle == b.subjects {
                return Some(Channel::Subjects);
            }
            if handle == b.active_session {
                return Some(Channel::ActiveSession);
            }
        }
        if let TodaySubscription::Subscribed(bound) = &self.today {
            if bound.handle == handle {
                return Some(Channel::Today);
            }
        }
        match &self.history {
            Some(bound) if bound.handle == handle => Some(Channel::History),
            _ => None,
        }
    }

    /// 0 or 1.
    pub fn live_today_subscriptions(&self) -> usize {
        match self.today {
            TodaySubscription::Subscribed(_) => 1,
            TodaySubscription::Unsubscribed => 0,
        }
    }

    fn drop_today(&mut self, store: &mut dyn DataStore) {
        if let TodaySubscription::Subscribed(bound) = std::mem::take(&mut self.today) {
            store.unsubscribe(bound.handle);
            debug!(
                "event=unsubscribe handle={} subject={} date={}",
                bound.handle, bound.key.subject, bound.key.date
            );
        }
    }

    fn drop_history(&mut self, store: &mut dyn DataStore) {
        if let Some(bound) = self.history.take() {
            store.unsubscribe(bound.handle);
            debug!("event=unsubscribe handle={} subject={}", bound.handle, bound.key);
        }
    }
}
