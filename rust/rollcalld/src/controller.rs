//! The dashboard controller.
//!
//! Owns the session-scoped state and the listener manager, and is the only
//! place that reacts to the two input streams: auth changes and store pushes.
//! Neither stream is ordered relative to the other, so every reaction
//! re-derives the selection from scratch.

use crate::aggregate::Aggregate;
use crate::auth::{AuthEvent, Identity};
use crate::error::SelectionError;
use crate::listeners::{AttendanceKey, Channel, ListenerManager};
use crate::model::{
    decode_active_session, decode_day, decode_history, decode_roster, decode_subjects,
    ActiveSession, DaySnapshot, RosterEntry,
};
use crate::render::{
    render_rows, render_tbody_html, subject_selector, SubjectSelector, TableRow, COLUMNS,
    DEFAULT_TEACHER_LABEL,
};
use crate::selection::resolve_selection;
use crate::store::{DataStore, StorePush};
use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Current UTC calendar day.
    System,
    Fixed(NaiveDate),
}

impl DateSource {
    pub fn today(&self) -> String {
        let date = match self {
            DateSource::System => Utc::now().date_naive(),
            DateSource::Fixed(date) => *date,
        };
        date.format("%Y-%m-%d").to_string()
    }
}

/// Created on sign-in, dropped on sign-out.
#[derive(Debug)]
struct SessionState {
    identity: Identity,
    roster: Vec<RosterEntry>,
    subjects: Vec<String>,
    active_session: Option<ActiveSession>,
    /// Explicit pick from `subjects.select`. The only prior selection that
    /// resolution honors.
    chosen: Option<String>,
    selected: Option<String>,
    /// Date the today listener was last pointed at. The view reports this one
    /// so the header always matches the rows.
    date: String,
    today: DaySnapshot,
    aggregate: Aggregate,
}

impl SessionState {
    fn new(identity: Identity, date: String) -> Self {
        Self {
            identity,
            date,
            roster: Vec::new(),
            subjects: Vec::new(),
            active_session: None,
            chosen: None,
            selected: None,
            today: DaySnapshot::new(),
            aggregate: Aggregate::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub view: ViewKind,
    pub login_message: String,
    pub teacher: Option<String>,
    pub active_date: String,
    pub active_session: Option<ActiveSession>,
    pub subjects: SubjectSelector,
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
    pub total_sessions: u32,
}

pub struct Dashboard {
    session: Option<SessionState>,
    listeners: ListenerManager,
    login_message: String,
    dates: DateSource,
}

impl Dashboard {
    pub fn new(dates: DateSource) -> Self {
        Self {
            session: None,
            listeners: ListenerManager::new(),
            login_message: String::new(),
            dates,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn set_login_message(&mut self, message: impl Into<String>) {
        self.login_message = message.into();
    }

    pub fn clear_login_message(&mut self) {
        self.login_message.clear();
    }

    pub fn on_auth_event(&mut self, event: AuthEvent, store: &mut dyn DataStore) {
        // Always start from a clean slate so repeated sign-ins never stack
        // subscriptions.
        self.listeners.detach_all(store);
        self.session = None;

        let AuthEvent::SignedIn(identity) = event else {
            debug!("event=dashboard_reset reason=signed_out");
            return;
        };
        info!(
            "event=dashboard_attach email={} session={}",
            identity.email, identity.session_id
        );
        self.session = Some(SessionState::new(identity, self.dates.today()));
        if let Err(e) = self.listeners.attach_baseline(store) {
            error!("event=dashboard_attach status=failed error={}", e);
        }
    }

    pub fn on_push(&mut self, push: StorePush, store: &mut dyn DataStore) {
        let Some(channel) = self.listeners.classify(push.handle) else {
            debug!("event=push_dropped handle={} path={}", push.handle, push.path);
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let value = push.value.as_ref();
        match channel {
            Channel::Students => session.roster = decode_roster(value),
            Channel::Today => session.today = decode_day(value),
            Channel::History => session.aggregate = Aggregate::from_history(&decode_history(value)),
            Channel::Subjects => {
                session.subjects = decode_subjects(value);
                self.reconcile(store);
            }
            Channel::ActiveSession => {
                session.active_session = decode_active_session(value);
                self.reconcile(store);
            }
        }
    }

    pub fn select_subject(
        &mut self,
        subject: &str,
        store: &mut dyn DataStore,
    ) -> Result<String, SelectionError> {
        let session = self.session.as_mut().ok_or(SelectionError::NotSignedIn)?;
        if !session.subjects.iter().any(|s| s == subject) {
            return Err(SelectionError::UnknownSubject(subject.to_string()));
        }
        session.chosen = Some(subject.to_string());
        self.reconcile(store);
        Ok(subject.to_string())
    }

    pub fn selected_subject(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.selected.as_deref())
    }

    pub fn active_date(&self) -> String {
        match &self.session {
            Some(session) => session.date.clone(),
            None => self.dates.today(),
        }
    }

    /// The active session's date, else the current calendar day.
    fn current_date(&self) -> String {
        self.session
            .as_ref()
            .and_then(|s| s.active_session.as_ref())
            .and_then(|a| a.date.clone())
            .unwrap_or_else(|| self.dates.today())
    }

    /// Re-points the today listener when the calendar day moved on without a
    /// store push.
    pub fn roll_date(&mut self, store: &mut dyn DataStore) {
        let current = self.current_date();
        let Some(session) = &self.session else {
            return;
        };
        if session.date != current {
            info!("event=date_rollover from={} to={}", session.date, current);
            self.reconcile(store);
        }
    }

    pub fn live_today_subscriptions(&self) -> usize {
        self.listeners.live_today_subscriptions()
    }

    /// Resolves the selection and points the attendance listeners at it.
    fn reconcile(&mut self, store: &mut dyn DataStore) {
        let date = self.current_date();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let unlisted = session
            .chosen
            .as_ref()
            .is_some_and(|c| !session.subjects.contains(c));
        if unlisted {
            debug!("event=selection_dropped subject={:?}", session.chosen);
            session.chosen = None;
        }
        let resolved = resolve_selection(
            session.chosen.as_deref(),
            &session.subjects,
            session.active_session.as_ref(),
        );
        if resolved != session.selected {
            info!(
                "event=selection_changed from={:?} to={:?}",
                session.selected, resolved
            );
            session.selected = resolved;
        }

        session.date = date.clone();
        let key = session.selected.clone().map(|subject| AttendanceKey { subject, date });
        let outcome = self.listeners.retarget(store, key.as_ref());
        if let Some(e) = &outcome.history_error {
            warn!("event=attendance_subscribe listener=history status=skipped error={}", e);
        }
        if let Some(e) = &outcome.today_error {
            warn!("event=attendance_subscribe listener=today status=skipped error={}", e);
        }
        if outcome.today_changed {
            session.today = DaySnapshot::new();
        }
        if outcome.history_changed {
            session.aggregate = Aggregate::default();
        }
    }

    pub fn rows(&self) -> Vec<TableRow> {
        match &self.session {
            Some(s) => render_rows(&s.roster, &s.today, &s.aggregate),
            None => render_rows(&[], &DaySnapshot::new(), &Aggregate::default()),
        }
    }

    pub fn tbody_html(&self) -> String {
        render_tbody_html(&self.rows())
    }

    pub fn view(&self) -> DashboardView {
        let columns = COLUMNS.to_vec();
        let active_date = self.active_date();
        let Some(session) = &self.session else {
            return DashboardView {
                view: ViewKind::Login,
                login_message: self.login_message.clone(),
                teacher: None,
                active_date,
                active_session: None,
                subjects: subject_selector(&[], None),
                columns,
                rows: Vec::new(),
                total_sessions: 0,
            };
        };

        let teacher = if session.identity.email.trim().is_empty() {
            DEFAULT_TEACHER_LABEL.to_string()
        } else {
            session.identity.email.clone()
        };
        DashboardView {
            view: ViewKind::Dashboard,
            login_message: self.login_message.clone(),
            teacher: Some(teacher),
            active_date,
            active_session: session.active_session.clone(),
            subjects: subject_selector(&session.subjects, session.selected.as_deref()),
            columns,
            rows: render_rows(&session.roster, &session.today, &session.aggregate),
            total_sessions: session.aggregate.total_sessions,
        }
    }
}
