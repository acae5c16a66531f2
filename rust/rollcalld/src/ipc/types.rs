use crate::auth::{AuthEvent, AuthService, LocalAuth};
use crate::config::{self, Config};
use crate::controller::{Dashboard, DateSource};
use crate::store::{MemoryStore, StorePush};
use anyhow::Result;
use log::info;
use serde::Deserialize;
use std::sync::mpsc::Receiver;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: MemoryStore,
    pub auth: LocalAuth,
    pub dashboard: Dashboard,
    store_events: Receiver<StorePush>,
    auth_events: Receiver<AuthEvent>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let (mut store, store_events) = MemoryStore::new();
        if let Some(seed) = config.seed_file.as_deref() {
            store.load(config::load_seed(seed)?);
            info!("event=store_seeded file={}", seed.to_string_lossy());
        }

        let mut auth = LocalAuth::new(config.accounts.clone());
        let auth_events = auth.watch();

        let dates = match config.today_date()? {
            Some(date) => DateSource::Fixed(date),
            None => DateSource::System,
        };

        let mut state = Self {
            store,
            auth,
            dashboard: Dashboard::new(dates),
            store_events,
            auth_events,
        };
        state.settle();
        Ok(state)
    }

    /// Feeds queued auth changes and store pushes to the dashboard until both
    /// streams are empty. Handling an event may queue more (new subscriptions
    /// push their current value), hence the outer loop.
    pub fn settle(&mut self) {
        loop {
            let mut progressed = false;
            while let Ok(event) = self.auth_events.try_recv() {
                self.dashboard.on_auth_event(event, &mut self.store);
                progressed = true;
            }
            while let Ok(push) = self.store_events.try_recv() {
                self.dashboard.on_push(push, &mut self.store);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }
}
