mod aggregate;
mod auth;
mod config;
mod controller;
mod error;
mod ipc;
mod listeners;
mod logging;
mod model;
mod render;
mod selection;
mod store;

use log::{info, warn};
use serde_json::json;
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    let (config, config_path) = config::load_from_env()?;
    logging::init(config.log_level.as_deref());
    info!(
        "event=app_start version={} config={}",
        env!("CARGO_PKG_VERSION"),
        config_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| "<defaults>".to_string())
    );

    let mut state = ipc::AppState::new(&config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                warn!("event=bad_json error={}", e);
                let _ = writeln!(
                    stdout,
                    "{}",
                    json!({ "ok": false, "error": { "code": "bad_json", "message": e.to_string() } })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("event=app_stop reason=stdin_closed");
    Ok(())
}
