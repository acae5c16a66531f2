use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ROLLCALLD_CONFIG";
pub const TODAY_ENV: &str = "ROLLCALLD_TODAY";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    /// Lowercase hex SHA-256 of the password.
    pub password_sha256: String,
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub accounts: Vec<Account>,
    /// Backend JSON export loaded into the store at startup. Relative paths
    /// resolve against the config file's directory.
    pub seed_file: Option<PathBuf>,
    /// Fixed calendar day (`YYYY-MM-DD`) used when no active session date exists.
    pub today: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn today_date(&self) -> Result<Option<NaiveDate>> {
        self.today
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("today must be YYYY-MM-DD, got {:?}", raw))
            })
            .transpose()
    }

    fn validate(&self) -> Result<()> {
        for account in &self.accounts {
            if !account.email.contains('@') {
                return Err(anyhow!("account email {:?} is not an address", account.email));
            }
            let digest = account.password_sha256.trim();
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(anyhow!(
                    "account {} passwordSha256 must be 64 hex characters",
                    account.email
                ));
            }
        }
        self.today_date()?;
        Ok(())
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
    let mut config: Config = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.to_string_lossy()))?;
    if let (Some(seed), Some(dir)) = (config.seed_file.as_ref(), path.parent()) {
        if seed.is_relative() {
            config.seed_file = Some(dir.join(seed));
        }
    }
    config.validate()?;
    Ok(config)
}

/// Config from `ROLLCALLD_CONFIG` (defaults when unset), then the
/// `ROLLCALLD_TODAY` override.
pub fn load_from_env() -> Result<(Config, Option<PathBuf>)> {
    let path = std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let mut config = match path.as_deref() {
        Some(p) => load(p)?,
        None => Config::default(),
    };
    if let Ok(today) = std::env::var(TODAY_ENV) {
        if !today.trim().is_empty() {
            config.today = Some(today);
            config.today_date()?;
        }
    }
    Ok((config, path))
}

pub fn load_seed(path: &Path) -> Result<serde_json::Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.to_string_lossy()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse seed file {}", path.to_string_lossy()))
}
