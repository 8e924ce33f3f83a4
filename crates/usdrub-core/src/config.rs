use std::{env, fs, path::Path, time::Duration};

use crate::{domain::Region, errors::Error, scheduler::CronSpec, Result};

pub const DEFAULT_SOURCE_URL: &str = "https://www.banki.ru/products/currency/map/{region}/";
pub const DEFAULT_CRON_SPEC: &str = "*/5 * * * *";

/// Typed runtime configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: Option<String>,

    // Logging
    pub debug: bool,

    // Cash branch source
    pub region: Region,
    pub source_url: String,
    pub fetch_timeout: Duration,
    pub rate_max_age: Duration,

    // Scheduling
    pub cron_spec: String,
    pub cursor_idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load from the process environment, after merging `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let cfg = Self::from_lookup(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a config from an arbitrary key lookup. Missing or unparsable
    /// values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").or_else(|| get("BOT_TOKEN"));
        let debug = get("DEBUG").map(|s| parse_bool(&s)).unwrap_or(false);

        let region = Region::new(&get("CASH_REGION").unwrap_or_default());
        let source_url = get("CASH_SOURCE_URL").unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let fetch_timeout = Duration::from_secs(parse_u64(get("FETCH_TIMEOUT_SECS")).unwrap_or(20));
        let rate_max_age = Duration::from_secs(
            parse_u64(get("RATE_MAX_AGE_HOURS"))
                .unwrap_or(24)
                .saturating_mul(3600),
        );

        let cron_spec = get("CRON_SPEC").unwrap_or_else(|| DEFAULT_CRON_SPEC.to_string());
        let cursor_idle_timeout =
            Duration::from_secs(parse_u64(get("CURSOR_IDLE_SECS")).unwrap_or(3600));

        Self {
            telegram_bot_token,
            debug,
            region,
            source_url,
            fetch_timeout,
            rate_max_age,
            cron_spec,
            cursor_idle_timeout,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout.is_zero() {
            return Err(Error::Config(
                "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.rate_max_age.is_zero() {
            return Err(Error::Config(
                "RATE_MAX_AGE_HOURS must be greater than zero".to_string(),
            ));
        }
        if !self.source_url.starts_with("http://") && !self.source_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "CASH_SOURCE_URL must be an http(s) URL, got {}",
                self.source_url
            )));
        }
        CronSpec::parse(&self.cron_spec)?;
        Ok(())
    }

    /// The bot binary cannot start without a token; the CLI never asks for it.
    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram_bot_token.as_deref().ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = &val[1..val.len() - 1];
        }

        out.push((key.to_string(), val.to_string()));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}
