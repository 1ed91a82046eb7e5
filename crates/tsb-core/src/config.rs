use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration for the relay bot.
///
/// Everything comes from the environment (with `.env` support); the bot
/// itself never parses command-line flags.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub admin_user_id: i64,

    // Persistence
    pub database_path: PathBuf,

    // Shortening service
    pub shortener_api_url: String,
    pub redirect_base_url: String,
    pub validation_test_url: String,
    pub http_timeout: Duration,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,

    // Outbound pacing (Telegram flood control during fan-out)
    pub send_global_min_interval: Duration,
    pub send_per_chat_min_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_user_id = env_i64("ADMIN_USER_ID").ok_or_else(|| {
            Error::Config("ADMIN_USER_ID environment variable is required".to_string())
        })?;

        let database_path = PathBuf::from(
            env_str("DATABASE_PATH").unwrap_or("/tmp/terashort/terashort.sqlite".to_string()),
        );

        let shortener_api_url = env_str("SHORTENER_API_URL")
            .and_then(non_empty)
            .unwrap_or("https://bisgram.com/api".to_string());
        let redirect_base_url = env_str("REDIRECT_BASE_URL")
            .and_then(non_empty)
            .unwrap_or("https://terabis.blogspot.com/?url=".to_string());
        let validation_test_url = env_str("VALIDATION_TEST_URL")
            .and_then(non_empty)
            .unwrap_or("https://example.com".to_string());

        // Single-digit seconds; a timeout is just another failed shorten.
        let http_timeout = Duration::from_millis(env_u64("HTTP_TIMEOUT_MS").unwrap_or(8_000));

        let audit_log_path = PathBuf::from(
            env_str("AUDIT_LOG_PATH").unwrap_or("/tmp/terashort-audit.log".to_string()),
        );
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(false);

        let send_global_min_interval =
            Duration::from_millis(env_u64("SEND_GLOBAL_MIN_INTERVAL_MS").unwrap_or(40));
        let send_per_chat_min_interval =
            Duration::from_millis(env_u64("SEND_PER_CHAT_MIN_INTERVAL_MS").unwrap_or(1050));

        Ok(Self {
            telegram_bot_token,
            admin_user_id,
            database_path,
            shortener_api_url,
            redirect_base_url,
            validation_test_url,
            http_timeout,
            audit_log_path,
            audit_log_json,
            send_global_min_interval,
            send_per_chat_min_interval,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
