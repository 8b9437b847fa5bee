use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SITE_BASE: &str = "https://site.api.espn.com/apis";
const DEFAULT_WEB_BASE: &str = "https://site.web.api.espn.com/apis";
const APP_DIR: &str = "gridiron_paths";
const STORE_FILE: &str = "store.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Espn,
    Fake,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub source: SourceKind,
    pub site_base: String,
    pub web_base: String,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub fetch_parallelism: usize,
    pub search_debounce: Duration,
    pub search_limit: usize,
    pub master_team_count: usize,
    pub store_path: Option<PathBuf>,
}

/// Linear backoff: attempt `n` (zero based) waits `base_delay * (n + 1)`
/// before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Espn,
            site_base: DEFAULT_SITE_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            http_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            fetch_parallelism: 6,
            search_debounce: Duration::from_millis(300),
            search_limit: 10,
            master_team_count: 8,
            store_path: default_store_path(),
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let source = match env::var("DATA_SOURCE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "fake" | "offline" => SourceKind::Fake,
            _ => SourceKind::Espn,
        };
        let site_base = env_string("ESPN_SITE_BASE").unwrap_or(defaults.site_base);
        let web_base = env_string("ESPN_WEB_BASE").unwrap_or(defaults.web_base);
        let http_timeout = Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 10u64).clamp(2, 60));
        let retry = RetryPolicy {
            retries: env_parse("FETCH_RETRIES", 2u32).min(5),
            base_delay: Duration::from_millis(env_parse("FETCH_RETRY_BASE_MS", 1000u64).min(10_000)),
        };
        let fetch_parallelism = env_parse("FETCH_PARALLELISM", 6usize).clamp(2, 32);
        let search_debounce =
            Duration::from_millis(env_parse("SEARCH_DEBOUNCE_MS", 300u64).clamp(50, 2000));
        let search_limit = env_parse("SEARCH_LIMIT", 10usize).clamp(1, 25);
        let master_team_count = env_parse("MASTER_TEAM_COUNT", 8usize).clamp(1, 32);
        let store_path = env_string("GAME_STORE_PATH")
            .map(PathBuf::from)
            .or(defaults.store_path);

        Self {
            source,
            site_base: site_base.trim_end_matches('/').to_string(),
            web_base: web_base.trim_end_matches('/').to_string(),
            http_timeout,
            retry,
            fetch_parallelism,
            search_debounce,
            search_limit,
            master_team_count,
            store_path,
        }
    }
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(base) = env_string("XDG_DATA_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env_string("HOME")?;
    Some(PathBuf::from(home).join(".local").join("share").join(APP_DIR))
}

fn default_store_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(STORE_FILE))
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RetryPolicy;

    #[test]
    fn retry_delays_grow_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
    }
}
