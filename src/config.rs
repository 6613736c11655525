use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::util::keywords::{
    DuplicateDetector, KeywordExtractor, DEFAULT_DUPLICATE_THRESHOLD,
};

pub const SERVER_COMPONENT: &str = "library";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/library.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Log file for a process. The server writes to `file`; jobs get a sibling file
    /// named after themselves so their runs stay separate.
    pub fn file_for(&self, component: &str) -> PathBuf {
        let path = PathBuf::from(&self.file);
        if component == SERVER_COMPONENT {
            return path;
        }
        path.with_file_name(format!("{component}.log"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    pub max_page_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 6,
            max_page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub threshold: f32,
    /// Replaces the built-in stop-word list when present.
    pub stop_words: Option<Vec<String>>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DUPLICATE_THRESHOLD,
            stop_words: None,
        }
    }
}

impl DedupConfig {
    pub fn extractor(&self) -> KeywordExtractor {
        match &self.stop_words {
            Some(words) => KeywordExtractor::with_stop_words(words),
            None => KeywordExtractor::default(),
        }
    }

    pub fn detector(&self) -> anyhow::Result<DuplicateDetector> {
        DuplicateDetector::new(self.threshold)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyHallConfig {
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

impl Default for StudyHallConfig {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub recent_titles: i64,
    pub categories: Vec<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            timeout_secs: 120,
            recent_titles: 20,
            categories: [
                "Politics",
                "Arts",
                "Science",
                "Jobs",
                "Economy",
                "Technology",
                "Family",
                "Global Issues",
                "Philosophy",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
    pub listing: ListingConfig,
    pub dedup: DedupConfig,
    pub study_hall: StudyHallConfig,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        for env_file in [".env.local", ".env"] {
            // a missing file is fine; the process environment may already be populated
            let _ = dotenvy::from_filename(env_file);
        }

        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            let path = locate_default_config();
            if let Some(path) = path {
                Self::load_from_file(&path)?
            } else {
                AppConfig::default()
            }
        };

        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("failed to parse config file {:?}", path))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.db.url = url;
        }

        if let Some(max_conn) = parse_optional_env("DB_MAX_CONNECTIONS")? {
            config.db.max_connections = max_conn;
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        if let Some(max_requests) = parse_optional_env("RATE_LIMIT_MAX_REQUESTS")? {
            config.rate_limit.max_requests = max_requests;
        }

        if let Some(window) = parse_optional_env("RATE_LIMIT_WINDOW_SECS")? {
            config.rate_limit.window_secs = window;
        }

        if let Some(threshold) = parse_optional_env("DEDUP_THRESHOLD")? {
            config.dedup.threshold = threshold;
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini.model = model;
        }

        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.gemini.base_url = base_url;
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.db.url.trim().is_empty() {
            return Err(anyhow!(
                "database url missing; set DATABASE_URL env var or db.url in config file"
            ));
        }

        self.dedup
            .detector()
            .context("dedup.threshold is out of range")?;

        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(anyhow!(
                "rate_limit.max_requests and rate_limit.window_secs must be positive"
            ));
        }

        if self.study_hall.focus_minutes == 0 || self.study_hall.break_minutes == 0 {
            return Err(anyhow!("study hall session lengths must be positive"));
        }

        Ok(())
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(
            v.parse::<T>()
                .with_context(|| format!("{key} must be a valid value"))?,
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    candidates.into_iter().find(|path| path.exists())
}
