// src/config.rs
//! Environment-driven configuration for both board integrations

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

const DEFAULT_SIMILARITY_THRESHOLD: f64 = 70.0;
const DEFAULT_TOP_N: usize = 5;

/// Robota.ua (API-based board) settings.
#[derive(Debug, Clone)]
pub struct RobotaUaConfig {
    pub login_url: String,
    pub resumes_url: String,
    pub regions_url: String,
    pub username: String,
    pub password: String,
    pub regions_cache_path: PathBuf,
    pub experience_cache_path: PathBuf,
}

/// Work.ua (scrape-based board) settings.
#[derive(Debug, Clone)]
pub struct WorkUaConfig {
    pub base_url: String,
    pub resumes_path: String,
    pub min_js_url: String,
    pub regions_cache_path: PathBuf,
    pub salary_cache_path: PathBuf,
    pub experience_cache_path: PathBuf,
    /// When set, page fetches are routed through the scraping proxy.
    pub scraper_api_key: Option<String>,
}

/// Chat-side option files (keyboard labels, not board query vocabulary).
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub salary_options_path: PathBuf,
    pub experience_options_path: PathBuf,
    pub top_n: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub robota_ua: RobotaUaConfig,
    pub work_ua: WorkUaConfig,
    pub chat: ChatConfig,
    /// Minimum token-sort similarity (0-100) for a region to resolve.
    pub similarity_threshold: f64,
}

impl AppConfig {
    /// Load all settings from the environment.
    ///
    /// Credentials and endpoint URLs are required; thresholds and the
    /// result count fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let robota_ua = RobotaUaConfig {
            login_url: require("ROBOTA_UA_LOGIN_URL")?,
            resumes_url: require("ROBOTA_UA_RESUMES_URL")?,
            regions_url: require("ROBOTA_UA_REGIONS_URL")?,
            username: require("ROBOTA_UA_USERNAME")?,
            password: require("ROBOTA_UA_PASSWORD")?,
            regions_cache_path: path_var("ROBOTA_UA_REGIONS_JSON_PATH")?,
            experience_cache_path: path_var("ROBOTA_UA_EXPERIENCE_JSON_PATH")?,
        };

        let work_ua = WorkUaConfig {
            base_url: require("WORK_UA_URL")?,
            resumes_path: require("WORK_UA_RESUMES_URL")?,
            min_js_url: require("WORK_UA_MIN_JS_URL")?,
            regions_cache_path: path_var("WORK_UA_REGIONS_JSON_PATH")?,
            salary_cache_path: path_var("WORK_UA_SALARY_JSON_PATH")?,
            experience_cache_path: path_var("WORK_UA_EXPERIENCE_JSON_PATH")?,
            scraper_api_key: std::env::var("SCRAPER_API_KEY").ok(),
        };

        let chat = ChatConfig {
            salary_options_path: path_var("CHAT_SALARY_JSON_PATH")?,
            experience_options_path: path_var("CHAT_EXPERIENCE_JSON_PATH")?,
            top_n: std::env::var("TOP_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOP_N),
        };

        let similarity_threshold = std::env::var("WORD_SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

        info!(
            "Configuration loaded (similarity threshold {}, top {})",
            similarity_threshold, chat.top_n
        );

        Ok(Self {
            robota_ua,
            work_ua,
            chat,
            similarity_threshold,
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{} environment variable not set", name))
}

fn path_var(name: &str) -> Result<PathBuf> {
    require(name).map(PathBuf::from)
}
