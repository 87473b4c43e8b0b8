use anyhow::{anyhow, Context};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Startup settings, read once from `FEEDBACKD_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_filter: String,
    pub log_json: bool,
    pub default_page_size: NonZeroUsize,
    pub max_page_size: NonZeroUsize,
    pub workspace: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            log_json: false,
            default_page_size: NonZeroUsize::MIN.saturating_add(9),
            max_page_size: NonZeroUsize::MIN.saturating_add(499),
            workspace: None,
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("{key} must be a boolean (got {other:?})")),
    }
}

fn parse_page_size(key: &str, raw: &str) -> anyhow::Result<NonZeroUsize> {
    let n: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be an integer (got {raw:?})"))?;
    usize::try_from(n)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| anyhow!("{key} must be greater than zero (got {n})"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Config::default();
        if let Some(v) = lookup("FEEDBACKD_LOG") {
            config.log_filter = v;
        }
        if let Some(v) = lookup("FEEDBACKD_LOG_JSON") {
            config.log_json = parse_bool("FEEDBACKD_LOG_JSON", &v)?;
        }
        if let Some(v) = lookup("FEEDBACKD_PAGE_SIZE") {
            config.default_page_size = parse_page_size("FEEDBACKD_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("FEEDBACKD_MAX_PAGE_SIZE") {
            config.max_page_size = parse_page_size("FEEDBACKD_MAX_PAGE_SIZE", &v)?;
        }
        if config.default_page_size > config.max_page_size {
            return Err(anyhow!(
                "FEEDBACKD_PAGE_SIZE ({}) exceeds FEEDBACKD_MAX_PAGE_SIZE ({})",
                config.default_page_size,
                config.max_page_size
            ));
        }
        config.workspace = lookup("FEEDBACKD_WORKSPACE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Ok(config)
    }
}
