use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the OpenAI-compatible inference API (chat, vision and
    /// embeddings all live under it).
    pub inference_base_url: String,
    pub inference_api_key: String,
    pub llm_model: String,
    pub vision_model: String,
    pub embeddings_model: String,
    /// Root directory for uploaded documents and their scratch files.
    pub uploads_dir: String,
    pub port: u16,
    pub rust_log: String,
    /// Page limits enforced before any model call is paid for.
    pub cv_max_pages: u32,
    pub jd_max_pages: u32,
    /// Workers per pipeline stage.
    pub stage_workers: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            inference_base_url: require_env("INFERENCE_BASE_URL")?,
            inference_api_key: require_env("INFERENCE_API_KEY")?,
            llm_model: require_env("LLM_MODEL")?,
            vision_model: require_env("VISION_MODEL")?,
            embeddings_model: require_env("EMBEDDINGS_MODEL")?,
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cv_max_pages: env_number("CV_MAX_PAGES", 2)?,
            jd_max_pages: env_number("JD_MAX_PAGES", 3)?,
            stage_workers: env_number("STAGE_WORKERS", 2)?,
        })
    }
}

#[cfg(test)]
impl Config {
    /// A config that never touches the environment, for unit tests.
    pub(crate) fn test_defaults() -> Self {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            inference_base_url: "http://localhost:9000/v1".to_string(),
            inference_api_key: "test-key".to_string(),
            llm_model: "test-llm".to_string(),
            vision_model: "test-vision".to_string(),
            embeddings_model: "test-embeddings".to_string(),
            uploads_dir: "uploads".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            cv_max_pages: 2,
            jd_max_pages: 3,
            stage_workers: 2,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a number, got '{value}'")),
        Err(_) => Ok(default),
    }
}
