use anyhow::{Context, Result};

const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash-lite";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
///
/// The GenAI credential is optional at startup: its absence surfaces as a
/// configuration error on the first gateway call, not as a boot failure.
#[derive(Debug, Clone)]
pub struct Config {
    pub genai_api_key: Option<String>,
    pub genai_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub llm_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            genai_api_key: None,
            genai_base_url: DEFAULT_GENAI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            llm_timeout_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            genai_api_key: optional_env("GOOGLE_GENAI_API_KEY"),
            genai_base_url: optional_env("GENAI_BASE_URL").unwrap_or(defaults.genai_base_url),
            text_model: optional_env("GENAI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: optional_env("GENAI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            port: parse_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}

/// Reads a variable, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
