use crate::error::AppError;
use crate::services::http::GatewayHttpConfig;

const DETECTION_API_URL: &str = "https://api.clarifai.com";
const TRANSLATION_API_URL: &str = "https://api-free.deepl.com";
const DICTIONARY_API_URL: &str = "https://api.dictionaryapi.dev";

/// Gateway credentials and endpoints, resolved once at startup.
#[derive(Clone)]
pub struct GatewayConfig {
    pub detection_api_key: String,
    pub detection_api_url: String,
    pub translation_api_key: String,
    pub translation_api_url: String,
    pub dictionary_api_url: String,
    pub http: GatewayHttpConfig,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("detection_api_key", &"[REDACTED]")
            .field("detection_api_url", &self.detection_api_url)
            .field("translation_api_key", &"[REDACTED]")
            .field("translation_api_url", &self.translation_api_url)
            .field("dictionary_api_url", &self.dictionary_api_url)
            .field("http", &self.http)
            .finish()
    }
}

impl GatewayConfig {
    /// Required: `CLARIFAI_API_KEY`, `DEEPL_API_KEY`.
    /// Optional URL overrides: `CLARIFAI_API_URL`, `DEEPL_API_URL`,
    /// `DICTIONARY_API_URL`.
    pub fn from_env() -> Result<Self, AppError> {
        let detection_api_key = require_env("CLARIFAI_API_KEY")?;
        let translation_api_key = require_env("DEEPL_API_KEY")?;

        Ok(Self {
            detection_api_key,
            detection_api_url: env_or("CLARIFAI_API_URL", DETECTION_API_URL),
            translation_api_key,
            translation_api_url: env_or("DEEPL_API_URL", TRANSLATION_API_URL),
            dictionary_api_url: env_or("DICTIONARY_API_URL", DICTIONARY_API_URL),
            http: GatewayHttpConfig::default(),
        })
    }
}

fn require_env(name: &str) -> Result<String, AppError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{name} environment variable not set")))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
