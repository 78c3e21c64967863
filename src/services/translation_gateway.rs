use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::models::language::DisplayLanguage;
use crate::services::http::{send_with_retry, GatewayHttpConfig};

const GATEWAY: &str = "translation";

/// Sentinel returned instead of an error when the gateway fails; callers
/// check for it rather than catching.
pub const TRANSLATION_FAILED: &str = "Translation failed";

/// Translation seam over the raw gateway. Production and mock
/// implementations both speak source-English.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: DisplayLanguage) -> Result<String, AppError>;
}

/// Front door used by the services: skips self-translation into English and
/// converts gateway failure into the sentinel.
pub async fn translate_display(
    translator: &dyn Translator,
    text: &str,
    target: DisplayLanguage,
) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    if target.is_english() {
        return text.to_string();
    }
    match translator.translate(text, target).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(target = %target, error = %e, "Translation failed, returning sentinel");
            TRANSLATION_FAILED.to_string()
        }
    }
}

pub fn is_translation_failure(text: &str) -> bool {
    text == TRANSLATION_FAILED
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    source_lang: &'static str,
    target_lang: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    #[serde(default)]
    text: String,
}

/// DeepL-backed translator.
pub struct DeeplTranslator {
    client: Client,
    http: GatewayHttpConfig,
    api_key: String,
    endpoint: String,
}

impl DeeplTranslator {
    pub fn new(config: &GatewayConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: config.http.build_client(GATEWAY)?,
            http: config.http.clone(),
            api_key: config.translation_api_key.clone(),
            endpoint: format!(
                "{}/v2/translate",
                config.translation_api_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    async fn translate(&self, text: &str, target: DisplayLanguage) -> Result<String, AppError> {
        let body = serde_json::to_value(TranslateRequest {
            text: [text],
            source_lang: "EN",
            target_lang: target.gateway_code(),
        })?;

        let response = send_with_retry(&self.http, GATEWAY, || {
            self.client
                .post(&self.endpoint)
                .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
                .json(&body)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::gateway(GATEWAY, format!("status {status}")));
        }

        let parsed: TranslateResponse = response.json().await?;
        let translated = parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::gateway(GATEWAY, "empty translations array"))?;

        debug!(target = %target, "Translation completed");
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranslator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(
            &self,
            text: &str,
            _target: DisplayLanguage,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::gateway(GATEWAY, "down"))
            } else {
                Ok(format!("<{text}>"))
            }
        }
    }

    #[tokio::test]
    async fn test_english_target_skips_gateway() {
        let translator = CountingTranslator {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let out =
            translate_display(&translator, "hello", DisplayLanguage::EnUs).await;
        assert_eq!(out, "hello");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_english_target_calls_gateway() {
        let translator = CountingTranslator {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let out =
            translate_display(&translator, "hello", DisplayLanguage::ChineseSimplified).await;
        assert_eq!(out, "<hello>");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_becomes_sentinel_not_error() {
        let translator = CountingTranslator {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let out =
            translate_display(&translator, "hello", DisplayLanguage::ChineseSimplified).await;
        assert!(is_translation_failure(&out));
    }

    #[tokio::test]
    async fn test_blank_text_short_circuits() {
        let translator = CountingTranslator {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let out = translate_display(&translator, "  ", DisplayLanguage::ChineseSimplified).await;
        assert_eq!(out, "");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(TranslateRequest {
            text: ["hello"],
            source_lang: "EN",
            target_lang: DisplayLanguage::ChineseSimplified.gateway_code(),
        })
        .unwrap();
        assert_eq!(body["text"][0], "hello");
        assert_eq!(body["source_lang"], "EN");
        assert_eq!(body["target_lang"], "ZH");
    }
}
