use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::services::http::{send_with_retry, GatewayHttpConfig};

const GATEWAY: &str = "dictionary";

/// Placeholder shown when the gateway cannot be reached but the word may
/// well exist.
pub const NO_DEFINITION: &str = "No definition available.";

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryDefinition {
    pub part_of_speech: Option<String>,
    pub definition: String,
    pub example: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub word: String,
    pub phonetic: Option<String>,
    pub definitions: Vec<DictionaryDefinition>,
    /// True when the gateway could not be reached and the entry is a
    /// placeholder. Degraded entries are renderable but must not be cached.
    pub degraded: bool,
}

/// Dictionary seam. A missing word is `AppError::WordNotFound`; a transport
/// failure degrades to a placeholder entry (`degraded` set) instead.
#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<DictionaryEntry, AppError>;
}

#[derive(Deserialize)]
struct EntryPayload {
    #[serde(default)]
    word: String,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<PhoneticPayload>,
    #[serde(default)]
    meanings: Vec<MeaningPayload>,
}

#[derive(Deserialize)]
struct PhoneticPayload {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct MeaningPayload {
    #[serde(default, rename = "partOfSpeech")]
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<DefinitionPayload>,
}

#[derive(Deserialize)]
struct DefinitionPayload {
    #[serde(default)]
    definition: String,
    #[serde(default)]
    example: Option<String>,
}

/// Free Dictionary API client.
pub struct FreeDictionary {
    client: Client,
    http: GatewayHttpConfig,
    base_url: String,
}

impl FreeDictionary {
    pub fn new(config: &GatewayConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: config.http.build_client(GATEWAY)?,
            http: config.http.clone(),
            base_url: config.dictionary_api_url.trim_end_matches('/').to_string(),
        })
    }

    fn entry_url(&self, word: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::gateway(GATEWAY, format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::gateway(GATEWAY, "base url cannot carry a path"))?
            .extend(["api", "v2", "entries", "en", word]);
        Ok(url)
    }

    fn entry_from_payload(word: &str, payload: EntryPayload) -> DictionaryEntry {
        let phonetic = payload
            .phonetic
            .filter(|p| !p.is_empty())
            .or_else(|| {
                payload
                    .phonetics
                    .into_iter()
                    .find_map(|p| p.text.filter(|t| !t.is_empty()))
            });

        let definitions: Vec<DictionaryDefinition> = payload
            .meanings
            .into_iter()
            .flat_map(|meaning| {
                let part_of_speech = meaning.part_of_speech;
                meaning
                    .definitions
                    .into_iter()
                    .filter(|d| !d.definition.is_empty())
                    .map(move |d| DictionaryDefinition {
                        part_of_speech: part_of_speech.clone(),
                        definition: d.definition,
                        example: d.example.filter(|e| !e.is_empty()),
                    })
            })
            .collect();

        DictionaryEntry {
            word: if payload.word.is_empty() {
                word.to_string()
            } else {
                payload.word
            },
            phonetic,
            definitions,
            degraded: false,
        }
    }

    fn placeholder_entry(word: &str) -> DictionaryEntry {
        DictionaryEntry {
            word: word.to_string(),
            phonetic: None,
            definitions: vec![DictionaryDefinition {
                part_of_speech: None,
                definition: NO_DEFINITION.to_string(),
                example: None,
            }],
            degraded: true,
        }
    }
}

#[async_trait]
impl DictionaryProvider for FreeDictionary {
    async fn lookup(&self, word: &str) -> Result<DictionaryEntry, AppError> {
        let url = self.entry_url(word)?;

        let response = match send_with_retry(&self.http, GATEWAY, || {
            self.client.get(url.clone())
        })
        .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(word, error = %e, "Dictionary unreachable, degrading to placeholder");
                return Ok(Self::placeholder_entry(word));
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::WordNotFound(word.to_string()));
        }
        if !response.status().is_success() {
            warn!(word, status = %response.status(), "Dictionary error status, degrading to placeholder");
            return Ok(Self::placeholder_entry(word));
        }

        let entries: Vec<EntryPayload> = match response.json().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(word, error = %e, "Malformed dictionary payload, degrading to placeholder");
                return Ok(Self::placeholder_entry(word));
            }
        };

        match entries.into_iter().next() {
            Some(payload) => {
                let entry = Self::entry_from_payload(word, payload);
                if entry.definitions.is_empty() {
                    return Err(AppError::WordNotFound(word.to_string()));
                }
                debug!(word, definitions = entry.definitions.len(), "Dictionary lookup completed");
                Ok(entry)
            }
            None => Err(AppError::WordNotFound(word.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> EntryPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_meanings_flatten_into_definitions() {
        let entry = FreeDictionary::entry_from_payload(
            "hello",
            payload(serde_json::json!({
                "word": "hello",
                "phonetic": "/həˈləʊ/",
                "meanings": [
                    {
                        "partOfSpeech": "noun",
                        "definitions": [
                            { "definition": "a greeting", "example": "she said hello" },
                            { "definition": "a call of surprise" }
                        ]
                    },
                    {
                        "partOfSpeech": "verb",
                        "definitions": [{ "definition": "to say hello" }]
                    }
                ]
            })),
        );

        assert_eq!(entry.definitions.len(), 3);
        assert_eq!(entry.definitions[0].part_of_speech.as_deref(), Some("noun"));
        assert_eq!(entry.definitions[0].definition, "a greeting");
        assert_eq!(
            entry.definitions[0].example.as_deref(),
            Some("she said hello")
        );
        assert_eq!(entry.definitions[2].part_of_speech.as_deref(), Some("verb"));
    }

    #[test]
    fn test_phonetic_falls_back_to_phonetics_list() {
        let entry = FreeDictionary::entry_from_payload(
            "hello",
            payload(serde_json::json!({
                "word": "hello",
                "phonetics": [{ "text": "" }, { "text": "/həˈləʊ/" }],
                "meanings": [{ "definitions": [{ "definition": "a greeting" }] }]
            })),
        );
        assert_eq!(entry.phonetic.as_deref(), Some("/həˈləʊ/"));
    }

    #[test]
    fn test_placeholder_entry_always_renderable() {
        let entry = FreeDictionary::placeholder_entry("ineffable");
        assert_eq!(entry.word, "ineffable");
        assert_eq!(entry.definitions.len(), 1);
        assert_eq!(entry.definitions[0].definition, NO_DEFINITION);
        assert!(entry.degraded);
    }

    #[test]
    fn test_entry_url_percent_encodes_word() {
        let gateway = FreeDictionary {
            client: Client::new(),
            http: GatewayHttpConfig::default(),
            base_url: "https://api.dictionaryapi.dev".to_string(),
        };
        let url = gateway.entry_url("ice cream").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.dictionaryapi.dev/api/v2/entries/en/ice%20cream"
        );
    }
}
