use serde::{Deserialize, Serialize};

/// Display locales the app can render in, mapped to the 2-5 character
/// uppercase codes the translation gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayLanguage {
    EnUs,
    EnUk,
    French,
    German,
    Japanese,
    Korean,
    Spanish,
    ChineseSimplified,
}

impl DisplayLanguage {
    pub const DEFAULT: DisplayLanguage = DisplayLanguage::EnUs;

    pub fn from_locale(locale: &str) -> Option<Self> {
        match locale {
            "en-US" => Some(Self::EnUs),
            "en-UK" => Some(Self::EnUk),
            "fr" => Some(Self::French),
            "de" => Some(Self::German),
            "ja" => Some(Self::Japanese),
            "ko" => Some(Self::Korean),
            "es" => Some(Self::Spanish),
            "zh-CN" => Some(Self::ChineseSimplified),
            _ => None,
        }
    }

    pub fn locale(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnUk => "en-UK",
            Self::French => "fr",
            Self::German => "de",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::Spanish => "es",
            Self::ChineseSimplified => "zh-CN",
        }
    }

    /// Target code consumed by the translation gateway.
    pub fn gateway_code(&self) -> &'static str {
        match self {
            Self::EnUs => "EN",
            Self::EnUk => "EN-GB",
            Self::French => "FR",
            Self::German => "DE",
            Self::Japanese => "JA",
            Self::Korean => "KO",
            Self::Spanish => "ES",
            Self::ChineseSimplified => "ZH",
        }
    }

    /// Source material is English; translating into English is a no-op.
    pub fn is_english(&self) -> bool {
        matches!(self, Self::EnUs | Self::EnUk)
    }
}

impl TryFrom<String> for DisplayLanguage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_locale(&value).ok_or_else(|| format!("unknown display language: {value}"))
    }
}

impl From<DisplayLanguage> for String {
    fn from(lang: DisplayLanguage) -> String {
        lang.locale().to_string()
    }
}

impl std::fmt::Display for DisplayLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.locale())
    }
}
