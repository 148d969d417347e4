//! Translation through a generative provider

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tracing::info;

use super::rules::{case_insensitive, RuleTable};
use crate::agent::{Capability, Outcome};
use crate::card::{AgentCard, AgentSkill};
use crate::error::CourierError;
use crate::provider::{Provider, ProviderReply};

/// Target languages the translator recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    French,
    English,
    Spanish,
    German,
    Italian,
    Japanese,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::French => "French",
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
        };
        f.write_str(name)
    }
}

const LANGUAGE_RULES: &[(&str, Language)] = &[
    ("to french|en français|au français", Language::French),
    ("to english|en anglais|in english", Language::English),
    ("to spanish|en espagnol|al español", Language::Spanish),
    ("to german|en allemand|auf deutsch", Language::German),
    ("to italian|en italien|in italiano", Language::Italian),
    ("to japanese|en japonais|日本語", Language::Japanese),
];

const SEPARATOR: &str = r"(?:translate|traduire|translation)\s+(?:to|en|au|in)\s+(?:français|anglais|espagnol|english|spanish|french|german|italian|japanese)\s*:?\s*";

/// Parsed translation request
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub language: Language,
    pub text: String,
}

pub fn translator_card() -> AgentCard {
    AgentCard::new("Translator Agent", "http://localhost:4001/")
        .with_description("Translates text into different languages")
        .with_provider("Courier", "https://a2a-protocol.org")
        .add_skill(
            AgentSkill::new(
                "translate_text",
                "Translate Text",
                "Translates text into the specified target language",
            )
            .with_tags(&["translation", "language", "localization"])
            .with_examples(&["Traduire en français", "Translate to English", "Traducir al español"]),
        )
}

pub struct TranslatorCapability {
    provider: Arc<dyn Provider>,
    languages: RuleTable<Language>,
    separator: Regex,
}

impl TranslatorCapability {
    pub fn new(provider: Arc<dyn Provider>) -> Result<Self, CourierError> {
        Ok(Self {
            provider,
            languages: RuleTable::compile(LANGUAGE_RULES)?,
            separator: case_insensitive(SEPARATOR)?,
        })
    }

    /// Target language (French unless a rule says otherwise) and the text
    /// after a `translate to <language>:` separator, or the whole input
    pub fn parse(&self, text: &str) -> TranslationRequest {
        let language = self
            .languages
            .first_match(text)
            .map(|(language, _)| language)
            .unwrap_or(Language::French);

        let text = match self.separator.find(text) {
            Some(separator) => text[separator.end()..].trim(),
            None => text.trim(),
        };

        TranslationRequest {
            language,
            text: text.to_string(),
        }
    }
}

fn prompt(request: &TranslationRequest) -> String {
    format!(
        "Translate the following text to {}. Provide only the translation without explanations:\n\n{}",
        request.language, request.text
    )
}

#[async_trait]
impl Capability for TranslatorCapability {
    fn label(&self) -> &'static str {
        "Translation"
    }

    fn card(&self) -> AgentCard {
        translator_card()
    }

    async fn run(&self, text: &str) -> Result<Outcome, CourierError> {
        let request = self.parse(text);
        if request.text.is_empty() {
            return Err(CourierError::input("no text to translate found in message"));
        }
        info!(language = %request.language, "Translating");

        let context = json!({
            "language": request.language.to_string(),
            "text": request.text,
        });
        let translated = self
            .provider
            .provide(&prompt(&request), Some(&context))
            .await
            .into_text(self.provider.name())?;

        Ok(Outcome::reply(format!(
            "Translation to {}:\n\n{}",
            request.language, translated
        )))
    }
}

/// Text marked as translated to `language`, otherwise unchanged
pub fn synthetic_translation(language: &str, text: &str) -> String {
    format!("[MOCK TRANSLATION TO {}]\n\n{}", language.to_uppercase(), text)
}

/// Offline stand-in for a generative translator
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticTranslator;

#[async_trait]
impl Provider for SyntheticTranslator {
    fn name(&self) -> &str {
        "synthetic-translator"
    }

    async fn provide(&self, query: &str, context: Option<&Value>) -> ProviderReply {
        let language = context
            .and_then(|c| c.get("language"))
            .and_then(Value::as_str)
            .unwrap_or("French");
        let text = context
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or(query);
        ProviderReply::Text(synthetic_translation(language, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SyntheticProvider;

    fn capability() -> TranslatorCapability {
        TranslatorCapability::new(Arc::new(SyntheticTranslator)).unwrap()
    }

    #[test]
    fn test_language_rules() {
        let translator = capability();
        let cases = [
            ("Translate to French: hello", Language::French),
            ("traduire au français", Language::French),
            ("Say it in English please", Language::English),
            ("traduire en anglais", Language::English),
            ("al español por favor", Language::Spanish),
            ("Translate to German: good night", Language::German),
            ("auf Deutsch bitte", Language::German),
            ("in italiano", Language::Italian),
            ("en italien", Language::Italian),
            ("Translate to Japanese: thanks", Language::Japanese),
            ("日本語でお願いします", Language::Japanese),
        ];
        for (input, expected) in cases {
            assert_eq!(translator.parse(input).language, expected, "{input}");
        }
    }

    #[test]
    fn test_language_defaults_to_french() {
        assert_eq!(capability().parse("Good morning").language, Language::French);
    }

    #[test]
    fn test_separator_isolates_text() {
        let request = capability().parse("Translate to Spanish:\n\nDay 1: visit the museum");
        assert_eq!(request.language, Language::Spanish);
        assert_eq!(request.text, "Day 1: visit the museum");

        let request = capability().parse("Traduire en anglais : Bonjour");
        assert_eq!(request.text, "Bonjour");
    }

    #[test]
    fn test_without_separator_whole_text_is_translated() {
        let request = capability().parse("  Where is the station?  ");
        assert_eq!(request.text, "Where is the station?");
    }

    #[tokio::test]
    async fn test_run_formats_reply_and_prompt() {
        let provider = SyntheticProvider::new("translator", |prompt, _| {
            assert!(prompt.starts_with("Translate the following text to German."));
            assert!(prompt.ends_with("\n\nGood night"));
            ProviderReply::Text("Gute Nacht".into())
        });
        let translator = TranslatorCapability::new(Arc::new(provider)).unwrap();

        let outcome = translator.run("Translate to German: Good night").await.unwrap();
        assert_eq!(outcome.reply, "Translation to German:\n\nGute Nacht");
        assert!(outcome.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_input_error() {
        let err = capability().run("Translate to English:").await.unwrap_err();
        assert!(matches!(err, CourierError::Input(_)));
    }

    #[tokio::test]
    async fn test_synthetic_translator_uses_context() {
        let outcome = capability().run("Translate to Italian: ciao").await.unwrap();
        assert_eq!(outcome.reply, "Translation to Italian:\n\n[MOCK TRANSLATION TO ITALIAN]\n\nciao");
    }
}
