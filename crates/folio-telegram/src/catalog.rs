use folio_core::{FolioError, FolioResult};
use std::collections::HashMap;
use std::path::Path;

/// Fallback language when a key has no entry for the configured one.
const FALLBACK_LANGUAGE: &str = "en";

/// Localized display strings, loaded from a YAML file shaped
/// `key → language tag → text`.
///
/// Only the transport layer consumes this; the session core returns
/// structured replies and never formatted text.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: HashMap<String, HashMap<String, String>>,
    language: String,
}

impl MessageCatalog {
    /// Loads the catalog from a YAML file, phrasing replies in `language`.
    pub async fn load(path: impl AsRef<Path>, language: impl Into<String>) -> FolioResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&raw, language)
            .map_err(|e| FolioError::Config(format!("messages file {}: {e}", path.display())))
    }

    /// Parses a catalog from raw YAML.
    pub fn from_yaml(raw: &str, language: impl Into<String>) -> Result<Self, serde_yaml::Error> {
        let messages = serde_yaml::from_str(raw)?;
        Ok(Self {
            messages,
            language: language.into(),
        })
    }

    /// The display string for `key` in the configured language, falling back
    /// to English and finally to the key itself so a missing entry degrades
    /// to something visible rather than a dropped message.
    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        let entry = self.messages.get(key);
        if let Some(text) = entry.and_then(|langs| langs.get(&self.language)) {
            return text;
        }
        if let Some(text) = entry.and_then(|langs| langs.get(FALLBACK_LANGUAGE)) {
            tracing::warn!(key, language = %self.language, "message missing, using fallback");
            return text;
        }
        tracing::warn!(key, "message missing from catalog");
        key
    }
}
