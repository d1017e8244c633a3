use async_trait::async_trait;
use bytes::Bytes;
use folio_core::{FolioError, FolioResult, MediaSource};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FileResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<FilePayload>,
}

#[derive(Debug, Deserialize)]
struct FilePayload {
    file_path: Option<String>,
}

/// A Telegram file reference with the capability to download it.
///
/// Resolves the `file_id` through `getFile` and fetches the content from the
/// file endpoint. Implements [`MediaSource`], so the staging layer stays
/// ignorant of Telegram.
pub struct TelegramMedia {
    client: reqwest::Client,
    bot_token: String,
    file_id: String,
}

impl TelegramMedia {
    /// Wraps a `file_id` for download with the given client and token.
    pub fn new(client: reqwest::Client, bot_token: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            client,
            bot_token: bot_token.into(),
            file_id: file_id.into(),
        }
    }
}

#[async_trait]
impl MediaSource for TelegramMedia {
    async fn fetch_bytes(&self) -> FolioResult<Bytes> {
        let url = format!(
            "https://api.telegram.org/bot{}/getFile",
            self.bot_token
        );
        let response = self
            .client
            .get(&url)
            .query(&[("file_id", self.file_id.as_str())])
            .send()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram getFile error: {e}")))?;

        let body: FileResponse = response
            .json()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram parse error: {e}")))?;

        if !body.ok {
            return Err(FolioError::Channel(format!(
                "Telegram getFile failed: {}",
                body.description.unwrap_or_default()
            )));
        }

        let file_path = body
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| FolioError::Channel("Telegram getFile returned no path".to_string()))?;

        let download_url = format!(
            "https://api.telegram.org/file/bot{}/{file_path}",
            self.bot_token
        );
        let bytes = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram download error: {e}")))?
            .bytes()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram download error: {e}")))?;

        Ok(bytes)
    }
}
