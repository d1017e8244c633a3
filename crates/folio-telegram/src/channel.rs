use crate::catalog::MessageCatalog;
use crate::keyboard::{self, ReplyKeyboard};
use crate::media::TelegramMedia;
use crate::update::{map_message, InboundAction, TelegramInbound, TelegramUpdate};
use bytes::Bytes;
use folio_core::{FolioError, FolioResult, SessionEvent, SessionReply, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

// ── Telegram API request/response types ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyKeyboard>,
}

#[derive(Debug, Serialize)]
struct DeleteMessageRequest {
    chat_id: i64,
    message_id: i64,
}

// ── Implementation ──────────────────────────────────────────────────────────

/// Telegram Bot API channel adapter.
///
/// Uses the Bot HTTP API for sending and long-polling (`getUpdates`) for
/// receiving. Incoming messages are mapped to [`TelegramInbound`] events and
/// forwarded through a `tokio::sync::mpsc` channel; structured session
/// replies come back in through [`TelegramChannel::deliver`], which phrases
/// them using the [`MessageCatalog`].
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
    catalog: MessageCatalog,
    poll_timeout_secs: u64,
    event_tx: mpsc::Sender<TelegramInbound>,
    event_rx: Option<mpsc::Receiver<TelegramInbound>>,
}

impl TelegramChannel {
    /// Create a new `TelegramChannel`.
    ///
    /// * `bot_token` – The bot token obtained from @BotFather.
    /// * `catalog` – Localized texts for outbound messages.
    /// * `event_buffer` – Capacity of the internal mpsc event buffer.
    /// * `poll_timeout_secs` – Long-poll timeout passed to `getUpdates`.
    pub fn new(
        bot_token: impl Into<String>,
        catalog: MessageCatalog,
        event_buffer: usize,
        poll_timeout_secs: u64,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        Self {
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
            catalog,
            poll_timeout_secs,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the receiving half of the event channel.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<TelegramInbound>> {
        self.event_rx.take()
    }

    /// Start long-polling the Telegram `getUpdates` endpoint.
    ///
    /// Runs indefinitely, forwarding every understood message through the
    /// mpsc channel in arrival order. Should be spawned onto a Tokio task.
    pub async fn poll_updates(&self) -> FolioResult<()> {
        let mut offset: Option<i64> = None;

        loop {
            let url = self.api_url("getUpdates");

            let mut params: Vec<(&str, String)> =
                vec![("timeout", self.poll_timeout_secs.to_string())];
            if let Some(off) = offset {
                params.push(("offset", off.to_string()));
            }

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .map_err(|e| FolioError::Channel(format!("Telegram poll error: {e}")))?;

            let body: TelegramResponse<Vec<TelegramUpdate>> = response
                .json()
                .await
                .map_err(|e| FolioError::Channel(format!("Telegram parse error: {e}")))?;

            if !body.ok {
                return Err(FolioError::Channel(format!(
                    "Telegram API error: {}",
                    body.description.unwrap_or_default()
                )));
            }

            for update in body.result.unwrap_or_default() {
                // Advance the offset so we do not receive this update again.
                offset = Some(update.update_id + 1);

                let Some(inbound) = update.message.as_ref().and_then(map_message) else {
                    continue;
                };

                // Best-effort send; if the receiver is dropped we stop.
                if self.event_tx.send(inbound).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    /// Converts a mapped inbound action into the session event it stands
    /// for, attaching the media download capability where one is needed.
    /// `Info` has no session meaning and returns `None`.
    pub fn to_session_event(&self, action: InboundAction) -> Option<SessionEvent> {
        match action {
            InboundAction::Info => None,
            InboundAction::Begin => Some(SessionEvent::Begin),
            InboundAction::Photo { key, file_id } => Some(SessionEvent::PhotoReceived {
                key,
                media: Arc::new(TelegramMedia::new(
                    self.client.clone(),
                    self.bot_token.clone(),
                    file_id,
                )),
            }),
            InboundAction::ToPdf => Some(SessionEvent::RequestConversion),
            InboundAction::RemoveLast => Some(SessionEvent::RemoveLast),
            InboundAction::RemoveByReply { key } => Some(SessionEvent::RemoveByKey(key)),
            InboundAction::Back => Some(SessionEvent::GoBack),
            InboundAction::Cancel => Some(SessionEvent::Cancel),
            InboundAction::Text(name) => Some(SessionEvent::NameChosen(name)),
        }
    }

    /// Sends the `/start` and `/help` explanation.
    pub async fn send_info(&self, user: UserId) -> FolioResult<()> {
        self.send_text(user, "start", Some(&keyboard::idle())).await
    }

    /// Phrases one structured session reply as chat output.
    ///
    /// `trigger_id` is the id of the message that produced the reply; photo
    /// removals delete both the staged photo's chat message and the trigger,
    /// mirroring what the user sees to what is staged.
    pub async fn deliver(
        &self,
        user: UserId,
        trigger_id: i64,
        reply: SessionReply,
    ) -> FolioResult<()> {
        match reply {
            SessionReply::Started => {
                self.send_text(user, "send_photos", Some(&keyboard::collecting()))
                    .await
            }
            SessionReply::AwaitingName => {
                self.send_text(user, "send_name", Some(&keyboard::naming())).await
            }
            SessionReply::StagingEmpty => self.send_text(user, "empty", None).await,
            SessionReply::RemovedLast { key } | SessionReply::Removed { key } => {
                // Chat cleanup is cosmetic; the staging area is already
                // consistent, so deletion failures only get logged.
                self.delete_message_quietly(user, key.0).await;
                self.delete_message_quietly(user, trigger_id).await;
                Ok(())
            }
            SessionReply::NotFound { .. } => self.send_text(user, "not_found", None).await,
            SessionReply::Resumed => {
                self.send_text(user, "continue", Some(&keyboard::collecting()))
                    .await
            }
            SessionReply::Cancelled => {
                self.send_text(user, "cancel", Some(&keyboard::idle())).await
            }
            SessionReply::DocumentReady { name, data } => {
                self.send_text(user, "get_pdf", Some(&keyboard::idle())).await?;
                self.send_document(user, &name, data).await
            }
            SessionReply::AssemblyFailed { .. } => {
                self.send_text(user, "convert_failed", None).await
            }
            SessionReply::InvalidName => self.send_text(user, "bad_name", None).await,
            SessionReply::PhotoSaved { .. }
            | SessionReply::NothingToRemove
            | SessionReply::Ignored => Ok(()),
        }
    }

    /// Sends the catalog text for `key`, optionally replacing the keyboard.
    pub async fn send_text(
        &self,
        user: UserId,
        key: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> FolioResult<()> {
        let payload = SendMessageRequest {
            chat_id: user.0,
            text: self.catalog.text(key),
            reply_markup: keyboard,
        };
        self.call("sendMessage", &payload).await
    }

    /// Uploads the finished PDF as `<name>.pdf`.
    pub async fn send_document(&self, user: UserId, name: &str, data: Bytes) -> FolioResult<()> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(format!("{name}.pdf"))
            .mime_str("application/pdf")
            .map_err(|e| FolioError::Channel(format!("Telegram document part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", user.0.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram send error: {e}")))?;

        self.check(response).await
    }

    /// Deletes one chat message.
    pub async fn delete_message(&self, user: UserId, message_id: i64) -> FolioResult<()> {
        let payload = DeleteMessageRequest {
            chat_id: user.0,
            message_id,
        };
        self.call("deleteMessage", &payload).await
    }

    async fn delete_message_quietly(&self, user: UserId, message_id: i64) {
        if let Err(e) = self.delete_message(user, message_id).await {
            tracing::warn!(%user, message_id, error = %e, "message deletion failed");
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    async fn call<P: Serialize>(&self, method: &str, payload: &P) -> FolioResult<()> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram send error: {e}")))?;
        self.check(response).await
    }

    async fn check(&self, response: reqwest::Response) -> FolioResult<()> {
        let body: TelegramResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| FolioError::Channel(format!("Telegram parse error: {e}")))?;
        if !body.ok {
            return Err(FolioError::Channel(format!(
                "Telegram API call failed: {}",
                body.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }
}
