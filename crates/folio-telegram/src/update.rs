use crate::keyboard;
use folio_core::{SequenceKey, UserId};
use serde::Deserialize;

// ── Telegram API update types ───────────────────────────────────────────────

/// One entry from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    /// Monotonic update id, used to advance the polling offset.
    pub update_id: i64,
    /// The message payload, when the update carries one.
    pub message: Option<IncomingMessage>,
}

/// An incoming chat message, reduced to the fields the bot reads.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    /// Chat-scoped message id; monotonically increasing, so it doubles as
    /// the staged photo's [`SequenceKey`].
    pub message_id: i64,
    /// The chat the message arrived in.
    pub chat: TelegramChat,
    /// Text content, for commands, buttons, and chosen names.
    #[serde(default)]
    pub text: Option<String>,
    /// Available renditions of an attached photo, smallest first.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    /// An attached file, accepted when it is a `.jpg`/`.png` image.
    #[serde(default)]
    pub document: Option<DocumentAttachment>,
    /// The message this one replies to, for `/remove`.
    #[serde(default)]
    pub reply_to_message: Option<Box<IncomingMessage>>,
}

/// The chat an update belongs to.
#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    /// Chat id; for private chats this is the user id.
    pub id: i64,
}

/// One rendition of a photo attachment.
#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    /// Telegram file reference, downloadable through `getFile`.
    pub file_id: String,
}

/// A generic file attachment.
#[derive(Debug, Deserialize)]
pub struct DocumentAttachment {
    /// Telegram file reference, downloadable through `getFile`.
    pub file_id: String,
    /// Original file name, used to accept only image uploads.
    #[serde(default)]
    pub file_name: Option<String>,
}

// ── Mapped inbound events ───────────────────────────────────────────────────

/// One incoming message, mapped to its semantic meaning.
#[derive(Debug, Clone)]
pub struct TelegramInbound {
    /// The user (chat) the message came from.
    pub user: UserId,
    /// Id of the triggering message, kept for later chat cleanup.
    pub message_id: i64,
    /// What the message means to the session layer.
    pub action: InboundAction,
}

/// The semantic meaning of one incoming message.
///
/// `Photo` carries the Telegram file reference rather than a session event
/// directly; the channel attaches the download capability when it forwards
/// the event, keeping this mapping free of I/O and unit-testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAction {
    /// `/start` or `/help`: explain the bot, no session change.
    Info,
    /// `/photos`: begin (or restart) a collecting session.
    Begin,
    /// A photo or image document to stage under `key`.
    Photo {
        /// Sequence key derived from the message id.
        key: SequenceKey,
        /// Telegram file reference to download.
        file_id: String,
    },
    /// The "To PDF" button.
    ToPdf,
    /// The "Remove last photo" button.
    RemoveLast,
    /// `/remove` sent as a reply to the photo message to delete.
    RemoveByReply {
        /// Sequence key of the replied-to photo message.
        key: SequenceKey,
    },
    /// The "Back" button.
    Back,
    /// The "Cancel" button.
    Cancel,
    /// Any other text; a document name while naming, noise otherwise.
    Text(String),
}

/// Maps a raw message to its inbound action, or `None` when the message
/// carries nothing the bot understands (stickers, non-image files,
/// `/remove` without a reply).
pub fn map_message(msg: &IncomingMessage) -> Option<TelegramInbound> {
    let user = UserId(msg.chat.id);
    let message_id = msg.message_id;

    let action = if let Some(text) = msg.text.as_deref() {
        match text {
            "/start" | "/help" => InboundAction::Info,
            "/photos" => InboundAction::Begin,
            keyboard::BTN_TO_PDF => InboundAction::ToPdf,
            keyboard::BTN_REMOVE_LAST => InboundAction::RemoveLast,
            keyboard::BTN_BACK => InboundAction::Back,
            keyboard::BTN_CANCEL => InboundAction::Cancel,
            "/remove" => {
                let replied = msg.reply_to_message.as_deref()?;
                InboundAction::RemoveByReply {
                    key: SequenceKey(replied.message_id),
                }
            }
            _ => InboundAction::Text(text.to_string()),
        }
    } else if let Some(sizes) = &msg.photo {
        // Renditions are ordered smallest first; take the largest.
        let best = sizes.last()?;
        InboundAction::Photo {
            key: SequenceKey(message_id),
            file_id: best.file_id.clone(),
        }
    } else if let Some(doc) = &msg.document {
        if !is_image_name(doc.file_name.as_deref()?) {
            return None;
        }
        InboundAction::Photo {
            key: SequenceKey(message_id),
            file_id: doc.file_id.clone(),
        }
    } else {
        return None;
    };

    Some(TelegramInbound {
        user,
        message_id,
        action,
    })
}

fn is_image_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn message(json: serde_json::Value) -> IncomingMessage {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn commands_and_buttons_map_to_actions() {
        let cases = [
            ("/start", InboundAction::Info),
            ("/help", InboundAction::Info),
            ("/photos", InboundAction::Begin),
            ("To PDF", InboundAction::ToPdf),
            ("Remove last photo", InboundAction::RemoveLast),
            ("Back", InboundAction::Back),
            ("Cancel", InboundAction::Cancel),
            ("vacation", InboundAction::Text("vacation".to_string())),
        ];
        for (text, expected) in cases {
            let msg = message(serde_json::json!({
                "message_id": 10, "chat": {"id": 42}, "text": text
            }));
            let inbound = map_message(&msg).unwrap();
            assert_eq!(inbound.user, UserId(42));
            assert_eq!(inbound.action, expected, "text {text:?}");
        }
    }

    #[test]
    fn photo_takes_the_largest_rendition_and_keys_by_message_id() {
        let msg = message(serde_json::json!({
            "message_id": 77, "chat": {"id": 42},
            "photo": [{"file_id": "small"}, {"file_id": "big"}]
        }));
        let inbound = map_message(&msg).unwrap();
        assert_eq!(
            inbound.action,
            InboundAction::Photo {
                key: SequenceKey(77),
                file_id: "big".to_string()
            }
        );
    }

    #[test]
    fn image_documents_are_accepted_and_others_dropped() {
        let image = message(serde_json::json!({
            "message_id": 5, "chat": {"id": 1},
            "document": {"file_id": "f", "file_name": "scan.PNG"}
        }));
        assert!(matches!(
            map_message(&image).unwrap().action,
            InboundAction::Photo { .. }
        ));

        let other = message(serde_json::json!({
            "message_id": 6, "chat": {"id": 1},
            "document": {"file_id": "f", "file_name": "notes.txt"}
        }));
        assert!(map_message(&other).is_none());
    }

    #[test]
    fn remove_requires_a_replied_message() {
        let with_reply = message(serde_json::json!({
            "message_id": 9, "chat": {"id": 1}, "text": "/remove",
            "reply_to_message": {"message_id": 4, "chat": {"id": 1}}
        }));
        assert_eq!(
            map_message(&with_reply).unwrap().action,
            InboundAction::RemoveByReply { key: SequenceKey(4) }
        );

        let without = message(serde_json::json!({
            "message_id": 9, "chat": {"id": 1}, "text": "/remove"
        }));
        assert!(map_message(&without).is_none());
    }

    #[test]
    fn unsupported_payloads_are_dropped() {
        let sticker = message(serde_json::json!({
            "message_id": 3, "chat": {"id": 1}
        }));
        assert!(map_message(&sticker).is_none());
    }
}
