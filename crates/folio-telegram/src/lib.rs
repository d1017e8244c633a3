//! Telegram Bot API transport for the Folio bot.
//!
//! Long-polls `getUpdates`, maps raw updates into the typed session events
//! the core understands, and phrases the core's structured replies as
//! localized chat messages, keyboards, and document uploads. All knowledge
//! of Telegram — file ids, chat ids, button texts, the HTTP API — stays in
//! this crate.
//!
//! # Main types
//!
//! - [`TelegramChannel`] — Polling, sending, and reply delivery.
//! - [`TelegramInbound`] / [`InboundAction`] — One mapped incoming message.
//! - [`MessageCatalog`] — Localized text lookup (YAML key → language → text).

/// Localized message catalog.
pub mod catalog;
/// The Telegram channel adapter.
pub mod channel;
/// Reply keyboard layouts and button texts.
pub mod keyboard;
/// Downloadable media references.
pub mod media;
/// Inbound update types and their mapping to session events.
pub mod update;

pub use catalog::MessageCatalog;
pub use channel::TelegramChannel;
pub use media::TelegramMedia;
pub use update::{InboundAction, TelegramInbound};
