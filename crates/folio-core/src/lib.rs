//! Core types and error definitions for the Folio photo-to-PDF bot.
//!
//! This crate provides the foundational types shared across all Folio crates:
//! the identifiers that address users and staged photos, the typed session
//! events and replies exchanged between the transport and the session layer,
//! and the unified error enum.
//!
//! # Main types
//!
//! - [`FolioError`] — Unified error enum for all Folio subsystems.
//! - [`FolioResult`] — Convenience alias for `Result<T, FolioError>`.
//! - [`UserId`] — Opaque stable identifier for one chat user.
//! - [`SequenceKey`] — Storage key and ordering position of a staged photo.
//! - [`SessionEvent`] / [`SessionReply`] — The session layer's input and
//!   output vocabulary.
//! - [`MediaSource`] — Capability to fetch the raw bytes of an uploaded image.

/// Session events and the structured replies they produce.
pub mod event;
/// The media-fetching capability implemented by transport adapters.
pub mod media;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use event::{SessionEvent, SessionReply};
pub use media::MediaSource;

// --- Error types ---

/// Top-level error type for the Folio bot.
///
/// Each variant corresponds to a subsystem that can produce errors. Conditions
/// that are part of the normal conversation flow (an empty staging area, an
/// unknown removal key, a stale button press) are *not* errors — they are
/// [`SessionReply`] variants.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// An error from the staging store (directory bookkeeping, photo I/O).
    #[error("Staging error: {0}")]
    Staging(String),

    /// A document assembly failure: an image could not be decoded, the photo
    /// set was empty, or the output could not be produced.
    #[error("Assembly error: {0}")]
    Assembly(String),

    /// An error from the user registry database.
    #[error("Registry error: {0}")]
    Registry(String),

    /// An error from the chat transport (polling, sending, media download).
    #[error("Channel error: {0}")]
    Channel(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`FolioError`].
pub type FolioResult<T> = Result<T, FolioError>;

// --- Identifiers ---

/// Opaque stable identifier for one chat user (the Telegram chat id).
///
/// The sole key for sessions, staging areas, and registry entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of one staged photo within a user's area.
///
/// Doubles as the stored file name and as the sort key for final document
/// ordering. Derived from the originating chat message id, which is
/// monotonically increasing per chat, so ascending key order is upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceKey(pub i64);

impl SequenceKey {
    /// Width of the zero-padded decimal file stem.
    ///
    /// Padding keeps lexicographic directory order and numeric key order in
    /// agreement, so a backend that lists names as strings still yields
    /// `2` before `10`.
    pub const STEM_WIDTH: usize = 20;

    /// The fixed-width file stem for this key, e.g. `00000000000000000042`.
    pub fn stem(self) -> String {
        format!("{:020}", self.0)
    }

    /// Parses a file stem back into a key. Accepts both padded and bare
    /// decimal stems; returns `None` for anything else.
    pub fn from_stem(stem: &str) -> Option<Self> {
        stem.parse::<i64>().ok().map(Self)
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
