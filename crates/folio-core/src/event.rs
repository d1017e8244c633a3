use crate::media::MediaSource;
use crate::SequenceKey;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// A semantic event delivered to a user's session.
///
/// The transport layer maps raw chat input (commands, button presses, media
/// attachments, free text) into these variants; the session state machine
/// validates each one against the current state and answers with a
/// [`SessionReply`]. Events that do not apply in the current state are
/// silently ignored, never errors — the chat UI may legitimately deliver
/// stale button presses.
pub enum SessionEvent {
    /// Start (or restart) a photo-collecting session, resetting the area.
    Begin,
    /// An image arrived and should be staged under `key`.
    PhotoReceived {
        /// Storage key and final ordering position of the photo.
        key: SequenceKey,
        /// Capability to download the image content.
        media: Arc<dyn MediaSource>,
    },
    /// The user asked to turn the staged photos into a document.
    RequestConversion,
    /// Remove the most recently staged photo.
    RemoveLast,
    /// Remove the photo staged under exactly this key.
    RemoveByKey(SequenceKey),
    /// Return from naming back to collecting, keeping the area intact.
    GoBack,
    /// Abandon the session and erase the area.
    Cancel,
    /// The user chose a name for the output document.
    NameChosen(String),
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "Begin"),
            Self::PhotoReceived { key, .. } => write!(f, "PhotoReceived({key})"),
            Self::RequestConversion => write!(f, "RequestConversion"),
            Self::RemoveLast => write!(f, "RemoveLast"),
            Self::RemoveByKey(key) => write!(f, "RemoveByKey({key})"),
            Self::GoBack => write!(f, "GoBack"),
            Self::Cancel => write!(f, "Cancel"),
            Self::NameChosen(name) => write!(f, "NameChosen({name:?})"),
        }
    }
}

/// The structured outcome of handling one [`SessionEvent`].
///
/// The session layer never produces user-facing text; the transport layer
/// translates these into localized chat messages and keyboard updates.
#[derive(Debug, Clone)]
pub enum SessionReply {
    /// A fresh collecting session started with an empty area.
    Started,
    /// The photo was written to durable storage.
    PhotoSaved {
        /// Key the photo was stored under.
        key: SequenceKey,
    },
    /// Conversion accepted; the session now awaits a document name.
    AwaitingName,
    /// Conversion requested with zero staged photos; state unchanged.
    StagingEmpty,
    /// The most recently staged photo was removed.
    RemovedLast {
        /// Key of the removed photo.
        key: SequenceKey,
    },
    /// Remove-last on an empty area; nothing happened.
    NothingToRemove,
    /// The photo under the given key was removed.
    Removed {
        /// Key of the removed photo.
        key: SequenceKey,
    },
    /// Remove-by-key found no matching photo; state unchanged.
    NotFound {
        /// The key that was requested.
        key: SequenceKey,
    },
    /// Returned from naming to collecting with the area untouched.
    Resumed,
    /// The session was cancelled and the area erased.
    Cancelled,
    /// Assembly succeeded; the area is erased and the session idle.
    DocumentReady {
        /// The user-chosen document name (without extension).
        name: String,
        /// The finished PDF content.
        data: Bytes,
    },
    /// Assembly failed; the area and the naming state are preserved so the
    /// user can retry without re-uploading.
    AssemblyFailed {
        /// Human-oriented failure description for logs; the transport sends
        /// a localized message instead.
        reason: String,
    },
    /// The chosen document name was empty or contained path components.
    InvalidName,
    /// The event did not apply in the current state and was dropped.
    Ignored,
}
