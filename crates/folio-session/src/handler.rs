use crate::state::SessionState;
use folio_core::{FolioError, FolioResult, SessionEvent, SessionReply, UserId};
use folio_registry::UserRegistry;
use folio_staging::StagingStore;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Applies one [`SessionEvent`] to one user's session.
///
/// Holds no per-user state itself; the caller owns the [`SessionState`] and
/// must serialize calls per user (see [`crate::SessionRouter`]). Every event
/// either produces a structured [`SessionReply`] or, for storage faults,
/// propagates an error — the handler never formats user-facing text.
pub struct SessionHandler {
    store: Arc<StagingStore>,
    registry: Arc<dyn UserRegistry>,
}

impl SessionHandler {
    /// Creates a handler over the given staging store and user registry.
    pub fn new(store: Arc<StagingStore>, registry: Arc<dyn UserRegistry>) -> Self {
        Self { store, registry }
    }

    /// Validates an event against `state`, performs its staging operations,
    /// and advances `state`.
    ///
    /// Events not applicable in the current state answer
    /// [`SessionReply::Ignored`] without touching anything; the chat UI may
    /// deliver stale button presses long after the state moved on.
    pub async fn handle(
        &self,
        user: UserId,
        state: &mut SessionState,
        event: SessionEvent,
    ) -> FolioResult<SessionReply> {
        use SessionState::{AwaitingName, CollectingPhotos, Idle};

        tracing::debug!(%user, ?state, ?event, "handling session event");

        match (*state, event) {
            // Begin is valid from any state: an idempotent reset.
            (_, SessionEvent::Begin) => {
                self.registry.record_user(user).await?;
                self.store.create_area(user).await?;
                *state = CollectingPhotos;
                Ok(SessionReply::Started)
            }

            (CollectingPhotos, SessionEvent::PhotoReceived { key, media }) => {
                let bytes = media.fetch_bytes().await?;
                self.store.put_photo(user, key, &bytes).await?;
                Ok(SessionReply::PhotoSaved { key })
            }

            (CollectingPhotos, SessionEvent::RequestConversion) => {
                if self.store.is_empty(user).await? {
                    Ok(SessionReply::StagingEmpty)
                } else {
                    *state = AwaitingName;
                    Ok(SessionReply::AwaitingName)
                }
            }

            (CollectingPhotos, SessionEvent::RemoveLast) => {
                match self.store.remove_last_photo(user).await? {
                    Some(key) => Ok(SessionReply::RemovedLast { key }),
                    None => Ok(SessionReply::NothingToRemove),
                }
            }

            (CollectingPhotos, SessionEvent::RemoveByKey(key)) => {
                if self.store.remove_photo(user, key).await? {
                    Ok(SessionReply::Removed { key })
                } else {
                    Ok(SessionReply::NotFound { key })
                }
            }

            (AwaitingName, SessionEvent::GoBack) => {
                *state = CollectingPhotos;
                Ok(SessionReply::Resumed)
            }

            (CollectingPhotos | AwaitingName, SessionEvent::Cancel) => {
                self.store.delete_area(user).await?;
                *state = Idle;
                Ok(SessionReply::Cancelled)
            }

            (AwaitingName, SessionEvent::NameChosen(name)) => {
                self.finish(user, state, name.trim()).await
            }

            (_, event) => {
                tracing::debug!(%user, ?state, ?event, "event ignored in current state");
                Ok(SessionReply::Ignored)
            }
        }
    }

    /// Assembles, hands back the finished document, and tears the area down.
    ///
    /// A conversion failure keeps both the staged photos and the
    /// `AwaitingName` state, so the user can retry with another name or
    /// cancel explicitly without losing uploads.
    async fn finish(
        &self,
        user: UserId,
        state: &mut SessionState,
        name: &str,
    ) -> FolioResult<SessionReply> {
        if !valid_document_name(name) {
            return Ok(SessionReply::InvalidName);
        }

        match self.store.assemble(user, name).await {
            Ok(_) => {}
            Err(FolioError::Assembly(reason)) => {
                tracing::warn!(%user, name, %reason, "assembly failed, area preserved");
                return Ok(SessionReply::AssemblyFailed { reason });
            }
            Err(e) => return Err(e),
        }

        let mut file = self.store.open_document(user, name).await?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        drop(file);

        self.store.delete_area(user).await?;
        *state = SessionState::Idle;
        Ok(SessionReply::DocumentReady {
            name: name.to_string(),
            data: data.into(),
        })
    }
}

/// A usable document name: non-empty and free of path components.
fn valid_document_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::valid_document_name;

    #[test]
    fn rejects_empty_and_path_like_names() {
        assert!(!valid_document_name(""));
        assert!(!valid_document_name(".."));
        assert!(!valid_document_name("../../etc/passwd"));
        assert!(!valid_document_name("a/b"));
        assert!(!valid_document_name("a\\b"));
    }

    #[test]
    fn accepts_ordinary_titles() {
        assert!(valid_document_name("trip"));
        assert!(valid_document_name("summer 2021"));
        assert!(valid_document_name("отчёт"));
    }
}
