/// The conversation state of one user's session.
///
/// `Idle` is both initial and terminal; no session data exists while idle.
/// The only transitions are the ones the handler performs:
/// `Idle → CollectingPhotos` (begin), `CollectingPhotos → AwaitingName`
/// (conversion requested on a non-empty area), `AwaitingName →
/// CollectingPhotos` (back), and `{CollectingPhotos, AwaitingName} → Idle`
/// (cancel or completed assembly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session in flight; no staging area need exist.
    Idle,
    /// Photos are being uploaded, reordered, and removed.
    CollectingPhotos,
    /// The area is frozen; the user is choosing the document name.
    AwaitingName,
}
