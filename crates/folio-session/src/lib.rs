//! Per-user session state machine and event routing for the Folio bot.
//!
//! The conversation with each user is a three-state machine: `Idle` (no
//! session), `CollectingPhotos` (uploads, removals), `AwaitingName` (the
//! user picks the document title). [`SessionHandler`] holds the transition
//! logic; [`SessionRouter`] gives every active user a single-threaded actor
//! so same-user events are handled in strict arrival order while unrelated
//! users proceed independently.
//!
//! # Main types
//!
//! - [`SessionState`] — The three conversation states.
//! - [`SessionHandler`] — Applies one event to one session.
//! - [`SessionRouter`] — Per-user mpsc workers enforcing event ordering.

/// Event application logic.
pub mod handler;
/// Per-user worker routing.
pub mod router;
/// Session state definitions.
pub mod state;

pub use handler::SessionHandler;
pub use router::SessionRouter;
pub use state::SessionState;
