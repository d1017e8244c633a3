//! File-system staging area and PDF assembly for the Folio bot.
//!
//! Each user owns a staging area with two slots: pending photos (zero or
//! more, keyed and ordered by [`folio_core::SequenceKey`]) and the finished
//! document (zero or one PDF). The area is created when a session starts
//! collecting and erased when the session ends, whether by completion or
//! cancellation.
//!
//! # Main types
//!
//! - [`StagingStore`] — Durable per-user photo and document storage.
//! - [`DocumentAssembler`] — Ordered images in, one PDF out.
//! - [`ImagePdfAssembler`] — The `printpdf`-backed production assembler.

/// Image-to-PDF conversion.
pub mod assembler;
/// The on-disk staging store.
pub mod store;

pub use assembler::{DocumentAssembler, ImagePdfAssembler};
pub use store::StagingStore;
