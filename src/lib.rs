//! Replays a jpdb vocabulary review export onto Anki flashcards.
//!
//! The export is parsed into [`VocabularyEntry`] timelines, matched against the
//! configured deck and replayed through a [`Scheduler`] one review at a time, so
//! every card ends up with the scheduling state and history it would have had if
//! the reviews had been done in Anki. Re-running an import only applies reviews
//! newer than each card's latest recorded review.

pub mod anki;
pub mod core;
pub mod import;
pub mod parser;
pub mod persistence;

pub use anki::{
    AnkiConnect,
    CollectionStore,
    Scheduler,
};
pub use crate::core::{
    tasks::{
        CancelToken,
        ImportProgress,
        ImportSummary,
    },
    ImportError,
    VocabularyEntry,
};
pub use import::{
    ImportConfig,
    Importer,
    ValidatedConfig,
};
