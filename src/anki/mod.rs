use crate::core::ImportError;

pub mod api;
#[cfg(test)]
pub(crate) mod fakes;
pub mod types;

pub use api::AnkiConnect;
pub use types::{
    CardAnswer,
    CardId,
    CardRef,
    NewNote,
    NextStates,
    NoteId,
    SchedulingState,
};

/// The flashcard collection the import writes into.
pub trait CollectionStore {
    fn field_names(&self, note_type: &str) -> Result<Vec<String>, ImportError>;

    fn template_names(&self, note_type: &str) -> Result<Vec<String>, ImportError>;

    fn find_cards(&self, query: &str) -> Result<Vec<CardId>, ImportError>;

    fn card(&self, card_id: CardId) -> Result<CardRef, ImportError>;

    /// Batch variant of [`CollectionStore::card`]; adapters with a bulk endpoint override it.
    fn cards(&self, card_ids: &[CardId]) -> Result<Vec<CardRef>, ImportError> {
        card_ids.iter().map(|&id| self.card(id)).collect()
    }

    fn note_field(&self, note_id: NoteId, field: &str) -> Result<Option<String>, ImportError>;

    fn note_cards(&self, note_id: NoteId) -> Result<Vec<CardRef>, ImportError>;

    fn create_note(&self, note: &NewNote) -> Result<NoteId, ImportError>;

    /// Time of the most recent review recorded for the card, in epoch milliseconds.
    fn latest_review_millis(&self, card_id: CardId) -> Result<Option<i64>, ImportError>;

    fn commit(&self) -> Result<(), ImportError>;
}

/// The stateful spaced-repetition scheduler that owns card state transitions.
pub trait Scheduler {
    fn next_states(&self, card_id: CardId) -> Result<NextStates, ImportError>;

    fn answer(&self, answer: &CardAnswer) -> Result<(), ImportError>;
}
