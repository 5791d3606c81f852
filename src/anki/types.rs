use std::collections::HashMap;

use crate::core::Rating;

pub type CardId = u64;
pub type NoteId = u64;

/// A card as seen by the importer: which note it belongs to and which template produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRef {
    pub card_id: CardId,
    pub note_id: NoteId,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub deck: String,
    pub note_type: String,
    pub fields: HashMap<String, String>,
    pub tags: Vec<String>,
}

/// Opaque scheduler state. Only the scheduler knows how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulingState(Vec<u8>);

impl SchedulingState {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The card's live state and the projection for each rating, valid only until the next answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextStates {
    pub current: SchedulingState,
    pub again: SchedulingState,
    pub hard: SchedulingState,
    pub good: SchedulingState,
    pub easy: SchedulingState,
}

impl NextStates {
    pub fn for_rating(&self, rating: Rating) -> &SchedulingState {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    pub fn into_transition(self, rating: Rating) -> (SchedulingState, SchedulingState) {
        let new_state = self.for_rating(rating).clone();
        (self.current, new_state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAnswer {
    pub card_id: CardId,
    pub current_state: SchedulingState,
    pub new_state: SchedulingState,
    pub rating: Rating,
    pub answered_at_millis: i64,
    pub milliseconds_taken: u32,
}
