//! In-memory collection and scheduler used by the importer tests.

use std::{
    cell::RefCell,
    collections::{
        BTreeMap,
        HashMap,
        HashSet,
    },
};

use super::{
    CardAnswer,
    CardId,
    CardRef,
    CollectionStore,
    NewNote,
    NextStates,
    NoteId,
    Scheduler,
    SchedulingState,
};
use crate::core::{
    ImportError,
    Rating,
};

struct NoteType {
    fields: Vec<String>,
    templates: Vec<String>,
}

struct FakeNote {
    fields: HashMap<String, String>,
    cards: Vec<CardId>,
}

struct FakeCard {
    note_id: NoteId,
    template: String,
    deck: String,
    state: SchedulingState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevlogEntry {
    pub card_id: CardId,
    pub answered_at_millis: i64,
    pub rating: Rating,
}

#[derive(Default)]
struct Inner {
    note_types: HashMap<String, NoteType>,
    notes: BTreeMap<NoteId, FakeNote>,
    cards: BTreeMap<CardId, FakeCard>,
    revlog: Vec<RevlogEntry>,
    rejected_times: HashSet<i64>,
    failing_values: HashSet<String>,
    suppressed_templates: HashSet<String>,
    next_id: u64,
    commits: usize,
}

#[derive(Default)]
pub struct MemoryCollection {
    inner: RefCell<Inner>,
}

// State bytes: review count (u32 LE) followed by the rating that produced it
fn state_after(current: &SchedulingState, rating: Rating) -> SchedulingState {
    let reps = current
        .as_bytes()
        .get(..4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0);
    let mut bytes = (reps + 1).to_le_bytes().to_vec();
    bytes.push(rating as u8);
    SchedulingState::from_bytes(bytes)
}

fn unescape_search_term(term: &str) -> String {
    let term = term.strip_prefix('"').and_then(|t| t.strip_suffix('"')).unwrap_or(term);
    let mut unescaped = String::with_capacity(term.len());
    let mut chars = term.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => unescaped.extend(chars.next()),
            _ => unescaped.push(c),
        }
    }
    unescaped
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note_type(self, name: &str, fields: &[&str], templates: &[&str]) -> Self {
        self.inner.borrow_mut().note_types.insert(
            name.to_string(),
            NoteType {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                templates: templates.iter().map(|t| t.to_string()).collect(),
            },
        );
        self
    }

    /// Make `addNote` fail for any note carrying this field value.
    pub fn fail_creation_of(&self, value: &str) {
        self.inner.borrow_mut().failing_values.insert(value.to_string());
    }

    /// New notes get no card for this template, like a template whose front renders empty.
    pub fn suppress_template(&self, template: &str) {
        self.inner.borrow_mut().suppressed_templates.insert(template.to_string());
    }

    /// Make the scheduler reject the answer stamped with this time.
    pub fn reject_answer_at(&self, answered_at_millis: i64) {
        self.inner.borrow_mut().rejected_times.insert(answered_at_millis);
    }

    pub fn revlog(&self) -> Vec<RevlogEntry> {
        self.inner.borrow().revlog.clone()
    }

    pub fn revlog_for(&self, card_id: CardId) -> Vec<RevlogEntry> {
        self.inner.borrow().revlog.iter().filter(|r| r.card_id == card_id).cloned().collect()
    }

    pub fn note_count(&self) -> usize {
        self.inner.borrow().notes.len()
    }

    pub fn commits(&self) -> usize {
        self.inner.borrow().commits
    }

    /// Card id for the note whose `field` equals `value`, produced by `template`.
    pub fn card_for(&self, field: &str, value: &str, template: &str) -> Option<CardId> {
        let inner = self.inner.borrow();
        inner
            .notes
            .values()
            .filter(|note| note.fields.get(field).map(String::as_str) == Some(value))
            .flat_map(|note| note.cards.iter())
            .copied()
            .find(|id| inner.cards.get(id).map(|c| c.template.as_str()) == Some(template))
    }

    fn next_id(inner: &mut Inner) -> u64 {
        inner.next_id += 1;
        inner.next_id
    }
}

impl CollectionStore for MemoryCollection {
    fn field_names(&self, note_type: &str) -> Result<Vec<String>, ImportError> {
        self.inner
            .borrow()
            .note_types
            .get(note_type)
            .map(|t| t.fields.clone())
            .ok_or_else(|| ImportError::AnkiConnect(format!("model was not found: {note_type}")))
    }

    fn template_names(&self, note_type: &str) -> Result<Vec<String>, ImportError> {
        self.inner
            .borrow()
            .note_types
            .get(note_type)
            .map(|t| t.templates.clone())
            .ok_or_else(|| ImportError::AnkiConnect(format!("model was not found: {note_type}")))
    }

    fn find_cards(&self, query: &str) -> Result<Vec<CardId>, ImportError> {
        let deck = query
            .strip_prefix("deck:")
            .map(unescape_search_term)
            .ok_or_else(|| ImportError::AnkiConnect(format!("unsupported query: {query}")))?;

        Ok(self
            .inner
            .borrow()
            .cards
            .iter()
            .filter(|(_, card)| card.deck == deck)
            .map(|(&id, _)| id)
            .collect())
    }

    fn card(&self, card_id: CardId) -> Result<CardRef, ImportError> {
        self.inner
            .borrow()
            .cards
            .get(&card_id)
            .map(|card| CardRef { card_id, note_id: card.note_id, template: card.template.clone() })
            .ok_or_else(|| ImportError::AnkiConnect(format!("card {card_id} not found")))
    }

    fn note_field(&self, note_id: NoteId, field: &str) -> Result<Option<String>, ImportError> {
        Ok(self.inner.borrow().notes.get(&note_id).and_then(|n| n.fields.get(field).cloned()))
    }

    fn note_cards(&self, note_id: NoteId) -> Result<Vec<CardRef>, ImportError> {
        let card_ids = self
            .inner
            .borrow()
            .notes
            .get(&note_id)
            .map(|n| n.cards.clone())
            .unwrap_or_default();
        self.cards(&card_ids)
    }

    fn create_note(&self, note: &NewNote) -> Result<NoteId, ImportError> {
        let mut inner = self.inner.borrow_mut();

        if note.fields.values().any(|v| inner.failing_values.contains(v)) {
            return Err(ImportError::AnkiConnect("cannot create note".to_string()));
        }
        let templates = inner
            .note_types
            .get(&note.note_type)
            .map(|t| t.templates.clone())
            .ok_or_else(|| ImportError::AnkiConnect("model was not found".to_string()))?;

        let note_id = Self::next_id(&mut inner);
        let mut cards = Vec::new();
        for template in templates {
            if inner.suppressed_templates.contains(&template) {
                continue;
            }
            let card_id = Self::next_id(&mut inner);
            inner.cards.insert(
                card_id,
                FakeCard {
                    note_id,
                    template,
                    deck: note.deck.clone(),
                    state: SchedulingState::default(),
                },
            );
            cards.push(card_id);
        }
        inner.notes.insert(note_id, FakeNote { fields: note.fields.clone(), cards });

        Ok(note_id)
    }

    fn latest_review_millis(&self, card_id: CardId) -> Result<Option<i64>, ImportError> {
        Ok(self
            .inner
            .borrow()
            .revlog
            .iter()
            .filter(|r| r.card_id == card_id)
            .map(|r| r.answered_at_millis)
            .max())
    }

    fn commit(&self) -> Result<(), ImportError> {
        self.inner.borrow_mut().commits += 1;
        Ok(())
    }
}

impl Scheduler for MemoryCollection {
    fn next_states(&self, card_id: CardId) -> Result<NextStates, ImportError> {
        let inner = self.inner.borrow();
        let card = inner
            .cards
            .get(&card_id)
            .ok_or_else(|| ImportError::AnkiConnect(format!("card {card_id} not found")))?;

        Ok(NextStates {
            current: card.state.clone(),
            again: state_after(&card.state, Rating::Again),
            hard: state_after(&card.state, Rating::Hard),
            good: state_after(&card.state, Rating::Good),
            easy: state_after(&card.state, Rating::Easy),
        })
    }

    fn answer(&self, answer: &CardAnswer) -> Result<(), ImportError> {
        let mut inner = self.inner.borrow_mut();
        let rejection = |reason: &str| ImportError::SchedulerRejection {
            card_id: answer.card_id,
            reason: reason.to_string(),
        };

        if inner.rejected_times.contains(&answer.answered_at_millis) {
            return Err(rejection("rejected by test"));
        }
        let card = inner.cards.get_mut(&answer.card_id).ok_or_else(|| rejection("no such card"))?;
        if card.state != answer.current_state {
            return Err(rejection("stale current state"));
        }
        if answer.new_state != state_after(&card.state, answer.rating) {
            return Err(rejection("new state does not match rating"));
        }
        card.state = answer.new_state.clone();

        inner.revlog.push(RevlogEntry {
            card_id: answer.card_id,
            answered_at_millis: answer.answered_at_millis,
            rating: answer.rating,
        });
        Ok(())
    }
}
