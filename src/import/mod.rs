use std::{
    collections::{
        HashMap,
        HashSet,
    },
    path::Path,
    time::Instant,
};

use chrono::{
    DateTime,
    Utc,
};
use tracing::{
    debug,
    info,
    warn,
};

use crate::{
    anki::{
        CardRef,
        CollectionStore,
        NewNote,
        NoteId,
        Scheduler,
    },
    core::{
        tasks::{
            CancelToken,
            ImportPhase,
            ImportProgress,
            ImportSummary,
            ProgressCallback,
        },
        utils::{
            quote_search_term,
            StripHtml,
        },
        Direction,
        ImportError,
        ReviewEvent,
        VocabularyEntry,
    },
    parser,
};

pub mod config;
pub mod enrich;
pub mod replay;

pub use config::{
    ImportConfig,
    ValidatedConfig,
};
pub use enrich::{
    EnrichedWord,
    Enricher,
    EnrichmentField,
};
pub use replay::{
    ReplayOutcome,
    Replayer,
};

/// Drives one import run against a collection and its scheduler.
///
/// Existing cards in the configured deck are brought up to date first, replaying
/// only reviews newer than the card's latest recorded review. Vocabulary with no
/// matching note is then created and replayed from its first review.
pub struct Importer<'a> {
    config: ValidatedConfig,
    store: &'a dyn CollectionStore,
    scheduler: &'a dyn Scheduler,
    enricher: Option<&'a dyn Enricher>,
    cancel: CancelToken,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a> Importer<'a> {
    pub fn new(
        config: ValidatedConfig,
        store: &'a dyn CollectionStore,
        scheduler: &'a dyn Scheduler,
    ) -> Self {
        Self {
            config,
            store,
            scheduler,
            enricher: None,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_enricher(mut self, enricher: &'a dyn Enricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(&ImportProgress) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Parse the export at `path` and import it. A parse failure imports nothing.
    pub fn run(&mut self, path: &Path) -> Result<ImportSummary, ImportError> {
        let vocabulary = parser::load_vocabulary(path)?;
        info!("Parsed {} vocabulary words from {}", vocabulary.len(), path.display());
        self.import(&vocabulary)
    }

    pub fn import(&mut self, vocabulary: &[VocabularyEntry]) -> Result<ImportSummary, ImportError> {
        let start = Instant::now();
        let mut summary = ImportSummary { parsed: vocabulary.len(), ..ImportSummary::default() };

        let handled = self.update_existing(vocabulary, &mut summary)?;
        if !summary.cancelled {
            self.create_missing(vocabulary, &handled, &mut summary);
        }
        self.store.commit()?;

        info!("Import finished: {} ({:.1}s)", summary.message(), start.elapsed().as_secs_f32());
        Ok(summary)
    }

    /// Replay new reviews onto cards already in the deck. Returns the spellings seen.
    fn update_existing<'v>(
        &mut self,
        vocabulary: &'v [VocabularyEntry],
        summary: &mut ImportSummary,
    ) -> Result<HashSet<&'v str>, ImportError> {
        let mut by_spelling: HashMap<&str, &VocabularyEntry> = HashMap::new();
        for entry in vocabulary {
            by_spelling.entry(entry.spelling.as_str()).or_insert(entry);
        }

        let query = format!("deck:{}", quote_search_term(&self.config.config().deck));
        let card_ids = self.store.find_cards(&query)?;
        let notes = group_by_note(self.store.cards(&card_ids)?);
        debug!("Found {} cards on {} notes in {}", card_ids.len(), notes.len(), query);

        let mut handled = HashSet::new();
        let total = notes.len();
        for (index, (note_id, cards)) in notes.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Import cancelled during update after {} of {} notes", index, total);
                summary.cancelled = true;
                break;
            }

            let entry = self.match_note(note_id, &by_spelling);
            if let Some(entry) = entry {
                handled.insert(entry.spelling.as_str());
                for card in cards {
                    if self.update_card(&card, entry, summary) {
                        summary.updated += 1;
                    }
                }
            }

            let spelling = entry.map_or("", |e| e.spelling.as_str());
            self.report(ImportPhase::Update, index + 1, total, spelling);
        }

        Ok(handled)
    }

    fn match_note<'v>(
        &self,
        note_id: NoteId,
        by_spelling: &HashMap<&str, &'v VocabularyEntry>,
    ) -> Option<&'v VocabularyEntry> {
        let field = &self.config.config().expression_field;
        let expression = match self.store.note_field(note_id, field) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(note_id, "Note has no {} field", field);
                return None;
            }
            Err(e) => {
                warn!(note_id, "Could not read {} field: {}", field, e);
                return None;
            }
        };

        let spelling = expression.strip_html();
        let entry = by_spelling.get(&*spelling).copied();
        if entry.is_none() {
            debug!(note_id, spelling = %spelling, "No exported vocabulary for note");
        }
        entry
    }

    /// Returns whether the card was brought up to date.
    fn update_card(
        &self,
        card: &CardRef,
        entry: &VocabularyEntry,
        summary: &mut ImportSummary,
    ) -> bool {
        let Some(direction) = self.config.direction_of(&card.template) else {
            debug!(card_id = card.card_id, template = %card.template, "Ignoring card template");
            return false;
        };

        let watermark = match self.store.latest_review_millis(card.card_id) {
            Ok(watermark) => watermark,
            Err(e) => {
                warn!(card_id = card.card_id, "Could not read review history: {}", e);
                return false;
            }
        };

        let pending = entry.reviews_after(direction, watermark);
        debug!(
            card_id = card.card_id,
            spelling = %entry.spelling,
            %direction,
            watermark = ?watermark.and_then(DateTime::<Utc>::from_timestamp_millis),
            pending = pending.len(),
            "Updating card"
        );
        self.replay(card, entry, direction, pending, summary);
        true
    }

    fn create_missing(
        &mut self,
        vocabulary: &[VocabularyEntry],
        handled: &HashSet<&str>,
        summary: &mut ImportSummary,
    ) {
        let (pending, duplicates) = missing_entries(vocabulary, handled);
        for entry in duplicates {
            warn!(
                vid = entry.vid,
                spelling = %entry.spelling,
                reading = %entry.reading,
                reviews = entry.forward_reviews.len() + entry.reverse_reviews.len(),
                "Duplicate spelling, reviews not imported"
            );
        }

        let total = pending.len();
        for (index, entry) in pending.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Import cancelled during create after {} of {} notes", index, total);
                summary.cancelled = true;
                break;
            }

            match self.create_note(entry) {
                Ok(note_id) => {
                    summary.created += 1;
                    self.backfill_note(note_id, entry, summary);
                }
                Err(e) => warn!(vid = entry.vid, "{}", e),
            }

            self.report(ImportPhase::Create, index + 1, total, &entry.spelling);
        }
    }

    fn create_note(&self, entry: &VocabularyEntry) -> Result<NoteId, ImportError> {
        let config = self.config.config();
        let mut fields = HashMap::new();
        fields.insert(config.expression_field.clone(), entry.spelling.clone());
        fields.insert(config.reading_field.clone(), entry.reading.clone());

        if let Some(enricher) = self.enricher.filter(|_| !config.enrichment_fields.is_empty()) {
            match enricher.lookup(&entry.spelling) {
                Ok(word) => {
                    for (role, field) in &config.enrichment_fields {
                        if let Some(value) = word.value(*role) {
                            fields.insert(field.clone(), value.to_string());
                        }
                    }
                }
                Err(e) => warn!(spelling = %entry.spelling, "Enrichment lookup failed: {}", e),
            }
        }

        let note = NewNote {
            deck: config.deck.clone(),
            note_type: config.note_type.clone(),
            fields,
            tags: config.tags.clone(),
        };
        self.store.create_note(&note).map_err(|e| ImportError::NoteCreation {
            spelling: entry.spelling.clone(),
            reason: e.to_string(),
        })
    }

    /// Replay the full history onto each card of a freshly created note.
    fn backfill_note(
        &self,
        note_id: NoteId,
        entry: &VocabularyEntry,
        summary: &mut ImportSummary,
    ) {
        let cards = match self.store.note_cards(note_id) {
            Ok(cards) => cards,
            Err(e) => {
                warn!(note_id, spelling = %entry.spelling, "Could not load new cards: {}", e);
                return;
            }
        };

        for &direction in self.config.directions() {
            let reviews = entry.reviews(direction);
            let template = self.config.template(direction);
            match cards.iter().find(|c| c.template == template) {
                Some(card) => self.replay(card, entry, direction, reviews, summary),
                None if direction == Direction::Forward || !reviews.is_empty() => warn!(
                    note_id,
                    spelling = %entry.spelling,
                    "Note has no {} card, {} reviews not imported",
                    template,
                    reviews.len()
                ),
                None => {}
            }
        }
    }

    fn replay(
        &self,
        card: &CardRef,
        entry: &VocabularyEntry,
        direction: Direction,
        reviews: &[ReviewEvent],
        summary: &mut ImportSummary,
    ) {
        if reviews.is_empty() {
            return;
        }
        let identity = entry.identity(direction);
        match Replayer::new(self.scheduler).replay(card.card_id, &identity, reviews) {
            Ok(ReplayOutcome { applied, rejected }) => {
                summary.reviews_applied += applied;
                summary.reviews_skipped += rejected;
            }
            Err(e) => {
                warn!(
                    card_id = card.card_id,
                    spelling = %identity.spelling,
                    %direction,
                    "Reviews not imported: {}",
                    e
                );
                summary.reviews_skipped += reviews.len();
            }
        }
    }

    fn report(&mut self, phase: ImportPhase, current: usize, total: usize, spelling: &str) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&ImportProgress { phase, current, total, spelling: spelling.to_string() });
        }
    }
}

/// Entries without an updated note, split into those to create and later entries
/// whose spelling is already taken by an earlier one.
fn missing_entries<'v>(
    vocabulary: &'v [VocabularyEntry],
    handled: &HashSet<&str>,
) -> (Vec<&'v VocabularyEntry>, Vec<&'v VocabularyEntry>) {
    let mut seen: HashSet<&str> = HashSet::new();
    vocabulary
        .iter()
        .filter(|v| !handled.contains(v.spelling.as_str()))
        .partition(|v| seen.insert(v.spelling.as_str()))
}

/// Group cards by note, keeping the order in which each note first appears.
fn group_by_note(cards: Vec<CardRef>) -> Vec<(NoteId, Vec<CardRef>)> {
    let mut groups: Vec<(NoteId, Vec<CardRef>)> = Vec::new();
    let mut index: HashMap<NoteId, usize> = HashMap::new();

    for card in cards {
        match index.get(&card.note_id) {
            Some(&i) => groups[i].1.push(card),
            None => {
                index.insert(card.note_id, groups.len());
                groups.push((card.note_id, vec![card]));
            }
        }
    }

    groups
}
