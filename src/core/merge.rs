use std::collections::HashMap;

use tracing::warn;

use super::{
    ReviewRecord,
    VocabularyEntry,
};

/// Merge the two directional lists into one entry per vocabulary id.
///
/// Forward records seed the map and are authoritative for spelling and reading;
/// a reverse record only contributes its reviews when its id is already known.
/// Output keeps insertion order: forward entries first, then reverse-only ones.
pub fn merge_directions(
    forward: Vec<ReviewRecord>,
    reverse: Vec<ReviewRecord>,
) -> Vec<VocabularyEntry> {
    let mut entries: Vec<VocabularyEntry> = Vec::with_capacity(forward.len());
    let mut by_vid: HashMap<u64, usize> = HashMap::new();

    for record in forward {
        if let Some(&index) = by_vid.get(&record.vid) {
            // Same id twice in one list: keep the first record's text, append reviews
            let entry = &mut entries[index];
            entry.forward_reviews.extend(record.reviews);
            entry.forward_reviews.sort_by_key(|r| r.timestamp);
            continue;
        }
        by_vid.insert(record.vid, entries.len());
        entries.push(VocabularyEntry {
            vid: record.vid,
            spelling: record.spelling,
            reading: record.reading,
            forward_reviews: record.reviews,
            reverse_reviews: Vec::new(),
        });
    }

    for record in reverse {
        match by_vid.get(&record.vid) {
            Some(&index) => {
                let entry = &mut entries[index];
                if entry.spelling != record.spelling || entry.reading != record.reading {
                    warn!(
                        vid = record.vid,
                        forward = %format!("{} [{}]", entry.spelling, entry.reading),
                        reverse = %format!("{} [{}]", record.spelling, record.reading),
                        "Directional records disagree, keeping the forward spelling and reading"
                    );
                }
                entry.reverse_reviews.extend(record.reviews);
                entry.reverse_reviews.sort_by_key(|r| r.timestamp);
            }
            None => {
                by_vid.insert(record.vid, entries.len());
                entries.push(VocabularyEntry {
                    vid: record.vid,
                    spelling: record.spelling,
                    reading: record.reading,
                    forward_reviews: Vec::new(),
                    reverse_reviews: record.reviews,
                });
            }
        }
    }

    entries
}
