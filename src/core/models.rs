use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub grade: String,  // Raw label from the export, translated at replay time
    pub timestamp: i64, // Epoch seconds
}

impl ReviewEvent {
    pub fn new(grade: impl Into<String>, timestamp: i64) -> Self {
        Self { grade: grade.into(), timestamp }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.saturating_mul(1000)
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// One vocabulary record as it appears in a single direction's export list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub vid: u64,
    pub spelling: String,
    pub reading: String,
    pub reviews: Vec<ReviewEvent>, // Sorted by timestamp, stable
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub vid: u64,
    pub spelling: String,
    pub reading: String,
    pub forward_reviews: Vec<ReviewEvent>,
    pub reverse_reviews: Vec<ReviewEvent>,
}

impl VocabularyEntry {
    pub fn reviews(&self, direction: Direction) -> &[ReviewEvent] {
        match direction {
            Direction::Forward => &self.forward_reviews,
            Direction::Reverse => &self.reverse_reviews,
        }
    }

    /// Events strictly newer than `watermark_millis`, relying on the list being time-sorted.
    pub fn reviews_after(
        &self,
        direction: Direction,
        watermark_millis: Option<i64>,
    ) -> &[ReviewEvent] {
        let reviews = self.reviews(direction);
        match watermark_millis {
            Some(watermark) => {
                let start = reviews.partition_point(|r| r.timestamp_millis() <= watermark);
                &reviews[start..]
            }
            None => reviews,
        }
    }

    pub fn identity(&self, direction: Direction) -> CardIdentity {
        CardIdentity { spelling: self.spelling.clone(), direction }
    }
}

/// Forward is foreign -> native (the export's jp_en list), reverse is native -> foreign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardIdentity {
    pub spelling: String,
    pub direction: Direction,
}
