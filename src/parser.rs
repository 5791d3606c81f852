use std::{
    fs,
    path::Path,
};

use serde::Deserialize;

use crate::core::{
    merge::merge_directions,
    ImportError,
    ReviewEvent,
    ReviewRecord,
    VocabularyEntry,
};

// Forward is the jp_en list, reverse the en_jp list
#[derive(Debug, Deserialize)]
struct RawExport {
    #[serde(rename = "cards_vocabulary_jp_en")]
    forward: Vec<RawVocabulary>,
    #[serde(rename = "cards_vocabulary_en_jp")]
    reverse: Vec<RawVocabulary>,
}

#[derive(Debug, Deserialize)]
struct RawVocabulary {
    vid: u64,
    spelling: String,
    reading: String,
    reviews: Vec<RawReview>,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    grade: String,
    timestamp: i64,
}

impl From<RawVocabulary> for ReviewRecord {
    fn from(raw: RawVocabulary) -> Self {
        let mut reviews: Vec<ReviewEvent> =
            raw.reviews.into_iter().map(|r| ReviewEvent::new(r.grade, r.timestamp)).collect();
        // Stable: same-second reviews keep their export order
        reviews.sort_by_key(|r| r.timestamp);

        ReviewRecord { vid: raw.vid, spelling: raw.spelling, reading: raw.reading, reviews }
    }
}

/// Both directional lists of an export, each record's reviews sorted by time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewExport {
    pub forward: Vec<ReviewRecord>,
    pub reverse: Vec<ReviewRecord>,
}

impl ReviewExport {
    pub fn into_vocabulary(self) -> Vec<VocabularyEntry> {
        merge_directions(self.forward, self.reverse)
    }
}

/// Parse export JSON. `source` names the input in error messages.
pub fn parse_export(content: &str, source: &str) -> Result<ReviewExport, ImportError> {
    let raw: RawExport =
        serde_json::from_str(content).map_err(|e| ImportError::parse(source, e))?;

    Ok(ReviewExport {
        forward: raw.forward.into_iter().map(ReviewRecord::from).collect(),
        reverse: raw.reverse.into_iter().map(ReviewRecord::from).collect(),
    })
}

pub fn read_export(path: &Path) -> Result<ReviewExport, ImportError> {
    let source = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| ImportError::parse(&source, e))?;
    parse_export(&content, &source)
}

pub fn load_vocabulary(path: &Path) -> Result<Vec<VocabularyEntry>, ImportError> {
    Ok(read_export(path)?.into_vocabulary())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cards_vocabulary_jp_en": [
            {"vid": 1, "spelling": "猫", "reading": "ねこ", "reviews": [
                {"grade": "okay", "timestamp": 100},
                {"grade": "hard", "timestamp": 50},
                {"grade": "easy", "timestamp": 200}
            ]},
            {"vid": 2, "spelling": "犬", "reading": "いぬ", "reviews": []}
        ],
        "cards_vocabulary_en_jp": [
            {"vid": 1, "spelling": "猫", "reading": "ねこ", "reviews": [
                {"grade": "fail", "timestamp": 300},
                {"grade": "okay", "timestamp": 120}
            ]},
            {"vid": 3, "spelling": "鳥", "reading": "とり", "reviews": [
                {"grade": "known", "timestamp": 10}
            ]}
        ]
    }"#;

    fn timestamps(reviews: &[ReviewEvent]) -> Vec<i64> {
        reviews.iter().map(|r| r.timestamp).collect()
    }

    #[test]
    fn test_parse_sorts_each_direction() {
        let export = parse_export(SAMPLE, "sample.json").unwrap();
        assert_eq!(export.forward.len(), 2);
        assert_eq!(export.reverse.len(), 2);
        assert_eq!(timestamps(&export.forward[0].reviews), vec![50, 100, 200]);
        assert_eq!(export.forward[0].reviews[0].grade, "hard");
        assert_eq!(timestamps(&export.reverse[0].reviews), vec![120, 300]);
    }

    #[test]
    fn test_parse_and_merge() {
        let vocab = parse_export(SAMPLE, "sample.json").unwrap().into_vocabulary();

        assert_eq!(vocab.len(), 3);
        let cat = &vocab[0];
        assert_eq!((cat.vid, cat.spelling.as_str(), cat.reading.as_str()), (1, "猫", "ねこ"));
        assert_eq!(cat.forward_reviews.len(), 3);
        assert_eq!(cat.reverse_reviews.len(), 2);

        let bird = &vocab[2];
        assert_eq!(bird.spelling, "鳥");
        assert!(bird.forward_reviews.is_empty());
        assert_eq!(timestamps(&bird.reverse_reviews), vec![10]);
    }

    #[test]
    fn test_same_second_reviews_keep_export_order() {
        let content = r#"{
            "cards_vocabulary_jp_en": [{"vid": 1, "spelling": "猫", "reading": "ねこ", "reviews": [
                {"grade": "fail", "timestamp": 100},
                {"grade": "okay", "timestamp": 100},
                {"grade": "hard", "timestamp": 90}
            ]}],
            "cards_vocabulary_en_jp": []
        }"#;
        let export = parse_export(content, "ties.json").unwrap();
        let grades: Vec<&str> =
            export.forward[0].reviews.iter().map(|r| r.grade.as_str()).collect();
        assert_eq!(grades, vec!["hard", "fail", "okay"]);
    }

    #[test]
    fn test_unknown_grade_label_parses() {
        // Labels are validated at replay time, not here
        let content = r#"{
            "cards_vocabulary_jp_en": [{"vid": 1, "spelling": "猫", "reading": "ねこ",
                "reviews": [{"grade": "blacklisted", "timestamp": 1}]}],
            "cards_vocabulary_en_jp": []
        }"#;
        assert!(parse_export(content, "labels.json").is_ok());
    }

    #[test]
    fn test_malformed_exports_are_rejected() {
        let cases = [
            "[]",
            "not json",
            r#"{"cards_vocabulary_jp_en": []}"#,
            r#"{"cards_vocabulary_jp_en": {}, "cards_vocabulary_en_jp": []}"#,
            r#"{"cards_vocabulary_jp_en": [{"spelling": "猫", "reading": "ねこ", "reviews": []}],
                "cards_vocabulary_en_jp": []}"#,
            r#"{"cards_vocabulary_jp_en": [{"vid": 1, "reading": "ねこ", "reviews": []}],
                "cards_vocabulary_en_jp": []}"#,
            r#"{"cards_vocabulary_jp_en": [{"vid": 1, "spelling": "猫", "reviews": []}],
                "cards_vocabulary_en_jp": []}"#,
            r#"{"cards_vocabulary_jp_en": [{"vid": 1, "spelling": "猫", "reading": "ねこ",
                "reviews": [{"timestamp": 1}]}], "cards_vocabulary_en_jp": []}"#,
            r#"{"cards_vocabulary_jp_en": [{"vid": 1, "spelling": "猫", "reading": "ねこ",
                "reviews": [{"grade": "okay", "timestamp": "yesterday"}]}],
                "cards_vocabulary_en_jp": []}"#,
            r#"{"cards_vocabulary_jp_en": [{"vid": "one", "spelling": "猫", "reading": "ねこ",
                "reviews": []}], "cards_vocabulary_en_jp": []}"#,
        ];

        for content in cases {
            match parse_export(content, "broken.json") {
                Err(ImportError::Parse { file, .. }) => assert_eq!(file, "broken.json"),
                other => panic!("Expected Parse error for {}, got {:?}", content, other),
            }
        }
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let path = std::env::temp_dir().join("jpdb-backfill-missing-export.json");
        match read_export(&path) {
            Err(ImportError::Parse { file, .. }) => assert_eq!(file, path.display().to_string()),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_vocabulary_from_file() {
        let path = std::env::temp_dir()
            .join(format!("jpdb-backfill-export-{}.json", std::process::id()));
        fs::write(&path, SAMPLE).unwrap();

        let vocab = load_vocabulary(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(vocab.unwrap().len(), 3);
    }
}
