use std::sync::OnceLock;

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::ImportError;

/// Optional note fields that an [`Enricher`] can fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentField {
    Reading,
    Glossary,
    Notes,
    Sentence,
}

impl EnrichmentField {
    pub fn label(&self) -> &'static str {
        match self {
            EnrichmentField::Reading => "reading",
            EnrichmentField::Glossary => "glossary",
            EnrichmentField::Notes => "notes",
            EnrichmentField::Sentence => "sentence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnrichedWord {
    pub spelling: String,
    pub reading: Option<String>,
    pub glossary: String, // HTML, see glossary_html
    pub notes: Option<String>,
    pub sentence: Option<String>,
}

impl EnrichedWord {
    pub fn value(&self, field: EnrichmentField) -> Option<&str> {
        match field {
            EnrichmentField::Reading => self.reading.as_deref(),
            EnrichmentField::Glossary => Some(self.glossary.as_str()).filter(|g| !g.is_empty()),
            EnrichmentField::Notes => self.notes.as_deref(),
            EnrichmentField::Sentence => self.sentence.as_deref(),
        }
    }
}

/// Word lookup service used to pre-populate optional fields of new notes.
pub trait Enricher {
    fn lookup(&self, spelling: &str) -> Result<EnrichedWord, ImportError>;
}

/// `<div class="glossary"><p class="pos">noun, verb</p><ol><li>..</li></ol></div>`
pub fn glossary_html(parts_of_speech: &[String], definitions: &[String]) -> String {
    static NUMBERING: OnceLock<Regex> = OnceLock::new();
    let numbering = NUMBERING.get_or_init(|| Regex::new(r"^\d+\. ").unwrap());

    let items: String = definitions
        .iter()
        .map(|d| format!("<li>{}</li>", numbering.replace(d, "")))
        .collect();

    format!(
        r#"<div class="glossary"><p class="pos">{}</p><ol>{}</ol></div>"#,
        parts_of_speech.join(", "),
        items
    )
}
