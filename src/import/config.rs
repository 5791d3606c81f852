use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

use super::enrich::EnrichmentField;
use crate::{
    anki::{
        api::DEFAULT_URL,
        CollectionStore,
    },
    core::{
        Direction,
        ImportError,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub deck: String,
    pub note_type: String,
    pub expression_field: String,
    pub reading_field: String,
    pub forward_template: String, // Card template for jp -> en reviews
    pub reverse_template: String, // Card template for en -> jp reviews
    pub import_reverse: bool,
    pub enrichment_fields: BTreeMap<EnrichmentField, String>,
    pub tags: Vec<String>,
    pub anki_connect_url: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            deck: "Default".to_string(),
            note_type: "Basic".to_string(),
            expression_field: "Front".to_string(),
            reading_field: "Back".to_string(),
            forward_template: "JPtoEN".to_string(),
            reverse_template: "ENtoJP".to_string(),
            import_reverse: false,
            enrichment_fields: BTreeMap::new(),
            tags: Vec::new(),
            anki_connect_url: DEFAULT_URL.to_string(),
        }
    }
}

impl ImportConfig {
    /// Check every configured name against the note type in `store`.
    pub fn validate(self, store: &dyn CollectionStore) -> Result<ValidatedConfig, ImportError> {
        if self.deck.trim().is_empty() {
            return Err(ImportError::Config("deck name is empty".to_string()));
        }

        let fields = store.field_names(&self.note_type).map_err(|e| {
            ImportError::Config(format!("cannot read note type {:?}: {}", self.note_type, e))
        })?;
        let require_field = |name: &str, role: &str| {
            if fields.iter().any(|f| f == name) {
                Ok(())
            } else {
                Err(ImportError::Config(format!(
                    "{} field {:?} does not exist on note type {:?} (fields: {})",
                    role,
                    name,
                    self.note_type,
                    fields.join(", ")
                )))
            }
        };

        require_field(&self.expression_field, "expression")?;
        require_field(&self.reading_field, "reading")?;
        if self.expression_field == self.reading_field {
            return Err(ImportError::Config(format!(
                "expression and reading both map to field {:?}",
                self.expression_field
            )));
        }

        for (role, field) in &self.enrichment_fields {
            require_field(field, role.label())?;
            if field == &self.expression_field || field == &self.reading_field {
                return Err(ImportError::Config(format!(
                    "{} enrichment cannot overwrite the {:?} field",
                    role.label(),
                    field
                )));
            }
        }

        let templates = store.template_names(&self.note_type).map_err(|e| {
            ImportError::Config(format!("cannot read templates of {:?}: {}", self.note_type, e))
        })?;
        let require_template = |name: &str, role: &str| {
            if templates.iter().any(|t| t == name) {
                Ok(())
            } else {
                Err(ImportError::Config(format!(
                    "{} card template {:?} does not exist on note type {:?} (templates: {})",
                    role,
                    name,
                    self.note_type,
                    templates.join(", ")
                )))
            }
        };

        require_template(&self.forward_template, "forward")?;
        if self.import_reverse {
            require_template(&self.reverse_template, "reverse")?;
            if self.forward_template == self.reverse_template {
                return Err(ImportError::Config(format!(
                    "forward and reverse cards both use template {:?}",
                    self.forward_template
                )));
            }
        }

        Ok(ValidatedConfig(self))
    }
}

/// An [`ImportConfig`] whose names were checked against the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig(ImportConfig);

impl ValidatedConfig {
    pub fn config(&self) -> &ImportConfig {
        &self.0
    }

    pub fn template(&self, direction: Direction) -> &str {
        match direction {
            Direction::Forward => &self.0.forward_template,
            Direction::Reverse => &self.0.reverse_template,
        }
    }

    /// Which review list a card template replays; reverse only when reverse import is on.
    pub fn direction_of(&self, template: &str) -> Option<Direction> {
        if template == self.0.forward_template {
            Some(Direction::Forward)
        } else if self.0.import_reverse && template == self.0.reverse_template {
            Some(Direction::Reverse)
        } else {
            None
        }
    }

    pub fn directions(&self) -> &'static [Direction] {
        if self.0.import_reverse {
            &[Direction::Forward, Direction::Reverse]
        } else {
            &[Direction::Forward]
        }
    }
}
