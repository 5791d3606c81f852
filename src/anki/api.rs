use std::{
    cell::RefCell,
    collections::HashMap,
    time::Duration,
};

use reqwest::blocking::Client;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use super::{
    types::{
        CardId,
        CardRef,
        NewNote,
        NoteId,
    },
    CollectionStore,
};
use crate::{
    core::ImportError,
    import::ImportConfig,
};

pub const DEFAULT_URL: &str = "http://localhost:8765";
const API_VERSION: u32 = 6;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Field {
    pub value: String,
    pub order: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: u64,
    pub model_name: String,
    pub fields: HashMap<String, Field>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cards: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: u64,
    pub note: u64,
    pub ord: usize,
    pub model_name: String,
    pub deck_name: String,
}

/// One revlog row; `id` is the review time in epoch milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub ease: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, action: &str) -> Result<T, ImportError> {
        if let Some(error) = self.error {
            return Err(ImportError::AnkiConnect(format!("{action}: {error}")));
        }
        self.result.ok_or_else(|| ImportError::AnkiConnect(format!("{action}: empty result")))
    }
}

pub fn request_body(action: &str, params: Option<serde_json::Value>) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
    body.insert("version".to_string(), serde_json::Value::Number(API_VERSION.into()));

    if let Some(params) = params {
        body.insert("params".to_string(), params);
    }

    serde_json::Value::Object(body)
}

pub fn add_note_params(note: &NewNote) -> serde_json::Value {
    serde_json::json!({
        "note": {
            "deckName": note.deck,
            "modelName": note.note_type,
            "fields": note.fields,
            "tags": note.tags,
            "options": {
                "allowDuplicate": false,
                "duplicateScope": "deck",
            },
        }
    })
}

/// Blocking AnkiConnect client. Every call persists immediately on the Anki side.
pub struct AnkiConnect {
    client: Client,
    url: String,
    templates: RefCell<HashMap<String, Vec<String>>>, // model name -> template names by ord
}

impl AnkiConnect {
    pub fn new(url: impl Into<String>) -> Result<Self, ImportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ImportError::Custom(format!("HTTP client build failed: {e}")))?;

        Ok(Self { client, url: url.into(), templates: RefCell::new(HashMap::new()) })
    }

    pub fn from_config(config: &ImportConfig) -> Result<Self, ImportError> {
        Self::new(config.anki_connect_url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T, ImportError> {
        debug!(action, "AnkiConnect request");
        let response: ApiResponse<T> = self
            .client
            .post(&self.url)
            .json(&request_body(action, params))
            .send()?
            .error_for_status()?
            .json()?;

        response.into_result(action)
    }

    pub fn notes(&self, note_ids: &[NoteId]) -> Result<Vec<Note>, ImportError> {
        self.request("notesInfo", Some(serde_json::json!({ "notes": note_ids })))
    }

    fn cards_info(&self, card_ids: &[CardId]) -> Result<Vec<Card>, ImportError> {
        self.request("cardsInfo", Some(serde_json::json!({ "cards": card_ids })))
    }

    fn template_name(&self, model_name: &str, ord: usize) -> Result<String, ImportError> {
        if !self.templates.borrow().contains_key(model_name) {
            let names = self.template_names(model_name)?;
            self.templates.borrow_mut().insert(model_name.to_string(), names);
        }

        self.templates
            .borrow()
            .get(model_name)
            .and_then(|names| names.get(ord).cloned())
            .ok_or_else(|| {
                ImportError::AnkiConnect(format!("note type {model_name} has no template {ord}"))
            })
    }

    fn card_ref(&self, card: Card) -> Result<CardRef, ImportError> {
        let template = self.template_name(&card.model_name, card.ord)?;
        Ok(CardRef { card_id: card.card_id, note_id: card.note, template })
    }
}

impl CollectionStore for AnkiConnect {
    fn field_names(&self, note_type: &str) -> Result<Vec<String>, ImportError> {
        self.request("modelFieldNames", Some(serde_json::json!({ "modelName": note_type })))
    }

    fn template_names(&self, note_type: &str) -> Result<Vec<String>, ImportError> {
        // Keys arrive in template order; serde_json is built with preserve_order
        let templates: serde_json::Map<String, serde_json::Value> =
            self.request("modelTemplates", Some(serde_json::json!({ "modelName": note_type })))?;
        Ok(templates.into_iter().map(|(name, _)| name).collect())
    }

    fn find_cards(&self, query: &str) -> Result<Vec<CardId>, ImportError> {
        self.request("findCards", Some(serde_json::json!({ "query": query })))
    }

    fn card(&self, card_id: CardId) -> Result<CardRef, ImportError> {
        let card = self
            .cards_info(&[card_id])?
            .into_iter()
            .next()
            .ok_or_else(|| ImportError::AnkiConnect(format!("card {card_id} not found")))?;
        self.card_ref(card)
    }

    fn cards(&self, card_ids: &[CardId]) -> Result<Vec<CardRef>, ImportError> {
        if card_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.cards_info(card_ids)?.into_iter().map(|card| self.card_ref(card)).collect()
    }

    fn note_field(&self, note_id: NoteId, field: &str) -> Result<Option<String>, ImportError> {
        Ok(self
            .notes(&[note_id])?
            .into_iter()
            .next()
            .and_then(|note| note.fields.get(field).map(|f| f.value.clone())))
    }

    fn note_cards(&self, note_id: NoteId) -> Result<Vec<CardRef>, ImportError> {
        let card_ids = self
            .notes(&[note_id])?
            .into_iter()
            .next()
            .map(|note| note.cards)
            .unwrap_or_default();
        self.cards(&card_ids)
    }

    fn create_note(&self, note: &NewNote) -> Result<NoteId, ImportError> {
        self.request("addNote", Some(add_note_params(note)))
    }

    fn latest_review_millis(&self, card_id: CardId) -> Result<Option<i64>, ImportError> {
        let reviews: HashMap<String, Vec<Review>> = self.request(
            "getReviewsOfCards",
            Some(serde_json::json!({ "cards": [card_id.to_string()] })),
        )?;

        Ok(reviews.get(&card_id.to_string()).and_then(|r| r.iter().map(|r| r.id).max()))
    }

    fn commit(&self) -> Result<(), ImportError> {
        Ok(())
    }
}
