use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("could not parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("unknown review grade: {0:?}")]
    UnknownGrade(String),

    #[error("scheduler rejected answer for card {card_id}: {reason}")]
    SchedulerRejection { card_id: u64, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("AnkiConnect error: {0}")]
    AnkiConnect(String),

    #[error("could not create note for {spelling}: {reason}")]
    NoteCreation { spelling: String, reason: String },

    #[error("ImportError: {0}")]
    Custom(String),
}

impl ImportError {
    pub fn parse(file: impl Into<String>, reason: impl ToString) -> Self {
        ImportError::Parse { file: file.into(), reason: reason.to_string() }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(error: std::io::Error) -> Self {
        ImportError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for ImportError {
    fn from(error: reqwest::Error) -> Self {
        ImportError::Reqwest(Box::new(error))
    }
}
