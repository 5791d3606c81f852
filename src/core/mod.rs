pub mod errors;
pub mod grade;
pub mod merge;
pub mod models;
pub mod tasks;
pub mod utils;

pub use errors::ImportError;
pub use grade::{ Grade, Rating };
pub use models::{ CardIdentity, Direction, ReviewEvent, ReviewRecord, VocabularyEntry };
