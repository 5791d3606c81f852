use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use super::ImportError;

/// Grade labels used by the review export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    Okay,
    Known,
    Hard,
    Unknown,
    Something,
    Fail,
    Nothing,
    Easy,
}

/// The scheduler's four answer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 8] = [
        Grade::Okay,
        Grade::Known,
        Grade::Hard,
        Grade::Unknown,
        Grade::Something,
        Grade::Fail,
        Grade::Nothing,
        Grade::Easy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Okay => "okay",
            Grade::Known => "known",
            Grade::Hard => "hard",
            Grade::Unknown => "unknown",
            Grade::Something => "something",
            Grade::Fail => "fail",
            Grade::Nothing => "nothing",
            Grade::Easy => "easy",
        }
    }

    pub fn rating(&self) -> Rating {
        match self {
            Grade::Okay | Grade::Known => Rating::Good,
            Grade::Hard => Rating::Hard,
            Grade::Unknown | Grade::Something | Grade::Fail | Grade::Nothing => Rating::Again,
            Grade::Easy => Rating::Easy,
        }
    }
}

impl FromStr for Grade {
    type Err = ImportError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|grade| grade.label() == label)
            .ok_or_else(|| ImportError::UnknownGrade(label.to_string()))
    }
}

/// Map an export grade label onto the scheduler's rating scale. Never defaults.
pub fn translate(label: &str) -> Result<Rating, ImportError> {
    label.parse::<Grade>().map(|grade| grade.rating())
}
