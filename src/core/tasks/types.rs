#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Update,
    Create,
}

impl ImportPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ImportPhase::Update => "update",
            ImportPhase::Create => "create",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    pub phase: ImportPhase,
    pub current: usize, // 1-based position within the phase
    pub total: usize,
    pub spelling: String, // Empty for a deck note with no exported vocabulary
}

impl ImportProgress {
    pub fn message(&self) -> String {
        let message =
            format!("({}/{}) {} {}", self.current, self.total, self.phase.label(), self.spelling);
        // Notes with no matching vocabulary report an empty spelling
        message.trim_end().to_string()
    }
}

pub type ProgressCallback<'a> = Box<dyn FnMut(&ImportProgress) + 'a>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub parsed: usize,
    pub updated: usize,
    pub created: usize,
    pub reviews_applied: usize,
    pub reviews_skipped: usize, // Rejected by the scheduler or carrying an unknown grade
    pub cancelled: bool,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        let mut message = format!(
            "parsed {} vocabulary words, updated {} cards, created {} notes, applied {} reviews",
            self.parsed, self.updated, self.created, self.reviews_applied
        );
        if self.reviews_skipped > 0 {
            message.push_str(&format!(", skipped {} reviews", self.reviews_skipped));
        }
        if self.cancelled {
            message.push_str(" (cancelled)");
        }
        message
    }
}
