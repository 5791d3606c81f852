use std::borrow::Cow;

use tracing::{
    debug,
    warn,
};

use crate::{
    anki::{
        CardAnswer,
        CardId,
        Scheduler,
    },
    core::{
        grade::translate,
        CardIdentity,
        ImportError,
        Rating,
        ReviewEvent,
    },
};

/// Response time submitted with every replayed answer; the real one is not exported.
pub const NOMINAL_ANSWER_MILLIS: u32 = 1000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub applied: usize,
    pub rejected: usize,
}

pub struct Replayer<'a> {
    scheduler: &'a dyn Scheduler,
}

impl<'a> Replayer<'a> {
    pub fn new(scheduler: &'a dyn Scheduler) -> Self {
        Self { scheduler }
    }

    /// Answer `card_id` once per review, oldest first.
    ///
    /// Every grade is translated before anything is submitted, so an unknown label
    /// leaves the card untouched. After that each answer stands alone: a rejected
    /// submission is logged and the next review is still applied.
    pub fn replay(
        &self,
        card_id: CardId,
        identity: &CardIdentity,
        reviews: &[ReviewEvent],
    ) -> Result<ReplayOutcome, ImportError> {
        let reviews = chronological(reviews);
        let ratings: Vec<Rating> =
            reviews.iter().map(|r| translate(&r.grade)).collect::<Result<_, _>>()?;

        let mut outcome = ReplayOutcome::default();
        for (review, rating) in reviews.iter().zip(ratings) {
            match self.answer(card_id, review, rating) {
                Ok(()) => outcome.applied += 1,
                Err(e) => {
                    warn!(
                        card_id,
                        spelling = %identity.spelling,
                        direction = %identity.direction,
                        reviewed_at = ?review.reviewed_at(),
                        "Skipping review: {}",
                        e
                    );
                    outcome.rejected += 1;
                }
            }
        }

        debug!(
            card_id,
            spelling = %identity.spelling,
            direction = %identity.direction,
            applied = outcome.applied,
            rejected = outcome.rejected,
            "Replayed reviews"
        );
        Ok(outcome)
    }

    fn answer(
        &self,
        card_id: CardId,
        review: &ReviewEvent,
        rating: Rating,
    ) -> Result<(), ImportError> {
        // Projections are only valid for the card's live state, so ask again every time
        let (current_state, new_state) =
            self.scheduler.next_states(card_id)?.into_transition(rating);

        self.scheduler.answer(&CardAnswer {
            card_id,
            current_state,
            new_state,
            rating,
            answered_at_millis: review.timestamp_millis(),
            milliseconds_taken: NOMINAL_ANSWER_MILLIS,
        })
    }
}

fn chronological(reviews: &[ReviewEvent]) -> Cow<'_, [ReviewEvent]> {
    if reviews.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
        return Cow::Borrowed(reviews);
    }
    let mut sorted = reviews.to_vec();
    sorted.sort_by_key(|r| r.timestamp);
    Cow::Owned(sorted)
}
