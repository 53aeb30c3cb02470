use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::index;

use quiz_core::model::{Catalog, QuestionRecord, QuizSettings, SessionState};

use crate::error::SessionError;

/// Draws up to `count` distinct questions uniformly at random.
///
/// The draw order is the serving order. When the catalog holds fewer than `count`
/// questions, every question is returned exactly once.
pub fn sample_questions<R: Rng + ?Sized>(
    catalog: &Catalog,
    count: usize,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    let amount = count.min(catalog.len());
    index::sample(rng, catalog.len(), amount)
        .into_iter()
        .filter_map(|i| catalog.get(i).cloned())
        .collect()
}

/// Build a fresh session over a random sample of the catalog.
///
/// # Errors
///
/// Returns `SessionError::Unavailable` if the catalog is empty.
pub fn start_session<R: Rng + ?Sized>(
    catalog: &Catalog,
    settings: &QuizSettings,
    started_at: DateTime<Utc>,
    rng: &mut R,
) -> Result<SessionState, SessionError> {
    if catalog.is_empty() {
        return Err(SessionError::Unavailable);
    }

    let count = usize::try_from(settings.question_count()).unwrap_or(usize::MAX);
    let selected = sample_questions(catalog, count, rng);
    Ok(SessionState::new(selected, started_at))
}
