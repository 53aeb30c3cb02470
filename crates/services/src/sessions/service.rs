use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use quiz_core::model::{
    AnswerOutcome, Catalog, FinalScore, QuizSettings, SessionId, SessionState,
};
use storage::{SessionStore, StorageError};

use super::plan::start_session;
use super::view::{QuestionView, QuizStep, SubmitResult};
use crate::Clock;
use crate::error::SessionError;

type SessionLocks = Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Runs placement sessions against a shared, read-only catalog.
///
/// Session state lives in the injected `SessionStore`; this service only reads the
/// clock, samples questions, and applies transitions. Every transition for one
/// session id runs under that id's lock, so racing posts are applied one at a time
/// and a repeated post for an already answered question is ignored.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    settings: QuizSettings,
    catalog: Arc<Catalog>,
    sessions: Arc<dyn SessionStore>,
    locks: SessionLocks,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        catalog: Arc<Catalog>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            clock,
            settings,
            catalog,
            sessions,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replace the clock; clones share the same store and locks.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// False when the catalog is empty and no session can start.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.catalog.is_empty()
    }

    /// Start a new session and return its id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` for an empty catalog, or a storage error.
    pub async fn start(&self) -> Result<SessionId, SessionError> {
        self.purge_expired().await?;
        let now = self.clock.now();
        let state = start_session(&self.catalog, &self.settings, now, &mut rand::rng())?;
        let id = SessionId::generate();
        self.sessions.save(id, &state).await?;
        info!("session {id} started with {} questions", state.total());
        Ok(id)
    }

    /// Current question, or the final score if the session just ended.
    ///
    /// A finished or expired session is reported once and then cleared.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown or already cleared ids.
    pub async fn current(&self, id: SessionId) -> Result<QuizStep, SessionError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().await;

        let state = self.load(id).await?;
        let now = self.clock.now();
        if state.is_complete(now, self.settings.total_time_budget()) {
            return self.finish_locked(id, &state).await;
        }
        Ok(self.step_for(&state, now))
    }

    /// Answer the question at `question_index`.
    ///
    /// Only an answer for the current question moves the session forward; anything
    /// else comes back as `AnswerOutcome::Stale` with state unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown ids, or a storage error.
    pub async fn submit(
        &self,
        id: SessionId,
        question_index: usize,
        answer: &str,
    ) -> Result<SubmitResult, SessionError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().await;

        let mut state = self.load(id).await?;
        let now = self.clock.now();
        let budget = self.settings.total_time_budget();

        if state.is_complete(now, budget) {
            let outcome = if state.all_answered() {
                AnswerOutcome::Ignored
            } else {
                warn!("session {id} ran out of time before answering question {question_index}");
                AnswerOutcome::Expired
            };
            let next = self.finish_locked(id, &state).await?;
            return Ok(SubmitResult { outcome, next });
        }

        if question_index != state.current_index() {
            warn!(
                "session {id}: ignoring answer for question {question_index}, current is {}",
                state.current_index()
            );
            return Ok(SubmitResult {
                outcome: AnswerOutcome::Stale,
                next: self.step_for(&state, now),
            });
        }

        let outcome = state.submit_answer_within(answer, now, &self.settings);
        debug!("session {id}: question {question_index} -> {outcome:?}");

        let next = if state.is_complete(now, budget) {
            self.finish_locked(id, &state).await?
        } else {
            self.sessions.save(id, &state).await?;
            self.step_for(&state, now)
        };
        Ok(SubmitResult { outcome, next })
    }

    /// End a session early and report its score, e.g. when the shell's overall
    /// countdown reaches zero.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown or already cleared ids.
    pub async fn finish(&self, id: SessionId) -> Result<FinalScore, SessionError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().await;

        let state = self.load(id).await?;
        self.sessions.remove(id).await?;
        self.release(id);
        let score = state.final_score();
        info!("session {id} finished early with score {score}");
        Ok(score)
    }

    /// Drop every session whose total budget has run out, with its lock entry.
    ///
    /// Abandoned sessions are otherwise only cleared when someone touches them again.
    /// Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be listed or updated.
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = self.clock.now();
        let budget = self.settings.total_time_budget();
        let mut purged = 0;

        for id in self.sessions.ids().await? {
            let lock = self.lock_for(id)?;
            let _guard = lock.lock().await;

            match self.sessions.load(id).await? {
                Some(state) if !state.is_expired(now, budget) => continue,
                Some(_) => {
                    self.sessions.remove(id).await?;
                    purged += 1;
                }
                None => {}
            }
            self.release(id);
        }

        if purged > 0 {
            info!("purged {purged} expired sessions");
        }
        Ok(purged)
    }

    async fn load(&self, id: SessionId) -> Result<SessionState, SessionError> {
        match self.sessions.load(id).await? {
            Some(state) => Ok(state),
            None => {
                self.release(id);
                Err(SessionError::NotFound)
            }
        }
    }

    async fn finish_locked(
        &self,
        id: SessionId,
        state: &SessionState,
    ) -> Result<QuizStep, SessionError> {
        self.sessions.remove(id).await?;
        self.release(id);
        let score = state.final_score();
        info!("session {id} finished with score {score}");
        Ok(QuizStep::Finished(score))
    }

    fn step_for(&self, state: &SessionState, now: DateTime<Utc>) -> QuizStep {
        QuestionView::build(state, &self.settings, now)
            .map_or_else(|| QuizStep::Finished(state.final_score()), QuizStep::Question)
    }

    fn lock_for(&self, id: SessionId) -> Result<Arc<AsyncMutex<()>>, SessionError> {
        let mut guard = self
            .locks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Arc::clone(guard.entry(id).or_default()))
    }

    fn release(&self, id: SessionId) {
        if let Ok(mut guard) = self.locks.lock() {
            guard.remove(&id);
        }
    }
}

impl fmt::Debug for QuizService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizService")
            .field("clock", &self.clock)
            .field("settings", &self.settings)
            .field("catalog_len", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuestionKind, QuestionRecord};
    use quiz_core::time::fixed_clock;
    use storage::InMemorySessionStore;

    fn service_with(n: usize) -> (QuizService, InMemorySessionStore) {
        let records = (0..n)
            .map(|i| {
                QuestionRecord::new("A1", QuestionKind::TrueFalse, format!("Q{i}"), vec![], "Vrai")
                    .unwrap()
            })
            .collect();
        let store = InMemorySessionStore::new();
        let svc = QuizService::new(
            fixed_clock(),
            QuizSettings::default(),
            Arc::new(Catalog::new(records)),
            Arc::new(store.clone()),
        );
        (svc, store)
    }

    #[tokio::test]
    async fn stale_index_does_not_double_count() {
        let (svc, _store) = service_with(3);
        let id = svc.start().await.unwrap();

        let first = svc.submit(id, 0, "Vrai").await.unwrap();
        assert_eq!(first.outcome, AnswerOutcome::Correct);

        let replay = svc.submit(id, 0, "Vrai").await.unwrap();
        assert_eq!(replay.outcome, AnswerOutcome::Stale);
        let QuizStep::Question(view) = replay.next else {
            panic!("session should still be running");
        };
        assert_eq!(view.index, 1);
        assert_eq!(view.progress.score, 1);
    }

    #[tokio::test]
    async fn lock_table_is_cleared_with_the_session() {
        let (svc, store) = service_with(1);
        let id = svc.start().await.unwrap();
        let res = svc.submit(id, 0, "Faux").await.unwrap();
        assert_eq!(res.next, QuizStep::Finished(FinalScore { score: 0, total: 1 }));
        assert!(store.is_empty().unwrap());
        assert!(svc.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_sessions_and_their_locks() {
        let (svc, store) = service_with(2);
        let old = svc.start().await.unwrap();
        svc.current(old).await.unwrap();

        let later = svc.clone().with_clock(fixed_clock().advanced_by(Duration::minutes(60)));
        let recent = later.start().await.unwrap();
        assert_eq!(later.purge_expired().await.unwrap(), 0);
        assert_eq!(store.len().unwrap(), 2);

        let much_later = svc.with_clock(fixed_clock().advanced_by(Duration::minutes(100)));
        assert_eq!(much_later.purge_expired().await.unwrap(), 1);
        assert_eq!(store.ids().await.unwrap(), vec![recent]);
        assert!(!much_later.locks.lock().unwrap().contains_key(&old));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (svc, _store) = service_with(1);
        let err = svc.current(SessionId::generate()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
        assert!(svc.locks.lock().unwrap().is_empty());
    }
}
