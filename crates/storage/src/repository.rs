use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{QuestionRecord, SessionId, SessionState, SessionStateError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("stored session is inconsistent: {0}")]
    InvalidState(#[from] SessionStateError),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Persisted shape for a session.
///
/// Mirrors the domain `SessionState` so stores can serialize it without the domain
/// type committing to a wire format. The JSON token form is what a cookie-style
/// transport would carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub started_at: DateTime<Utc>,
    pub question_started_at: DateTime<Utc>,
    pub questions: Vec<QuestionRecord>,
    pub current_index: usize,
    pub score: usize,
}

impl SessionRecord {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            started_at: state.started_at(),
            question_started_at: state.question_started_at(),
            questions: state.selected().to_vec(),
            current_index: state.current_index(),
            score: state.score(),
        }
    }

    /// Convert the record back into a domain `SessionState`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidState` if counters or timestamps disagree.
    pub fn into_state(self) -> Result<SessionState, StorageError> {
        Ok(SessionState::from_persisted(
            self.started_at,
            self.question_started_at,
            self.questions,
            self.current_index,
            self.score,
        )?)
    }

    /// Encode as an opaque JSON token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_token(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a token produced by [`to_token`](Self::to_token).
    ///
    /// Question records are re-validated on the way in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed or tampered tokens.
    pub fn from_token(token: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(token)?)
    }
}

/// Load/save session state by session identity.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stored state cannot be read back.
    async fn load(&self, id: SessionId) -> Result<Option<SessionState>, StorageError>;

    /// Persist or replace a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save(&self, id: SessionId, state: &SessionState) -> Result<(), StorageError>;

    /// Forget a session. Removing an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn remove(&self, id: SessionId) -> Result<(), StorageError>;

    /// Ids of every session currently held, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn ids(&self) -> Result<Vec<SessionId>, StorageError>;
}

/// In-memory session store holding encoded tokens, as a cookie jar would.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    tokens: Arc<Mutex<HashMap<SessionId, String>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of sessions currently held.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .tokens
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }

    /// Returns true when no sessions are held.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: SessionId) -> Result<Option<SessionState>, StorageError> {
        let token = {
            let guard = self
                .tokens
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.get(&id).cloned()
        };
        token
            .map(|t| SessionRecord::from_token(&t)?.into_state())
            .transpose()
    }

    async fn save(&self, id: SessionId, state: &SessionState) -> Result<(), StorageError> {
        let token = SessionRecord::from_state(state).to_token()?;
        let mut guard = self
            .tokens
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, token);
        Ok(())
    }

    async fn remove(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id);
        Ok(())
    }

    async fn ids(&self) -> Result<Vec<SessionId>, StorageError> {
        let guard = self
            .tokens
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionKind;
    use quiz_core::time::fixed_now;

    fn build_state() -> SessionState {
        let q = QuestionRecord::new(
            "Beginner",
            QuestionKind::MultipleChoice,
            "Capitale ?",
            vec!["A) Paris".into(), "B) Lyon".into()],
            "A",
        )
        .unwrap();
        let t = QuestionRecord::new("A1", QuestionKind::TrueFalse, "Oui ?", vec![], "Vrai").unwrap();
        SessionState::new(vec![q, t], fixed_now())
    }

    #[tokio::test]
    async fn round_trips_session_progress() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        let mut state = build_state();
        state.submit_answer("a", fixed_now());
        store.save(id, &state).await.unwrap();

        let loaded = store.load(id).await.unwrap().expect("stored");
        assert_eq!(loaded, state);
        assert_eq!(loaded.score(), 1);
        assert_eq!(loaded.current_index(), 1);
    }

    #[tokio::test]
    async fn unknown_and_removed_sessions_load_as_none() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        assert!(store.load(id).await.unwrap().is_none());

        store.save(id, &build_state()).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.ids().await.unwrap(), vec![id]);
        store.remove(id).await.unwrap();
        assert!(store.load(id).await.unwrap().is_none());
        assert!(store.is_empty().unwrap());
        assert!(store.ids().await.unwrap().is_empty());
        store.remove(id).await.unwrap();
    }

    #[test]
    fn token_rejects_inconsistent_counters() {
        let mut record = SessionRecord::from_state(&build_state());
        record.score = 2;
        let token = record.to_token().unwrap();
        let err = SessionRecord::from_token(&token)
            .unwrap()
            .into_state()
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));
    }

    #[test]
    fn token_rejects_tampered_question() {
        let record = SessionRecord::from_state(&build_state());
        let token = record.to_token().unwrap().replace("\"A\"", "\"D\"");
        let err = SessionRecord::from_token(&token).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
