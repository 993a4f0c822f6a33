use crate::error::{AppError, AppResult};
use crate::models::{Evaluation, NewEvaluation, Session};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistence seam for sessions. The service only ever needs these four
/// operations; a database-backed implementation slots in behind this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> AppResult<()>;
    async fn find_by_id(&self, session_id: &str) -> AppResult<Option<Session>>;
    async fn find_by_link_code(&self, link_code: &str) -> AppResult<Option<Session>>;
    async fn persist_status_change(&self, session: &Session) -> AppResult<()>;
}

/// Persistence seam for evaluation batches. `bulk_insert` is all-or-nothing:
/// it is only called with a fully validated batch and persists either every
/// row or none.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn bulk_insert(&self, rows: Vec<NewEvaluation>) -> AppResult<Vec<Evaluation>>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(AppError::Internal);
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn find_by_id(&self, session_id: &str) -> AppResult<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn find_by_link_code(&self, link_code: &str) -> AppResult<Option<Session>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| s.link_code == link_code)
            .cloned())
    }

    async fn persist_status_change(&self, session: &Session) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("session not found".into())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryEvaluationStore {
    state: RwLock<EvaluationRows>,
}

#[derive(Default)]
struct EvaluationRows {
    rows: Vec<Evaluation>,
    next_id: i64,
}

impl InMemoryEvaluationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/inspection helper; not part of the store contract.
    pub async fn count_for_session(&self, session_id: &str) -> usize {
        self.state
            .read()
            .await
            .rows
            .iter()
            .filter(|r| r.session_id == session_id)
            .count()
    }
}

#[async_trait]
impl EvaluationStore for InMemoryEvaluationStore {
    async fn bulk_insert(&self, rows: Vec<NewEvaluation>) -> AppResult<Vec<Evaluation>> {
        let mut state = self.state.write().await;
        let created_at = Utc::now();

        let inserted: Vec<Evaluation> = rows
            .into_iter()
            .map(|row| {
                state.next_id += 1;
                Evaluation {
                    id: state.next_id,
                    session_id: row.session_id,
                    problem_id: row.problem_id,
                    rating: row.rating,
                    comment: row.comment,
                    candidate_code: row.candidate_code,
                    created_at,
                }
            })
            .collect();

        state.rows.extend(inserted.iter().cloned());
        Ok(inserted)
    }
}
