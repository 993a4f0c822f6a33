use crate::error::{AppError, AppResult};
use crate::models::{Difficulty, Language, Participant, Role, Session, SessionStatus};
use crate::services::problem_provider::ProblemProvider;
use crate::services::store::SessionStore;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SESSION_ID_LEN: usize = 8;
const LINK_CODE_LEN: usize = 10;

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Owns the session lifecycle state machine: waiting -> active -> ended,
/// never backward.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    problems: Arc<dyn ProblemProvider>,
    // Transitions are read-modify-write against the store; serialize them so
    // two concurrent joins cannot both observe `waiting`.
    transition_lock: Mutex<()>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, problems: Arc<dyn ProblemProvider>) -> Self {
        Self {
            store,
            problems,
            transition_lock: Mutex::new(()),
        }
    }

    /// Create a session in `waiting` state with `count` assigned problems.
    ///
    /// Returns the session and its link code; the link code is handed to the
    /// candidate out of band and is the only way to discover the session
    /// without its id.
    pub async fn create_session(
        &self,
        interviewer_name: &str,
        difficulty: Difficulty,
        language: Language,
        count: usize,
    ) -> AppResult<(Session, String)> {
        let problems = self
            .problems
            .select_problems(difficulty, language, count)
            .await?;

        let id = self.unique_session_id().await?;
        let link_code = self.unique_link_code().await?;

        let session = Session {
            id,
            link_code: link_code.clone(),
            difficulty,
            language,
            number_of_problems: count,
            problems,
            interviewer: Participant {
                name: interviewer_name.to_string(),
                role: Role::Interviewer,
            },
            candidate: None,
            status: SessionStatus::Waiting,
            created_at: Utc::now(),
            ended_at: None,
        };

        self.store.create(session.clone()).await?;
        tracing::info!(session_id = %session.id, %difficulty, %language, count, "session created");

        Ok((session, link_code))
    }

    /// Candidate joins: assigns the candidate and moves `waiting` -> `active`.
    /// Rejected with `InvalidState` for any other status, so a session can
    /// never be joined twice.
    pub async fn join_session(&self, session_id: &str, candidate_name: &str) -> AppResult<Session> {
        let _guard = self.transition_lock.lock().await;

        let mut session = self
            .store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("session not found".into()))?;

        if session.status != SessionStatus::Waiting {
            return Err(AppError::InvalidState(format!(
                "session is not available for joining (status: {})",
                session.status
            )));
        }

        session.candidate = Some(Participant {
            name: candidate_name.to_string(),
            role: Role::Candidate,
        });
        session.status = SessionStatus::Active;

        self.store.persist_status_change(&session).await?;
        tracing::info!(session_id, candidate = candidate_name, "candidate joined, session active");

        Ok(session)
    }

    /// Move a session to `ended` and stamp `endedAt`.
    ///
    /// Ending an already-ended session is an idempotent no-op that returns
    /// the stored session with its original `endedAt` intact.
    pub async fn end_session(&self, session_id: &str) -> AppResult<Session> {
        let _guard = self.transition_lock.lock().await;

        let mut session = self
            .store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("session not found".into()))?;

        if session.status == SessionStatus::Ended {
            return Ok(session);
        }

        session.status = SessionStatus::Ended;
        session.ended_at = Some(Utc::now());

        self.store.persist_status_change(&session).await?;
        tracing::info!(session_id, "session ended");

        Ok(session)
    }

    /// Pure lookup; absence is `None`, not an error.
    pub async fn get_by_id(&self, session_id: &str) -> AppResult<Option<Session>> {
        self.store.find_by_id(session_id).await
    }

    /// Pure lookup; absence is `None`, not an error.
    pub async fn get_by_link_code(&self, link_code: &str) -> AppResult<Option<Session>> {
        self.store.find_by_link_code(link_code).await
    }

    async fn unique_session_id(&self) -> AppResult<String> {
        loop {
            let id = format!("sess_{}", random_token(SESSION_ID_LEN));
            if self.store.find_by_id(&id).await?.is_none() {
                return Ok(id);
            }
        }
    }

    async fn unique_link_code(&self) -> AppResult<String> {
        loop {
            let code = random_token(LINK_CODE_LEN);
            if self.store.find_by_link_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::problem_provider::SeededProblemProvider;
    use crate::services::store::InMemorySessionStore;
    use std::collections::HashSet;

    fn service() -> SessionService {
        SessionService::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(SeededProblemProvider::new()),
        )
    }

    #[tokio::test]
    async fn create_starts_waiting_with_assigned_problems() {
        let svc = service();
        let (session, link_code) = svc
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 2)
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Waiting);
        assert_eq!(session.problems.len(), 2);
        assert_eq!(session.number_of_problems, 2);
        assert!(session.candidate.is_none());
        assert!(session.ended_at.is_none());
        assert!(session.id.starts_with("sess_"));
        assert_eq!(link_code.len(), LINK_CODE_LEN);

        let by_link = svc.get_by_link_code(&link_code).await.unwrap().unwrap();
        assert_eq!(by_link.id, session.id);
    }

    #[tokio::test]
    async fn create_fails_when_inventory_is_insufficient() {
        let svc = service();
        let err = svc
            .create_session("Alice Smith", Difficulty::Senior, Language::Python, 5)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[tokio::test]
    async fn link_codes_are_pairwise_distinct() {
        let svc = service();
        let mut codes = HashSet::new();
        for _ in 0..50 {
            let (_, code) = svc
                .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
                .await
                .unwrap();
            assert!(codes.insert(code));
        }
    }

    #[tokio::test]
    async fn join_moves_waiting_to_active() {
        let svc = service();
        let (session, _) = svc
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
            .await
            .unwrap();

        let joined = svc.join_session(&session.id, "Jane Doe").await.unwrap();
        assert_eq!(joined.status, SessionStatus::Active);
        let candidate = joined.candidate.unwrap();
        assert_eq!(candidate.name, "Jane Doe");
        assert_eq!(candidate.role, Role::Candidate);
    }

    #[tokio::test]
    async fn join_rejects_non_waiting_sessions() {
        let svc = service();
        let (session, _) = svc
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
            .await
            .unwrap();

        svc.join_session(&session.id, "Jane Doe").await.unwrap();
        let err = svc.join_session(&session.id, "Late Joiner").await.unwrap_err();
        assert_eq!(err.kind(), "InvalidState");

        svc.end_session(&session.id).await.unwrap();
        let err = svc.join_session(&session.id, "Too Late").await.unwrap_err();
        assert_eq!(err.kind(), "InvalidState");
    }

    #[tokio::test]
    async fn join_unknown_session_is_not_found() {
        let svc = service();
        let err = svc.join_session("sess_missing0", "Jane Doe").await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn end_stamps_ended_at_and_is_idempotent() {
        let svc = service();
        let (session, _) = svc
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
            .await
            .unwrap();

        let ended = svc.end_session(&session.id).await.unwrap();
        assert_eq!(ended.status, SessionStatus::Ended);
        let first_ended_at = ended.ended_at.unwrap();

        let again = svc.end_session(&session.id).await.unwrap();
        assert_eq!(again.status, SessionStatus::Ended);
        assert_eq!(again.ended_at.unwrap(), first_ended_at);
    }

    #[tokio::test]
    async fn end_unknown_session_is_not_found() {
        let svc = service();
        let err = svc.end_session("sess_missing0").await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn lookups_return_none_for_unknown_keys() {
        let svc = service();
        assert!(svc.get_by_id("sess_missing0").await.unwrap().is_none());
        assert!(svc.get_by_link_code("nope").await.unwrap().is_none());
    }
}
