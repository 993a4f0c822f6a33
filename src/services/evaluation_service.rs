use crate::error::{AppError, AppResult};
use crate::models::{Evaluation, EvaluationInput, NewEvaluation, SessionStatus};
use crate::services::store::{EvaluationStore, SessionStore};
use std::collections::HashSet;
use std::sync::Arc;

const MIN_RATING: i32 = 1;
const MAX_RATING: i32 = 5;

/// Creates evaluation batches for ended sessions. The whole batch is
/// validated before anything is persisted, so a single bad item leaves zero
/// rows behind.
pub struct EvaluationService {
    sessions: Arc<dyn SessionStore>,
    store: Arc<dyn EvaluationStore>,
}

impl EvaluationService {
    pub fn new(sessions: Arc<dyn SessionStore>, store: Arc<dyn EvaluationStore>) -> Self {
        Self { sessions, store }
    }

    pub async fn submit(
        &self,
        session_id: &str,
        items: Vec<EvaluationInput>,
    ) -> AppResult<Vec<Evaluation>> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("session not found".into()))?;

        if session.status != SessionStatus::Ended {
            return Err(AppError::InvalidState(format!(
                "session must be ended before evaluation (status: {})",
                session.status
            )));
        }

        let assigned: HashSet<i64> = session.problems.iter().map(|p| p.id).collect();

        for item in &items {
            if !(MIN_RATING..=MAX_RATING).contains(&item.rating) {
                return Err(AppError::Validation(format!(
                    "rating must be between {MIN_RATING} and {MAX_RATING} (got {} for problem {})",
                    item.rating, item.problem_id
                )));
            }
            if !assigned.contains(&item.problem_id) {
                return Err(AppError::Validation(format!(
                    "problem {} is not assigned to session {session_id}",
                    item.problem_id
                )));
            }
        }

        let rows = items
            .into_iter()
            .map(|item| NewEvaluation {
                session_id: session_id.to_string(),
                problem_id: item.problem_id,
                rating: item.rating,
                comment: item.comment,
                candidate_code: item.candidate_code,
            })
            .collect();

        let inserted = self.store.bulk_insert(rows).await?;
        tracing::info!(session_id, rows = inserted.len(), "evaluation batch persisted");

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Language};
    use crate::services::problem_provider::SeededProblemProvider;
    use crate::services::session_service::SessionService;
    use crate::services::store::{InMemoryEvaluationStore, InMemorySessionStore};

    struct Fixture {
        sessions: SessionService,
        evaluations: EvaluationService,
        eval_store: Arc<InMemoryEvaluationStore>,
    }

    fn fixture() -> Fixture {
        let session_store = Arc::new(InMemorySessionStore::new());
        let eval_store = Arc::new(InMemoryEvaluationStore::new());
        Fixture {
            sessions: SessionService::new(
                session_store.clone(),
                Arc::new(SeededProblemProvider::new()),
            ),
            evaluations: EvaluationService::new(session_store, eval_store.clone()),
            eval_store,
        }
    }

    fn item(problem_id: i64, rating: i32) -> EvaluationInput {
        EvaluationInput {
            problem_id,
            rating,
            comment: None,
            candidate_code: None,
        }
    }

    #[tokio::test]
    async fn rejects_unended_session_with_zero_rows() {
        let fx = fixture();
        let (session, _) = fx
            .sessions
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
            .await
            .unwrap();
        let problem_id = session.problems[0].id;

        let err = fx
            .evaluations
            .submit(&session.id, vec![item(problem_id, 4)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidState");
        assert_eq!(fx.eval_store.count_for_session(&session.id).await, 0);
    }

    #[tokio::test]
    async fn rejects_unknown_session() {
        let fx = fixture();
        let err = fx
            .evaluations
            .submit("sess_missing0", vec![item(1, 4)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn rejects_unassigned_problem_with_zero_rows() {
        let fx = fixture();
        let (session, _) = fx
            .sessions
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
            .await
            .unwrap();
        let assigned = session.problems[0].id;
        fx.sessions.end_session(&session.id).await.unwrap();

        // one valid item plus one unassigned: the whole batch must fail
        let err = fx
            .evaluations
            .submit(&session.id, vec![item(assigned, 4), item(9999, 3)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(fx.eval_store.count_for_session(&session.id).await, 0);
    }

    #[tokio::test]
    async fn rejects_out_of_range_rating_with_zero_rows() {
        let fx = fixture();
        let (session, _) = fx
            .sessions
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 1)
            .await
            .unwrap();
        let problem_id = session.problems[0].id;
        fx.sessions.end_session(&session.id).await.unwrap();

        for rating in [0, 6, -1] {
            let err = fx
                .evaluations
                .submit(&session.id, vec![item(problem_id, rating)])
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "ValidationError");
        }
        assert_eq!(fx.eval_store.count_for_session(&session.id).await, 0);
    }

    #[tokio::test]
    async fn persists_valid_batch_after_end() {
        let fx = fixture();
        let (session, _) = fx
            .sessions
            .create_session("Alice Smith", Difficulty::Junior, Language::Python, 2)
            .await
            .unwrap();
        let ids: Vec<i64> = session.problems.iter().map(|p| p.id).collect();
        fx.sessions.end_session(&session.id).await.unwrap();

        let inserted = fx
            .evaluations
            .submit(&session.id, vec![item(ids[0], 4), item(ids[1], 5)])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 2);
        assert!(inserted.iter().all(|e| e.session_id == session.id));
        assert_eq!(fx.eval_store.count_for_session(&session.id).await, 2);
    }
}
