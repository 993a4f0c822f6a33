use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rating submitted by the interviewer for one (session, problem) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: i64,
    pub session_id: String,
    pub problem_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub candidate_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Evaluation row before the store assigns an id
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub session_id: String,
    pub problem_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub candidate_code: Option<String>,
}

/// Client-supplied evaluation item, one per problem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationInput {
    pub problem_id: i64,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub candidate_code: Option<String>,
}
