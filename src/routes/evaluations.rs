use crate::{error::AppError, models::EvaluationInput, state::AppState};
use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubmitEvaluationRequest {
    pub evaluations: Vec<EvaluationInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvaluationResponse {
    pub success: bool,
    pub evaluation_id: String,
}

/// POST /api/sessions/{session_id}/evaluate
/// Persist the interviewer's per-problem ratings; all-or-nothing
#[post("/api/sessions/{session_id}/evaluate")]
pub async fn submit_evaluation(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
    body: web::Json<SubmitEvaluationRequest>,
) -> Result<HttpResponse, AppError> {
    let inserted = state
        .evaluations
        .submit(&session_id, body.into_inner().evaluations)
        .await?;

    let evaluation_id = inserted
        .first()
        .map(|e| format!("eval_{}", e.id))
        .unwrap_or_else(|| "eval_0".to_string());

    Ok(HttpResponse::Created().json(SubmitEvaluationResponse {
        success: true,
        evaluation_id,
    }))
}
