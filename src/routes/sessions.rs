use crate::{
    error::AppError,
    models::{Difficulty, Language, Session},
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

const MIN_NAME_LEN: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub interviewer_name: String,
    pub difficulty: Difficulty,
    pub language: Language,
    pub number_of_problems: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session: Session,
    pub link_code: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub candidate_name: String,
}

#[derive(Serialize)]
pub struct EndSessionResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct InterviewerInfo {
    pub name: String,
}

/// Limited view returned for link-code lookups, before the candidate has
/// joined. Never exposes the problems.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub difficulty: Difficulty,
    pub language: Language,
    pub number_of_problems: usize,
    pub interviewer: InterviewerInfo,
}

#[derive(Serialize)]
pub struct SessionInfoResponse {
    pub session: SessionInfo,
}

fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().len() < MIN_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// POST /api/sessions
/// Create a new interview session with assigned problems
#[post("/api/sessions")]
pub async fn create_session(
    state: web::Data<AppState>,
    body: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();

    validate_name("interviewerName", &req.interviewer_name)?;
    if req.number_of_problems == 0 {
        return Err(AppError::Validation(
            "numberOfProblems must be at least 1".into(),
        ));
    }

    let (session, link_code) = state
        .sessions
        .create_session(
            req.interviewer_name.trim(),
            req.difficulty,
            req.language,
            req.number_of_problems,
        )
        .await?;

    Ok(HttpResponse::Created().json(CreateSessionResponse { session, link_code }))
}

/// GET /api/sessions/by-link/{link_code}
/// Resolve a candidate join link to limited session info
#[get("/api/sessions/by-link/{link_code}")]
pub async fn get_session_by_link(
    state: web::Data<AppState>,
    link_code: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .sessions
        .get_by_link_code(&link_code)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".into()))?;

    let info = SessionInfo {
        id: session.id,
        difficulty: session.difficulty,
        language: session.language,
        number_of_problems: session.number_of_problems,
        interviewer: InterviewerInfo {
            name: session.interviewer.name,
        },
    };

    Ok(HttpResponse::Ok().json(SessionInfoResponse { session: info }))
}

/// GET /api/sessions/{session_id}
/// Full session details including problems and participants
#[get("/api/sessions/{session_id}")]
pub async fn get_session(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .sessions
        .get_by_id(&session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("session not found".into()))?;

    Ok(HttpResponse::Ok().json(SessionResponse { session }))
}

/// POST /api/sessions/{session_id}/join
/// Candidate joins the session; waiting -> active
#[post("/api/sessions/{session_id}/join")]
pub async fn join_session(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
    body: web::Json<JoinSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    validate_name("candidateName", &req.candidate_name)?;

    let session = state
        .sessions
        .join_session(&session_id, req.candidate_name.trim())
        .await?;

    Ok(HttpResponse::Ok().json(SessionResponse { session }))
}

/// POST /api/sessions/{session_id}/end
/// Mark the session as ended; idempotent
#[post("/api/sessions/{session_id}/end")]
pub async fn end_session(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.sessions.end_session(&session_id).await?;
    Ok(HttpResponse::Ok().json(EndSessionResponse { success: true }))
}
