use actix_web::{web, App, HttpServer};
use interview_sync_service::{
    config, error, logging, routes,
    services::{
        EvaluationService, EvaluationStore, InMemoryEvaluationStore, InMemorySessionStore,
        ProblemProvider, SeededProblemProvider, SessionService, SessionStore,
    },
    state::AppState,
    websocket::ConnectionRegistry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let registry = ConnectionRegistry::new();
    let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let evaluation_store: Arc<dyn EvaluationStore> = Arc::new(InMemoryEvaluationStore::new());
    let problems: Arc<dyn ProblemProvider> = Arc::new(SeededProblemProvider::new());

    let sessions = Arc::new(SessionService::new(session_store.clone(), problems));
    let evaluations = Arc::new(EvaluationService::new(session_store, evaluation_store));

    let state = AppState {
        registry,
        sessions,
        evaluations,
        config: cfg.clone(),
    };

    let bind_addr = cfg.bind_addr();
    tracing::info!(%bind_addr, "starting interview-sync-service");

    let cors_origins = cfg.cors_origins.clone();
    HttpServer::new(move || {
        let mut cors = actix_cors::Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .service(routes::sessions::create_session)
            .service(routes::sessions::get_session_by_link)
            .service(routes::sessions::get_session)
            .service(routes::sessions::join_session)
            .service(routes::sessions::end_session)
            .service(routes::evaluations::submit_evaluation)
            .service(routes::wsroute::ws_handler)
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("run server: {e}")))
}
