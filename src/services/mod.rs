pub mod evaluation_service;
pub mod problem_provider;
pub mod session_service;
pub mod store;

// Re-export key types for convenience
pub use evaluation_service::EvaluationService;
pub use problem_provider::{ProblemProvider, SeededProblemProvider};
pub use session_service::SessionService;
pub use store::{
    EvaluationStore, InMemoryEvaluationStore, InMemorySessionStore, SessionStore,
};
