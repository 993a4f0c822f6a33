use crate::{
    config::Config,
    services::{EvaluationService, SessionService},
    websocket::ConnectionRegistry,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub sessions: Arc<SessionService>,
    pub evaluations: Arc<EvaluationService>,
    pub config: Arc<Config>,
}
