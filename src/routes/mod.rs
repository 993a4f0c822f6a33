// Re-export route modules
pub mod evaluations;
pub mod sessions;
pub mod wsroute;
