pub mod evaluation;
pub mod problem;
pub mod session;

pub use evaluation::{Evaluation, EvaluationInput, NewEvaluation};
pub use problem::{Difficulty, Language, Problem, TestCase};
pub use session::{Participant, Role, Session, SessionStatus};
