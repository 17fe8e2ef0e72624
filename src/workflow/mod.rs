pub mod assessment_flow;
pub mod session_state;

pub use assessment_flow::{AnswerFeedback, AssessmentSession, QuestionPrompt, SessionPhase, Step};
pub use session_state::{AssessmentLimits, BatchStats, SessionState};
