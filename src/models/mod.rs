pub mod assessment;
pub mod level;
pub mod loaders;
pub mod question;
pub mod survey;

pub use assessment::{
    AssessmentResult, BatchDecision, DecisionOutcome, Phase, QuestionRecord, Verdict, WarmupTally,
    NO_LEVEL_CONFIRMED,
};
pub use level::{clamp_index, clamp_index_f64, Level, LEVELS, LEVEL_COUNT};
pub use loaders::{load_question_bank, parse_question_bank};
pub use question::{Question, QuestionBank, QuestionBankFile, QuestionEntry};
pub use survey::{Answer, Direction, Profile, SurveyOutcome, Topic, TraceEntry};
