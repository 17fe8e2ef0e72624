pub mod batch_evaluator;
pub mod question_selector;
pub mod report_writer;
pub mod survey_estimator;

pub use batch_evaluator::{evaluate_batch, Verdict};
pub use question_selector::{select_questions, shuffled_options};
pub use report_writer::{AssessmentReport, ReportWriter};
pub use survey_estimator::{estimate_start, DirectionProbe, StudyHistory, SurveyEstimator, SurveyIntake};
