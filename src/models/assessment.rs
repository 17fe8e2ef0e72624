//! 测评记录
//!
//! 批次决策、逐题记录和最终结果，全部可序列化，直接写进报告文件

use serde::{Deserialize, Serialize};

use crate::models::level::Level;

/// 未确认任何等级时的哨兵值
pub const NO_LEVEL_CONFIRMED: i32 = -1;

/// 一批边界题的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Promote,
    Demote,
    Undecided,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Verdict::Promote => "promote",
            Verdict::Demote => "demote",
            Verdict::Undecided => "undecided",
        };
        write!(f, "{}", name)
    }
}

/// 一次批次决策的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Promote,
    Demote,
    Undecided,
    /// 该等级没有剩余题目（或没有剩余额度），一题未问
    Exhausted,
}

impl From<Verdict> for DecisionOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Promote => DecisionOutcome::Promote,
            Verdict::Demote => DecisionOutcome::Demote,
            Verdict::Undecided => DecisionOutcome::Undecided,
        }
    }
}

/// 决策日志条目，显示为 `A2.1[+3/-0]→promote`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDecision {
    pub level: Level,
    pub correct: usize,
    pub wrong: usize,
    pub outcome: DecisionOutcome,
}

impl std::fmt::Display for BatchDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = match self.outcome {
            DecisionOutcome::Promote => "promote",
            DecisionOutcome::Demote => "demote",
            DecisionOutcome::Undecided => "undecided",
            DecisionOutcome::Exhausted => "exhausted",
        };
        write!(
            f,
            "{}[+{}/-{}]→{}",
            self.level, self.correct, self.wrong, outcome
        )
    }
}

/// 题目所属阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Warmup,
    Boundary,
    Supportive,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Warmup => "warmup",
            Phase::Boundary => "boundary",
            Phase::Supportive => "supportive",
        };
        write!(f, "{}", name)
    }
}

/// 已作答题目的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: usize,
    pub question_text: String,
    pub level: Level,
    pub correct_option: String,
    /// 跳过时为 None
    pub chosen_option: Option<String>,
    pub is_correct: bool,
    pub phase: Phase,
}

/// 热身题统计（只做诊断，不影响升降级）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupTally {
    pub asked: usize,
    pub correct: usize,
}

/// 测评最终结果，会话结束时生成一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// 已确认通过的最高等级下标，[`NO_LEVEL_CONFIRMED`] 表示没有
    pub finished_index: i32,
    pub recommended_start_index: usize,
    pub total_asked: usize,
    pub decision_log: Vec<BatchDecision>,
    pub question_history: Vec<QuestionRecord>,
    pub warmup: WarmupTally,
}

impl AssessmentResult {
    pub fn finished_level(&self) -> Option<Level> {
        usize::try_from(self.finished_index).ok().map(Level::from_index)
    }

    pub fn recommended_level(&self) -> Level {
        Level::from_index(self.recommended_start_index)
    }

    /// 可读的决策日志
    pub fn decision_strings(&self) -> Vec<String> {
        self.decision_log.iter().map(ToString::to_string).collect()
    }

    /// 答错的题目
    pub fn wrong_answers(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.question_history.iter().filter(|r| !r.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_display() {
        let d = BatchDecision {
            level: Level::A2_1,
            correct: 3,
            wrong: 1,
            outcome: DecisionOutcome::Promote,
        };
        assert_eq!(d.to_string(), "A2.1[+3/-1]→promote");

        let d = BatchDecision {
            level: Level::B1_1,
            correct: 0,
            wrong: 0,
            outcome: DecisionOutcome::Exhausted,
        };
        assert_eq!(d.to_string(), "B1.1[+0/-0]→exhausted");
    }

    #[test]
    fn test_finished_level_sentinel() {
        let mut result = AssessmentResult {
            finished_index: NO_LEVEL_CONFIRMED,
            recommended_start_index: 0,
            total_asked: 0,
            decision_log: Vec::new(),
            question_history: Vec::new(),
            warmup: WarmupTally::default(),
        };
        assert_eq!(result.finished_level(), None);
        assert_eq!(result.recommended_level(), Level::A1_1);

        result.finished_index = 4;
        result.recommended_start_index = 5;
        assert_eq!(result.finished_level(), Some(Level::A2_2));
        assert_eq!(result.recommended_level(), Level::A2_3);
    }
}
