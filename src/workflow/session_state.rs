//! 测评会话状态
//!
//! 由状态机独占并修改，不在会话之间共享

use std::collections::HashSet;

use crate::models::assessment::{BatchDecision, QuestionRecord, WarmupTally, NO_LEVEL_CONFIRMED};
use crate::models::level::clamp_index;

/// 会话上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentLimits {
    /// 单次会话最多题数
    pub hard_cap: usize,
    /// 报告至少需要的题数，不足时补充辅助题
    pub min_questions: usize,
    /// 每批边界题最多题数
    pub batch_size: usize,
    /// 起始等级达到该值时先做热身题
    pub warmup_threshold: usize,
}

impl Default for AssessmentLimits {
    fn default() -> Self {
        Self {
            hard_cap: 14,
            min_questions: 6,
            batch_size: 5,
            warmup_threshold: 3,
        }
    }
}

/// 单批边界题的计数，只属于一个等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub correct: usize,
    pub wrong: usize,
    pub asked: usize,
}

impl BatchStats {
    pub fn record(&mut self, is_correct: bool) {
        self.asked += 1;
        if is_correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
    }
}

/// 会话可变状态
#[derive(Debug, Clone)]
pub struct SessionState {
    pub current_level_index: usize,
    pub total_asked: usize,
    /// 已确认通过的最高等级，初始为 -1
    pub last_confirmed_pass_index: i32,
    /// 刚刚从哪个等级升上来（仅用于"升级后立刻降级"的判断）
    pub last_promotion_source_index: Option<usize>,
    pub floor_demote_count: usize,
    pub floor_wrong_count: usize,
    pub batch: BatchStats,
    pub warmup: WarmupTally,
    /// 已展示过的题目，只增不减
    pub used: HashSet<usize>,
    pub decision_log: Vec<BatchDecision>,
    pub question_history: Vec<QuestionRecord>,
}

impl SessionState {
    pub fn new(start_index: usize) -> Self {
        Self {
            current_level_index: clamp_index(start_index as i64),
            total_asked: 0,
            last_confirmed_pass_index: NO_LEVEL_CONFIRMED,
            last_promotion_source_index: None,
            floor_demote_count: 0,
            floor_wrong_count: 0,
            batch: BatchStats::default(),
            warmup: WarmupTally::default(),
            used: HashSet::new(),
            decision_log: Vec::new(),
            question_history: Vec::new(),
        }
    }

    /// 剩余额度
    pub fn headroom(&self, limits: &AssessmentLimits) -> usize {
        limits.hard_cap.saturating_sub(self.total_asked)
    }

    /// 记录一个已确认通过的等级（只升不降）
    pub fn confirm_pass(&mut self, index: i32) {
        self.last_confirmed_pass_index = self.last_confirmed_pass_index.max(index);
    }

    /// 推荐起始等级
    pub fn recommended_start_index(&self) -> usize {
        clamp_index(self.last_confirmed_pass_index.max(NO_LEVEL_CONFIRMED) as i64 + 1)
    }

    /// 辅助题所在等级：已确认通过的最高等级，没有时为最低等级
    ///
    /// 不从推荐等级倒推，推荐等级在顶端会被截断
    pub fn supportive_level_index(&self) -> usize {
        clamp_index(self.last_confirmed_pass_index.max(0) as i64)
    }
}
