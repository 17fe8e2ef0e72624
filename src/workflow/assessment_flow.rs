//! 测评状态机 - 流程层
//!
//! 核心职责：驱动 热身 → 边界批次 →（新等级重复）→ 辅助题 → 完成
//!
//! ```text
//! WARMUP ──(热身题用完)──▶ BOUNDARY ──promote──▶ BOUNDARY(+1)
//!                              │ ──demote───▶ BOUNDARY(-1)
//!                              │ ──undecided / 题库耗尽 / 到达上限──▶ 收尾
//! 收尾: 题数不足 ──▶ SUPPORTIVE ──▶ COMPLETE
//!       否则 ─────────────────────▶ COMPLETE
//! ```
//!
//! 交互是拉取式的：`next_prompt()` 给出一道题，`answer()` 提交答案，
//! 同一时刻最多只有一道待答题。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::error::AssessmentError;
use crate::models::assessment::{
    AssessmentResult, BatchDecision, DecisionOutcome, Phase, QuestionRecord, Verdict,
    NO_LEVEL_CONFIRMED,
};
use crate::models::level::{clamp_index, Level};
use crate::models::question::{Question, QuestionBank};
use crate::models::survey::{Profile, SurveyOutcome};
use crate::services::batch_evaluator::evaluate_batch;
use crate::services::question_selector::{select_questions, shuffled_options};
use crate::workflow::session_state::{AssessmentLimits, BatchStats, SessionState};

/// 状态机的四个状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Warmup,
    Boundary,
    Supportive,
    Complete,
}

/// 展示给学员的一道题
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPrompt {
    pub question_id: usize,
    pub level: Level,
    pub phase: Phase,
    pub sentence: String,
    /// 本次展示的选项顺序（每次展示都重新打乱）
    pub options: Vec<String>,
    /// 本题是第几题（从 1 开始）
    pub number: usize,
}

/// 作答反馈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_option: String,
}

/// `next_prompt()` 的产出
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Ask(QuestionPrompt),
    Finished(AssessmentResult),
}

/// 单个学员的一次测评会话
pub struct AssessmentSession<'a, R: Rng = StdRng> {
    bank: &'a QuestionBank,
    limits: AssessmentLimits,
    rng: R,
    phase: SessionPhase,
    state: SessionState,
    /// 当前阶段已选好、尚未展示的题目
    queue: VecDeque<(&'a Question, Phase)>,
    pending: Option<(QuestionPrompt, &'a Question)>,
    extreme_beginner: bool,
    extreme_floor: bool,
    result: Option<AssessmentResult>,
}

impl<'a> AssessmentSession<'a, StdRng> {
    /// 使用默认上限和系统熵种子创建会话
    pub fn new(profile: &Profile, bank: &'a QuestionBank) -> Self {
        Self::with_rng(
            profile,
            bank,
            AssessmentLimits::default(),
            StdRng::from_entropy(),
        )
    }
}

impl<'a, R: Rng> AssessmentSession<'a, R> {
    pub fn with_rng(
        profile: &Profile,
        bank: &'a QuestionBank,
        limits: AssessmentLimits,
        rng: R,
    ) -> Self {
        Self::start(
            profile.start_index,
            profile.extreme_beginner,
            bank,
            limits,
            rng,
        )
    }

    /// 由问卷结果创建会话，门槛失败直接进入完成状态
    pub fn for_outcome(
        outcome: &SurveyOutcome,
        bank: &'a QuestionBank,
        limits: AssessmentLimits,
        rng: R,
    ) -> Self {
        match outcome {
            SurveyOutcome::Placed(profile) => Self::with_rng(profile, bank, limits, rng),
            SurveyOutcome::GateFail { .. } => Self::start(0, true, bank, limits, rng),
        }
    }

    fn start(
        start_index: usize,
        canned: bool,
        bank: &'a QuestionBank,
        limits: AssessmentLimits,
        rng: R,
    ) -> Self {
        let mut session = Self {
            bank,
            limits,
            rng,
            phase: SessionPhase::Boundary,
            state: SessionState::new(start_index),
            queue: VecDeque::new(),
            pending: None,
            extreme_beginner: canned,
            extreme_floor: false,
            result: None,
        };

        if canned {
            info!("🌱 零基础学员，跳过测评");
            session.complete();
            return session;
        }

        let start = session.state.current_level_index;
        info!("🚀 测评开始，起始等级 {}", Level::from_index(start));
        if start >= limits.warmup_threshold {
            session.begin_warmup(start);
        } else {
            session.begin_boundary(start);
        }
        session
    }

    // ========== 对外接口 ==========

    /// 取下一道题；已有待答题时重复返回同一道
    pub fn next_prompt(&mut self) -> Step {
        if let Some((prompt, _)) = &self.pending {
            return Step::Ask(prompt.clone());
        }
        if let Some(result) = &self.result {
            return Step::Finished(result.clone());
        }

        match self.queue.pop_front() {
            Some((question, phase)) => Step::Ask(self.present(question, phase)),
            None => {
                // 各个 begin_* 保证非完成状态下队列非空，这里只是兜底
                self.complete();
                match &self.result {
                    Some(result) => Step::Finished(result.clone()),
                    None => Step::Finished(self.build_result()),
                }
            }
        }
    }

    /// 提交答案
    ///
    /// # 参数
    /// - `choice`: 本次展示选项中的下标，`None` 表示跳过（记为答错）
    ///
    /// # 返回
    /// 返回本题对错和正确选项；没有待答题或下标越界时返回错误，会话状态不变
    pub fn answer(&mut self, choice: Option<usize>) -> Result<AnswerFeedback, AssessmentError> {
        let (prompt, question) = self
            .pending
            .take()
            .ok_or(AssessmentError::NoPendingQuestion)?;

        if let Some(index) = choice {
            if index >= prompt.options.len() {
                let max_index = prompt.options.len().saturating_sub(1);
                self.pending = Some((prompt, question));
                return Err(AssessmentError::ChoiceOutOfRange { index, max_index });
            }
        }

        let chosen = choice.map(|i| prompt.options[i].clone());
        let is_correct = chosen.as_deref() == Some(question.correct.as_str());

        self.state.question_history.push(QuestionRecord {
            question_id: question.id,
            question_text: question.sentence.clone(),
            level: question.level,
            correct_option: question.correct.clone(),
            chosen_option: chosen,
            is_correct,
            phase: prompt.phase,
        });
        self.state.total_asked += 1;

        debug!(
            "[{} {}] 第 {} 题 {}",
            prompt.phase,
            question.level,
            self.state.total_asked,
            if is_correct { "✓" } else { "✗" }
        );

        match prompt.phase {
            Phase::Warmup => {
                self.state.warmup.asked += 1;
                if is_correct {
                    self.state.warmup.correct += 1;
                }
                if self.queue.is_empty() {
                    let start = self.state.current_level_index;
                    self.begin_boundary(start);
                }
            }
            Phase::Boundary => {
                self.state.batch.record(is_correct);
                let BatchStats {
                    correct,
                    wrong,
                    asked,
                } = self.state.batch;
                let verdict = evaluate_batch(correct, wrong, asked);

                if verdict != Verdict::Undecided
                    || self.queue.is_empty()
                    || self.state.total_asked >= self.limits.hard_cap
                {
                    self.finish_batch(verdict);
                }
            }
            Phase::Supportive => {
                if self.queue.is_empty() || self.state.total_asked >= self.limits.hard_cap {
                    self.complete();
                }
            }
        }

        Ok(AnswerFeedback {
            is_correct,
            correct_option: question.correct.clone(),
        })
    }

    /// 用同步回调把会话跑完，越界的选项按跳过处理
    pub fn run_to_completion<F>(mut self, mut respond: F) -> AssessmentResult
    where
        F: FnMut(&QuestionPrompt) -> Option<usize>,
    {
        loop {
            match self.next_prompt() {
                Step::Finished(result) => return result,
                Step::Ask(prompt) => {
                    let choice = respond(&prompt);
                    let answered = self.answer(choice).or_else(|err| {
                        debug!("第 {} 题选项无效 ({})，按跳过处理", prompt.number, err);
                        self.answer(None)
                    });
                    // 刚取到题目，待答题一定存在
                    debug_assert!(answered.is_ok(), "跳过待答题失败: {:?}", answered);
                }
            }
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn limits(&self) -> &AssessmentLimits {
        &self.limits
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    // ========== 状态转移 ==========

    fn begin_warmup(&mut self, start: usize) {
        let bank = self.bank;
        let levels = [
            clamp_index(start as i64 - 1),
            clamp_index(start as i64 - 2),
        ];
        let headroom = self.state.headroom(&self.limits);

        let mut planned: VecDeque<(&'a Question, Phase)> = VecDeque::new();
        for level in levels {
            if planned.len() >= headroom {
                break;
            }
            let mut excluded = self.state.used.clone();
            excluded.extend(planned.iter().map(|(q, _)| q.id));

            // 该等级没有题目时直接跳过
            if let Some(q) = select_questions(bank.questions(), level, &excluded, 1, &mut self.rng)
                .into_iter()
                .next()
            {
                planned.push_back((q, Phase::Warmup));
            }
        }

        if planned.is_empty() {
            info!("热身题为空，直接进入边界测试");
            self.begin_boundary(start);
            return;
        }

        info!("🔥 热身阶段: {} 题", planned.len());
        self.phase = SessionPhase::Warmup;
        self.queue = planned;
    }

    fn begin_boundary(&mut self, level_index: usize) {
        let bank = self.bank;
        let level_index = clamp_index(level_index as i64);
        self.state.current_level_index = level_index;
        self.state.batch = BatchStats::default();

        let count = self.limits.batch_size.min(self.state.headroom(&self.limits));
        let batch = if count == 0 {
            Vec::new()
        } else {
            select_questions(
                bank.questions(),
                level_index,
                &self.state.used,
                count,
                &mut self.rng,
            )
        };

        let level = Level::from_index(level_index);
        if batch.is_empty() {
            let decision = BatchDecision {
                level,
                correct: 0,
                wrong: 0,
                outcome: DecisionOutcome::Exhausted,
            };
            info!("📭 {} 没有可用题目: {}", level, decision);
            self.state.decision_log.push(decision);
            self.finalize(false);
            return;
        }

        info!("📦 边界批次 {}: {} 题", level, batch.len());
        self.phase = SessionPhase::Boundary;
        self.queue = batch.into_iter().map(|q| (q, Phase::Boundary)).collect();
    }

    fn finish_batch(&mut self, verdict: Verdict) {
        // 同一批次绝不跨等级，剩余已选题目作废
        self.queue.clear();

        let current = self.state.current_level_index;
        let level = Level::from_index(current);
        let stats = self.state.batch;
        let decision = BatchDecision {
            level,
            correct: stats.correct,
            wrong: stats.wrong,
            outcome: verdict.into(),
        };
        info!("📊 {}", decision);
        self.state.decision_log.push(decision);

        match verdict {
            Verdict::Promote => {
                self.state.confirm_pass(current as i32);
                self.state.last_promotion_source_index = Some(current);

                if level.is_top() || self.state.total_asked >= self.limits.hard_cap {
                    self.finalize(false);
                } else {
                    self.begin_boundary(current + 1);
                }
            }
            Verdict::Demote => {
                if current == 0 {
                    // 每次降级恰好错 2 题，满 5 题只会在外部改过计数时出现
                    self.state.floor_demote_count += 1;
                    self.state.floor_wrong_count += stats.wrong;
                    if self.state.floor_demote_count >= 2 || self.state.floor_wrong_count >= 5 {
                        info!(
                            "🧱 最低等级多次未通过 (降级 {} 次, 错 {} 题)",
                            self.state.floor_demote_count, self.state.floor_wrong_count
                        );
                        self.finalize(true);
                        return;
                    }
                }

                // 刚升上来就被降回：边界已找到
                if self
                    .state
                    .last_promotion_source_index
                    .is_some_and(|source| current == source + 1)
                {
                    info!("🎯 升级后立即降级，边界确定在 {}", Level::from_index(current - 1));
                    self.finalize(false);
                    return;
                }

                self.state.last_promotion_source_index = None;
                self.begin_boundary(current.saturating_sub(1));
            }
            Verdict::Undecided => {
                self.state.confirm_pass(current as i32 - 1);
                self.finalize(false);
            }
        }
    }

    fn finalize(&mut self, extreme_floor: bool) {
        let bank = self.bank;
        self.extreme_floor = extreme_floor;
        self.queue.clear();

        let total = self.state.total_asked;
        if !extreme_floor && !self.extreme_beginner && total < self.limits.min_questions {
            let need = (self.limits.min_questions - total).min(self.state.headroom(&self.limits));
            let level_index = self.state.supportive_level_index();
            let picked = select_questions(
                bank.questions(),
                level_index,
                &self.state.used,
                need,
                &mut self.rng,
            );

            if !picked.is_empty() {
                info!(
                    "➕ 辅助题 {} 道 ({})",
                    picked.len(),
                    Level::from_index(level_index)
                );
                self.phase = SessionPhase::Supportive;
                self.queue = picked.into_iter().map(|q| (q, Phase::Supportive)).collect();
                return;
            }
        }

        self.complete();
    }

    fn complete(&mut self) {
        self.queue.clear();
        self.phase = SessionPhase::Complete;
        let result = self.build_result();
        info!(
            "✅ 测评完成: 已通过 {:?}, 建议从 {} 开始, 共 {} 题",
            result.finished_level(),
            result.recommended_level(),
            result.total_asked
        );
        self.result = Some(result);
    }

    fn build_result(&self) -> AssessmentResult {
        let (finished_index, recommended_start_index) =
            if self.extreme_floor || self.extreme_beginner {
                (NO_LEVEL_CONFIRMED, 0)
            } else {
                (
                    self.state.last_confirmed_pass_index,
                    self.state.recommended_start_index(),
                )
            };

        AssessmentResult {
            finished_index,
            recommended_start_index,
            total_asked: self.state.total_asked,
            decision_log: self.state.decision_log.clone(),
            question_history: self.state.question_history.clone(),
            warmup: self.state.warmup,
        }
    }

    fn present(&mut self, question: &'a Question, phase: Phase) -> QuestionPrompt {
        self.state.used.insert(question.id);

        let prompt = QuestionPrompt {
            question_id: question.id,
            level: question.level,
            phase,
            sentence: question.sentence.clone(),
            options: shuffled_options(question, &mut self.rng),
            number: self.state.total_asked + 1,
        };
        self.pending = Some((prompt.clone(), question));
        prompt
    }
}
