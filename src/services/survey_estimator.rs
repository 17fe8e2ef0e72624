//! 问卷估计服务 - 业务能力层
//!
//! 1. 由学习月数 × 每周学时估出先验等级（80 学时 ≈ 1 级）
//! 2. 最多 3 步的方向探测：回答 yes 指针上移，no / unsure 下移，方向一旦翻转立即停止
//! 3. 由最后一次回答推出起始等级，并限制在先验等级 ±3 之内
//!
//! 探测是拉取式的：调用方反复 `next_topic()` → 提问 → `record()`，
//! 同步（[`estimate_start`]）和异步终端流程共用同一套状态。

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::level::clamp_index;
use crate::models::survey::{Answer, Direction, Profile, SurveyOutcome, Topic, TraceEntry};

/// 平均每月周数
pub const WEEKS_PER_MONTH: f64 = 4.3;
/// 每升一级大约需要的学时
pub const HOURS_PER_LEVEL: f64 = 80.0;
/// 方向探测最多步数
pub const MAX_PROBE_STEPS: usize = 3;
/// 探测结果相对先验等级的最大偏移
pub const PRIOR_CLAMP_RADIUS: i64 = 3;

/// 学习经历
#[derive(Debug, Clone, PartialEq)]
pub enum StudyHistory {
    Never,
    Studied { months: u32, weekly_hours: f64 },
}

/// 问卷前半段的原始回答
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyIntake {
    pub name: String,
    pub email: Option<String>,
    /// 能否识读字母（门槛题）
    pub can_decode: bool,
    pub study: StudyHistory,
}

// ========== 输入整理 ==========

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("valid email regex"))
}

fn latin_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z'-]*$").expect("valid word regex"))
}

/// 姓名规范化：拉丁字母单词首字母大写，其他文字原样保留
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            if latin_word_regex().is_match(word) {
                let lower = word.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 邮箱校验（选填，空字符串视为合法）
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    email.is_empty() || email_regex().is_match(email)
}

/// 学习月数：空白或无法解析时默认为 1，负数按 0 处理
pub fn parse_months(raw: &str) -> u32 {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return v.clamp(0, u32::MAX as i64) as u32;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc().clamp(0.0, u32::MAX as f64) as u32,
        _ => 1,
    }
}

/// 每周学时：空白或无法解析时默认为 1，负数按 0 处理
pub fn parse_weekly_hours(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v.max(0.0),
        _ => 1.0,
    }
}

/// 累计学时（不小于 0）
pub fn total_hours(months: u32, weekly_hours: f64) -> f64 {
    (months as f64 * WEEKS_PER_MONTH * weekly_hours).max(0.0)
}

/// 学时对应的先验等级
pub fn hour_index(total_hours: f64) -> usize {
    crate::models::level::clamp_index_f64((total_hours / HOURS_PER_LEVEL).floor())
}

// ========== 方向探测 ==========

/// 方向探测状态
#[derive(Debug, Clone)]
pub struct DirectionProbe {
    hour_index: usize,
    pointer: usize,
    steps: usize,
    last_direction: Option<Direction>,
    asked: HashSet<Topic>,
    trace: Vec<TraceEntry>,
    /// 最后一次提问时的等级和回答
    last_ask: Option<(usize, Answer)>,
    done: bool,
}

impl DirectionProbe {
    pub fn new(hour_index: usize) -> Self {
        let hour_index = clamp_index(hour_index as i64);
        Self {
            hour_index,
            pointer: hour_index,
            steps: 0,
            last_direction: None,
            asked: HashSet::new(),
            trace: Vec::new(),
            last_ask: None,
            done: false,
        }
    }

    /// 下一个要问的话题，探测结束时返回 None
    pub fn next_topic(&self) -> Option<Topic> {
        if self.done {
            None
        } else {
            Some(Topic::for_level_index(self.pointer))
        }
    }

    /// 记录对当前话题的回答
    pub fn record(&mut self, answer: Answer) {
        if self.done {
            debug!("方向探测已结束，忽略多余回答: {:?}", answer);
            return;
        }

        let at = self.pointer;
        let topic = Topic::for_level_index(at);
        self.asked.insert(topic);
        self.trace.push(TraceEntry {
            topic,
            answer,
            level_index: at,
            reason: None,
        });
        self.last_ask = Some((at, answer));

        let direction = Direction::from(answer);
        debug!("探测 {} @ {} -> {:?} ({:?})", topic, at, answer, direction);

        // 方向翻转：已经夹住真实水平，指针不再移动
        if let Some(previous) = self.last_direction {
            if previous != direction {
                self.done = true;
                return;
            }
        }

        self.pointer = match direction {
            Direction::Up => clamp_index(at as i64 + 1),
            Direction::Down => clamp_index(at as i64 - 1),
        };
        self.steps += 1;
        self.last_direction = Some(direction);

        // 话题不重复问；在两端被钳制时下一话题与本题相同，也在这里停止
        if self.steps >= MAX_PROBE_STEPS
            || self.asked.contains(&Topic::for_level_index(self.pointer))
        {
            self.done = true;
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn hour_index(&self) -> usize {
        self.hour_index
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// 由探测结果推出起始等级
    pub fn start_index(&self) -> usize {
        let Some((at, answer)) = self.last_ask else {
            return self.hour_index;
        };

        let proposal = if answer.is_yes() {
            at as i64
        } else {
            clamp_index(at as i64 - 1) as i64
        };

        let prior = self.hour_index as i64;
        let bounded = proposal.clamp(prior - PRIOR_CLAMP_RADIUS, prior + PRIOR_CLAMP_RADIUS);
        clamp_index(bounded)
    }
}

// ========== 问卷估计 ==========

/// 问卷估计器：门槛题 → 学习经历 → 方向探测
#[derive(Debug, Clone)]
pub struct SurveyEstimator {
    intake: SurveyIntake,
    probe: Option<DirectionProbe>,
}

impl SurveyEstimator {
    pub fn new(intake: SurveyIntake) -> Self {
        let probe = match (&intake.study, intake.can_decode) {
            (StudyHistory::Studied { months, weekly_hours }, true) => {
                let hours = total_hours(*months, *weekly_hours);
                Some(DirectionProbe::new(hour_index(hours)))
            }
            _ => None,
        };
        Self { intake, probe }
    }

    /// 先验等级（门槛失败或从未学习时为 None）
    pub fn hour_index(&self) -> Option<usize> {
        self.probe.as_ref().map(DirectionProbe::hour_index)
    }

    pub fn next_topic(&self) -> Option<Topic> {
        self.probe.as_ref().and_then(DirectionProbe::next_topic)
    }

    pub fn record(&mut self, answer: Answer) {
        if let Some(probe) = self.probe.as_mut() {
            probe.record(answer);
        }
    }

    /// 生成最终结果
    pub fn finish(self) -> SurveyOutcome {
        let SurveyIntake {
            name,
            email,
            can_decode,
            study,
        } = self.intake;

        if !can_decode {
            return SurveyOutcome::GateFail { name, email };
        }

        match (study, self.probe) {
            (StudyHistory::Studied { months, weekly_hours }, Some(probe)) => {
                SurveyOutcome::Placed(Profile {
                    name,
                    email,
                    has_ever_studied: true,
                    months,
                    weekly_hours,
                    total_hours: total_hours(months, weekly_hours),
                    hour_index: probe.hour_index(),
                    start_index: probe.start_index(),
                    extreme_beginner: false,
                    trace: probe.trace,
                })
            }
            _ => SurveyOutcome::Placed(Profile {
                name,
                email,
                has_ever_studied: false,
                months: 0,
                weekly_hours: 0.0,
                total_hours: 0.0,
                hour_index: 0,
                start_index: 0,
                extreme_beginner: true,
                trace: vec![TraceEntry {
                    topic: Topic::Present,
                    answer: Answer::No,
                    level_index: 0,
                    reason: Some("no prior study".to_string()),
                }],
            }),
        }
    }
}

/// 同步版本的问卷估计，`ask` 负责回答每个探测话题
pub fn estimate_start<F>(intake: SurveyIntake, mut ask: F) -> SurveyOutcome
where
    F: FnMut(Topic) -> Answer,
{
    let mut estimator = SurveyEstimator::new(intake);
    while let Some(topic) = estimator.next_topic() {
        let answer = ask(topic);
        estimator.record(answer);
    }
    estimator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::level::LEVEL_COUNT;

    fn studied(months: u32, weekly_hours: f64) -> SurveyIntake {
        SurveyIntake {
            name: "Dana".to_string(),
            email: None,
            can_decode: true,
            study: StudyHistory::Studied {
                months,
                weekly_hours,
            },
        }
    }

    /// 按顺序回放的回答，同时记录被问到的话题
    fn scripted(answers: &[Answer]) -> (impl FnMut(Topic) -> Answer + '_, std::rc::Rc<std::cell::RefCell<Vec<Topic>>>) {
        let asked = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = asked.clone();
        let mut it = answers.iter().copied();
        let f = move |t: Topic| {
            log.borrow_mut().push(t);
            it.next().unwrap_or(Answer::Unsure)
        };
        (f, asked)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  jOHN   o'neil "), "John O'neil");
        assert_eq!(normalize_name("דנה cohen"), "דנה Cohen");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email(""));
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("a@b.c"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("no-at-sign.com"));
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(parse_months(""), 1);
        assert_eq!(parse_months("abc"), 1);
        assert_eq!(parse_months("12"), 12);
        assert_eq!(parse_months("3.7"), 3);
        assert_eq!(parse_months("-4"), 0);
        assert_eq!(parse_weekly_hours(""), 1.0);
        assert_eq!(parse_weekly_hours("x"), 1.0);
        assert_eq!(parse_weekly_hours("2.5"), 2.5);
        assert_eq!(parse_weekly_hours("-1"), 0.0);
    }

    #[test]
    fn test_hour_index_matches_formula() {
        for months in [0u32, 1, 5, 12, 30, 100] {
            for weekly in [0.0, 0.5, 2.0, 6.0, 20.0] {
                let hours = total_hours(months, weekly);
                assert!(hours >= 0.0);
                let expected = clamp_index((hours / HOURS_PER_LEVEL).floor() as i64);
                assert_eq!(hour_index(hours), expected);
            }
        }
        // 12 个月 × 4.3 × 4 = 206.4 学时 → 第 2 级
        assert_eq!(hour_index(total_hours(12, 4.0)), 2);
    }

    #[test]
    fn test_gate_fail() {
        let mut intake = studied(10, 3.0);
        intake.can_decode = false;
        let outcome = estimate_start(intake, |_| panic!("不应提问"));
        assert!(outcome.is_gate_fail());
    }

    #[test]
    fn test_never_studied_is_extreme_beginner() {
        let intake = SurveyIntake {
            name: "Noa".to_string(),
            email: Some("noa@example.com".to_string()),
            can_decode: true,
            study: StudyHistory::Never,
        };
        let outcome = estimate_start(intake, |_| panic!("不应提问"));
        let profile = outcome.profile().unwrap();
        assert!(profile.extreme_beginner);
        assert!(!profile.has_ever_studied);
        assert_eq!(profile.start_index, 0);
        assert_eq!(profile.trace.len(), 1);
        assert_eq!(profile.trace[0].reason.as_deref(), Some("no prior study"));
    }

    #[test]
    fn test_direction_stops_on_flip() {
        // 学时先验为 2：yes → 3，no → 翻转停止
        let (ask, asked) = scripted(&[Answer::Yes, Answer::No, Answer::Yes]);
        let outcome = estimate_start(studied(12, 4.0), ask);
        let profile = outcome.profile().unwrap();

        assert_eq!(
            *asked.borrow(),
            vec![Topic::Past, Topic::FutureBasic]
        );
        assert_eq!(profile.trace[1].level_index, 3);
        // 最后一个回答是 no → 3 - 1
        assert_eq!(profile.start_index, 2);
    }

    #[test]
    fn test_direction_three_steps_up() {
        let (ask, asked) = scripted(&[Answer::Yes, Answer::Yes, Answer::Yes, Answer::Yes]);
        let profile = estimate_start(studied(12, 4.0), ask)
            .profile()
            .cloned()
            .unwrap();

        assert_eq!(asked.borrow().len(), MAX_PROBE_STEPS);
        // 最后一次在 4 回答 yes
        assert_eq!(profile.start_index, 4);
    }

    #[test]
    fn test_direction_unsure_counts_as_down() {
        // 先验 2：unsure → 1，no → 0，unsure → 停在三步
        let (ask, asked) = scripted(&[Answer::Unsure, Answer::No, Answer::Unsure]);
        let profile = estimate_start(studied(12, 4.0), ask)
            .profile()
            .cloned()
            .unwrap();

        assert_eq!(
            *asked.borrow(),
            vec![Topic::Past, Topic::Infinitive, Topic::Present]
        );
        assert_eq!(profile.start_index, 0);
    }

    #[test]
    fn test_direction_never_repeats_topic_at_floor() {
        // 先验 0：no → 指针钳在 0，话题重复，立即停止
        let (ask, asked) = scripted(&[Answer::No, Answer::No]);
        let profile = estimate_start(studied(1, 1.0), ask)
            .profile()
            .cloned()
            .unwrap();

        assert_eq!(*asked.borrow(), vec![Topic::Present]);
        assert_eq!(profile.start_index, 0);
    }

    #[test]
    fn test_direction_never_repeats_topic_at_top() {
        // 先验 9：yes → 指针钳在 9，话题重复，立即停止
        let (ask, asked) = scripted(&[Answer::Yes]);
        let profile = estimate_start(studied(100, 20.0), ask)
            .profile()
            .cloned()
            .unwrap();

        assert_eq!(*asked.borrow(), vec![Topic::Academic]);
        assert_eq!(profile.hour_index, LEVEL_COUNT - 1);
        assert_eq!(profile.start_index, LEVEL_COUNT - 1);
    }

    #[test]
    fn test_start_index_within_prior_window() {
        let patterns = [
            [Answer::Yes, Answer::Yes, Answer::Yes],
            [Answer::No, Answer::No, Answer::No],
            [Answer::Yes, Answer::No, Answer::Yes],
            [Answer::Unsure, Answer::Yes, Answer::No],
        ];
        for months in [1u32, 6, 12, 24, 60] {
            for weekly in [1.0, 3.0, 8.0] {
                for pattern in &patterns {
                    let (ask, asked) = scripted(pattern);
                    let profile = estimate_start(studied(months, weekly), ask)
                        .profile()
                        .cloned()
                        .unwrap();
                    let prior = profile.hour_index as i64;
                    let start = profile.start_index as i64;

                    assert!(asked.borrow().len() <= MAX_PROBE_STEPS);
                    let unique: HashSet<Topic> = asked.borrow().iter().copied().collect();
                    assert_eq!(unique.len(), asked.borrow().len());
                    assert!(start >= (prior - 3).max(0));
                    assert!(start <= (prior + 3).min(LEVEL_COUNT as i64 - 1));
                }
            }
        }
    }
}
