//! 问卷相关数据结构
//!
//! 自述问卷只产出一次 [`Profile`]，之后只读。

use serde::{Deserialize, Serialize};

use crate::models::level::LEVEL_COUNT;

/// 是 / 否 / 不确定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
    Unsure,
}

impl Answer {
    /// 宽松解析：y/k 为是，n/l 为否，其余一律视为不确定
    ///
    /// k / l 对应希伯来语 כן / לא 的拉丁转写首字母
    pub fn parse(input: &str) -> Self {
        let x = input.trim().to_lowercase();
        match x.chars().next() {
            Some('y') | Some('k') => Answer::Yes,
            Some('n') | Some('l') => Answer::No,
            _ => Answer::Unsure,
        }
    }

    pub fn is_yes(self) -> bool {
        self == Answer::Yes
    }
}

/// 方向探测的移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl From<Answer> for Direction {
    /// 只有 yes 向上，no 与 unsure 都向下
    fn from(answer: Answer) -> Self {
        if answer.is_yes() {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// 方向探测使用的语法/能力话题，难度随等级单调递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "present")]
    Present,
    #[serde(rename = "inf")]
    Infinitive,
    #[serde(rename = "past")]
    Past,
    #[serde(rename = "futBasic")]
    FutureBasic,
    #[serde(rename = "futAdv")]
    FutureAdvanced,
    #[serde(rename = "passive")]
    Passive,
    #[serde(rename = "fluencyDaily")]
    FluencyDaily,
    #[serde(rename = "fluencyComplex")]
    FluencyComplex,
    #[serde(rename = "fluencyNews")]
    FluencyNews,
    #[serde(rename = "academic")]
    Academic,
}

/// 等级 → 话题
const TOPIC_BY_LEVEL: [Topic; LEVEL_COUNT] = [
    Topic::Present,
    Topic::Infinitive,
    Topic::Past,
    Topic::FutureBasic,
    Topic::FutureAdvanced,
    Topic::Passive,
    Topic::FluencyDaily,
    Topic::FluencyComplex,
    Topic::FluencyNews,
    Topic::Academic,
];

impl Topic {
    /// 饱和查表：超出表长的下标一律使用最后一个话题
    pub fn for_level_index(index: usize) -> Self {
        TOPIC_BY_LEVEL[index.min(TOPIC_BY_LEVEL.len() - 1)]
    }

    pub fn key(self) -> &'static str {
        match self {
            Topic::Present => "present",
            Topic::Infinitive => "inf",
            Topic::Past => "past",
            Topic::FutureBasic => "futBasic",
            Topic::FutureAdvanced => "futAdv",
            Topic::Passive => "passive",
            Topic::FluencyDaily => "fluencyDaily",
            Topic::FluencyComplex => "fluencyComplex",
            Topic::FluencyNews => "fluencyNews",
            Topic::Academic => "academic",
        }
    }

    /// 面向学员的问题
    pub fn question(self) -> &'static str {
        match self {
            Topic::Present => "Can you use the PRESENT tense (basic forms)?",
            Topic::Infinitive => "Do you know infinitives and the verb patterns (binyanim)?",
            Topic::Past => "Can you use the PAST tense comfortably?",
            Topic::FutureBasic => "Can you use the FUTURE tense (basic forms)?",
            Topic::FutureAdvanced => "Can you use the FUTURE tense (advanced and irregular forms)?",
            Topic::Passive => "Do you know some PASSIVE verbs?",
            Topic::FluencyDaily => "Are you fluent in everyday conversation?",
            Topic::FluencyComplex => {
                "Can you handle complex tasks (forms, long instructions)?"
            }
            Topic::FluencyNews => "Can you read news or formal texts with relative ease?",
            Topic::Academic => "Can you manage academic or legal content?",
        }
    }

    /// 报告中使用的能力描述
    pub fn ability(self) -> &'static str {
        match self {
            Topic::Present => "use the present tense",
            Topic::Infinitive => "use infinitives",
            Topic::Past => "talk about past events",
            Topic::FutureBasic => "talk about the future",
            Topic::FutureAdvanced => "use advanced future forms",
            Topic::Passive => "use the passive voice",
            Topic::FluencyDaily => "hold everyday conversations fluently",
            Topic::FluencyComplex => "handle complex conversations",
            Topic::FluencyNews => "follow news and media",
            Topic::Academic => "work with academic texts",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// 问卷轨迹中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub topic: Topic,
    pub answer: Answer,
    /// 提问时指针所在的等级下标
    pub level_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// 问卷产出的学员画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub has_ever_studied: bool,
    pub months: u32,
    pub weekly_hours: f64,
    pub total_hours: f64,
    /// 仅由学时推出的先验等级
    pub hour_index: usize,
    pub start_index: usize,
    pub extreme_beginner: bool,
    pub trace: Vec<TraceEntry>,
}

/// 问卷结果
#[derive(Debug, Clone, PartialEq)]
pub enum SurveyOutcome {
    /// 不能识读字母，直接终止
    GateFail { name: String, email: Option<String> },
    Placed(Profile),
}

impl SurveyOutcome {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SurveyOutcome::Placed(p) => Some(p),
            SurveyOutcome::GateFail { .. } => None,
        }
    }

    pub fn is_gate_fail(&self) -> bool {
        matches!(self, SurveyOutcome::GateFail { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_parse() {
        assert_eq!(Answer::parse("Yes"), Answer::Yes);
        assert_eq!(Answer::parse("  y "), Answer::Yes);
        assert_eq!(Answer::parse("ken"), Answer::Yes);
        assert_eq!(Answer::parse("no"), Answer::No);
        assert_eq!(Answer::parse("lo"), Answer::No);
        assert_eq!(Answer::parse("unsure"), Answer::Unsure);
        assert_eq!(Answer::parse(""), Answer::Unsure);
        assert_eq!(Answer::parse("maybe"), Answer::Unsure);
    }

    #[test]
    fn test_unsure_points_down() {
        assert_eq!(Direction::from(Answer::Unsure), Direction::Down);
        assert_eq!(Direction::from(Answer::No), Direction::Down);
        assert_eq!(Direction::from(Answer::Yes), Direction::Up);
    }

    #[test]
    fn test_topic_lookup_saturates() {
        assert_eq!(Topic::for_level_index(0), Topic::Present);
        assert_eq!(Topic::for_level_index(9), Topic::Academic);
        assert_eq!(Topic::for_level_index(42), Topic::Academic);
    }

    #[test]
    fn test_topic_keys_match_serde() {
        for i in 0..LEVEL_COUNT {
            let topic = Topic::for_level_index(i);
            let json = serde_json::to_string(&topic).unwrap();
            assert_eq!(json, format!("\"{}\"", topic.key()));
        }
    }
}
