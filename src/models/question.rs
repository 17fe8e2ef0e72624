//! 题目与题库
//!
//! 题库加载后只读，会话只通过题目编号记录哪些题已经用过

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::level::{Level, LEVEL_COUNT};

/// 题库中的一道选择题（加载后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 会话内唯一且稳定的编号（加载顺序）
    pub id: usize,
    pub level: Level,
    pub sentence: String,
    pub options: Vec<String>,
    pub correct: String,
}

/// TOML 中的原始题目条目
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionEntry {
    /// 等级，既可以写代码 `"A1.1"`，也可以写下标 `0`
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Option<Level>,
    pub sentence: String,
    pub options: Vec<String>,
    pub correct: String,
}

/// 题库文件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionBankFile {
    #[serde(default)]
    pub questions: Vec<QuestionEntry>,
}

/// 预加载的题库（外部协作者，核心只读）
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// 直接由题目列表构建（测试和内存题库用）
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// 由原始条目构建，非法条目记录警告后跳过
    pub fn from_entries(entries: Vec<QuestionEntry>) -> Self {
        let mut questions = Vec::with_capacity(entries.len());

        for (position, entry) in entries.into_iter().enumerate() {
            let Some(level) = entry.level else {
                warn!("跳过第 {} 条题目: 无法识别的等级", position + 1);
                continue;
            };
            if entry.options.len() < 2 {
                warn!("跳过第 {} 条题目: 选项少于 2 个", position + 1);
                continue;
            }
            if !entry.options.contains(&entry.correct) {
                warn!(
                    "跳过第 {} 条题目: 正确答案 '{}' 不在选项中",
                    position + 1,
                    entry.correct
                );
                continue;
            }

            questions.push(Question {
                id: questions.len(),
                level,
                sentence: entry.sentence,
                options: entry.options,
                correct: entry.correct,
            });
        }

        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// 各等级题目数量，下标即等级序号
    pub fn counts_by_level(&self) -> [usize; LEVEL_COUNT] {
        let mut counts = [0; LEVEL_COUNT];
        for q in &self.questions {
            counts[q.level.index()] += 1;
        }
        counts
    }
}

// 等级字段既可能是字符串也可能是整数
fn deserialize_level<'de, D>(deserializer: D) -> Result<Option<Level>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct LevelVisitor;

    impl<'de> Visitor<'de> for LevelVisitor {
        type Value = Option<Level>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a level code such as \"A1.1\" or a level index")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Level::from_code(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(usize::try_from(value)
                .ok()
                .filter(|i| *i < LEVEL_COUNT)
                .map(Level::from_index))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(usize::try_from(value)
                .ok()
                .filter(|i| *i < LEVEL_COUNT)
                .map(Level::from_index))
        }
    }

    deserializer.deserialize_any(LevelVisitor)
}
