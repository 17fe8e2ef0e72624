//! 等级刻度
//!
//! 固定的 10 级有序刻度。所有等级下标运算都经过 [`clamp_index`]，
//! 结果始终落在 `[0, LEVEL_COUNT - 1]`。

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 等级数量
pub const LEVEL_COUNT: usize = 10;

/// 等级枚举（按难度递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "A1.1")]
    A1_1,
    #[serde(rename = "A1.2")]
    A1_2,
    #[serde(rename = "A1.3")]
    A1_3,
    #[serde(rename = "A2.1")]
    A2_1,
    #[serde(rename = "A2.2")]
    A2_2,
    #[serde(rename = "A2.3")]
    A2_3,
    #[serde(rename = "B1.1")]
    B1_1,
    #[serde(rename = "B1.2")]
    B1_2,
    #[serde(rename = "B1.3")]
    B1_3,
    #[serde(rename = "B2.1")]
    B2_1,
}

/// 全部等级，下标即等级序号
pub const LEVELS: [Level; LEVEL_COUNT] = [
    Level::A1_1,
    Level::A1_2,
    Level::A1_3,
    Level::A2_1,
    Level::A2_2,
    Level::A2_3,
    Level::B1_1,
    Level::B1_2,
    Level::B1_3,
    Level::B2_1,
];

/// 等级代码（大写）到等级的查找表，题库加载时使用
static LEVEL_CODES: phf::Map<&'static str, Level> = phf_map! {
    "A1.1" => Level::A1_1,
    "A1.2" => Level::A1_2,
    "A1.3" => Level::A1_3,
    "A2.1" => Level::A2_1,
    "A2.2" => Level::A2_2,
    "A2.3" => Level::A2_3,
    "B1.1" => Level::B1_1,
    "B1.2" => Level::B1_2,
    "B1.3" => Level::B1_3,
    "B2.1" => Level::B2_1,
};

/// 把任意整数下标钳制到刻度范围内
pub fn clamp_index(i: i64) -> usize {
    i.clamp(0, LEVEL_COUNT as i64 - 1) as usize
}

/// 浮点版本，NaN 视为 0
pub fn clamp_index_f64(x: f64) -> usize {
    if x.is_nan() {
        return 0;
    }
    // `as` 对 ±inf 饱和
    clamp_index(x.floor() as i64)
}

impl Level {
    /// 按下标取等级（越界饱和到两端）
    pub fn from_index(index: usize) -> Self {
        LEVELS[index.min(LEVEL_COUNT - 1)]
    }

    /// 等级序号
    pub fn index(self) -> usize {
        self as usize
    }

    /// 等级代码，例如 `A1.1`
    pub fn code(self) -> &'static str {
        match self {
            Level::A1_1 => "A1.1",
            Level::A1_2 => "A1.2",
            Level::A1_3 => "A1.3",
            Level::A2_1 => "A2.1",
            Level::A2_2 => "A2.2",
            Level::A2_3 => "A2.3",
            Level::B1_1 => "B1.1",
            Level::B1_2 => "B1.2",
            Level::B1_3 => "B1.3",
            Level::B2_1 => "B2.1",
        }
    }

    /// 从代码解析等级
    ///
    /// 同时支持 `"Aleph (A1.1)"` 这种展示名，取括号里的代码
    pub fn from_code(s: &str) -> Option<Self> {
        let s = s.trim();
        let code = match (s.find('('), s.rfind(')')) {
            (Some(open), Some(close)) if open < close => s[open + 1..close].trim(),
            _ => s,
        };
        LEVEL_CODES.get(code.to_ascii_uppercase().as_str()).copied()
    }

    /// 是否为最高等级
    pub fn is_top(self) -> bool {
        self.index() == LEVEL_COUNT - 1
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
