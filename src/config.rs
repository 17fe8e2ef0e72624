//! 程序配置
//!
//! 所有配置都来自环境变量，缺省或无法解析时使用默认值

use crate::error::{AppResult, ConfigError};
use crate::workflow::AssessmentLimits;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 题库 TOML 文件
    pub question_bank_path: String,
    /// 测评报告文件（每行一条 JSON 记录）
    pub report_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 会话上限
    pub limits: AssessmentLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_bank_path: "data/questions.toml".to_string(),
            report_file: "placement_reports.jsonl".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            limits: AssessmentLimits::default(),
        }
    }
}

impl Config {
    /// 从环境变量读取，无法解析的值回落到默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let limits = AssessmentLimits {
            hard_cap: lookup("HARD_CAP").and_then(|v| v.parse().ok()).unwrap_or(default.limits.hard_cap),
            min_questions: lookup("MIN_QUESTIONS").and_then(|v| v.parse().ok()).unwrap_or(default.limits.min_questions),
            batch_size: lookup("BATCH_SIZE").and_then(|v| v.parse().ok()).unwrap_or(default.limits.batch_size),
            ..default.limits
        };
        Self {
            question_bank_path: lookup("QUESTION_BANK_PATH").unwrap_or(default.question_bank_path),
            report_file: lookup("REPORT_FILE").unwrap_or(default.report_file),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: lookup("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            limits,
        }
    }

    /// 检查数值配置是否自洽
    pub fn validate(&self) -> AppResult<()> {
        if self.limits.hard_cap == 0 {
            return Err(invalid("HARD_CAP", self.limits.hard_cap, "必须大于 0").into());
        }
        if self.limits.batch_size == 0 {
            return Err(invalid("BATCH_SIZE", self.limits.batch_size, "必须大于 0").into());
        }
        if self.limits.min_questions > self.limits.hard_cap {
            return Err(invalid(
                "MIN_QUESTIONS",
                self.limits.min_questions,
                "不能超过 HARD_CAP",
            )
            .into());
        }
        Ok(())
    }
}

fn invalid(name: &str, value: usize, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.question_bank_path, "data/questions.toml");
        assert_eq!(config.limits, AssessmentLimits::default());
        assert!(!config.verbose_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = Config::from_lookup(lookup_from(&[
            ("HARD_CAP", "20"),
            ("MIN_QUESTIONS", "many"),
            ("VERBOSE_LOGGING", "true"),
            ("REPORT_FILE", "out.jsonl"),
        ]));
        assert_eq!(config.limits.hard_cap, 20);
        assert_eq!(config.limits.min_questions, 6);
        assert_eq!(config.limits.warmup_threshold, 3);
        assert!(config.verbose_logging);
        assert_eq!(config.report_file, "out.jsonl");
    }

    #[test]
    fn test_validate_rejects_inconsistent_limits() {
        let config = Config::from_lookup(lookup_from(&[("HARD_CAP", "4")]));
        assert!(matches!(
            config.validate(),
            Err(crate::error::AppError::Config(ConfigError::InvalidValue { .. }))
        ));

        let config = Config::from_lookup(lookup_from(&[("BATCH_SIZE", "0")]));
        assert!(config.validate().is_err());
    }
}
