//! 测评报告服务 - 业务能力层
//!
//! 生成文字版测评报告，并把报告追加写入本地文件。
//! 外部投递（webhook、CRM 等）不在这里处理。

use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::assessment::{AssessmentResult, DecisionOutcome, Phase};
use crate::models::survey::{Answer, Profile};

/// 测评报告
pub struct AssessmentReport;

impl AssessmentReport {
    /// 生成面向老师/顾问的文字报告
    pub fn render(profile: &Profile, result: &AssessmentResult) -> String {
        let mut report = profile.name.clone();
        if let Some(email) = &profile.email {
            report.push_str(&format!(" ({})", email));
        }

        // 一题未问（零基础）
        if result.total_asked == 0 {
            report.push_str(" has never studied Hebrew before. ");
            report.push_str(
                "The background questions showed no prior experience with the language, ",
            );
            report.push_str(&format!(
                "so they should start at the very beginning with level {}. ",
                result.recommended_level()
            ));
            report.push_str("No assessment questions were needed.\n");
            return report;
        }

        report.push_str(&format!(
            " has studied Hebrew for {} {}",
            profile.months,
            plural(profile.months as f64, "month", "months")
        ));
        if profile.weekly_hours > 0.0 {
            report.push_str(&format!(
                ", {} {} per week, about {} hours in total",
                profile.weekly_hours,
                plural(profile.weekly_hours, "hour", "hours"),
                profile.total_hours.round()
            ));
        }
        report.push_str(". ");

        let can: Vec<&str> = profile
            .trace
            .iter()
            .filter(|t| t.answer == Answer::Yes)
            .map(|t| t.topic.ability())
            .collect();
        let cannot: Vec<&str> = profile
            .trace
            .iter()
            .filter(|t| t.answer == Answer::No)
            .map(|t| t.topic.ability())
            .collect();

        if !can.is_empty() {
            report.push_str(&format!(
                "They reported being able to {}. ",
                join_list(&can, "and")
            ));
        }
        if !cannot.is_empty() {
            report.push_str(&format!(
                "They indicated they cannot yet {}. ",
                join_list(&cannot, "or")
            ));
        }

        if let Some(first) = result
            .question_history
            .iter()
            .find(|r| r.phase == Phase::Boundary)
        {
            report.push_str(&format!(
                "The test began with questions from level {}. ",
                first.level
            ));
        }

        for decision in &result.decision_log {
            let movement = match decision.outcome {
                DecisionOutcome::Promote => "moved up a level",
                DecisionOutcome::Demote => "moved down a level",
                DecisionOutcome::Undecided => "concluded the assessment",
                DecisionOutcome::Exhausted => {
                    report.push_str(&format!(
                        "There were no more questions at level {}, so the assessment ended there. ",
                        decision.level
                    ));
                    continue;
                }
            };
            report.push_str(&format!(
                "At level {} they answered {} correctly and {} incorrectly, so the test {}. ",
                decision.level, decision.correct, decision.wrong, movement
            ));
        }

        match result.finished_level() {
            Some(finished) => report.push_str(&format!(
                "They have probably finished level {} and should start with level {}. ",
                finished,
                result.recommended_level()
            )),
            None => report.push_str(&format!(
                "They should start at the very beginning with level {}. ",
                result.recommended_level()
            )),
        }
        report.push_str(&format!(
            "Total questions asked: {}.\n\n",
            result.total_asked
        ));

        let wrong: Vec<_> = result.wrong_answers().collect();
        if wrong.is_empty() {
            report.push_str("They answered every question correctly.\n");
        } else {
            report.push_str("Questions answered incorrectly:\n\n");
            for (i, record) in wrong.iter().enumerate() {
                report.push_str(&format!(
                    "{}. ({}) \"{}\"\n   Their answer: {}\n   Correct answer: \"{}\"\n\n",
                    i + 1,
                    record.level,
                    record.question_text,
                    record
                        .chosen_option
                        .as_deref()
                        .map(|o| format!("\"{}\"", o))
                        .unwrap_or_else(|| "(skipped)".to_string()),
                    record.correct_option
                ));
            }
        }

        report
    }
}

fn plural(n: f64, one: &'static str, many: &'static str) -> &'static str {
    if n == 1.0 {
        one
    } else {
        many
    }
}

/// "a"、"a and b"、"a, b and c"
fn join_list(items: &[&str], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [rest @ .., last] => format!("{} {} {}", rest.join(", "), conjunction, last),
    }
}

/// 写入文件的一条报告记录
#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    generated_at: String,
    profile: &'a Profile,
    result: &'a AssessmentResult,
    summary: String,
}

/// 报告写入服务
///
/// 职责：
/// - 把一次测评的 JSON 记录追加到报告文件（每行一条）
/// - 不关心测评流程
pub struct ReportWriter {
    report_file_path: String,
}

impl ReportWriter {
    /// 创建新的报告写入服务
    pub fn new() -> Self {
        Self {
            report_file_path: "placement_reports.jsonl".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.report_file_path
    }

    /// 追加写入一条报告
    ///
    /// # 参数
    /// - `profile`: 问卷画像
    /// - `result`: 测评结果
    ///
    /// # 返回
    /// 返回生成的文字报告
    pub async fn write(&self, profile: &Profile, result: &AssessmentResult) -> AppResult<String> {
        let summary = AssessmentReport::render(profile, result);
        let record = ReportRecord {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            profile,
            result,
            summary: summary.clone(),
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        debug!(
            "写入报告: {} | 共 {} 题 | {} 字节",
            profile.name,
            result.total_asked,
            line.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_file_path)
            .await
            .map_err(|e| AppError::file_write_failed(&self.report_file_path, e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(&self.report_file_path, e))?;

        Ok(summary)
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{BatchDecision, QuestionRecord, WarmupTally};
    use crate::models::level::Level;
    use crate::models::survey::{Topic, TraceEntry};
    use tokio_test::assert_ok;

    fn profile() -> Profile {
        Profile {
            name: "Dana Levi".into(),
            email: Some("dana@example.com".into()),
            has_ever_studied: true,
            months: 12,
            weekly_hours: 4.0,
            total_hours: 206.4,
            hour_index: 2,
            start_index: 2,
            extreme_beginner: false,
            trace: vec![
                TraceEntry {
                    topic: Topic::Past,
                    answer: Answer::Yes,
                    level_index: 2,
                    reason: None,
                },
                TraceEntry {
                    topic: Topic::FutureBasic,
                    answer: Answer::No,
                    level_index: 3,
                    reason: None,
                },
            ],
        }
    }

    fn record(level: Level, correct: bool, phase: Phase) -> QuestionRecord {
        QuestionRecord {
            question_id: 0,
            question_text: "Ani ___ sefer".into(),
            level,
            correct_option: "kore".into(),
            chosen_option: if correct { Some("kore".into()) } else { None },
            is_correct: correct,
            phase,
        }
    }

    fn result() -> AssessmentResult {
        AssessmentResult {
            finished_index: 1,
            recommended_start_index: 2,
            total_asked: 6,
            decision_log: vec![
                BatchDecision {
                    level: Level::A1_2,
                    correct: 3,
                    wrong: 0,
                    outcome: DecisionOutcome::Promote,
                },
                BatchDecision {
                    level: Level::A1_3,
                    correct: 0,
                    wrong: 2,
                    outcome: DecisionOutcome::Demote,
                },
            ],
            question_history: vec![
                record(Level::A1_2, true, Phase::Boundary),
                record(Level::A1_2, true, Phase::Boundary),
                record(Level::A1_2, true, Phase::Boundary),
                record(Level::A1_3, false, Phase::Boundary),
                record(Level::A1_3, false, Phase::Boundary),
                record(Level::A1_2, true, Phase::Supportive),
            ],
            warmup: WarmupTally::default(),
        }
    }

    #[test]
    fn test_join_list() {
        assert_eq!(join_list(&[], "and"), "");
        assert_eq!(join_list(&["a"], "and"), "a");
        assert_eq!(join_list(&["a", "b"], "and"), "a and b");
        assert_eq!(join_list(&["a", "b", "c"], "or"), "a, b or c");
    }

    #[test]
    fn test_render_full_report() {
        let text = AssessmentReport::render(&profile(), &result());
        assert!(text.starts_with("Dana Levi (dana@example.com) has studied Hebrew for 12 months"));
        assert!(text.contains("about 206 hours in total"));
        assert!(text.contains("They reported being able to talk about past events."));
        assert!(text.contains("They indicated they cannot yet talk about the future."));
        assert!(text.contains("The test began with questions from level A1.2."));
        assert!(text.contains("At level A1.3 they answered 0 correctly and 2 incorrectly"));
        assert!(text.contains("probably finished level A1.2 and should start with level A1.3"));
        assert!(text.contains("Total questions asked: 6."));
        assert!(text.contains("Their answer: (skipped)"));
    }

    #[test]
    fn test_render_no_questions() {
        let mut p = profile();
        p.email = None;
        let r = AssessmentResult {
            finished_index: -1,
            recommended_start_index: 0,
            total_asked: 0,
            decision_log: Vec::new(),
            question_history: Vec::new(),
            warmup: WarmupTally::default(),
        };
        let text = AssessmentReport::render(&p, &r);
        assert!(text.starts_with("Dana Levi has never studied"));
        assert!(text.contains("level A1.1"));
    }

    #[tokio::test]
    async fn test_write_appends_json_lines() {
        let path = std::env::temp_dir().join(format!(
            "level_placement_reports_{}.jsonl",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&path).await;
        let writer = ReportWriter::with_path(path.to_string_lossy());

        assert_ok!(writer.write(&profile(), &result()).await);
        assert_ok!(writer.write(&profile(), &result()).await);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["result"]["finished_index"], 1);
        assert_eq!(value["profile"]["trace"][0]["topic"], "past");

        let _ = tokio::fs::remove_file(&path).await;
    }
}
