//! 问卷流程 - 编排层
//!
//! 在终端上逐步询问：姓名 → 邮箱 → 门槛题 → 学习经历 → 方向探测。
//! 具体估计逻辑委托给 [`SurveyEstimator`]。

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::infrastructure::Console;
use crate::models::survey::{Answer, SurveyOutcome};
use crate::services::survey_estimator::{
    is_valid_email, normalize_name, parse_months, parse_weekly_hours, StudyHistory,
    SurveyEstimator, SurveyIntake,
};

const YES_NO_HINT: &str = "(yes / no / unsure)";

/// 运行问卷，输入提前结束时返回 None
pub async fn run_survey<R, W>(console: &mut Console<R, W>) -> AppResult<Option<SurveyOutcome>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let name = loop {
        let Some(raw) = console.ask("What's your name?").await? else {
            return Ok(None);
        };
        let name = normalize_name(&raw);
        if !name.is_empty() {
            break name;
        }
    };

    let email = loop {
        let Some(raw) = console.ask("What's your email? (optional)").await? else {
            return Ok(None);
        };
        if raw.is_empty() {
            break None;
        }
        if is_valid_email(&raw) {
            break Some(raw);
        }
        console
            .say("Please enter a valid email or leave it blank.")
            .await?;
    };

    let Some(raw) = console
        .ask(&format!("Can you decode/read the Hebrew alphabet? {}", YES_NO_HINT))
        .await?
    else {
        return Ok(None);
    };
    let can_decode = Answer::parse(&raw).is_yes();

    let study = if can_decode {
        let Some(raw) = console
            .ask(&format!("Have you studied Hebrew before? {}", YES_NO_HINT))
            .await?
        else {
            return Ok(None);
        };
        match Answer::parse(&raw) {
            Answer::Yes => {
                let Some(months) = console.ask("How many months have you studied?").await? else {
                    return Ok(None);
                };
                let Some(hours) = console.ask("How many hours per week on average?").await? else {
                    return Ok(None);
                };
                StudyHistory::Studied {
                    months: parse_months(&months),
                    weekly_hours: parse_weekly_hours(&hours),
                }
            }
            Answer::No => StudyHistory::Never,
            // 不确定：不问学时，按 0 小时进入方向探测
            Answer::Unsure => StudyHistory::Studied {
                months: 0,
                weekly_hours: 0.0,
            },
        }
    } else {
        StudyHistory::Never
    };

    info!("📝 问卷: {} | 识读字母: {} | {:?}", name, can_decode, study);

    let mut estimator = SurveyEstimator::new(SurveyIntake {
        name,
        email,
        can_decode,
        study,
    });

    if let Some(prior) = estimator.hour_index() {
        debug!("学时先验等级下标: {}", prior);
    }

    while let Some(topic) = estimator.next_topic() {
        let Some(raw) = console
            .ask(&format!("{} {}", topic.question(), YES_NO_HINT))
            .await?
        else {
            return Ok(None);
        };
        let answer = Answer::parse(&raw);
        debug!("探测 {} → {:?}", topic.key(), answer);
        estimator.record(answer);
    }

    Ok(Some(estimator.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn survey(input: &'static str) -> Option<SurveyOutcome> {
        let mut console = Console::new(input.as_bytes(), Vec::new());
        run_survey(&mut console).await.unwrap()
    }

    #[tokio::test]
    async fn test_gate_fail() {
        let outcome = survey("dana levi\n\nno\n").await.unwrap();
        assert_eq!(
            outcome,
            SurveyOutcome::GateFail {
                name: "Dana Levi".into(),
                email: None
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_email_is_asked_again() {
        let outcome = survey("Dana\nnot-an-email\ndana@example.com\nyes\nno\n")
            .await
            .unwrap();
        let profile = outcome.profile().unwrap();
        assert_eq!(profile.email.as_deref(), Some("dana@example.com"));
        assert!(profile.extreme_beginner);
        assert_eq!(profile.start_index, 0);
    }

    #[tokio::test]
    async fn test_studied_then_direction_questions() {
        // 1 个月 × 1 小时 → 先验 0，第一题答"否"后探测结束
        let outcome = survey("Dana\n\ny\ny\n1\n1\nn\n").await.unwrap();
        let profile = outcome.profile().unwrap();
        assert!(profile.has_ever_studied);
        assert_eq!(profile.hour_index, 0);
        assert_eq!(profile.start_index, 0);
        assert_eq!(profile.trace.len(), 1);
    }

    #[tokio::test]
    async fn test_unsure_study_history_asks_direction_questions() {
        let outcome = survey("Dana\n\ny\nunsure\nno\n").await.unwrap();
        let profile = outcome.profile().unwrap();
        assert!(!profile.extreme_beginner);
        assert!(profile.has_ever_studied);
        assert_eq!(profile.months, 0);
        assert_eq!(profile.total_hours, 0.0);
        assert_eq!(profile.hour_index, 0);
        assert_eq!(profile.start_index, 0);
        assert_eq!(profile.trace.len(), 1);
        assert_eq!(profile.trace[0].answer, Answer::No);
        assert_eq!(profile.trace[0].reason, None);
    }

    #[tokio::test]
    async fn test_eof_returns_none() {
        assert!(survey("Dana\n").await.is_none());
        assert!(survey("").await.is_none());
    }
}
