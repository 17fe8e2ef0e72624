//! 分级测评应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源管理和一次完整测评的调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、加载题库、连接终端
//! 2. **问卷**：委托 survey_flow 得到学员画像
//! 3. **测评**：驱动 AssessmentSession，逐题展示并收集答案
//! 4. **报告**：委托 ReportWriter 生成并保存报告
//!
//! 编排层不做升降级判断。

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, Stdin, Stdout};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::Console;
use crate::models::assessment::AssessmentResult;
use crate::models::load_question_bank;
use crate::models::question::QuestionBank;
use crate::models::survey::SurveyOutcome;
use crate::orchestrator::survey_flow::run_survey;
use crate::services::report_writer::ReportWriter;
use crate::utils::logging::{init_log_file, log_startup, print_final_stats, truncate_text};
use crate::workflow::{AssessmentSession, QuestionPrompt, Step};

const OPTION_LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// 一次完整测评的产出
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    pub survey: SurveyOutcome,
    pub result: AssessmentResult,
    /// 文字报告（门槛失败时没有）
    pub report: Option<String>,
}

/// 应用主结构
pub struct App<R, W> {
    config: Config,
    bank: QuestionBank,
    console: Console<R, W>,
    report_writer: ReportWriter,
}

impl App<BufReader<Stdin>, Stdout> {
    /// 初始化应用（标准输入输出）
    pub async fn initialize(config: Config) -> AppResult<Self> {
        init_log_file(&config.output_log_file).await?;
        Self::with_console(config, Console::stdio()).await
    }
}

impl<R, W> App<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// 使用指定终端初始化应用
    pub async fn with_console(config: Config, console: Console<R, W>) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let bank = load_question_bank(Path::new(&config.question_bank_path)).await?;
        let report_writer = ReportWriter::with_path(config.report_file.clone());

        Ok(Self {
            config,
            bank,
            console,
            report_writer,
        })
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// 取回终端（测试里用来检查输出）
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// 运行一次完整测评，输入中途结束时返回 None
    pub async fn run(&mut self) -> AppResult<Option<PlacementOutcome>> {
        self.console
            .say("Welcome to the Hebrew level assessment.")
            .await?;

        let Some(survey) = run_survey(&mut self.console).await? else {
            warn!("⚠️ 问卷未完成，程序结束");
            return Ok(None);
        };

        let mut session = AssessmentSession::for_outcome(
            &survey,
            &self.bank,
            self.config.limits,
            StdRng::from_entropy(),
        );

        let result = loop {
            let prompt = match session.next_prompt() {
                Step::Finished(result) => break result,
                Step::Ask(prompt) => prompt,
            };

            show_prompt(&mut self.console, &prompt).await?;
            let Some(choice) = ask_choice(&mut self.console, prompt.options.len()).await? else {
                warn!("⚠️ 第 {} 题未作答，输入已结束，测评中止", prompt.number);
                return Ok(None);
            };

            let feedback = session.answer(choice)?;
            info!(
                "[{}] {} | {} | {}",
                prompt.number,
                prompt.level,
                truncate_text(&prompt.sentence, 30),
                if feedback.is_correct { "✓" } else { "✗" }
            );
            if feedback.is_correct {
                self.console.say("Correct!").await?;
            } else {
                self.console
                    .say(&format!(
                        "Not quite. The answer was: {}",
                        feedback.correct_option
                    ))
                    .await?;
            }
        };

        let report = match &survey {
            SurveyOutcome::GateFail { name, .. } => {
                info!("🚫 {} 不能识读字母，不进行测评", name);
                self.console
                    .say("This test is for readers of Hebrew script. Once you can decode the alphabet, come back and we'll assess you.")
                    .await?;
                None
            }
            SurveyOutcome::Placed(profile) => {
                let report = self.report_writer.write(profile, &result).await?;
                print_final_stats(&profile.name, &result, self.report_writer.path());

                self.console
                    .say(&format!("Assessment complete, {}. Here are your results.", profile.name))
                    .await?;
                self.console
                    .say(&format!(
                        "Recommended starting level: {}",
                        result.recommended_level()
                    ))
                    .await?;
                self.console.say("").await?;
                self.console.say(&report).await?;
                self.console
                    .say("Thank you for completing the Hebrew Level Assessment.")
                    .await?;
                Some(report)
            }
        };

        Ok(Some(PlacementOutcome {
            survey,
            result,
            report,
        }))
    }
}

async fn show_prompt<R, W>(console: &mut Console<R, W>, prompt: &QuestionPrompt) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    console.say("").await?;
    console
        .say(&format!("Question {} ({})", prompt.number, prompt.level))
        .await?;
    console.say(&prompt.sentence).await?;
    for (letter, option) in OPTION_LETTERS.iter().zip(&prompt.options) {
        console.say(&format!("  {}) {}", letter, option)).await?;
    }
    Ok(())
}

/// 读取选项：字母或序号选择，`s` 或空行跳过
///
/// 外层 None 表示输入已结束，内层 None 表示跳过
async fn ask_choice<R, W>(
    console: &mut Console<R, W>,
    option_count: usize,
) -> AppResult<Option<Option<usize>>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let shown = option_count.min(OPTION_LETTERS.len());
    let last = OPTION_LETTERS[shown.saturating_sub(1)];
    loop {
        let Some(raw) = console
            .ask(&format!("Your answer (A-{}, or s to skip):", last))
            .await?
        else {
            return Ok(None);
        };
        match parse_choice(&raw, shown) {
            Some(choice) => return Ok(Some(choice)),
            None => console.say("Please choose one of the options.").await?,
        }
    }
}

/// None 表示输入无效
fn parse_choice(raw: &str, option_count: usize) -> Option<Option<usize>> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() || raw == "s" || raw == "skip" {
        return Some(None);
    }
    let index = if let Ok(n) = raw.parse::<usize>() {
        n.checked_sub(1)?
    } else {
        let mut chars = raw.chars();
        let c = chars.next()?;
        if chars.next().is_some() || !c.is_ascii_lowercase() {
            return None;
        }
        (c as u8 - b'a') as usize
    };
    (index < option_count).then_some(Some(index))
}
