//! # Level Placement
//!
//! 一个语言分级测评引擎：先用自述问卷估计起始等级，再用自适应选择题找到学员的能力边界
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有终端输入输出，只暴露能力
//! - `Console` - 提问 / 输出
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `survey_estimator` - 学时先验 + 方向探测
//! - `question_selector` - 按等级抽题、打乱选项
//! - `batch_evaluator` - 单批升降级判定
//! - `report_writer` - 文字报告和报告文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次测评的状态机
//! - `AssessmentSession` - 热身 → 边界批次 → 辅助题 → 完成
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/placement_app` - 应用入口，串起问卷、测评和报告
//! - `orchestrator/survey_flow` - 终端问卷
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::Console;
pub use models::{AssessmentResult, Level, Profile, Question, QuestionBank, SurveyOutcome};
pub use orchestrator::{App, PlacementOutcome};
pub use services::{estimate_start, evaluate_batch, SurveyIntake, Verdict};
pub use workflow::{AssessmentLimits, AssessmentSession, Step};
