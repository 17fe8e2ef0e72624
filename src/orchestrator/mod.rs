//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源管理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `placement_app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 持有题库、终端和报告写入器
//! - 驱动测评会话，输出结果
//!
//! ### `survey_flow` - 问卷流程
//! - 在终端上逐题询问
//! - 委托 SurveyEstimator 推出起始等级
//!
//! ## 层次关系
//!
//! ```text
//! placement_app (一次完整测评)
//!     ↓
//! survey_flow (问卷) → workflow::AssessmentSession (测评状态机)
//!     ↓
//! services (能力层：estimator / selector / evaluator / report)
//!     ↓
//! infrastructure (基础设施：Console)
//! ```

pub mod placement_app;
pub mod survey_flow;

// 重新导出主要类型
pub use placement_app::{App, PlacementOutcome};
pub use survey_flow::run_survey;
