//! # AI Exam Pro
//!
//! 终端里的 AI 模拟考试：按配置出卷、倒计时作答、交卷后由模型阅卷并给出报告
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有本地存储，只暴露能力
//! - `SnapshotStore` - 唯一的快照槽位，save / load / clear
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 结构化补全能力（OpenAI 兼容接口）
//! - `ExamGenerator` - 出卷能力
//! - `ExamEvaluator` - 阅卷能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次练习"的完整生命周期
//! - `Session` - 状态机（配置 → 出卷 → 作答 → 阅卷 → 报告）
//! - `ExamAttempt` - 倒计时、导航、作答和交卷门槛
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 事件循环，调度输入、计时和后台请求
//! - `orchestrator/command` - 输入命令解析
//!
//! `views/` 把会话状态渲染为终端文本，`models/` 定义数据结构
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod views;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use models::{EvaluationReport, Exam, ExamConfig, Question, UserAnswer};
pub use orchestrator::{App, TerminalApp};
pub use services::{CompletionProvider, CompletionRequest, ExamEvaluator, ExamGenerator, LlmService};
pub use workflow::{ExamAttempt, Phase, Request, RequestTicket, Screen, Session};
