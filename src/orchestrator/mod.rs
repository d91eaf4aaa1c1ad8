//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把终端输入、计时和后台请求调度到会话上，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `command` - 输入解析
//! - 一行输入 → 一个 UserAction
//!
//! ### `app` - 事件循环
//! - 持有会话、出卷/阅卷服务和计时源
//! - 在后台任务上执行请求，结果通过 channel 送回循环
//! - 每次状态变化后刷新页面
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (输入 / 计时 / 请求结果)
//!     ↓
//! workflow::Session (状态机) → workflow::ExamAttempt (计时 / 导航 / 作答)
//!     ↓
//! services (能力层：出卷 / 阅卷 / LLM)
//!     ↓
//! infrastructure (基础设施：快照存储)
//! ```

pub mod app;
pub mod command;

pub use app::{App, Completion, TerminalApp};
pub use command::{parse_action, ParseError, UserAction};
