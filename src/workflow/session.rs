//! 会话状态机 - 流程层
//!
//! 核心职责：定义"一次练习"的完整生命周期
//!
//! 状态顺序：
//! 1. Config（含阅读须知） → Generating
//! 2. Generating → Exam（失败回到 Config）
//! 3. Exam → Evaluating（手动交卷或时间到）
//! 4. Evaluating → Report（失败回到 Exam）
//! 5. 任意状态 → Config（重新开始）
//!
//! 会话不发起网络请求，只产出 [`Request`]，由编排层执行后把结果交回

use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{ConfigError, EvaluationError, GenerationError};
use crate::infrastructure::SnapshotStore;
use crate::models::catalog::ConfigField;
use crate::models::{ConfigDraft, EvaluationReport, Exam, ExamConfig, UserAnswer};
use crate::workflow::attempt::{EditRejection, ExamAttempt, SubmitRejection, TickOutcome};

pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate the exam. Please check your API key and try again.";
pub const EVALUATION_FAILED_MESSAGE: &str =
    "Failed to evaluate the exam. Please try submitting again.";

/// 一次外发请求的标识
///
/// 完成结果必须带回同一个 ticket，否则视为过期结果丢弃
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 会话要求编排层执行的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Generate {
        ticket: RequestTicket,
        config: ExamConfig,
    },
    Evaluate {
        ticket: RequestTicket,
        exam: Exam,
        answers: Vec<UserAnswer>,
    },
}

impl Request {
    pub fn ticket(&self) -> RequestTicket {
        match self {
            Request::Generate { ticket, .. } | Request::Evaluate { ticket, .. } => *ticket,
        }
    }
}

/// 会话阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Config {
        draft: ConfigDraft,
        /// 已通过校验、等待确认须知的配置
        pending: Option<ExamConfig>,
        error: Option<String>,
    },
    Generating {
        ticket: RequestTicket,
        config: ExamConfig,
    },
    Exam {
        attempt: ExamAttempt,
        config: ExamConfig,
        error: Option<String>,
    },
    Evaluating {
        ticket: RequestTicket,
        attempt: ExamAttempt,
        config: ExamConfig,
    },
    Report {
        attempt: ExamAttempt,
        config: ExamConfig,
        report: EvaluationReport,
    },
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Config {
            draft: ConfigDraft::default(),
            pending: None,
            error: None,
        }
    }
}

/// 当前显示的页面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Config,
    /// 配置页上的须知确认
    Guidelines,
    Generating,
    Exam,
    Evaluating,
    Report,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Config => "config",
            Screen::Guidelines => "guidelines",
            Screen::Generating => "generating",
            Screen::Exam => "exam",
            Screen::Evaluating => "evaluating",
            Screen::Report => "report",
        };
        f.write_str(name)
    }
}

/// 用户操作被拒绝
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("'{action}' is not available on the {screen} screen")]
    NotAvailable { action: &'static str, screen: Screen },

    /// `number` 从 1 开始
    #[error("There is no choice {number} for {field}")]
    NoSuchChoice { field: &'static str, number: usize },

    #[error("There is no question {0}")]
    NoSuchQuestion(usize),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Edit(#[from] EditRejection),

    #[error(transparent)]
    Submit(#[from] SubmitRejection),
}

/// 会话
///
/// 职责：
/// - 持有当前阶段及其数据（试卷、答案、报告）
/// - 决定何时保存、何时删除快照
/// - 用 ticket 丢弃过期的请求结果
/// - 不持有任何网络资源
pub struct Session<S: SnapshotStore> {
    phase: Phase,
    store: S,
    next_ticket: u64,
}

impl<S: SnapshotStore> Session<S> {
    /// 从配置页开始的新会话
    pub fn new(store: S) -> Self {
        Self {
            phase: Phase::default(),
            store,
            next_ticket: 0,
        }
    }

    /// 启动时恢复：存储里有可用快照就直接进入作答
    pub fn recover(store: S) -> Self {
        let mut session = Self::new(store);
        match session.store.load() {
            Ok(Some(snapshot)) => {
                info!(
                    "♻️ 恢复未完成的考试: {} (剩余 {} 秒)",
                    snapshot.exam.title, snapshot.time_left
                );
                let attempt = ExamAttempt::resume(snapshot.exam, snapshot.user_answers, snapshot.time_left);
                session.phase = Phase::Exam {
                    attempt,
                    config: snapshot.exam_config,
                    error: None,
                };
            }
            Ok(None) => {}
            Err(e) => warn!("⚠️ 读取快照失败，从配置页开始: {}", e),
        }
        session
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn screen(&self) -> Screen {
        match &self.phase {
            Phase::Config { pending: Some(_), .. } => Screen::Guidelines,
            Phase::Config { .. } => Screen::Config,
            Phase::Generating { .. } => Screen::Generating,
            Phase::Exam { .. } => Screen::Exam,
            Phase::Evaluating { .. } => Screen::Evaluating,
            Phase::Report { .. } => Screen::Report,
        }
    }

    /// 作答中的考试（作答页、阅卷中）
    pub fn attempt(&self) -> Option<&ExamAttempt> {
        match &self.phase {
            Phase::Exam { attempt, .. }
            | Phase::Evaluating { attempt, .. }
            | Phase::Report { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&EvaluationReport> {
        match &self.phase {
            Phase::Report { report, .. } => Some(report),
            _ => None,
        }
    }

    /// 倒计时是否需要继续走
    pub fn timer_running(&self) -> bool {
        matches!(&self.phase, Phase::Exam { attempt, .. } if attempt.timer_running())
    }

    fn not_available(&self, action: &'static str) -> ActionError {
        ActionError::NotAvailable {
            action,
            screen: self.screen(),
        }
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.next_ticket += 1;
        RequestTicket(self.next_ticket)
    }

    // ========== 配置页 ==========

    pub fn select_option(&mut self, field: ConfigField, index: usize) -> Result<(), ActionError> {
        let Phase::Config { draft, pending: None, error } = &mut self.phase else {
            return Err(self.not_available("select"));
        };
        if !draft.select(field, index) {
            return Err(ActionError::NoSuchChoice {
                field: field.title(),
                number: index + 1,
            });
        }
        *error = None;
        Ok(())
    }

    /// 校验配置并显示须知
    pub fn request_start(&mut self) -> Result<(), ActionError> {
        let Phase::Config { draft, pending: pending @ None, .. } = &mut self.phase else {
            return Err(self.not_available("start"));
        };
        let config = draft.to_config();
        config.validate()?;
        *pending = Some(config);
        Ok(())
    }

    /// 不同意须知，回到配置表单
    pub fn decline_guidelines(&mut self) -> Result<(), ActionError> {
        let Phase::Config { pending: pending @ Some(_), .. } = &mut self.phase else {
            return Err(self.not_available("decline"));
        };
        *pending = None;
        Ok(())
    }

    /// 确认须知，开始出卷
    pub fn acknowledge(&mut self) -> Result<Request, ActionError> {
        let Phase::Config { pending, .. } = &mut self.phase else {
            return Err(self.not_available("accept"));
        };
        let Some(config) = pending.take() else {
            return Err(self.not_available("accept"));
        };
        let ticket = self.issue_ticket();
        info!("➡️ 开始出卷 {}", ticket);
        self.phase = Phase::Generating {
            ticket,
            config: config.clone(),
        };
        Ok(Request::Generate { ticket, config })
    }

    /// 出卷结果
    ///
    /// 返回结果是否被采纳
    pub fn on_generated(&mut self, ticket: RequestTicket, result: Result<Exam, GenerationError>) -> bool {
        let current = match &self.phase {
            Phase::Generating { ticket: current, .. } => Some(*current),
            _ => None,
        };
        if current != Some(ticket) {
            warn!("⚠️ 丢弃过期的出卷结果 {}", ticket);
            return false;
        }
        let Phase::Generating { config, .. } = std::mem::take(&mut self.phase) else {
            return false;
        };

        match result {
            Ok(exam) => {
                let attempt = ExamAttempt::new(exam);
                info!(
                    "✓ 进入作答: {} ({} 道题, {} 秒)",
                    attempt.exam().title,
                    attempt.question_count(),
                    attempt.time_left()
                );
                self.phase = Phase::Exam {
                    attempt,
                    config,
                    error: None,
                };
                self.persist();
            }
            Err(e) => {
                tracing::error!("❌ 出卷失败: {}", e);
                self.phase = Phase::Config {
                    draft: ConfigDraft::from_config(&config),
                    pending: None,
                    error: Some(GENERATION_FAILED_MESSAGE.to_string()),
                };
            }
        }
        true
    }

    // ========== 作答页 ==========

    fn exam_attempt_mut(&mut self, action: &'static str) -> Result<&mut ExamAttempt, ActionError> {
        let screen = self.screen();
        match &mut self.phase {
            Phase::Exam { attempt, .. } => Ok(attempt),
            _ => Err(ActionError::NotAvailable { action, screen }),
        }
    }

    /// 修改当前题目的答案
    pub fn answer(&mut self, text: impl Into<String>) -> Result<(), ActionError> {
        let attempt = self.exam_attempt_mut("answer")?;
        let question_id = attempt
            .current_question()
            .map(|q| q.id)
            .ok_or(ActionError::NoSuchQuestion(attempt.current_index() + 1))?;
        attempt.set_answer(question_id, text)?;
        self.persist();
        Ok(())
    }

    pub fn next_question(&mut self) -> Result<(), ActionError> {
        let attempt = self.exam_attempt_mut("next")?;
        if !attempt.next() {
            return Err(ActionError::NoSuchQuestion(attempt.current_index() + 2));
        }
        Ok(())
    }

    pub fn previous_question(&mut self) -> Result<(), ActionError> {
        let attempt = self.exam_attempt_mut("prev")?;
        if !attempt.previous() {
            return Err(ActionError::NoSuchQuestion(0));
        }
        Ok(())
    }

    /// 跳到第 `number` 题（从 1 开始）
    pub fn go_to_question(&mut self, number: usize) -> Result<(), ActionError> {
        let attempt = self.exam_attempt_mut("goto")?;
        if number == 0 || !attempt.go_to(number - 1) {
            return Err(ActionError::NoSuchQuestion(number));
        }
        Ok(())
    }

    /// 走一秒，时间到时返回强制交卷的请求
    ///
    /// 作答页以外的计时一律忽略，交卷途中到点不会再次交卷
    pub fn tick(&mut self) -> Option<Request> {
        let Phase::Exam { attempt, .. } = &mut self.phase else {
            return None;
        };
        if !attempt.timer_running() {
            return None;
        }
        match attempt.tick() {
            TickOutcome::Running(_) => {
                self.persist();
                None
            }
            TickOutcome::Expired => {
                info!("⏰ 时间到，自动交卷");
                self.begin_evaluation()
            }
        }
    }

    /// 手动交卷
    ///
    /// 需要作答 ⌈N/2⌉ 题；时间未到时 `confirmed` 必须为 true
    pub fn submit(&mut self, confirmed: bool) -> Result<Request, ActionError> {
        let attempt = self.exam_attempt_mut("submit")?;
        attempt.check_submission(confirmed)?;
        info!(
            "📤 交卷 (已作答 {}/{})",
            attempt.answered_count(),
            attempt.question_count()
        );
        let screen = self.screen();
        self.begin_evaluation().ok_or(ActionError::NotAvailable {
            action: "submit",
            screen,
        })
    }

    /// Exam → Evaluating，进入时删除快照
    fn begin_evaluation(&mut self) -> Option<Request> {
        let Phase::Exam { mut attempt, config, .. } = std::mem::take(&mut self.phase) else {
            return None;
        };
        attempt.mark_submitted();
        let ticket = self.issue_ticket();
        let request = Request::Evaluate {
            ticket,
            exam: attempt.exam().clone(),
            answers: attempt.answers().to_vec(),
        };
        self.phase = Phase::Evaluating {
            ticket,
            attempt,
            config,
        };
        self.clear_store();
        Some(request)
    }

    /// 阅卷结果
    ///
    /// 失败时回到作答页，答案保留，倒计时从交卷时的剩余时间继续
    pub fn on_evaluated(
        &mut self,
        ticket: RequestTicket,
        result: Result<EvaluationReport, EvaluationError>,
    ) -> bool {
        let current = match &self.phase {
            Phase::Evaluating { ticket: current, .. } => Some(*current),
            _ => None,
        };
        if current != Some(ticket) {
            warn!("⚠️ 丢弃过期的阅卷结果 {}", ticket);
            return false;
        }
        let Phase::Evaluating { attempt, config, .. } = std::mem::take(&mut self.phase) else {
            return false;
        };

        match result {
            Ok(report) => {
                info!("✓ 阅卷完成: {}/{}", report.overall_score, attempt.exam().total_marks);
                self.phase = Phase::Report {
                    attempt,
                    config,
                    report,
                };
            }
            Err(e) => {
                tracing::error!("❌ 阅卷失败: {}", e);
                self.phase = Phase::Exam {
                    attempt,
                    config,
                    error: Some(EVALUATION_FAILED_MESSAGE.to_string()),
                };
            }
        }
        true
    }

    /// 重新开始：删除快照，清空所有数据，回到配置页
    pub fn restart(&mut self) {
        info!("🔄 重新开始");
        self.clear_store();
        self.phase = Phase::default();
    }

    // ========== 快照 ==========

    fn persist(&self) {
        let Phase::Exam { attempt, config, .. } = &self.phase else {
            return;
        };
        if !attempt.autosave_enabled() {
            return;
        }
        if let Err(e) = self.store.save(&attempt.snapshot(config)) {
            warn!("⚠️ 快照保存失败: {}", e);
        }
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!("⚠️ 快照删除失败: {}", e);
        }
    }
}
