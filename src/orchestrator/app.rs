//! 终端应用 - 编排层
//!
//! ## 职责
//!
//! 1. **事件循环**：在同一个任务上交替处理输入行、计时和请求结果
//! 2. **请求执行**：把会话产出的 Request 交给出卷/阅卷服务，在独立任务上运行
//! 3. **交互细节**：交卷确认、计时提醒、页面刷新
//!
//! 会话只在循环任务上被修改，因此不需要加锁

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, EvaluationError, GenerationError};
use crate::infrastructure::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use crate::models::{EvaluationReport, Exam};
use crate::orchestrator::command::{parse_action, UserAction, HELP_TEXT};
use crate::services::{CompletionProvider, ExamEvaluator, ExamGenerator, LlmService};
use crate::utils::truncate_text;
use crate::views::{self, format_time};
use crate::workflow::{
    ActionError, ExamAttempt, IntervalTicker, Request, RequestTicket, Screen, Session, SubmitRejection, TickSource,
};

pub const TIME_UP_MESSAGE: &str = "Time is up! Your exam will be submitted automatically.";
const PROGRESS_SAVED_MESSAGE: &str = "Your progress is saved. Run the program again to resume.";
const CONFIRM_PROMPT: &str = "Are you sure you want to submit your exam? (yes/no)";

/// 后台请求的结果
#[derive(Debug)]
pub enum Completion {
    Generated {
        ticket: RequestTicket,
        result: Result<Exam, GenerationError>,
    },
    Evaluated {
        ticket: RequestTicket,
        result: Result<EvaluationReport, EvaluationError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// 计时提醒：每整分钟一次，最后一分钟每 10 秒一次
fn should_announce(time_left: u32) -> bool {
    time_left > 0 && (time_left % 60 == 0 || (time_left < 60 && time_left % 10 == 0))
}

/// 应用主结构
pub struct App<S: SnapshotStore, T: TickSource> {
    session: Session<S>,
    generator: Arc<ExamGenerator>,
    evaluator: Arc<ExamEvaluator>,
    ticker: T,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// 正在等待考生确认交卷
    awaiting_confirmation: bool,
}

impl<S: SnapshotStore, T: TickSource> App<S, T> {
    pub fn new(session: Session<S>, generator: ExamGenerator, evaluator: ExamEvaluator, ticker: T) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session,
            generator: Arc::new(generator),
            evaluator: Arc::new(evaluator),
            ticker,
            completions_tx,
            completions_rx,
            awaiting_confirmation: false,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    /// 运行事件循环，直到输入结束或考生退出
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        if self.session.screen() == Screen::Exam {
            writeln!(output, "♻️ Resuming your saved exam.")?;
        }
        self.render(output)?;

        let mut was_running = false;
        loop {
            let timer_running = self.session.timer_running();
            if timer_running && !was_running {
                self.ticker.reset();
            }
            was_running = timer_running;

            tokio::select! {
                biased;

                Some(completion) = self.completions_rx.recv() => {
                    self.apply_completion(completion, output)?;
                }
                _ = self.ticker.tick(), if timer_running => {
                    self.on_tick(output)?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("输入结束，退出");
                        break;
                    };
                    if self.handle_line(&line, output)? == Flow::Quit {
                        info!("👋 考生退出");
                        break;
                    }
                }
            }
            output.flush()?;
        }
        Ok(())
    }

    // ========== 请求 ==========

    fn dispatch(&self, request: Request) {
        let tx = self.completions_tx.clone();
        match request {
            Request::Generate { ticket, config } => {
                let generator = Arc::clone(&self.generator);
                tokio::spawn(async move {
                    let result = generator.generate(&config).await;
                    let _ = tx.send(Completion::Generated { ticket, result });
                });
            }
            Request::Evaluate { ticket, exam, answers } => {
                let evaluator = Arc::clone(&self.evaluator);
                tokio::spawn(async move {
                    let result = evaluator.evaluate(&exam, &answers).await;
                    let _ = tx.send(Completion::Evaluated { ticket, result });
                });
            }
        }
    }

    fn apply_completion<W: Write>(&mut self, completion: Completion, output: &mut W) -> io::Result<()> {
        let applied = match completion {
            Completion::Generated { ticket, result } => self.session.on_generated(ticket, result),
            Completion::Evaluated { ticket, result } => self.session.on_evaluated(ticket, result),
        };
        if applied {
            self.render(output)?;
        }
        Ok(())
    }

    fn on_tick<W: Write>(&mut self, output: &mut W) -> io::Result<()> {
        match self.session.tick() {
            Some(request) => {
                self.awaiting_confirmation = false;
                writeln!(output, "⏰ {}", TIME_UP_MESSAGE)?;
                self.dispatch(request);
                self.render(output)?;
            }
            None => {
                if let Some(time_left) = self.session.attempt().map(|a| a.time_left()) {
                    if should_announce(time_left) {
                        writeln!(output, "⏱  Time left: {}", format_time(time_left))?;
                    }
                }
            }
        }
        Ok(())
    }

    // ========== 输入 ==========

    fn handle_line<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<Flow> {
        let action = match parse_action(line) {
            Ok(action) => action,
            Err(e) => {
                writeln!(output, "❓ {}", e)?;
                return Ok(Flow::Continue);
            }
        };
        debug!("输入: {:?}", action);

        if self.awaiting_confirmation {
            self.awaiting_confirmation = false;
            match action {
                UserAction::Yes => {
                    let result = self.session.submit(true).map(|request| self.dispatch(request));
                    return self.after(result, output);
                }
                UserAction::No => {
                    writeln!(output, "Submission cancelled.")?;
                    return Ok(Flow::Continue);
                }
                _ => {}
            }
        }

        let result = match action {
            UserAction::Select(field, index) => self.session.select_option(field, index),
            UserAction::Start => self.session.request_start(),
            UserAction::Accept => self.session.acknowledge().map(|request| self.dispatch(request)),
            UserAction::Yes if self.session.screen() == Screen::Guidelines => {
                self.session.acknowledge().map(|request| self.dispatch(request))
            }
            UserAction::No if self.session.screen() == Screen::Guidelines => self.session.decline_guidelines(),
            UserAction::Next => self.session.next_question(),
            UserAction::Previous => self.session.previous_question(),
            UserAction::GoTo(number) => self.session.go_to_question(number),
            UserAction::Answer(text) => {
                debug!("✏️ 作答: {}", truncate_text(&text, 40));
                self.session.answer(text)
            }
            UserAction::Clear => self.session.answer(String::new()),
            UserAction::Submit => match self.session.submit(false) {
                Err(ActionError::Submit(SubmitRejection::ConfirmationRequired)) => {
                    self.awaiting_confirmation = true;
                    writeln!(output, "{}", CONFIRM_PROMPT)?;
                    return Ok(Flow::Continue);
                }
                other => other.map(|request| self.dispatch(request)),
            },
            UserAction::Yes | UserAction::No => {
                writeln!(output, "Nothing to confirm.")?;
                return Ok(Flow::Continue);
            }
            UserAction::Restart => {
                self.session.restart();
                Ok(())
            }
            UserAction::Help => {
                writeln!(output, "{}", HELP_TEXT)?;
                return Ok(Flow::Continue);
            }
            UserAction::Quit => {
                let resumable = self.session.screen() == Screen::Exam
                    && self.session.attempt().is_some_and(ExamAttempt::autosave_enabled);
                if resumable {
                    writeln!(output, "{}", PROGRESS_SAVED_MESSAGE)?;
                }
                return Ok(Flow::Quit);
            }
        };
        self.after(result, output)
    }

    fn after<W: Write>(&mut self, result: Result<(), ActionError>, output: &mut W) -> io::Result<Flow> {
        match result {
            Ok(()) => self.render(output)?,
            Err(e) => writeln!(output, "⚠️ {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn render<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "{}", views::render(self.session.phase()))
    }
}

/// 终端上运行的应用
pub type TerminalApp = App<Box<dyn SnapshotStore>, IntervalTicker>;

impl TerminalApp {
    /// 初始化应用
    ///
    /// 快照目录不可写时退回内存存储（不能跨进程恢复）
    pub fn initialize(config: &Config) -> AppResult<Self> {
        let store: Box<dyn SnapshotStore> = match std::fs::create_dir_all(&config.snapshot_dir) {
            Ok(()) => {
                let store = FileSnapshotStore::new(&config.snapshot_dir);
                info!("💾 快照文件: {}", store.path().display());
                Box::new(store)
            }
            Err(e) => {
                warn!(
                    "⚠️ 快照目录 {} 不可用，使用内存存储: {}",
                    config.snapshot_dir.display(),
                    e
                );
                Box::new(MemorySnapshotStore::new())
            }
        };

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，出卷和阅卷请求将会失败");
        }
        let provider: Arc<dyn CompletionProvider> = Arc::new(LlmService::new(config));
        let generator = ExamGenerator::new(Arc::clone(&provider), config.generation_model_name.clone());
        let evaluator = ExamEvaluator::new(provider, config.evaluation_model_name.clone());

        Ok(App::new(
            Session::recover(store),
            generator,
            evaluator,
            IntervalTicker::every_second(),
        ))
    }

    /// 在标准输入输出上运行
    pub async fn run_terminal(mut self) -> AppResult<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = io::stdout();
        self.run(stdin, &mut stdout).await?;
        Ok(())
    }
}
