use ai_exam_pro::error::LlmError;
use ai_exam_pro::infrastructure::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use ai_exam_pro::services::{CompletionProvider, CompletionRequest, ExamEvaluator, ExamGenerator, LlmService};
use ai_exam_pro::workflow::{ActionError, Phase, Request, Screen, Session, SubmitRejection};
use ai_exam_pro::{Config, EvaluationReport, Exam};
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

/// 依次返回预置的模型响应
struct CannedProvider {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    user_messages: Mutex<Vec<String>>,
}

impl CannedProvider {
    fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            user_messages: Mutex::new(Vec::new()),
        })
    }
}

impl CompletionProvider for CannedProvider {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>> {
        self.user_messages.lock().unwrap().push(request.user_message);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent { model: request.model }));
        futures::future::ready(next).boxed()
    }
}

fn exam_response(marks: &[u32]) -> String {
    let questions: Vec<_> = marks
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let id = i + 1;
            if i % 2 == 0 {
                json!({
                    "id": id, "text": format!("Which unit measures quantity {}?", id), "type": "mcq", "marks": m,
                    "options": [
                        {"value": "a", "label": "Newton"}, {"value": "b", "label": "Joule"},
                        {"value": "c", "label": "Watt"}, {"value": "d", "label": "Pascal"}
                    ]
                })
            } else {
                json!({"id": id, "text": format!("Explain concept {}.", id), "type": "long", "marks": m})
            }
        })
        .collect();
    json!({
        "title": "Physics Board Exam Preparation",
        "duration": 30,
        "totalMarks": marks.iter().sum::<u32>(),
        "questions": questions
    })
    .to_string()
}

fn report_response(exam: &Exam, score_of: impl Fn(u32) -> u32) -> String {
    let feedback: Vec<_> = exam
        .questions
        .iter()
        .map(|q| {
            json!({
                "questionId": q.id,
                "questionText": q.text,
                "studentAnswer": "…",
                "assignedScore": score_of(q.marks),
                "feedback": "Excellent work!"
            })
        })
        .collect();
    json!({
        "overallScore": 999,
        "strengths": ["Units", "Definitions", "Recall"],
        "weaknesses": ["Derivations", "Diagrams", "Numericals"],
        "recommendations": ["Practise derivations", "Draw diagrams", "Time yourself"],
        "detailedFeedback": feedback
    })
    .to_string()
}

/// 会话 + 服务，按编排层的方式执行请求
struct Harness {
    session: Session<Arc<MemorySnapshotStore>>,
    store: Arc<MemorySnapshotStore>,
    generator: ExamGenerator,
    evaluator: ExamEvaluator,
}

impl Harness {
    fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        let provider = CannedProvider::new(responses);
        let store = Arc::new(MemorySnapshotStore::new());
        Self {
            session: Session::new(Arc::clone(&store)),
            store,
            generator: ExamGenerator::new(provider.clone(), "fast-model"),
            evaluator: ExamEvaluator::new(provider, "strong-model"),
        }
    }

    async fn execute(&mut self, request: Request) -> bool {
        match request {
            Request::Generate { ticket, config } => {
                let result = self.generator.generate(&config).await;
                self.session.on_generated(ticket, result)
            }
            Request::Evaluate { ticket, exam, answers } => {
                let result = self.evaluator.evaluate(&exam, &answers).await;
                self.session.on_evaluated(ticket, result)
            }
        }
    }

    async fn start_exam(&mut self) {
        self.session.request_start().unwrap();
        let request = self.session.acknowledge().unwrap();
        assert!(self.execute(request).await);
    }

    fn exam(&self) -> Exam {
        self.session.attempt().unwrap().exam().clone()
    }

    fn answer_all(&mut self, count: usize) {
        for i in 0..count {
            self.session.go_to_question(i + 1).unwrap();
            let is_mcq = self.session.attempt().unwrap().current_question().unwrap().is_mcq();
            self.session
                .answer(if is_mcq { "a" } else { "A force changes the motion of a body." })
                .unwrap();
        }
    }
}

#[tokio::test]
async fn test_complete_practice_session() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[2, 8, 5, 5]))]);
    harness.start_exam().await;

    let exam = harness.exam();
    let marks: Vec<u32> = exam.questions.iter().map(|q| q.marks).collect();
    let ids: Vec<u32> = exam.questions.iter().map(|q| q.id).collect();
    assert_eq!(marks, vec![2, 5, 5, 8]);
    assert_eq!(ids, vec![1, 3, 4, 2]);
    for q in &exam.questions {
        assert_eq!(q.options.is_some(), q.is_mcq());
    }
    assert_eq!(harness.session.attempt().unwrap().time_left(), 1800);

    harness.answer_all(2);
    assert!(!harness.store.is_empty());

    let report = report_response(&exam, |marks| marks / 2);
    let provider = CannedProvider::new(vec![Ok(report)]);
    harness.evaluator = ExamEvaluator::new(provider.clone(), "strong-model");

    let request = assert_ok!(harness.session.submit(true));
    assert!(harness.store.is_empty());
    assert!(harness.execute(request).await);

    assert_eq!(harness.session.screen(), Screen::Report);
    let report: &EvaluationReport = harness.session.report().unwrap();
    assert_eq!(report.overall_score, 1 + 2 + 2 + 4);
    let payload = provider.user_messages.lock().unwrap()[0].clone();
    assert_eq!(payload.matches(r#""studentAnswer":"Not answered""#).count(), 2);
}

#[tokio::test]
async fn test_forced_submission_happens_once() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[1, 2, 3])), Ok(String::new())]);
    harness.start_exam().await;

    let mut forced = Vec::new();
    for _ in 0..1800 {
        if let Some(request) = harness.session.tick() {
            forced.push(request);
        }
    }
    assert_eq!(forced.len(), 1);
    assert_eq!(harness.session.screen(), Screen::Evaluating);

    // 交卷途中的计时和手动交卷都不会产生新请求
    for _ in 0..5 {
        assert!(harness.session.tick().is_none());
    }
    assert!(matches!(
        harness.session.submit(true),
        Err(ActionError::NotAvailable { screen: Screen::Evaluating, .. })
    ));
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_manual_submission_in_flight_at_time_up() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[1, 2, 3, 4, 5]))]);
    harness.start_exam().await;

    for _ in 0..1799 {
        assert!(harness.session.tick().is_none());
    }
    assert_eq!(harness.session.attempt().unwrap().time_left(), 1);

    harness.answer_all(3);
    let mut requests = vec![assert_ok!(harness.session.submit(true))];
    for _ in 0..5 {
        requests.extend(harness.session.tick());
    }

    assert_eq!(requests.len(), 1);
    assert!(matches!(&requests[0], Request::Evaluate { answers, .. } if answers.len() == 5));
    assert_eq!(harness.session.screen(), Screen::Evaluating);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_forced_submission_with_no_answers() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[2, 3]))]);
    harness.start_exam().await;
    let exam = harness.exam();
    harness.evaluator = ExamEvaluator::new(
        CannedProvider::new(vec![Ok(report_response(&exam, |_| 0))]),
        "strong-model",
    );

    let request = (0..1800).find_map(|_| harness.session.tick()).unwrap();
    match &request {
        Request::Evaluate { answers, .. } => assert!(answers.iter().all(|a| a.answer.is_empty())),
        other => panic!("unexpected request {:?}", other),
    }
    assert!(harness.execute(request).await);
    assert_eq!(harness.session.report().unwrap().overall_score, 0);
}

#[tokio::test]
async fn test_gating_requires_half_the_questions() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[1, 1, 2, 2, 4]))]);
    harness.start_exam().await;

    harness.answer_all(2);
    let rejection = assert_err!(harness.session.submit(true));
    assert!(matches!(
        rejection,
        ActionError::Submit(SubmitRejection::NotEnoughAnswers { answered: 2, required: 3 })
    ));

    harness.answer_all(3);
    assert!(matches!(
        harness.session.submit(false),
        Err(ActionError::Submit(SubmitRejection::ConfirmationRequired))
    ));
    assert_ok!(harness.session.submit(true));
}

#[tokio::test]
async fn test_restart_twice_returns_to_empty_config() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[1, 2]))]);
    harness.start_exam().await;
    harness.answer_all(1);

    harness.session.restart();
    harness.session.restart();
    assert_eq!(*harness.session.phase(), Phase::default());
    assert!(harness.store.is_empty());
    assert!(harness.session.attempt().is_none());
}

#[tokio::test]
async fn test_result_arriving_after_restart_is_ignored() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[1, 2]))]);
    harness.session.request_start().unwrap();
    let request = harness.session.acknowledge().unwrap();

    harness.session.restart();
    assert!(!harness.execute(request).await);
    assert_eq!(harness.session.screen(), Screen::Config);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_generation_failure_returns_to_config() {
    let mut harness = Harness::new(vec![Ok("I'm sorry, I can't do that.".to_string())]);
    harness.session.request_start().unwrap();
    let request = harness.session.acknowledge().unwrap();
    assert!(harness.execute(request).await);

    match harness.session.phase() {
        Phase::Config { error: Some(error), .. } => assert!(error.contains("check your API key")),
        other => panic!("unexpected phase {:?}", other),
    }
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_evaluation_failure_keeps_answers() {
    let mut harness = Harness::new(vec![Ok(exam_response(&[1, 2])), Ok("not json".to_string())]);
    harness.start_exam().await;
    harness.answer_all(2);
    for _ in 0..60 {
        harness.session.tick();
    }

    let request = harness.session.submit(true).unwrap();
    assert!(harness.execute(request).await);

    assert_eq!(harness.session.screen(), Screen::Exam);
    let attempt = harness.session.attempt().unwrap();
    assert_eq!(attempt.answered_count(), 2);
    assert_eq!(attempt.time_left(), 1740);
    assert!(harness.session.timer_running());
}

#[tokio::test]
async fn test_interrupted_attempt_resumes_from_disk() {
    let dir = std::env::temp_dir().join(format!(
        "ai_exam_pro_resume_{}_{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let provider = CannedProvider::new(vec![Ok(exam_response(&[3, 1]))]);
    let generator = ExamGenerator::new(provider, "fast-model");

    {
        let mut session = Session::new(FileSnapshotStore::new(&dir));
        session.request_start().unwrap();
        let Request::Generate { ticket, config } = session.acknowledge().unwrap() else {
            panic!("expected a generation request");
        };
        session.on_generated(ticket, generator.generate(&config).await);
        session.answer("b").unwrap();
        for _ in 0..30 {
            session.tick();
        }
    }

    let session = Session::recover(FileSnapshotStore::new(&dir));
    assert_eq!(session.screen(), Screen::Exam);
    let attempt = session.attempt().unwrap();
    assert_eq!(attempt.time_left(), 1770);
    assert_eq!(attempt.exam().questions[0].marks, 1);
    let first = attempt.exam().questions[0].id;
    assert_eq!(attempt.answer_for(first), Some("b"));
    assert_eq!(attempt.answered_count(), 1);

    // 损坏的快照视为没有保存的考试
    std::fs::write(FileSnapshotStore::new(&dir).path(), "{ not json").unwrap();
    let session = Session::recover(FileSnapshotStore::new(&dir));
    assert_eq!(session.screen(), Screen::Config);

    FileSnapshotStore::new(&dir).clear().unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

/// 测试真实的出卷请求（需要 LLM_API_KEY）
#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_generate_with_live_model() {
    let config = Config::load().unwrap();
    let generator = ExamGenerator::new(Arc::new(LlmService::new(&config)), config.generation_model_name.clone());

    let exam = generator
        .generate(&ai_exam_pro::models::ConfigDraft::default().to_config())
        .await
        .expect("出卷失败");

    println!("试卷: {} ({} 道题)", exam.title, exam.questions.len());
    assert!(!exam.questions.is_empty());
}
