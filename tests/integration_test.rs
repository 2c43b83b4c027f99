//! 针对本地假后端的端到端测试
//!
//! 假后端用 axum 实现，记录收到的请求，服务端计数规则与真实后端一致：
//! 每个测验最多重新生成 5 次、删除 1 次。

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use quiz_admin::clients::QuizClient;
use quiz_admin::config::{Config, QuotaLimits};
use quiz_admin::error::{ApiError, AppError, QuotaError, ValidationError};
use quiz_admin::infrastructure::HttpExecutor;
use quiz_admin::models::{JobDocument, QuestionPatch, QuizJob, QuizStatus};
use quiz_admin::orchestrator::App;
use quiz_admin::services::results;
use quiz_admin::validation::PageRangeErrorKind;
use quiz_admin::workflow::{EditSession, JobCtx, QuizFlow};
use quiz_admin::Question;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

const SERVER_MAX_REGENERATIONS: u32 = 5;
const SERVER_MAX_DELETIONS: u32 = 1;

// ========== 假后端 ==========

struct StoredQuiz {
    id: String,
    title: String,
    description: Option<String>,
    published: bool,
    questions: Vec<Value>,
    regenerations_used: u32,
    deletions_used: u32,
}

impl StoredQuiz {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "status": if self.published { "published" } else { "draft" },
            "questions": self.questions,
            "quota": {
                "regenerations_used": self.regenerations_used,
                "deletions_used": self.deletions_used,
            },
        })
    }
}

#[derive(Default)]
struct Backend {
    next_id: u32,
    quizzes: HashMap<String, StoredQuiz>,
    create_calls: usize,
    auth_headers: Vec<String>,
    uploads: Vec<(String, String)>,
    generate_requests: Vec<Value>,
    update_requests: Vec<Value>,
    regenerate_calls: usize,
    delete_calls: usize,
    flaky_remaining: u32,
    flaky_calls: u32,
}

type Shared = Arc<Mutex<Backend>>;
type ApiFailure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> ApiFailure {
    (status, Json(json!({ "message": message })))
}

fn not_found() -> ApiFailure {
    failure(StatusCode::NOT_FOUND, "quiz not found")
}

fn mcq(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "question": text,
        "type": "multiple_choice",
        "options": ["甲", "乙", "丙"],
        "correct_answer": 0,
    })
}

async fn create_quiz(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut backend = state.lock().unwrap();
    backend.create_calls += 1;
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        backend
            .auth_headers
            .push(auth.to_str().unwrap_or_default().to_string());
    }

    backend.next_id += 1;
    let id = format!("quiz-{}", backend.next_id);
    let quiz = StoredQuiz {
        id: id.clone(),
        title: body["title"].as_str().unwrap_or_default().to_string(),
        description: body["description"].as_str().map(str::to_string),
        published: false,
        questions: Vec::new(),
        regenerations_used: 0,
        deletions_used: 0,
    };
    let response = json!({ "data": quiz.to_json() });
    backend.quizzes.insert(id, quiz);

    (StatusCode::CREATED, Json(response))
}

async fn list_quizzes(State(state): State<Shared>) -> Json<Value> {
    let backend = state.lock().unwrap();
    let mut items: Vec<Value> = backend
        .quizzes
        .values()
        .map(|quiz| {
            json!({
                "id": quiz.id,
                "title": quiz.title,
                "status": if quiz.published { "published" } else { "draft" },
                "question_count": quiz.questions.len(),
            })
        })
        .collect();
    items.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    Json(json!({ "quizzes": items }))
}

async fn get_quiz(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    let backend = state.lock().unwrap();
    let quiz = backend.quizzes.get(&id).ok_or_else(not_found)?;
    Ok(Json(json!({ "data": quiz.to_json() })))
}

async fn update_quiz(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    let mut backend = state.lock().unwrap();
    backend.update_requests.push(body.clone());
    let quiz = backend.quizzes.get_mut(&id).ok_or_else(not_found)?;

    if let Some(title) = body["title"].as_str() {
        quiz.title = title.to_string();
    }
    if let Some(description) = body["description"].as_str() {
        quiz.description = Some(description.to_string());
    }
    if let Some(questions) = body["questions"].as_array() {
        quiz.questions = questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let mut question = question.clone();
                if question["id"].as_str().is_none() {
                    question["id"] = json!(format!("q-new-{}", index + 1));
                }
                question
            })
            .collect();
    }

    Ok(Json(quiz.to_json()))
}

async fn upload_document(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiFailure> {
    let mut backend = state.lock().unwrap();
    if !backend.quizzes.contains_key(&id) {
        return Err(not_found());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    backend
        .uploads
        .push((content_type, String::from_utf8_lossy(&body).to_string()));
    let document_id = backend.uploads.len();

    Ok(Json(json!({ "data": { "id": document_id } })))
}

async fn generate(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    let mut backend = state.lock().unwrap();
    backend.generate_requests.push(body.clone());
    let quiz = backend.quizzes.get_mut(&id).ok_or_else(not_found)?;

    let count = body["num_questions"].as_u64().unwrap_or(0);
    quiz.questions = (1..=count)
        .map(|n| mcq(&format!("q{}", n), &format!("第 {} 题", n)))
        .collect();

    Ok(Json(json!({ "success": true })))
}

async fn publish(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    let mut backend = state.lock().unwrap();
    let quiz = backend.quizzes.get_mut(&id).ok_or_else(not_found)?;
    quiz.published = true;
    Ok(Json(json!({ "success": true, "quiz": quiz.to_json() })))
}

async fn regenerate(
    State(state): State<Shared>,
    Path((id, question_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiFailure> {
    let mut backend = state.lock().unwrap();
    backend.regenerate_calls += 1;
    let quiz = backend.quizzes.get_mut(&id).ok_or_else(not_found)?;

    if quiz.regenerations_used >= SERVER_MAX_REGENERATIONS {
        return Err(failure(StatusCode::FORBIDDEN, "regeneration limit reached"));
    }
    let slot = quiz
        .questions
        .iter_mut()
        .find(|q| q["id"].as_str() == Some(question_id.as_str()))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "question not found"))?;

    quiz.regenerations_used += 1;
    let fresh = mcq(
        &question_id,
        &format!("重新生成的题目 #{}", quiz.regenerations_used),
    );
    *slot = fresh.clone();

    Ok(Json(json!({
        "question": fresh,
        "regenerations_used": quiz.regenerations_used,
        "deletions_used": quiz.deletions_used,
    })))
}

async fn delete_question(
    State(state): State<Shared>,
    Path((id, question_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    let mut backend = state.lock().unwrap();
    backend.delete_calls += 1;
    let quiz = backend.quizzes.get_mut(&id).ok_or_else(not_found)?;

    if quiz.deletions_used >= SERVER_MAX_DELETIONS {
        return Err(failure(StatusCode::FORBIDDEN, "deletion limit reached"));
    }
    quiz.questions
        .retain(|q| q["id"].as_str() != Some(question_id.as_str()));
    quiz.deletions_used += 1;

    Ok(StatusCode::NO_CONTENT)
}

async fn attempts(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({
        "data": [
            {
                "id": 1,
                "student_name": "张三",
                "score": 8,
                "max_score": 10,
                "submitted_at": "2026-03-01T08:00:00Z",
                "answers": [
                    { "question_id": "q1", "is_correct": true },
                    { "question_id": "q2", "is_correct": false }
                ]
            },
            {
                "id": 2,
                "student": { "name": "李四" },
                "score": "4",
                "total": 10,
                "submitted_at": "2026-03-01T09:00:00Z",
                "answers": [{ "question_id": "q1", "correct": true }]
            },
            {
                "id": 3,
                "student_name": "张三",
                "score": 10,
                "max_score": 10,
                "submitted_at": "2026-03-02T08:00:00Z",
                "answers": [
                    { "question_id": "q1", "is_correct": true },
                    { "question_id": "q2", "is_correct": true }
                ]
            }
        ]
    }))
}

async fn flaky(State(state): State<Shared>) -> Response {
    let mut backend = state.lock().unwrap();
    backend.flaky_calls += 1;
    if backend.flaky_remaining > 0 {
        backend.flaky_remaining -= 1;
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "0")],
            "slow down",
        )
            .into_response();
    }
    Json(json!({ "ok": true })).into_response()
}

async fn throttled() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "0")]).into_response()
}

async fn broken() -> ApiFailure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "boom" })),
    )
}

async fn spawn_backend(state: Shared) -> String {
    let app = Router::new()
        .route("/api/quizzes", get(list_quizzes).post(create_quiz))
        .route("/api/quizzes/:id", get(get_quiz).put(update_quiz))
        .route("/api/quizzes/:id/documents", post(upload_document))
        .route("/api/quizzes/:id/generate", post(generate))
        .route("/api/quizzes/:id/publish", post(publish))
        .route(
            "/api/quizzes/:id/questions/:question_id/regenerate",
            post(regenerate),
        )
        .route(
            "/api/quizzes/:id/questions/:question_id",
            delete(delete_question),
        )
        .route("/api/quizzes/:id/attempts", get(attempts))
        .route("/api/flaky", get(flaky))
        .route("/api/throttled", get(throttled))
        .route("/api/broken", get(broken))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

// ========== 测试辅助 ==========

fn test_config(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        api_token: "secret-token".to_string(),
        max_retries: 3,
        retry_delay_ms: 10,
        ..Config::default()
    }
}

async fn setup() -> (Shared, Config, QuizClient) {
    let state: Shared = Arc::new(Mutex::new(Backend::default()));
    let base_url = spawn_backend(state.clone()).await;
    let config = test_config(&base_url);
    let client = QuizClient::new(HttpExecutor::new(&config).unwrap());
    (state, config, client)
}

/// 直接在后端放一份测验，模拟之前的会话留下的数据
fn seed_quiz(state: &Shared, question_count: usize, regenerations_used: u32, deletions_used: u32) -> String {
    let mut backend = state.lock().unwrap();
    backend.next_id += 1;
    let id = format!("quiz-{}", backend.next_id);
    backend.quizzes.insert(
        id.clone(),
        StoredQuiz {
            id: id.clone(),
            title: "细胞结构".to_string(),
            description: None,
            published: false,
            questions: (1..=question_count)
                .map(|n| mcq(&format!("q{}", n), &format!("第 {} 题", n)))
                .collect(),
            regenerations_used,
            deletions_used,
        },
    );
    id
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quiz_admin_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(dir: &std::path::Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

async fn flow_client_list(config: &Config) -> Vec<quiz_admin::models::QuizSummary> {
    let client = QuizClient::new(HttpExecutor::new(config).unwrap());
    client.list_quizzes().await.unwrap()
}

fn doc(path: &str, page_range: Option<&str>) -> JobDocument {
    JobDocument {
        path: path.to_string(),
        page_range: page_range.map(str::to_string),
    }
}

fn job(documents: Vec<JobDocument>, num_questions: u32, publish: bool) -> QuizJob {
    QuizJob {
        title: "光合作用".to_string(),
        description: Some("第三章练习".to_string()),
        num_questions,
        publish,
        documents,
        file_path: None,
    }
}

// ========== 创建流程 ==========

#[tokio::test]
async fn test_create_flow_sends_page_ranges_verbatim() {
    let (state, config, client) = setup().await;
    let dir = temp_dir("create_flow");
    let a = write_file(&dir, "a.pdf", "%PDF-1.4 chapter one");
    let b = write_file(&dir, "b.pdf", "%PDF-1.4 chapter two");
    let notes = write_file(&dir, "notes.docx", "word document");

    let job = job(
        vec![
            doc(&a, Some("1-3,7")),
            doc(&b, None),
            doc(&notes, Some("2")),
        ],
        4,
        false,
    );

    let flow = QuizFlow::new(client, &config);
    let outcome = assert_ok!(flow.run(&job, &JobCtx::new(1, "bio.toml")).await);

    assert_eq!(outcome.uploaded, 3);
    assert!(!outcome.published);
    assert_eq!(outcome.quiz.status, QuizStatus::Draft);
    assert_eq!(outcome.quiz.questions.len(), 4);
    // 下标形式的答案被换成选项文本
    assert_eq!(outcome.quiz.questions[0].correct_answer.as_deref(), Some("甲"));

    let backend = state.lock().unwrap();
    assert_eq!(backend.create_calls, 1);
    assert_eq!(backend.auth_headers, vec!["Bearer secret-token".to_string()]);

    assert_eq!(backend.uploads.len(), 3);
    for (content_type, _) in &backend.uploads {
        assert!(content_type.starts_with("multipart/form-data"));
    }
    for name in ["a.pdf", "b.pdf", "notes.docx"] {
        let needle = format!("filename=\"{}\"", name);
        assert!(backend.uploads.iter().any(|(_, body)| body.contains(&needle)));
    }

    assert_eq!(
        backend.generate_requests,
        vec![json!({
            "documents": [{ "filename": "a.pdf", "page_range": "1-3,7" }],
            "num_questions": 4,
        })]
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_create_flow_publishes_when_asked() {
    let (state, config, client) = setup().await;
    let dir = temp_dir("publish_flow");
    let a = write_file(&dir, "lecture.pdf", "%PDF-1.4");

    let flow = QuizFlow::new(client, &config);
    let outcome = flow
        .run(&job(vec![doc(&a, Some("2-4"))], 3, true), &JobCtx::new(1, "p.toml"))
        .await
        .unwrap();

    assert!(outcome.published);
    assert!(outcome.quiz.is_published());
    assert!(state.lock().unwrap().quizzes[&outcome.quiz.id].published);

    let summaries = flow_client_list(&config).await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, QuizStatus::Published);
    assert_eq!(summaries[0].question_count, 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_invalid_range_makes_no_requests() {
    let (state, config, client) = setup().await;
    let dir = temp_dir("invalid_range");
    let a = write_file(&dir, "a.pdf", "%PDF-1.4");
    let b = write_file(&dir, "b.pdf", "%PDF-1.4");

    let flow = QuizFlow::new(client, &config);
    let job = job(vec![doc(&a, Some("1-2")), doc(&b, Some("0,3"))], 5, false);
    let err = assert_err!(flow.run(&job, &JobCtx::new(1, "bad.toml")).await);

    match err {
        AppError::Validation(ValidationError::PageRange { filename, source }) => {
            assert_eq!(filename, "b.pdf");
            assert_eq!(source.kind(), PageRangeErrorKind::NonPositivePage);
        }
        other => panic!("意外的错误: {other}"),
    }

    let backend = state.lock().unwrap();
    assert_eq!(backend.create_calls, 0);
    assert!(backend.uploads.is_empty());
    assert!(backend.generate_requests.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

// ========== 编辑会话 ==========

#[tokio::test]
async fn test_save_sends_merged_question_list() {
    let (state, _config, client) = setup().await;
    let quiz_id = seed_quiz(&state, 2, 0, 0);

    let mut session = EditSession::open(client, &quiz_id, QuotaLimits::default())
        .await
        .unwrap();
    session
        .edit_question("q1", &QuestionPatch::text("叶绿体位于哪里?"))
        .unwrap();
    session
        .add_question(Question::short_answer("解释光反应的产物"))
        .unwrap();
    session.set_title("光合作用 (修订)");

    assert!(session.save().await.unwrap());
    assert!(!session.is_dirty());
    // 没有新修改时不再发送
    assert!(!session.save().await.unwrap());

    let backend = state.lock().unwrap();
    assert_eq!(backend.update_requests.len(), 1);
    let update = &backend.update_requests[0];
    assert_eq!(update["title"], "光合作用 (修订)");
    let questions = update["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["question"], "叶绿体位于哪里?");
    assert_eq!(questions[1]["question"], "第 2 题");
    assert!(questions[2].get("id").is_none());

    // 采用服务端返回的测验作为新基线
    assert_eq!(session.baseline().title, "光合作用 (修订)");
    assert_eq!(session.questions()[2].id.as_deref(), Some("q-new-3"));
}

#[tokio::test]
async fn test_quota_follows_server_counters() {
    let (state, _config, client) = setup().await;
    // 之前的会话已经用掉 4 次重新生成
    let quiz_id = seed_quiz(&state, 3, 4, 0);

    let mut session = EditSession::open(client.clone(), &quiz_id, QuotaLimits::default())
        .await
        .unwrap();
    assert_eq!(session.quota().remaining_regenerations(), 1);
    assert_eq!(session.quota().remaining_deletions(), 1);

    let regenerated = session.regenerate_question("q1").await.unwrap();
    assert_eq!(regenerated.text, "重新生成的题目 #5");
    assert_eq!(session.quota().usage().regenerations_used, 5);

    let err = session.regenerate_question("q2").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Quota(QuotaError::RegenerationsExhausted { limit: 5 })
    ));

    // 204 无响应体，计数从测验记录重新读取
    session.delete_question("q3").await.unwrap();
    assert_eq!(session.quota().usage().deletions_used, 1);
    assert_eq!(session.questions().len(), 2);

    let err = session.delete_question("q2").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Quota(QuotaError::DeletionsExhausted { limit: 1 })
    ));

    {
        let backend = state.lock().unwrap();
        assert_eq!(backend.regenerate_calls, 1);
        assert_eq!(backend.delete_calls, 1);
    }

    // 重新打开不会重置配额
    let reopened = EditSession::open(client, &quiz_id, QuotaLimits::default())
        .await
        .unwrap();
    assert_eq!(reopened.quota().remaining_regenerations(), 0);
    assert_eq!(reopened.quota().remaining_deletions(), 0);
}

#[tokio::test]
async fn test_title_change_saves_despite_server_side_answer_mismatch() {
    let (state, _config, client) = setup().await;
    let quiz_id = seed_quiz(&state, 1, 0, 0);
    state
        .lock()
        .unwrap()
        .quizzes
        .get_mut(&quiz_id)
        .unwrap()
        .questions
        .push(json!({
            "id": "q-odd",
            "question": "意大利的首都?",
            "type": "multiple_choice",
            "options": ["Paris", "Rome"],
            "correct_answer": "Z",
        }));

    let mut session = EditSession::open(client, &quiz_id, QuotaLimits::default())
        .await
        .unwrap();
    assert_eq!(session.questions()[1].correct_answer.as_deref(), Some("Z"));
    session.set_title("欧洲地理");

    assert_ok!(session.save().await);

    let backend = state.lock().unwrap();
    assert_eq!(backend.update_requests.len(), 1);
    let questions = backend.update_requests[0]["questions"].as_array().unwrap();
    assert_eq!(questions[1]["correct_answer"], "Z");
}

#[tokio::test]
async fn test_publish_saves_pending_edits_first() {
    let (state, _config, client) = setup().await;
    let quiz_id = seed_quiz(&state, 2, 0, 0);

    let mut session = EditSession::open(client, &quiz_id, QuotaLimits::default())
        .await
        .unwrap();
    session.set_description("期中复习");

    let quiz = session.publish().await.unwrap();
    assert_eq!(quiz.status, QuizStatus::Published);
    assert_eq!(quiz.description.as_deref(), Some("期中复习"));

    let backend = state.lock().unwrap();
    assert_eq!(backend.update_requests.len(), 1);
    assert!(backend.quizzes[&quiz_id].published);
}

// ========== 成绩 ==========

#[tokio::test]
async fn test_results_summary_from_attempts() {
    let (state, _config, client) = setup().await;
    let quiz_id = seed_quiz(&state, 3, 0, 0);

    let quiz = client.fetch_quiz(&quiz_id).await.unwrap();
    let attempts = client.fetch_attempts(&quiz_id).await.unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[1].student, "李四");

    let summary = results::summarize(&attempts, Some(&quiz), 60.0);
    assert_eq!(summary.total_attempts, 3);
    assert_eq!(summary.unique_students, 2);
    assert!((summary.average_percent - 220.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.highest_percent, 100.0);
    assert_eq!(summary.lowest_percent, 40.0);
    assert!((summary.pass_rate - 200.0 / 3.0).abs() < 1e-9);

    let ids: Vec<&str> = summary
        .questions
        .iter()
        .map(|q| q.question_id.as_str())
        .collect();
    assert_eq!(ids, vec!["q1", "q2", "q3"]);
    assert_eq!(summary.questions[0].correct, 3);
    assert_eq!(summary.questions[1].answered, 2);
    assert_eq!(summary.questions[2].answered, 0);

    assert_eq!(summary.students[0].student, "张三");
    assert_eq!(summary.students[0].attempts, 2);
    assert_eq!(summary.students[0].best_percent, 100.0);
}

// ========== HTTP 行为 ==========

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let (state, _config, client) = setup().await;
    state.lock().unwrap().flaky_remaining = 2;

    let body = client.executor().get("/api/flaky").await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
    assert_eq!(state.lock().unwrap().flaky_calls, 3);

    let err = client.executor().get("/api/throttled").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Api(ApiError::RateLimited { attempts: 4, .. })
    ));
}

#[tokio::test]
async fn test_error_responses_carry_server_message() {
    let (_state, _config, client) = setup().await;

    match client.fetch_quiz("missing").await.unwrap_err() {
        AppError::Api(ApiError::BadResponse {
            status, message, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(message.as_deref(), Some("quiz not found"));
        }
        other => panic!("意外的错误: {other}"),
    }

    match client.executor().get("/api/broken").await.unwrap_err() {
        AppError::Api(ApiError::BadResponse {
            status, message, ..
        }) => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("boom"));
        }
        other => panic!("意外的错误: {other}"),
    }
}

// ========== 批量处理 ==========

#[tokio::test]
async fn test_app_runs_jobs_and_records_failures() {
    let (state, config, _client) = setup().await;
    let dir = temp_dir("app_run");
    let jobs = dir.join("jobs");
    std::fs::create_dir_all(&jobs).unwrap();
    write_file(&jobs, "ch1.pdf", "%PDF-1.4");

    write_file(
        &jobs,
        "a_good.toml",
        r#"
title = "第一章"
num_questions = 2
publish = true

[[documents]]
path = "ch1.pdf"
page_range = "1-2"
"#,
    );
    write_file(
        &jobs,
        "b_bad.toml",
        r#"
title = "第二章"

[[documents]]
path = "ch1.pdf"
page_range = "4-2"
"#,
    );

    let warn_file = dir.join("warn.txt");
    let config = Config {
        jobs_folder: jobs.to_string_lossy().to_string(),
        warn_file: warn_file.to_string_lossy().to_string(),
        output_log_file: dir.join("output.txt").to_string_lossy().to_string(),
        max_concurrent_jobs: 2,
        report_quiz_ids: vec!["quiz-1".to_string()],
        ..config
    };

    let app = App::initialize(config).await.unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 1);

    let warnings = std::fs::read_to_string(&warn_file).unwrap();
    assert!(warnings.contains("b_bad.toml"));
    assert!(!warnings.contains("a_good.toml"));

    let backend = state.lock().unwrap();
    assert_eq!(backend.create_calls, 1);
    assert!(backend.quizzes["quiz-1"].published);
    assert_eq!(
        backend.generate_requests[0]["documents"],
        json!([{ "filename": "ch1.pdf", "page_range": "1-2" }])
    );

    let _ = std::fs::remove_dir_all(&dir);
}
