// Allow dead code: each test binary uses a different subset of the stub
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;

use leetreview_core::auth::MemoryTokenStore;
use leetreview_core::{Gateway, RedirectSlot, SessionManager};

/// Review stage intervals the real service uses, in days
const STAGE_INTERVALS: [i64; 5] = [1, 2, 4, 7, 15];

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

#[derive(Clone)]
pub struct StubUser {
    pub password: String,
    pub notification_time: String,
    pub timezone: String,
}

/// Holds `/auth/users/me` responses (read and update) after the server has
/// processed them, until the test releases one
#[derive(Clone, Default)]
pub struct ProfileGate {
    /// Signalled when a profile response is ready and waiting
    pub reached: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ProfileGate {
    async fn pass(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct StubData {
    pub users: HashMap<String, StubUser>,
    pub tokens: HashMap<String, String>,
    pub next_token: u64,
    /// Issue this token instead of generated ones
    pub fixed_token: Option<String>,
    /// Answer profile updates with 500
    pub fail_updates: bool,
    pub problems: Vec<Value>,
    pub next_problem_id: i64,
    /// `Authorization` header of every request, in order
    pub auth_headers: Vec<Option<String>>,
    pub profile_gate: Option<ProfileGate>,
}

#[derive(Clone, Default)]
pub struct StubState(Arc<Mutex<StubData>>);

impl StubState {
    pub fn lock(&self) -> MutexGuard<'_, StubData> {
        self.0.lock().unwrap()
    }
}

impl StubData {
    fn issue_token(&mut self, email: &str) -> String {
        self.next_token += 1;
        let token = self
            .fixed_token
            .clone()
            .unwrap_or_else(|| format!("token-{}", self.next_token));
        self.tokens.insert(token.clone(), email.to_string());
        token
    }

    fn authenticate(&mut self, headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
        let raw = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.push(raw.clone());

        raw.as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|t| self.tokens.get(t).cloned())
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    fn profile(&self, email: &str) -> Value {
        let user = &self.users[email];
        json!({
            "email": email,
            "notification_time": user.notification_time,
            "timezone": user.timezone,
        })
    }
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    notification_time: Option<String>,
    timezone: Option<String>,
}

#[derive(Deserialize)]
struct UpdateQuery {
    notification_time: Option<String>,
    timezone: Option<String>,
}

#[derive(Deserialize)]
struct ResetQuery {
    email: String,
    old_password: String,
    new_password: String,
}

#[derive(Deserialize)]
struct ListQuery {
    difficulty: Option<String>,
    status: Option<String>,
    skip: Option<usize>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct AddBody {
    problem_number: i64,
}

#[derive(Deserialize)]
struct EditBody {
    title: Option<String>,
    difficulty: Option<String>,
}

#[derive(Deserialize)]
struct PostponeQuery {
    days: Option<i64>,
}

async fn token(State(state): State<StubState>, Form(form): Form<LoginForm>) -> Reply {
    let mut data = state.lock();
    let valid = data
        .users
        .get(&form.username)
        .is_some_and(|u| u.password == form.password);
    if !valid {
        return Err(reject(StatusCode::UNAUTHORIZED, "Incorrect email or password"));
    }
    let token = data.issue_token(&form.username);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn register(State(state): State<StubState>, Json(body): Json<RegisterBody>) -> Reply {
    let mut data = state.lock();
    if data.users.contains_key(&body.email) {
        return Err(reject(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    data.users.insert(
        body.email.clone(),
        StubUser {
            password: body.password,
            notification_time: body.notification_time.unwrap_or_else(|| "09:00".to_string()),
            timezone: body.timezone.unwrap_or_else(|| "UTC".to_string()),
        },
    );
    let token = data.issue_token(&body.email);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn me(State(state): State<StubState>, headers: HeaderMap) -> Reply {
    let (profile, gate) = {
        let mut data = state.lock();
        let email = data.authenticate(&headers)?;
        (data.profile(&email), data.profile_gate.clone())
    };
    if let Some(gate) = gate {
        gate.pass().await;
    }
    Ok(Json(profile))
}

async fn update_me(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(query): Query<UpdateQuery>,
) -> Reply {
    let (row, gate) = {
        let mut data = state.lock();
        let email = data.authenticate(&headers)?;
        if data.fail_updates {
            return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable"));
        }
        let user = data.users.get_mut(&email).unwrap();
        if let Some(time) = query.notification_time {
            user.notification_time = time;
        }
        if let Some(tz) = query.timezone {
            user.timezone = tz;
        }
        // The real service echoes the whole row, with seconds on the time column
        let row = json!({
            "user_id": 1,
            "email": email,
            "hashed_password": "$2b$12$hash",
            "notification_time": format!("{}:00", user.notification_time),
            "timezone": user.timezone,
            "is_active": true,
        });
        (row, data.profile_gate.clone())
    };
    if let Some(gate) = gate {
        gate.pass().await;
    }
    Ok(Json(row))
}

async fn reset_password(State(state): State<StubState>, Query(query): Query<ResetQuery>) -> Reply {
    let mut data = state.lock();
    match data.users.get_mut(&query.email) {
        Some(user) if user.password == query.old_password => {
            user.password = query.new_password;
            Ok(Json(json!({ "message": "Password updated successfully" })))
        }
        _ => Err(reject(StatusCode::UNAUTHORIZED, "Incorrect email or password")),
    }
}

async fn list_problems(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    let filtered: Vec<Value> = data
        .problems
        .iter()
        .filter(|p| query.difficulty.as_deref().map_or(true, |d| p["difficulty"] == d))
        .filter(|p| match query.status.as_deref() {
            Some("active") => p["is_active"] == true,
            Some("completed") => p["is_active"] == false,
            _ => true,
        })
        .cloned()
        .collect();
    let total = filtered.len();
    let page: Vec<Value> = filtered
        .into_iter()
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(10))
        .collect();
    Ok(Json(json!({ "total": total, "problems": page })))
}

async fn add_problem(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    if data
        .problems
        .iter()
        .any(|p| p["leetcode_number"] == body.problem_number)
    {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Problem already exists in your review list",
        ));
    }
    data.next_problem_id += 1;
    let today = Utc::now().date_naive().to_string();
    let problem = json!({
        "problem_id": data.next_problem_id,
        "leetcode_number": body.problem_number,
        "title": format!("Problem {}", body.problem_number),
        "difficulty": if body.problem_number % 2 == 0 { "Medium" } else { "Easy" },
        "first_study_date": today,
        "next_review_date": today,
        "stage": 0,
        "is_active": true,
    });
    data.problems.push(problem.clone());
    Ok(Json(problem))
}

fn find_problem(data: &mut StubData, id: i64) -> Result<&mut Value, (StatusCode, Json<Value>)> {
    data.problems
        .iter_mut()
        .find(|p| p["problem_id"] == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Problem not found"))
}

async fn edit_problem(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<EditBody>,
) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    let problem = find_problem(&mut data, id)?;
    if let Some(title) = body.title {
        problem["title"] = json!(title);
    }
    if let Some(difficulty) = body.difficulty {
        problem["difficulty"] = json!(difficulty);
    }
    Ok(Json(problem.clone()))
}

async fn review_queue(State(state): State<StubState>, headers: HeaderMap) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    let today = Utc::now().date_naive().to_string();
    let due: Vec<Value> = data
        .problems
        .iter()
        .filter(|p| p["is_active"] == true)
        .filter(|p| p["next_review_date"].as_str().is_some_and(|d| d <= today.as_str()))
        .cloned()
        .collect();
    Ok(Json(json!(due)))
}

async fn complete(State(state): State<StubState>, headers: HeaderMap, Path(id): Path<i64>) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    let problem = find_problem(&mut data, id)?;
    let stage = problem["stage"].as_i64().unwrap_or(0);
    if stage >= 5 {
        problem["is_active"] = json!(false);
    } else {
        let next = stage + 1;
        let date = Utc::now().date_naive() + Duration::days(STAGE_INTERVALS[(next - 1) as usize]);
        problem["stage"] = json!(next);
        problem["next_review_date"] = json!(date.to_string());
    }
    Ok(Json(problem.clone()))
}

async fn postpone(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<PostponeQuery>,
) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    let days = query.days.unwrap_or(1);
    let problem = find_problem(&mut data, id)?;
    let date = Utc::now().date_naive() + Duration::days(days);
    problem["next_review_date"] = json!(date.to_string());
    Ok(Json(problem.clone()))
}

async fn stats(State(state): State<StubState>, headers: HeaderMap) -> Reply {
    let mut data = state.lock();
    data.authenticate(&headers)?;
    let total = data.problems.len();
    let active = data.problems.iter().filter(|p| p["is_active"] == true).count();
    let mut distribution: HashMap<String, u64> = HashMap::new();
    for p in &data.problems {
        let d = p["difficulty"].as_str().unwrap_or("Unknown").to_string();
        *distribution.entry(d).or_default() += 1;
    }
    Ok(Json(json!({
        "total_problems": total,
        "active_problems": active,
        "completed_problems": total - active,
        "difficulty_distribution": distribution,
    })))
}

fn router(state: StubState) -> Router {
    Router::new()
        .route("/api/auth/token", post(token))
        .route("/api/auth/register", post(register))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/users/me", get(me).put(update_me))
        .route("/api/problems", get(list_problems).post(add_problem))
        .route("/api/problems/review", get(review_queue))
        .route("/api/problems/stats", get(stats))
        .route("/api/problems/{id}", put(edit_problem))
        .route("/api/problems/{id}/complete", post(complete))
        .route("/api/problems/{id}/postpone", post(postpone))
        .with_state(state)
}

pub struct StubServer {
    pub base_url: String,
    pub state: StubState,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn spawn() -> Self {
        let state = StubState::default();
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.state.lock().users.insert(
            email.to_string(),
            StubUser {
                password: password.to_string(),
                notification_time: "09:00".to_string(),
                timezone: "UTC".to_string(),
            },
        );
    }

    /// Make `token` valid for `email`, as if issued earlier
    pub fn grant(&self, token: &str, email: &str) {
        self.state
            .lock()
            .tokens
            .insert(token.to_string(), email.to_string());
    }

    /// Hold profile responses until released through the returned gate
    pub fn gate_profile(&self) -> ProfileGate {
        let gate = ProfileGate::default();
        self.state.lock().profile_gate = Some(gate.clone());
        gate
    }

    /// Expire every issued token
    pub fn revoke_all(&self) {
        self.state.lock().tokens.clear();
    }

    pub fn gateway(&self, store: Arc<MemoryTokenStore>) -> Arc<Gateway> {
        Arc::new(Gateway::new(&self.base_url, store).unwrap())
    }

    pub fn session(&self, store: Arc<MemoryTokenStore>) -> (SessionManager, Arc<RedirectSlot>) {
        let slot = Arc::new(RedirectSlot::new());
        let session = SessionManager::new(self.gateway(store), slot.clone());
        (session, slot)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
