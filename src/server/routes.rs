//! axum router and handlers for the progress API.

use axum::{
    Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{NewReward, NewTask, Reward, Task, UserProgress};
use crate::validate;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    db: Arc<Database>,
}

impl ApiServer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turn a body that failed to parse into a 400 with the same error shape as
/// every other failure.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_value("body", &rejection.body_text()))
}

async fn list_tasks(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.db().list_tasks()?))
}

async fn create_task(
    State(state): State<ApiServer>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let input = body(payload)?;
    let task = state.db().create_task(&input)?;
    info!(task = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_rewards(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Reward>>> {
    Ok(Json(state.db().list_rewards()?))
}

async fn create_reward(
    State(state): State<ApiServer>,
    payload: Result<Json<NewReward>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Reward>)> {
    let input = body(payload)?;
    let reward = state.db().create_reward(&input)?;
    info!(reward = %reward.id, "Reward created");
    Ok((StatusCode::CREATED, Json(reward)))
}

#[derive(Deserialize)]
struct UserQuery {
    name: Option<String>,
}

/// `null` when the user has no record yet.
async fn get_user(
    State(state): State<ApiServer>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Option<UserProgress>>> {
    let name = validate::user_name(query.name.as_deref())?;
    let user = state.db().get_user(&name)?;
    debug!(user = %name, found = user.is_some(), "User lookup");
    Ok(Json(user))
}

/// Replace the whole record for the posted name.
async fn upsert_user(
    State(state): State<ApiServer>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<UserProgress>> {
    let value = body(payload)?;
    let name = validate::user_name(value.get("name").and_then(|n| n.as_str()))?;
    let mut progress: UserProgress = serde_json::from_value(value)
        .map_err(|e| ApiError::invalid_value("body", &e.to_string()))?;
    progress.name = name;
    Ok(Json(state.db().upsert_user(&progress)?))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"code": "NOT_FOUND", "message": "No such route"})),
    )
}

/// Build the API router.
pub fn build_router(state: ApiServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/rewards", get(list_rewards).post(create_reward))
        .route("/api/user", get(get_user).post(upsert_user))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve in the background.
///
/// Returns a sender that stops the server gracefully, and the bound address
/// (useful when binding port 0).
pub async fn start_server(
    db: Arc<Database>,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(ApiServer::new(db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Progress API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Progress API shutting down");
            })
            .await
        {
            tracing::error!("Progress API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let db = Database::open_in_memory().unwrap();
        build_router(ApiServer::new(Arc::new(db)))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), get_req("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_user_is_null() {
        let (status, body) = send(&app(), get_req("/api/user?name=nobody")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn user_lookup_requires_name() {
        let app = app();
        let (status, body) = send(&app, get_req("/api/user")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");

        let (status, _) = send(&app, get_req("/api/user?name=%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upsert_requires_name() {
        let (status, body) =
            send(&app(), post_json("/api/user", json!({"points": 10}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn upsert_replaces_whole_document() {
        let app = app();
        let first = json!({
            "name": "aisha",
            "points": 40,
            "completedTasks": ["t1"],
            "unlockedRewards": ["r1"],
            "dailyProgress": {"t1": {"currentProgress": 1, "completedDates": ["Fri Oct 16 2026"]}}
        });
        let (status, _) = send(&app, post_json("/api/user", first)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, saved) =
            send(&app, post_json("/api/user", json!({"name": "aisha", "points": 5}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["points"], 5);

        let (_, fetched) = send(&app, get_req("/api/user?name=aisha")).await;
        assert_eq!(fetched["points"], 5);
        assert_eq!(fetched["completedTasks"], json!([]));
        assert_eq!(fetched["unlockedRewards"], json!([]));
        assert_eq!(fetched["dailyProgress"], json!({}));
    }

    #[tokio::test]
    async fn create_and_list_tasks() {
        let app = app();
        let (status, created) = send(
            &app,
            post_json(
                "/api/tasks",
                json!({"title": "Send a voice note", "description": "any length",
                       "type": "daily", "duration": 3, "points": 15}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert!(id.starts_with('t'));

        let (status, listed) = send(&app, get_req("/api/tasks")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], id.as_str());
        assert_eq!(listed[0]["duration"], 3);
    }

    #[tokio::test]
    async fn duplicate_task_id_conflicts() {
        let app = app();
        let task = json!({"id": "t9", "title": "Hug", "description": "long one",
                          "type": "once", "points": 5});
        let (status, _) = send(&app, post_json("/api/tasks", task.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, post_json("/api/tasks", task)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn invalid_task_is_rejected() {
        let app = app();
        let (status, body) = send(
            &app,
            post_json("/api/tasks", json!({"title": "", "description": "x", "type": "once"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "title");

        let (status, _) =
            send(&app, post_json("/api/tasks", json!({"title": "x", "type": "weekly"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, listed) = send(&app, get_req("/api/tasks")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn create_reward_round_trip() {
        let app = app();
        let (status, created) = send(
            &app,
            post_json(
                "/api/rewards",
                json!({"title": "Bedtime story", "type": "gemini-story",
                       "content": "A story about stargazing", "cost": 150}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["id"].as_str().unwrap().starts_with('r'));

        let (_, listed) = send(&app, get_req("/api/rewards")).await;
        assert_eq!(listed[0]["type"], "gemini-story");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = send(&app(), get_req("/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
