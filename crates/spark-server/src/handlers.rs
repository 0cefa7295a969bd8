use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use spark_types::{OutputEvent, UserContext, allocate_session_id};

use crate::error::ApiError;
use crate::goal;
use crate::state::AppState;

const SERVICE_NAME: &str = "CareerSpark API";

pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "framework": "axum + AWS Bedrock AgentCore",
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "message": "API is operational" }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "agents_configured": state.session.is_some(),
        "planner_id": state.planner_agent_id,
        "planner_alias_id": state.planner_alias_id,
        "region": state.region,
    }))
}

#[derive(Debug, Deserialize)]
pub struct IntroRequest {
    pub goal: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Validate the career goal and produce the welcoming intro message.
pub async fn intro(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IntroRequest>,
) -> Result<Json<Value>, ApiError> {
    let goal = request.goal.trim();
    if goal.is_empty() {
        return Err(ApiError::BadRequest("Goal is required.".to_string()));
    }

    let chat = state
        .chat
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Chat model is not configured.".to_string()))?;

    let verdict = goal::classify_goal(chat, goal).await;
    if !verdict.allowed {
        return Err(ApiError::BadRequest(verdict.message));
    }

    let message = goal::generate_intro(chat, goal)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to generate introduction: {}", err)))?;

    let session_id = normalized_session_id(request.session_id);
    Ok(Json(json!({ "message": message, "session_id": session_id })))
}

#[derive(Debug, Deserialize)]
pub struct ProcessGoalRequest {
    pub goal: String,
}

/// Rewrite a natural-language goal into a structured goal statement.
pub async fn process_goal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessGoalRequest>,
) -> Result<Json<Value>, ApiError> {
    let goal = request.goal.trim();
    if goal.is_empty() {
        return Err(ApiError::BadRequest("Career goal is required.".to_string()));
    }

    let chat = state
        .chat
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Chat model is not configured.".to_string()))?;

    let processed = goal::rewrite_goal(chat, goal).await;
    Ok(Json(json!({
        "original_goal": request.goal,
        "processed_goal": processed,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub goal: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_major: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub career_goal: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub student_year: Option<String>,
    #[serde(default)]
    pub courses_taken: Option<String>,
    #[serde(default)]
    pub time_commitment: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
}

impl PlanRequest {
    fn user_context(&self) -> Option<UserContext> {
        let context = UserContext {
            name: self.user_name.clone(),
            major: self.user_major.clone(),
            graduation_year: self.graduation_year.clone(),
            skills: self.skills.clone(),
            student_year: self.student_year.clone(),
            courses_taken: self.courses_taken.clone(),
            time_commitment: self.time_commitment.clone(),
            gpa: self.gpa.clone(),
            career_goal: self.career_goal.clone(),
            bio: self.bio.clone(),
        };
        if context.is_empty() { None } else { Some(context) }
    }
}

/// Stream the supervisor's plan for a goal as Server-Sent Events.
///
/// Envelope: a leading `session` event, the invocation's `chunk`/`trace`
/// events in order, then a terminal `done` — or a terminal `error` carrying
/// the failure message. Progress already streamed is never retracted.
pub async fn plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let goal = request.goal.trim().to_string();
    if goal.is_empty() {
        return Err(ApiError::BadRequest("Goal is required.".to_string()));
    }

    let session = state.session.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable("Supervisor agent is not configured.".to_string())
    })?;

    let user_context = request.user_context();
    let session_id = normalized_session_id(request.session_id);
    let memory = state.memory.clone();

    let (tx, rx) = tokio::sync::mpsc::channel::<Event>(32);

    tokio::spawn(async move {
        let send = |event: Value| {
            let tx = tx.clone();
            async move { tx.send(Event::default().data(event.to_string())).await.is_ok() }
        };

        if !send(json!({ "type": "session", "session_id": session_id })).await {
            return;
        }

        if let Some(memory) = &memory {
            memory.record_user_goal(&session_id, &goal).await;
        }

        let mut stream = match session.invoke(&goal, &session_id, user_context.as_ref()).await {
            Ok(stream) => stream,
            Err(err) => {
                error!(session_id = %session_id, error = %err, "plan invocation failed to start");
                let _ = send(json!({ "type": "error", "message": err.to_string() })).await;
                return;
            }
        };

        let mut emitted = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    if let (Some(memory), OutputEvent::Trace { data, .. }) = (&memory, &event) {
                        if let Some(response) = &data.collaborator_response {
                            if let Some(output) = &response.output {
                                memory
                                    .record_agent_output(&session_id, &response.agent, output)
                                    .await;
                            }
                        }
                    }

                    let payload = match serde_json::to_value(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            error!(error = %err, "failed to serialize output event");
                            continue;
                        }
                    };
                    emitted += 1;
                    if !send(payload).await {
                        // Client disconnected; dropping the stream releases
                        // the upstream connection
                        return;
                    }
                }
                Err(err) => {
                    error!(session_id = %session_id, error = %err, "plan stream failed");
                    let _ = send(json!({ "type": "error", "message": err.to_string() })).await;
                    return;
                }
            }
        }

        info!(session_id = %session_id, events = emitted, "plan stream completed");
        let _ = send(json!({ "type": "done" })).await;
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn normalized_session_id(requested: Option<String>) -> String {
    requested
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(allocate_session_id)
}
