use crate::auth::UserIdentity;
use crate::todo::Todo;
use crate::todo::TodoPayload;
use crate::todo::service::{TodoError, TodoService};
use crate::todo::validation::FieldErrors;
use crate::web::api::v1::{FailureResponse, MessageResponse, Status};
use axum::{
    Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a Todo for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoJson {
    /// Unique identifier for the todo
    id: u32,
    title: String,
    description: String,
    /// Owner of the todo
    user_id: i64,
    active: bool,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id(),
            title: todo.title().to_string(),
            description: todo.description().to_string(),
            user_id: todo.user_id(),
            active: todo.active(),
            completed: todo.completed(),
            created_at: todo.created_at(),
            updated_at: todo.updated_at(),
        }
    }
}

/// API response for listing the caller's todos.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodoListResponse {
    status: Status,
    error: bool,
    /// Number of todos in `data`
    count: usize,
    data: Vec<TodoJson>,
}

impl TodoListResponse {
    pub fn new(data: Vec<TodoJson>) -> Self {
        Self {
            status: Status::Success,
            error: false,
            count: data.len(),
            data,
        }
    }
}

/// API response for a single todo.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodoResponse {
    status: Status,
    error: bool,
    data: TodoJson,
}

impl TodoResponse {
    pub fn new(data: TodoJson) -> Self {
        Self {
            status: Status::Success,
            error: false,
            data,
        }
    }
}

/// API response for a payload that broke one or more field rules.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationFailureResponse {
    status: Status,
    error: bool,
    /// Field name to its error messages
    #[schema(value_type = Object)]
    validation_errors: FieldErrors,
}

impl ValidationFailureResponse {
    pub fn new(validation_errors: FieldErrors) -> Self {
        Self {
            status: Status::Failed,
            error: true,
            validation_errors,
        }
    }
}

/// API response for a title already used by another todo. `error` carries the message.
#[derive(Debug, Serialize, ToSchema)]
pub struct DuplicateTitleResponse {
    status: Status,
    error: String,
}

impl DuplicateTitleResponse {
    pub fn new(error: String) -> Self {
        Self {
            status: Status::Failed,
            error,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TodoState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

fn read_payload(
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<TodoPayload, TodoError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| TodoError::MalformedPayload(rejection.body_text()))
}

// An ID that is not a number cannot name one of the caller's todos.
fn read_id(id: Result<Path<u32>, PathRejection>) -> Result<u32, TodoError> {
    id.map(|Path(id)| id).map_err(|_| TodoError::NotFound)
}

/// Handler for GET /todos - Returns the caller's todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos",
    responses(
        (status = 200, description = "Successfully retrieved todos", body = TodoListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = FailureResponse),
        (status = 500, description = "Internal server error", body = FailureResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<TodoState>>,
    user: UserIdentity,
) -> Result<(StatusCode, Json<TodoListResponse>), TodoError> {
    TodoService::new(&state.db).list(&user).await
}

/// Handler for POST /todos - Creates a todo owned by the caller.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/todos",
    request_body = TodoPayload,
    responses(
        (status = 201, description = "Todo created", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token", body = FailureResponse),
        (status = 409, description = "Title already taken", body = DuplicateTitleResponse),
        (status = 422, description = "Validation failed", body = ValidationFailureResponse),
        (status = 500, description = "Internal server error", body = FailureResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    user: UserIdentity,
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), TodoError> {
    let payload = read_payload(payload)?;
    TodoService::new(&state.db).create(&user, payload).await
}

/// Handler for GET /todos/{id} - Returns one of the caller's todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(("id" = u32, Path, description = "ID of the todo")),
    responses(
        (status = 200, description = "Successfully retrieved todo", body = TodoResponse),
        (status = 401, description = "Missing or invalid bearer token", body = FailureResponse),
        (status = 404, description = "No such todo for this caller", body = FailureResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn show_todo_handler(
    State(state): State<Arc<TodoState>>,
    user: UserIdentity,
    id: Result<Path<u32>, PathRejection>,
) -> Result<(StatusCode, Json<TodoResponse>), TodoError> {
    let id = read_id(id)?;
    TodoService::new(&state.db).show(&user, id).await
}

/// Handler for PUT/PATCH /todos/{id} - Updates one of the caller's todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/todos/{id}",
    params(("id" = u32, Path, description = "ID of the todo")),
    request_body = TodoPayload,
    responses(
        (status = 201, description = "Todo updated", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token", body = FailureResponse),
        (status = 404, description = "No such todo for this caller", body = FailureResponse),
        (status = 409, description = "Title already taken", body = DuplicateTitleResponse),
        (status = 422, description = "Validation failed", body = ValidationFailureResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    user: UserIdentity,
    id: Result<Path<u32>, PathRejection>,
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), TodoError> {
    let id = read_id(id)?;
    let service = TodoService::new(&state.db);
    match read_payload(payload) {
        Ok(payload) => service.update(&user, id, payload).await,
        // A malformed body for someone else's todo still answers 404.
        Err(err) => {
            service.show(&user, id).await?;
            Err(err)
        }
    }
}

/// Handler for DELETE /todos/{id} - Deletes one of the caller's todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(("id" = u32, Path, description = "ID of the todo")),
    responses(
        (status = 200, description = "Todo deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token", body = FailureResponse),
        (status = 404, description = "No such todo for this caller", body = FailureResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    user: UserIdentity,
    id: Result<Path<u32>, PathRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), TodoError> {
    let id = read_id(id)?;
    TodoService::new(&state.db).delete(&user, id).await
}

/// Creates and returns the todos API router.
pub fn create_api_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route("/todos", get(list_todos_handler).post(create_todo_handler))
        .route(
            "/todos/{id}",
            get(show_todo_handler)
                .put(update_todo_handler)
                .patch(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .with_state(state)
}
