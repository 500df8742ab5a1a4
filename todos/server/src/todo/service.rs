use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use sea_orm::DbErr;

use crate::auth::UserIdentity;
use crate::todo::api::v1::{
    DuplicateTitleResponse, TodoJson, TodoListResponse, TodoResponse, ValidationFailureResponse,
};
use crate::todo::validation::{self, CREATE_RULES, FieldErrors, UPDATE_RULES, ValidationResult};
use crate::todo::{NewTodo, TodoChanges, TodoPayload, TodoStore, TodoStoreError};
use crate::web::api::v1::{FailureResponse, MessageResponse};

pub const TODO_CREATED: &str = "Success! todo created.";
pub const TODO_UPDATED: &str = "Success! todo updated.";
pub const TODO_DELETED: &str = "Success! todo deleted.";
pub const TODO_NOT_FOUND: &str = "Failed! no todo found.";

/// Everything a todo request can fail with once the caller is known.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    /// The body could not be read as a todo payload.
    #[error("{0}")]
    MalformedPayload(String),
    #[error("Failed! no todo found.")]
    NotFound,
    #[error("A todo titled '{0}' already exists")]
    DuplicateTitle(String),
    #[error("Storage unavailable: {0}")]
    Storage(DbErr),
}

impl From<TodoStoreError> for TodoError {
    fn from(err: TodoStoreError) -> Self {
        match err {
            TodoStoreError::DuplicateTitle(title) => TodoError::DuplicateTitle(title),
            TodoStoreError::NotFound(_) => TodoError::NotFound,
            TodoStoreError::StorageUnavailable(db_err) => TodoError::Storage(db_err),
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        match self {
            TodoError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationFailureResponse::new(errors)),
            )
                .into_response(),
            TodoError::MalformedPayload(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(FailureResponse::new(message)),
            )
                .into_response(),
            TodoError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(FailureResponse::new(TODO_NOT_FOUND)),
            )
                .into_response(),
            err @ TodoError::DuplicateTitle(_) => (
                StatusCode::CONFLICT,
                Json(DuplicateTitleResponse::new(err.to_string())),
            )
                .into_response(),
            err @ TodoError::Storage(_) => {
                tracing::error!("Todo storage failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(FailureResponse::new(err.to_string())),
                )
                    .into_response()
            }
        }
    }
}

/// Orchestrates todo requests for an already resolved caller.
pub struct TodoService<'a> {
    store: TodoStore<'a>,
}

impl<'a> TodoService<'a> {
    pub fn new(db: &'a sea_orm::DatabaseConnection) -> Self {
        Self {
            store: TodoStore::new(db),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        user: &UserIdentity,
    ) -> Result<(StatusCode, Json<TodoListResponse>), TodoError> {
        let todos = self.store.list_by_owner(user.id).await?;
        let data: Vec<TodoJson> = todos.into_iter().map(TodoJson::from).collect();
        Ok((StatusCode::OK, Json(TodoListResponse::new(data))))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        user: &UserIdentity,
        payload: TodoPayload,
    ) -> Result<(StatusCode, Json<MessageResponse>), TodoError> {
        self.check(&payload, CREATE_RULES).await?;
        let created = self.store.create(user.id, NewTodo::from(&payload)).await?;
        tracing::info!("Created todo {} for user {}", created.id(), user.id);
        Ok((
            StatusCode::CREATED,
            Json(MessageResponse::success(TODO_CREATED)),
        ))
    }

    #[tracing::instrument(skip(self))]
    pub async fn show(
        &self,
        user: &UserIdentity,
        id: u32,
    ) -> Result<(StatusCode, Json<TodoResponse>), TodoError> {
        let todo = self.store.find_owned(user.id, id).await?;
        Ok((StatusCode::OK, Json(TodoResponse::new(TodoJson::from(todo)))))
    }

    /// Ownership is checked before validation, so a foreign ID answers 404 even
    /// when the payload is invalid.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        user: &UserIdentity,
        id: u32,
        payload: TodoPayload,
    ) -> Result<(StatusCode, Json<MessageResponse>), TodoError> {
        self.store.find_owned(user.id, id).await?;
        self.check(&payload, UPDATE_RULES).await?;
        self.store
            .update(user.id, id, TodoChanges::from(&payload))
            .await?;
        Ok((
            StatusCode::CREATED,
            Json(MessageResponse::success(TODO_UPDATED)),
        ))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(
        &self,
        user: &UserIdentity,
        id: u32,
    ) -> Result<(StatusCode, Json<MessageResponse>), TodoError> {
        self.store.find_owned(user.id, id).await?;
        self.store.delete(user.id, id).await?;
        Ok((StatusCode::OK, Json(MessageResponse::success(TODO_DELETED))))
    }

    async fn check(
        &self,
        payload: &TodoPayload,
        rules: validation::RuleSet,
    ) -> Result<(), TodoError> {
        match validation::validate(payload, rules, &self.store).await? {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(errors) => Err(TodoError::Validation(errors)),
        }
    }
}
