use crate::entities::todo;
use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;
pub mod service;
pub mod validation;

use validation::TitleLookup;

/// A single task, owned by exactly one user.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Todo {
    id: u32,
    title: String,
    description: String,
    user_id: i64,
    active: bool,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the ID of the owning user.
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<todo::Model> for Todo {
    fn from(model: todo::Model) -> Self {
        Self {
            id: model.id as u32,
            title: model.title,
            description: model.description,
            user_id: model.user_id,
            active: model.active,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Request body accepted by create and update.
///
/// `active` and `completed` use presence detection: a key sent with any boolean,
/// `false` included, is applied. An absent key or `null` leaves the flag untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TodoPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TodoPayload {
    /// Trimmed title, or `None` when absent or blank.
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Trimmed description, or `None` when absent or blank.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Fields needed to insert a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
}

impl From<&TodoPayload> for NewTodo {
    // Only called once the payload passed validation, so both fields are present.
    fn from(payload: &TodoPayload) -> Self {
        Self {
            title: payload.title().unwrap_or_default().to_string(),
            description: payload.description().unwrap_or_default().to_string(),
        }
    }
}

/// New state for an existing todo. `None` flags keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: String,
    pub description: String,
    pub active: Option<bool>,
    pub completed: Option<bool>,
}

impl From<&TodoPayload> for TodoChanges {
    fn from(payload: &TodoPayload) -> Self {
        Self {
            title: payload.title().unwrap_or_default().to_string(),
            description: payload.description().unwrap_or_default().to_string(),
            active: payload.active,
            completed: payload.completed,
        }
    }
}

/// Error type for TodoStore operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoStoreError {
    /// Another todo, owned by anyone, already uses this title.
    #[error("A todo titled '{0}' already exists")]
    DuplicateTitle(String),
    /// No todo with this ID is owned by the caller.
    #[error("Todo with ID {0} not found")]
    NotFound(u32),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DbErr),
}

impl TodoStoreError {
    /// Maps a failed insert/update, turning a unique index violation into `DuplicateTitle`.
    fn from_write(err: DbErr, title: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                TodoStoreError::DuplicateTitle(title.to_string())
            }
            _ => TodoStoreError::StorageUnavailable(err),
        }
    }
}

/// Owner-scoped access to the `todos` table.
///
/// Every lookup filters on the owner and the ID together, so a todo belonging to
/// someone else behaves exactly like one that does not exist.
pub struct TodoStore<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl<'a> TodoStore<'a> {
    pub fn new(db: &'a sea_orm::DatabaseConnection) -> Self {
        Self { db }
    }

    /// Retrieves the caller's todos in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Todo>, TodoStoreError> {
        let todos = todo::Entity::find()
            .filter(todo::Column::UserId.eq(user_id))
            .order_by_asc(todo::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Todo::from)
            .collect();
        Ok(todos)
    }

    /// Creates a new todo owned by `user_id`.
    ///
    /// Title uniqueness is enforced by the unique index on `todos.title`, so two
    /// concurrent creates with the same title cannot both succeed.
    ///
    /// # Returns
    ///
    /// The created `Todo`, or `TodoStoreError::DuplicateTitle` if the title is taken.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, user_id: i64, new_todo: NewTodo) -> Result<Todo, TodoStoreError> {
        let now = Utc::now();
        let active_model = todo::ActiveModel {
            title: ActiveValue::Set(new_todo.title.clone()),
            description: ActiveValue::Set(new_todo.description),
            user_id: ActiveValue::Set(user_id),
            active: ActiveValue::Set(true),
            completed: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model
            .insert(self.db)
            .await
            .map_err(|err| TodoStoreError::from_write(err, &new_todo.title))?;
        Ok(Todo::from(created_model))
    }

    /// Retrieves a todo by its ID, provided `user_id` owns it.
    #[tracing::instrument(skip(self))]
    pub async fn find_owned(&self, user_id: i64, id: u32) -> Result<Todo, TodoStoreError> {
        self.find_owned_model(user_id, id).await.map(Todo::from)
    }

    /// Applies `changes` to an owned todo and returns its new state.
    ///
    /// Title and description are always overwritten; flags only when supplied.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        user_id: i64,
        id: u32,
        changes: TodoChanges,
    ) -> Result<Todo, TodoStoreError> {
        let todo_to_update = self.find_owned_model(user_id, id).await?;

        let mut active_model: todo::ActiveModel = todo_to_update.into();
        active_model.title = ActiveValue::Set(changes.title.clone());
        active_model.description = ActiveValue::Set(changes.description);
        if let Some(active) = changes.active {
            active_model.active = ActiveValue::Set(active);
        }
        if let Some(completed) = changes.completed {
            active_model.completed = ActiveValue::Set(completed);
        }
        active_model.updated_at = ActiveValue::Set(Utc::now());

        let updated_model = todo::Entity::update(active_model)
            .filter(todo::Column::UserId.eq(user_id))
            .exec(self.db)
            .await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => TodoStoreError::NotFound(id),
                err => TodoStoreError::from_write(err, &changes.title),
            })?;
        Ok(Todo::from(updated_model))
    }

    /// Deletes an owned todo.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, id: u32) -> Result<(), TodoStoreError> {
        let Ok(key) = i32::try_from(id) else {
            return Err(TodoStoreError::NotFound(id));
        };
        let result = todo::Entity::delete_many()
            .filter(todo::Column::Id.eq(key))
            .filter(todo::Column::UserId.eq(user_id))
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TodoStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn find_owned_model(&self, user_id: i64, id: u32) -> Result<todo::Model, TodoStoreError> {
        let Ok(key) = i32::try_from(id) else {
            return Err(TodoStoreError::NotFound(id));
        };
        todo::Entity::find_by_id(key)
            .filter(todo::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .ok_or(TodoStoreError::NotFound(id))
    }
}

#[async_trait::async_trait]
impl TitleLookup for TodoStore<'_> {
    /// Checks every owner's todos, not just the caller's.
    #[tracing::instrument(skip(self))]
    async fn title_exists(&self, title: &str) -> Result<bool, TodoStoreError> {
        let count = todo::Entity::find()
            .filter(todo::Column::Title.eq(title))
            .count(self.db)
            .await?;
        Ok(count > 0)
    }
}
