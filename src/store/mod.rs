//! Persistence seams for users, tasks and the category catalog.
//!
//! Stores report only two kinds of outcome besides success: the row was not there
//! (`StoreError::NotFound`), or the backend failed. Constraint violations are
//! backend failures too, but they are classified so the services can translate them
//! into domain conflicts.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::models::{
    Category, CategorySeed, NewTask, NewUser, Task, TaskDraft, TaskFilters, TaskWithCategory, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No row matched the lookup.
    NotFound,
    /// A unique constraint rejected the write. Carries the constraint name.
    UniqueViolation(String),
    /// A foreign key constraint rejected the write. Carries the constraint name.
    ForeignKeyViolation(String),
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::UniqueViolation(c) => write!(f, "unique constraint violated: {}", c),
            StoreError::ForeignKeyViolation(c) => write!(f, "foreign key violated: {}", c),
            StoreError::Backend(msg) => write!(f, "store failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.constraint().unwrap_or_default().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::ForeignKeyViolation(db.constraint().unwrap_or_default().to_string())
            }
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

/// Persisted accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    async fn find_user_by_reset_token(&self, token: &str) -> Result<User, StoreError>;

    /// Fails with `UniqueViolation` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Verifies the account holding `token` and clears the token in one write.
    /// `NotFound` when no account holds it.
    async fn mark_verified(&self, token: &str) -> Result<User, StoreError>;

    /// Stores a new reset token without touching any other column.
    async fn set_reset_token(&self, id: i64, token: &str) -> Result<User, StoreError>;

    /// Replaces the password hash of the account holding `token` and clears the
    /// token in one write. `NotFound` when no account holds it.
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
}

/// Persisted tasks. Every operation is scoped to the owning user.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Owner's tasks matching every filter, newest first.
    async fn list_tasks(
        &self,
        owner: i64,
        filters: TaskFilters,
    ) -> Result<Vec<TaskWithCategory>, StoreError>;

    async fn find_task(&self, owner: i64, id: i64) -> Result<TaskWithCategory, StoreError>;

    async fn find_task_by_title(&self, owner: i64, title: &str)
        -> Result<Option<Task>, StoreError>;

    /// Fails with `UniqueViolation` on a duplicate (owner, title) and with
    /// `ForeignKeyViolation` on an unknown category.
    async fn insert_task(&self, task: NewTask) -> Result<TaskWithCategory, StoreError>;

    /// Same constraint failures as `insert_task`; `NotFound` when not owned.
    async fn update_task(
        &self,
        owner: i64,
        id: i64,
        changes: &TaskDraft,
    ) -> Result<TaskWithCategory, StoreError>;

    /// Flips the status in a single write.
    async fn toggle_task(&self, owner: i64, id: i64) -> Result<TaskWithCategory, StoreError>;

    async fn delete_task(&self, owner: i64, id: i64) -> Result<(), StoreError>;
}

/// The read-only category catalog.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn find_category(&self, id: i64) -> Result<Category, StoreError>;

    /// First-or-create by title. Running it again is a no-op.
    async fn seed_categories(&self, seeds: &[CategorySeed]) -> Result<(), StoreError>;
}
