//! PostgreSQL-backed store built on `sqlx` runtime queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{CategoryStore, StoreError, TaskStore, UserStore};
use crate::models::{
    Category, CategorySeed, NewTask, NewUser, Task, TaskDraft, TaskFilters, TaskPriority,
    TaskWithCategory, User,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_verified, verification_token, \
                            reset_token, created_at, updated_at";

/// Projection shared by every task read. `t` must expose the `tasks` columns.
const TASK_SELECT: &str = "SELECT t.id, t.title, t.priority, t.status, t.category_id, t.user_id, \
     t.created_at, t.updated_at, c.title AS category_title, c.color AS category_color, \
     c.icon_name AS category_icon_name";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A task row joined with its category columns.
#[derive(FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    priority: TaskPriority,
    status: bool,
    category_id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_title: String,
    category_color: String,
    category_icon_name: String,
}

impl From<TaskRow> for TaskWithCategory {
    fn from(row: TaskRow) -> Self {
        TaskWithCategory {
            category: Category {
                id: row.category_id,
                title: row.category_title,
                color: row.category_color,
                icon_name: row.category_icon_name,
            },
            task: Task {
                id: row.id,
                title: row.title,
                priority: row.priority,
                status: row.status,
                category_id: row.category_id,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

/// Wraps a data-modifying statement that returns `tasks` rows so the result comes
/// back joined with its category in the same round trip.
fn joined_from(cte: &str) -> String {
    format!(
        "WITH t AS ({}) {} FROM t JOIN categories c ON c.id = t.category_id",
        cte, TASK_SELECT
    )
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_reset_token(&self, token: &str) -> Result<User, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE reset_token = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, verification_token) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.verification_token)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn mark_verified(&self, token: &str) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET is_verified = TRUE, verification_token = NULL, updated_at = NOW() \
             WHERE verification_token = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_reset_token(&self, id: i64, token: &str) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET reset_token = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET password_hash = $1, reset_token = NULL, updated_at = NOW() \
             WHERE reset_token = $2 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(password_hash)
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(
        &self,
        owner: i64,
        filters: TaskFilters,
    ) -> Result<Vec<TaskWithCategory>, StoreError> {
        let mut sql = format!(
            "{} FROM tasks t JOIN categories c ON c.id = t.category_id WHERE t.user_id = $1",
            TASK_SELECT
        );
        let mut param_count = 2;
        let mut conditions: Vec<String> = Vec::new();

        if filters.category_id.is_some() {
            conditions.push(format!("t.category_id = ${}", param_count));
            param_count += 1;
        }
        if filters.status.is_some() {
            conditions.push(format!("t.status = ${}", param_count));
            param_count += 1;
        }
        if filters.priority.is_some() {
            conditions.push(format!("t.priority = ${}", param_count));
        }

        if !conditions.is_empty() {
            sql.push_str(" AND ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

        let mut query = sqlx::query_as::<_, TaskRow>(&sql).bind(owner);
        if let Some(category_id) = filters.category_id {
            query = query.bind(category_id);
        }
        if let Some(status) = filters.status {
            query = query.bind(status);
        }
        if let Some(priority) = filters.priority {
            query = query.bind(priority);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(TaskWithCategory::from).collect())
    }

    async fn find_task(&self, owner: i64, id: i64) -> Result<TaskWithCategory, StoreError> {
        let sql = format!(
            "{} FROM tasks t JOIN categories c ON c.id = t.category_id \
             WHERE t.id = $1 AND t.user_id = $2",
            TASK_SELECT
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_task_by_title(
        &self,
        owner: i64,
        title: &str,
    ) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, title, priority, status, category_id, user_id, created_at, updated_at \
             FROM tasks WHERE user_id = $1 AND title = $2",
        )
        .bind(owner)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn insert_task(&self, task: NewTask) -> Result<TaskWithCategory, StoreError> {
        let sql = joined_from(
            "INSERT INTO tasks (user_id, title, priority, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.user_id)
            .bind(task.title)
            .bind(task.priority)
            .bind(task.category_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_task(
        &self,
        owner: i64,
        id: i64,
        changes: &TaskDraft,
    ) -> Result<TaskWithCategory, StoreError> {
        let sql = joined_from(
            "UPDATE tasks SET title = $1, priority = $2, category_id = $3, updated_at = NOW() \
             WHERE id = $4 AND user_id = $5 RETURNING *",
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(&changes.title)
            .bind(changes.priority)
            .bind(changes.category_id)
            .bind(id)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn toggle_task(&self, owner: i64, id: i64) -> Result<TaskWithCategory, StoreError> {
        let sql = joined_from(
            "UPDATE tasks SET status = NOT status, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn delete_task(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, title, color, icon_name FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Category, StoreError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, color, icon_name FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn seed_categories(&self, seeds: &[CategorySeed]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for seed in seeds {
            sqlx::query(
                "INSERT INTO categories (title, color, icon_name) VALUES ($1, $2, $3) \
                 ON CONFLICT (title) DO NOTHING",
            )
            .bind(seed.title)
            .bind(seed.color)
            .bind(seed.icon_name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
