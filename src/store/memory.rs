//! In-process store used by the test suite and for running without Postgres.
//!
//! Enforces the same constraints as the SQL schema: unique emails, unique
//! (owner, title) pairs and task → category references.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{CategoryStore, StoreError, TaskStore, UserStore};
use crate::models::{
    Category, CategorySeed, NewTask, NewUser, Task, TaskDraft, TaskFilters, TaskWithCategory, User,
    CATALOG,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    last_user_id: i64,
    last_task_id: i64,
    last_category_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the standard category catalog already seeded.
    pub fn with_catalog() -> Self {
        let store = Self::new();
        seed(&mut store.state(), &CATALOG);
        store
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn seed(state: &mut State, seeds: &[CategorySeed]) {
    for entry in seeds {
        if state.categories.iter().any(|c| c.title == entry.title) {
            continue;
        }
        state.last_category_id += 1;
        state.categories.push(Category {
            id: state.last_category_id,
            title: entry.title.to_string(),
            color: entry.color.to_string(),
            icon_name: entry.icon_name.to_string(),
        });
    }
}

fn joined(state: &State, task: &Task) -> Result<TaskWithCategory, StoreError> {
    let category = state
        .categories
        .iter()
        .find(|c| c.id == task.category_id)
        .cloned()
        .ok_or_else(|| StoreError::Backend(format!("task {} has no category", task.id)))?;
    Ok(TaskWithCategory {
        task: task.clone(),
        category,
    })
}

fn check_task_constraints(
    state: &State,
    owner: i64,
    title: &str,
    category_id: i64,
    except_id: Option<i64>,
) -> Result<(), StoreError> {
    let duplicate = state
        .tasks
        .iter()
        .any(|t| t.user_id == owner && t.title == title && Some(t.id) != except_id);
    if duplicate {
        return Err(StoreError::UniqueViolation("tasks_user_id_title_key".into()));
    }
    if !state.categories.iter().any(|c| c.id == category_id) {
        return Err(StoreError::ForeignKeyViolation("tasks_category_id_fkey".into()));
    }
    Ok(())
}

fn owned_index(state: &State, owner: i64, id: i64) -> Result<usize, StoreError> {
    state
        .tasks
        .iter()
        .position(|t| t.id == id && t.user_id == owner)
        .ok_or(StoreError::NotFound)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.state()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_user_by_reset_token(&self, token: &str) -> Result<User, StoreError> {
        self.state()
            .users
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }

        state.last_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: state.last_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_verified: false,
            verification_token: Some(user.verification_token),
            reset_token: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(stored.clone());
        Ok(stored)
    }

    async fn mark_verified(&self, token: &str) -> Result<User, StoreError> {
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .ok_or(StoreError::NotFound)?;
        user.is_verified = true;
        user.verification_token = None;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_reset_token(&self, id: i64, token: &str) -> Result<User, StoreError> {
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.reset_token = Some(token.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.reset_token = None;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(
        &self,
        owner: i64,
        filters: TaskFilters,
    ) -> Result<Vec<TaskWithCategory>, StoreError> {
        let state = self.state();
        let mut tasks: Vec<&Task> = state
            .tasks
            .iter()
            .filter(|t| t.user_id == owner && filters.matches(t))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        tasks.into_iter().map(|t| joined(&state, t)).collect()
    }

    async fn find_task(&self, owner: i64, id: i64) -> Result<TaskWithCategory, StoreError> {
        let state = self.state();
        let index = owned_index(&state, owner, id)?;
        joined(&state, &state.tasks[index])
    }

    async fn find_task_by_title(
        &self,
        owner: i64,
        title: &str,
    ) -> Result<Option<Task>, StoreError> {
        Ok(self
            .state()
            .tasks
            .iter()
            .find(|t| t.user_id == owner && t.title == title)
            .cloned())
    }

    async fn insert_task(&self, task: NewTask) -> Result<TaskWithCategory, StoreError> {
        let mut state = self.state();
        check_task_constraints(&state, task.user_id, &task.title, task.category_id, None)?;

        state.last_task_id += 1;
        let now = Utc::now();
        let stored = Task {
            id: state.last_task_id,
            title: task.title,
            priority: task.priority,
            status: false,
            category_id: task.category_id,
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(stored.clone());
        joined(&state, &stored)
    }

    async fn update_task(
        &self,
        owner: i64,
        id: i64,
        changes: &TaskDraft,
    ) -> Result<TaskWithCategory, StoreError> {
        let mut state = self.state();
        let index = owned_index(&state, owner, id)?;
        check_task_constraints(&state, owner, &changes.title, changes.category_id, Some(id))?;

        let task = &mut state.tasks[index];
        task.title = changes.title.clone();
        task.priority = changes.priority;
        task.category_id = changes.category_id;
        task.updated_at = Utc::now();
        let updated = task.clone();
        joined(&state, &updated)
    }

    async fn toggle_task(&self, owner: i64, id: i64) -> Result<TaskWithCategory, StoreError> {
        let mut state = self.state();
        let index = owned_index(&state, owner, id)?;

        let task = &mut state.tasks[index];
        task.status = !task.status;
        task.updated_at = Utc::now();
        let toggled = task.clone();
        joined(&state, &toggled)
    }

    async fn delete_task(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        let mut state = self.state();
        let index = owned_index(&state, owner, id)?;
        state.tasks.remove(index);
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.state().categories.clone())
    }

    async fn find_category(&self, id: i64) -> Result<Category, StoreError> {
        self.state()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn seed_categories(&self, seeds: &[CategorySeed]) -> Result<(), StoreError> {
        seed(&mut self.state(), seeds);
        Ok(())
    }
}
