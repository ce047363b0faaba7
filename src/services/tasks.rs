use std::sync::Arc;

use crate::error::AppError;
use crate::models::{
    Category, NewTask, TaskDraft, TaskQuery, TaskRequest, TaskWithCategory,
};
use crate::store::{CategoryStore, StoreError, TaskStore};
use crate::validation::{push_message, FieldErrors};

pub const TASK_NOT_FOUND: &str = "Task not found";
pub const UNKNOWN_CATEGORY: &str = "Category does not exist";

/// Task operations, always scoped to the calling user.
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    categories: Arc<dyn CategoryStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, categories: Arc<dyn CategoryStore>) -> Self {
        Self { tasks, categories }
    }

    pub async fn list(
        &self,
        owner: i64,
        query: &TaskQuery,
    ) -> Result<Vec<TaskWithCategory>, AppError> {
        let filters = query.parse()?;
        Ok(self.tasks.list_tasks(owner, filters).await?)
    }

    pub async fn get(&self, owner: i64, id: i64) -> Result<TaskWithCategory, AppError> {
        self.tasks.find_task(owner, id).await.map_err(task_error)
    }

    pub async fn create(
        &self,
        owner: i64,
        request: TaskRequest,
    ) -> Result<TaskWithCategory, AppError> {
        let draft = self.checked_draft(request).await?;

        if self.tasks.find_task_by_title(owner, &draft.title).await?.is_some() {
            return Err(AppError::DuplicateTitle);
        }

        let created = self
            .tasks
            .insert_task(NewTask::from_draft(owner, draft))
            .await
            .map_err(task_error)?;
        log::debug!("user {} created task {}", owner, created.task.id);
        Ok(created)
    }

    pub async fn update(
        &self,
        owner: i64,
        id: i64,
        request: TaskRequest,
    ) -> Result<TaskWithCategory, AppError> {
        let existing = self.get(owner, id).await?;
        let draft = self.checked_draft(request).await?;

        if draft.matches(&existing.task) {
            return Err(AppError::NoChange);
        }

        let clash = self.tasks.find_task_by_title(owner, &draft.title).await?;
        if clash.map_or(false, |task| task.id != id) {
            return Err(AppError::DuplicateTitle);
        }

        self.tasks
            .update_task(owner, id, &draft)
            .await
            .map_err(task_error)
    }

    pub async fn delete(&self, owner: i64, id: i64) -> Result<(), AppError> {
        self.tasks.delete_task(owner, id).await.map_err(task_error)
    }

    pub async fn toggle(&self, owner: i64, id: i64) -> Result<TaskWithCategory, AppError> {
        self.tasks.toggle_task(owner, id).await.map_err(task_error)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.categories.list_categories().await?)
    }

    /// Runs the field rules, then checks that the referenced category exists.
    async fn checked_draft(&self, request: TaskRequest) -> Result<TaskDraft, AppError> {
        let draft = request.into_draft().map_err(AppError::ValidationFailed)?;

        match self.categories.find_category(draft.category_id).await {
            Ok(_) => Ok(draft),
            Err(StoreError::NotFound) => Err(unknown_category()),
            Err(e) => Err(e.into()),
        }
    }
}

fn unknown_category() -> AppError {
    let mut fields = FieldErrors::new();
    push_message(&mut fields, "category_id", UNKNOWN_CATEGORY);
    AppError::ValidationFailed(fields)
}

fn task_error(error: StoreError) -> AppError {
    match error {
        StoreError::NotFound => AppError::NotFound(TASK_NOT_FOUND.into()),
        StoreError::UniqueViolation(_) => AppError::DuplicateTitle,
        StoreError::ForeignKeyViolation(_) => unknown_category(),
        other => other.into(),
    }
}
