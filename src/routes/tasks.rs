use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskQuery, TaskRequest},
    state::AppState,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};

/// Retrieves the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `categoryId` (optional): Only tasks in this category.
/// - `status` (optional): `true` for completed tasks, `false` for open ones.
/// - `priority` (optional): `high`, `medium` or `low`, any case.
///
/// All supplied filters must match. An unparsable filter is a `400 Bad Request`.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list(user.id, &query_params).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// ## Responses:
/// - `201 Created`: The task joined with its category.
/// - `400 Bad Request`: Validation failed, unknown category, or the title is already used.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.create(user.id, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces title, priority and category of a task the user owns.
///
/// An update that changes nothing is rejected with `400 No changes detected`.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update(user.id, task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Flips the completion status of a task.
#[patch("/{id}/complete")]
pub async fn toggle_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.toggle(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}
