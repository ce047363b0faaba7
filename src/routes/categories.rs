use crate::{auth::AuthenticatedUser, error::AppError, state::AppState};
use actix_web::{get, web, HttpResponse, Responder};

/// Lists the category catalog. Requires authentication.
#[get("")]
pub async fn get_categories(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let categories = state.tasks.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}
