use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    auth::{jwt, service::AccountService},
    error::AppError,
    response::ApiResponse,
    staff::CreateStaff,
};

/// Create a staff member and their login (admin only)
/// POST /api/staff
pub async fn create_staff(
    State(service): State<AccountService>,
    claims: jwt::Claims,
    Json(payload): Json<CreateStaff>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let created = service.create_staff(payload).await?;
    Ok(ApiResponse::success(created).created())
}
