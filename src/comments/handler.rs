use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    auth::jwt,
    comments::{service::CommentService, Author, CreateComment, UpdateComment},
    error::AppError,
    response::ApiResponse,
};

/// Authors edit their own comments; staff may edit any.
fn ensure_can_modify(claims: &jwt::Claims, author: &Author) -> Result<(), AppError> {
    if claims.is_author(author) || claims.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Post a question or a reply
/// POST /api/comments
pub async fn create_comment(
    State(service): State<CommentService>,
    claims: jwt::Claims,
    Json(payload): Json<CreateComment>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    // An invalid author pair is left to the service to reject.
    if let Some(author) =
        Author::from_ids(payload.customer_id.as_deref(), payload.staff_id.as_deref())
    {
        if !claims.is_author(&author) {
            tracing::warn!(account = %claims.sub, author = author.id(), "comment posted under another author");
            return Err(AppError::Forbidden);
        }
    }

    let comment = service.create(payload).await?;
    Ok(ApiResponse::success(comment).created())
}

/// A comment with every reply below it
/// GET /api/comments/:id
pub async fn get_comment(
    State(service): State<CommentService>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(service.get_tree(&comment_id).await?))
}

/// PUT /api/comments/:id
pub async fn update_comment(
    State(service): State<CommentService>,
    claims: jwt::Claims,
    Path(comment_id): Path<String>,
    Json(payload): Json<UpdateComment>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;
    ensure_can_modify(&claims, &service.author_of(&comment_id).await?)?;

    Ok(ApiResponse::success(
        service.update(&comment_id, payload).await?,
    ))
}

/// Delete a comment and its replies
/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(service): State<CommentService>,
    claims: jwt::Claims,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_can_modify(&claims, &service.author_of(&comment_id).await?)?;
    service.delete(&comment_id).await?;
    Ok(ApiResponse::ok("Comment deleted".to_string()))
}

/// All threads of a product
/// GET /api/products/:id/comments
pub async fn get_product_comments(
    State(service): State<CommentService>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(service.get_forest(&product_id).await?))
}

/// GET /api/products/:id/comments/roots
pub async fn get_product_roots(
    State(service): State<CommentService>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(service.get_roots(&product_id).await?))
}

/// Threads still waiting for staff (staff only)
/// GET /api/products/:id/comments/unanswered
pub async fn get_product_unanswered(
    State(service): State<CommentService>,
    claims: jwt::Claims,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_staff()?;
    Ok(ApiResponse::success(
        service.get_unanswered(&product_id).await?,
    ))
}

/// Every root thread with its answer status (staff only)
/// GET /api/admin/comments/status
pub async fn get_root_statuses(
    State(service): State<CommentService>,
    claims: jwt::Claims,
) -> Result<impl IntoResponse, AppError> {
    claims.require_staff()?;
    Ok(ApiResponse::success(
        service.get_global_root_statuses().await?,
    ))
}
