use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    auth::{
        jwt, service::AccountService, LoginAccount, RegisterAccount, UsernameCheck, UsernameQuery,
    },
    error::AppError,
    response::ApiResponse,
};

/// GET /api/accounts/check-username?username=
pub async fn check_username(
    State(service): State<AccountService>,
    Query(query): Query<UsernameQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.username.trim().is_empty() {
        return Err(AppError::BadRequest("username is required".to_string()));
    }
    let exists = service.check_username(&query.username).await?;
    Ok(ApiResponse::success(UsernameCheck { exists }))
}

/// POST /api/accounts/sign-up
pub async fn signup(
    State(service): State<AccountService>,
    Json(payload): Json<RegisterAccount>,
) -> Result<impl IntoResponse, AppError> {
    let account = service.signup(payload).await?;
    Ok(ApiResponse::success(account).created())
}

/// POST /api/accounts/sign-in
pub async fn login(
    State(service): State<AccountService>,
    Json(payload): Json<LoginAccount>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(service.login(payload).await?))
}

/// GET /api/accounts/me
pub async fn get_me(
    State(service): State<AccountService>,
    claims: jwt::Claims,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(service.me(&claims).await?))
}
