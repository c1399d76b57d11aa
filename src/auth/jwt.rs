use anyhow::Result;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{Account, Role},
    comments::Author,
    config::settings::Settings,
    error::AppError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account code, e.g. `TK0001`.
    pub sub: String,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Whether the token holder is `author`. A staff id only counts for a staff role.
    pub fn is_author(&self, author: &Author) -> bool {
        match author {
            Author::Customer(id) => self.customer_id.as_deref() == Some(id.as_str()),
            Author::Staff(id) => {
                self.role.is_staff() && self.staff_id.as_deref() == Some(id.as_str())
            }
        }
    }
}

pub fn create_token(
    account: &Account,
    role: Role,
    position: Option<i32>,
    settings: &Settings,
) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: account.code.clone(),
        username: account.username.clone(),
        role,
        customer_id: account.customer_id.clone(),
        staff_id: account.staff_id.clone(),
        position,
        iss: settings.jwt_issuer.clone(),
        aud: settings.jwt_audience.clone(),
        exp: (now + Duration::minutes(settings.jwt_expiration_minutes)).timestamp(),
        iat: now.timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_ref()),
    )?)
}

pub fn decode_token(token: &str, settings: &Settings) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&settings.jwt_issuer]);
    validation.set_audience(&[&settings.jwt_audience]);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_ref()),
        &validation,
    )?;
    Ok(data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
    Settings: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let settings = Settings::from_ref(state);

        decode_token(bearer.token(), &settings).map_err(|e| {
            tracing::debug!("rejected bearer token: {e}");
            AppError::Unauthorized
        })
    }
}
