use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod handler;
pub mod jwt;
pub mod password;
pub mod service;
pub mod store;

/// Database model for a login account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Account {
    pub code: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub customer_id: Option<String>,
    pub staff_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Account fields to insert; the code is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

/// Staff position that grants administrator rights.
pub const ADMIN_POSITION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Staff,
    Admin,
}

impl Role {
    /// Role of a staff member holding `position`.
    pub fn for_staff_position(position: i32) -> Self {
        if position == ADMIN_POSITION {
            Role::Admin
        } else {
            Role::Staff
        }
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAccount {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be between 3 and 50 characters"
    ))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginAccount {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UsernameCheck {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: AccountResponse,
    pub role: Role,
    pub position: Option<i32>,
    pub is_admin: bool,
    /// False until a customer has filled in name, address and phone.
    pub has_customer_info: bool,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub code: String,
    pub username: String,
    pub email: Option<String>,
    pub customer_id: Option<String>,
    pub staff_id: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            code: account.code,
            username: account.username,
            email: account.email,
            customer_id: account.customer_id,
            staff_id: account.staff_id,
        }
    }
}
