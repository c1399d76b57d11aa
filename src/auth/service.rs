use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{
        jwt::{self, Claims},
        password,
        store::{AccountStore, AccountStoreError},
        Account, AccountResponse, LoginAccount, LoginResponse, NewAccount, RegisterAccount,
        Role,
    },
    config::settings::Settings,
    staff::{CreateStaff, NewStaff, StaffAccountResponse},
};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("Username already exists")]
    UsernameTaken,

    #[error(transparent)]
    Store(AccountStoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AccountStoreError> for AccountError {
    fn from(e: AccountStoreError) -> Self {
        match e {
            AccountStoreError::UsernameTaken(_) => AccountError::UsernameTaken,
            e => AccountError::Store(e),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    settings: Settings,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub async fn check_username(&self, username: &str) -> Result<bool, AccountError> {
        Ok(self.store.username_exists(username.trim()).await?)
    }

    pub async fn signup(&self, payload: RegisterAccount) -> Result<AccountResponse, AccountError> {
        payload
            .validate()
            .map_err(|e| AccountError::Validation(e.to_string()))?;

        let username = payload.username.trim().to_string();
        if self.store.username_exists(&username).await? {
            return Err(AccountError::UsernameTaken);
        }

        let password_hash = password::hash(&payload.password)?;
        let account = self
            .store
            .create_account(NewAccount {
                username,
                email: Some(payload.email),
                password_hash,
            })
            .await?;

        tracing::info!(account = %account.code, "account created");
        Ok(AccountResponse::from(account))
    }

    /// Password login. A plain user without a customer record gets an empty
    /// one on first login; staff roles come from their staff position. Staff
    /// accounts never report customer info.
    pub async fn login(&self, payload: LoginAccount) -> Result<LoginResponse, AccountError> {
        payload
            .validate()
            .map_err(|e| AccountError::Validation(e.to_string()))?;

        let mut account = self
            .store
            .find_by_username(payload.username.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !password::matches(&account.password_hash, &payload.password) {
            return Err(AccountError::InvalidCredentials);
        }

        let (role, position, has_customer_info) = match account.staff_id.as_deref() {
            Some(staff_id) => match self.store.staff_position(staff_id).await? {
                Some(position) => (Role::for_staff_position(position), Some(position), false),
                None => {
                    // No staff row, no staff rights.
                    tracing::warn!(account = %account.code, staff_id, "account points at missing staff record");
                    (Role::User, None, false)
                }
            },
            None => {
                let has_info = self.customer_info_for(&mut account).await?;
                (Role::User, None, has_info)
            }
        };

        let token = jwt::create_token(&account, role, position, &self.settings)?;
        tracing::info!(account = %account.code, ?role, "login succeeded");

        Ok(LoginResponse {
            token,
            role,
            position,
            is_admin: role == Role::Admin,
            has_customer_info,
            account: AccountResponse::from(account),
        })
    }

    async fn customer_info_for(&self, account: &mut Account) -> Result<bool, AccountError> {
        match account.customer_id.as_deref() {
            Some(code) => Ok(self
                .store
                .find_customer(code)
                .await?
                .is_some_and(|c| c.has_complete_profile())),
            None => {
                let customer = self.store.bootstrap_customer(&account.code).await?;
                tracing::info!(account = %account.code, customer = %customer.code, "customer record created on first login");
                let complete = customer.has_complete_profile();
                account.customer_id = Some(customer.code);
                Ok(complete)
            }
        }
    }

    /// Creates a staff member and the account they sign in with.
    pub async fn create_staff(
        &self,
        payload: CreateStaff,
    ) -> Result<StaffAccountResponse, AccountError> {
        payload
            .validate()
            .map_err(|e| AccountError::Validation(e.to_string()))?;
        if !payload.has_valid_phone() {
            return Err(AccountError::Validation(
                "Phone must be 10 or 11 digits".to_string(),
            ));
        }

        let username = payload.username.trim().to_string();
        if self.store.username_exists(&username).await? {
            return Err(AccountError::UsernameTaken);
        }

        let password_hash = password::hash(&payload.password)?;
        let (staff, account) = self
            .store
            .create_staff_account(
                NewStaff {
                    full_name: payload.full_name.trim().to_string(),
                    gender: payload.gender.trim().to_string(),
                    birth_date: payload.birth_date,
                    address: payload.address.trim().to_string(),
                    phone: payload.phone.trim().to_string(),
                    position: payload.position,
                },
                NewAccount {
                    username,
                    email: payload.email,
                    password_hash,
                },
            )
            .await?;

        tracing::info!(staff = %staff.code, account = %account.code, "staff account created");
        Ok(StaffAccountResponse {
            role: Role::for_staff_position(staff.position),
            staff,
            account: AccountResponse::from(account),
        })
    }

    pub async fn me(&self, claims: &Claims) -> Result<AccountResponse, AccountError> {
        let account = self
            .store
            .find_by_code(&claims.sub)
            .await?
            .ok_or_else(|| AccountError::NotFound("Account not found".to_string()))?;
        Ok(AccountResponse::from(account))
    }
}
