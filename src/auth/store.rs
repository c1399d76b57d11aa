use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    auth::{Account, NewAccount},
    codes::{self, CodeKind},
    customers::Customer,
    staff::{NewStaff, Staff},
};

#[derive(Debug, thiserror::Error)]
pub enum AccountStoreError {
    #[error("username {0} is already taken")]
    UsernameTaken(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence behind the account service.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn username_exists(&self, username: &str) -> Result<bool, AccountStoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountStoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Account>, AccountStoreError>;

    /// Inserts the account under the next `TK` code.
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountStoreError>;

    async fn staff_position(&self, staff_id: &str) -> Result<Option<i32>, AccountStoreError>;

    async fn find_customer(&self, code: &str) -> Result<Option<Customer>, AccountStoreError>;

    /// Creates an empty customer under the next `KH` code and links it to the account.
    async fn bootstrap_customer(&self, account_code: &str) -> Result<Customer, AccountStoreError>;

    /// Inserts a staff member under the next `NV` code and an account linked to
    /// it under the next `TK` code, as one unit.
    async fn create_staff_account(
        &self,
        staff: NewStaff,
        account: NewAccount,
    ) -> Result<(Staff, Account), AccountStoreError>;
}

const ACCOUNT_COLUMNS: &str =
    "code, username, email, password_hash, customer_id, staff_id, created_at";

const STAFF_COLUMNS: &str = "code, full_name, gender, birth_date, address, phone, position";

const USERNAME_UNIQUE: &str = "accounts_username_key";

fn username_error(e: sqlx::Error, username: &str) -> AccountStoreError {
    let taken = matches!(
        &e,
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(USERNAME_UNIQUE)
    );
    if taken {
        AccountStoreError::UsernameTaken(username.to_string())
    } else {
        AccountStoreError::Database(e)
    }
}

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn username_exists(&self, username: &str) -> Result<bool, AccountStoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountStoreError> {
        Ok(sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Account>, AccountStoreError> {
        Ok(sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountStoreError> {
        let mut tx = self.pool.begin().await?;
        let code = codes::next_code(&mut *tx, CodeKind::Account).await?;

        let created = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (code, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&code)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| username_error(e, &account.username))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn staff_position(&self, staff_id: &str) -> Result<Option<i32>, AccountStoreError> {
        Ok(
            sqlx::query_scalar::<_, i32>("SELECT position FROM staff WHERE code = $1")
                .bind(staff_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_customer(&self, code: &str) -> Result<Option<Customer>, AccountStoreError> {
        Ok(sqlx::query_as::<_, Customer>(
            "SELECT code, full_name, gender, birth_date, address, phone FROM customers WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn bootstrap_customer(&self, account_code: &str) -> Result<Customer, AccountStoreError> {
        let mut tx = self.pool.begin().await?;
        let code = codes::next_code(&mut *tx, CodeKind::Customer).await?;

        sqlx::query("INSERT INTO customers (code) VALUES ($1)")
            .bind(&code)
            .execute(&mut *tx)
            .await?;
        let linked = sqlx::query(
            "UPDATE accounts SET customer_id = $1 WHERE code = $2 AND customer_id IS NULL",
        )
        .bind(&code)
        .bind(account_code)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if linked == 0 {
            // A concurrent login linked a customer first; keep theirs.
            tx.rollback().await?;
            let existing = sqlx::query_as::<_, Customer>(
                r#"
                SELECT c.code, c.full_name, c.gender, c.birth_date, c.address, c.phone
                FROM customers c
                JOIN accounts a ON a.customer_id = c.code
                WHERE a.code = $1
                "#,
            )
            .bind(account_code)
            .fetch_one(&self.pool)
            .await?;
            return Ok(existing);
        }

        tx.commit().await?;
        Ok(Customer::empty(code))
    }

    async fn create_staff_account(
        &self,
        staff: NewStaff,
        account: NewAccount,
    ) -> Result<(Staff, Account), AccountStoreError> {
        let mut tx = self.pool.begin().await?;

        let staff_code = codes::next_code(&mut *tx, CodeKind::Staff).await?;
        let created_staff = sqlx::query_as::<_, Staff>(&format!(
            r#"
            INSERT INTO staff (code, full_name, gender, birth_date, address, phone, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STAFF_COLUMNS}
            "#
        ))
        .bind(&staff_code)
        .bind(&staff.full_name)
        .bind(&staff.gender)
        .bind(staff.birth_date)
        .bind(&staff.address)
        .bind(&staff.phone)
        .bind(staff.position)
        .fetch_one(&mut *tx)
        .await?;

        let account_code = codes::next_code(&mut *tx, CodeKind::Account).await?;
        let created_account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (code, username, email, password_hash, staff_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account_code)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&staff_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| username_error(e, &account.username))?;

        tx.commit().await?;
        Ok((created_staff, created_account))
    }
}
