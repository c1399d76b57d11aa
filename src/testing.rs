//! In-memory stores for service and router tests.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    auth::{
        store::{AccountStore, AccountStoreError},
        Account, NewAccount,
    },
    codes::CodeKind,
    comments::{
        store::{CommentStore, StoreError},
        Author, Comment,
    },
    customers::Customer,
    staff::{NewStaff, Staff},
};

#[derive(Default)]
struct Tables {
    comments: Vec<Comment>,
    accounts: Vec<Account>,
    customers: Vec<Customer>,
    staff: Vec<Staff>,
    sequences: HashMap<CodeKind, i64>,
    race_next_reply: bool,
    reply_during_delete: Option<String>,
}

impl Tables {
    fn next_code(&mut self, kind: CodeKind) -> String {
        let value = self.sequences.entry(kind).or_insert(0);
        *value += 1;
        kind.format(*value)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn add_customer(&self, code: &str, name: Option<&str>) {
        let mut customer = Customer::empty(code.to_string());
        customer.full_name = name.map(str::to_string);
        self.lock().customers.push(customer);
    }

    pub fn add_staff(&self, code: &str, name: Option<&str>, position: i32) {
        self.lock().staff.push(Staff {
            code: code.to_string(),
            full_name: name.map(str::to_string),
            gender: None,
            birth_date: None,
            address: None,
            phone: None,
            position,
        });
    }

    pub fn link_staff(&self, account_code: &str, staff_code: &str) {
        let mut tables = self.lock();
        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.code == account_code)
            .unwrap();
        account.staff_id = Some(staff_code.to_string());
    }

    pub fn complete_customer(&self, code: &str) {
        let mut tables = self.lock();
        let customer = tables.customers.iter_mut().find(|c| c.code == code).unwrap();
        customer.full_name = Some("Pham Thi D".to_string());
        customer.address = Some("1 Le Loi".to_string());
        customer.phone = Some("0911111111".to_string());
    }

    pub fn customer_count(&self) -> usize {
        self.lock().customers.len()
    }

    /// Makes another writer reply first to whatever parent the next insert targets.
    pub fn race_next_reply(&self) {
        self.lock().race_next_reply = true;
    }

    /// Makes a customer reply to `parent_id` just before the next delete runs.
    pub fn reply_during_next_delete(&self, parent_id: &str) {
        self.lock().reply_during_delete = Some(parent_id.to_string());
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn comments_for_product(&self, product_id: &str) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn all_comments(&self) -> Result<Vec<Comment>, StoreError> {
        Ok(self.lock().comments.clone())
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        Ok(self.lock().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn root_comments_for_product(
        &self,
        product_id: &str,
    ) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.product_id == product_id && c.is_root())
            .cloned()
            .collect())
    }

    async fn insert(&self, comment: &Comment) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if let Some(parent_id) = &comment.parent_id {
            if std::mem::take(&mut tables.race_next_reply) {
                tables.comments.push(Comment {
                    id: format!("racer-{parent_id}"),
                    author: Author::Staff("NV9999".to_string()),
                    created_at: Utc::now(),
                    ..comment.clone()
                });
            }
            if tables
                .comments
                .iter()
                .any(|c| c.parent_id.as_ref() == Some(parent_id))
            {
                return Err(StoreError::DuplicateReply(parent_id.clone()));
            }
        }
        tables.comments.push(comment.clone());
        Ok(())
    }

    async fn update_body(&self, id: &str, body: &str) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.lock();
        Ok(tables.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.body = body.to_string();
            c.clone()
        }))
    }

    async fn delete_all(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if let Some(parent_id) = tables.reply_during_delete.take() {
            let parent = tables
                .comments
                .iter()
                .find(|c| c.id == parent_id)
                .cloned()
                .unwrap();
            tables.comments.push(Comment {
                id: format!("late-{parent_id}"),
                author: Author::Customer("KH9999".to_string()),
                created_at: Utc::now(),
                parent_id: Some(parent_id),
                ..parent
            });
        }

        // Work on a copy so a failed delete leaves the table untouched.
        let mut remaining = tables.comments.clone();
        for (position, id) in ids.iter().enumerate() {
            if let Some(child) = remaining.iter().find(|c| c.parent_id.as_ref() == Some(id)) {
                assert!(
                    !ids[position..].contains(&child.id),
                    "deleted {id} before its replies"
                );
                return Err(StoreError::ThreadChanged(id.clone()));
            }
            remaining.retain(|c| &c.id != id);
        }
        tables.comments = remaining;
        Ok(())
    }

    async fn customer_names(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .lock()
            .customers
            .iter()
            .filter(|c| ids.contains(&c.code))
            .map(|c| {
                let name = c.full_name.clone().unwrap_or_else(|| c.code.clone());
                (c.code.clone(), name)
            })
            .collect())
    }

    async fn staff_names(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .lock()
            .staff
            .iter()
            .filter(|s| ids.contains(&s.code))
            .map(|s| {
                let name = s.full_name.clone().unwrap_or_else(|| s.code.clone());
                (s.code.clone(), name)
            })
            .collect())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn username_exists(&self, username: &str) -> Result<bool, AccountStoreError> {
        Ok(self.lock().accounts.iter().any(|a| a.username == username))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountStoreError> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Account>, AccountStoreError> {
        Ok(self.lock().accounts.iter().find(|a| a.code == code).cloned())
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountStoreError> {
        let mut tables = self.lock();
        if tables.accounts.iter().any(|a| a.username == account.username) {
            return Err(AccountStoreError::UsernameTaken(account.username));
        }
        let created = Account {
            code: tables.next_code(CodeKind::Account),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            customer_id: None,
            staff_id: None,
            created_at: Utc::now(),
        };
        tables.accounts.push(created.clone());
        Ok(created)
    }

    async fn staff_position(&self, staff_id: &str) -> Result<Option<i32>, AccountStoreError> {
        Ok(self
            .lock()
            .staff
            .iter()
            .find(|s| s.code == staff_id)
            .map(|s| s.position))
    }

    async fn find_customer(&self, code: &str) -> Result<Option<Customer>, AccountStoreError> {
        Ok(self.lock().customers.iter().find(|c| c.code == code).cloned())
    }

    async fn bootstrap_customer(&self, account_code: &str) -> Result<Customer, AccountStoreError> {
        let mut tables = self.lock();
        let customer = Customer::empty(tables.next_code(CodeKind::Customer));
        tables.customers.push(customer.clone());
        if let Some(account) = tables.accounts.iter_mut().find(|a| a.code == account_code) {
            account.customer_id = Some(customer.code.clone());
        }
        Ok(customer)
    }

    async fn create_staff_account(
        &self,
        staff: NewStaff,
        account: NewAccount,
    ) -> Result<(Staff, Account), AccountStoreError> {
        let mut tables = self.lock();
        if tables.accounts.iter().any(|a| a.username == account.username) {
            return Err(AccountStoreError::UsernameTaken(account.username));
        }
        let created_staff = Staff {
            code: tables.next_code(CodeKind::Staff),
            full_name: Some(staff.full_name),
            gender: Some(staff.gender),
            birth_date: Some(staff.birth_date),
            address: Some(staff.address),
            phone: Some(staff.phone),
            position: staff.position,
        };
        let created_account = Account {
            code: tables.next_code(CodeKind::Account),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            customer_id: None,
            staff_id: Some(created_staff.code.clone()),
            created_at: Utc::now(),
        };
        tables.staff.push(created_staff.clone());
        tables.accounts.push(created_account.clone());
        Ok((created_staff, created_account))
    }
}
