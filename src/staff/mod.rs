use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{AccountResponse, Role};

pub mod handler;

/// Staff record; `position` 1 is an administrator.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Staff {
    pub code: String,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub position: i32,
}

/// Staff fields to insert; the code is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub full_name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub phone: String,
    pub position: i32,
}

/// Request payload for creating a staff member together with their login
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaff {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Full name must be between 3 and 100 characters"
    ))]
    pub full_name: String,
    pub birth_date: NaiveDate,
    #[validate(length(min = 1, max = 20, message = "Gender must be 1 to 20 characters"))]
    pub gender: String,
    pub phone: String,
    #[validate(length(
        min = 5,
        max = 255,
        message = "Address must be between 5 and 255 characters"
    ))]
    pub address: String,
    pub position: i32,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be between 3 and 50 characters"
    ))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl CreateStaff {
    /// 10 or 11 digits, nothing else.
    pub fn has_valid_phone(&self) -> bool {
        let phone = self.phone.trim();
        (10..=11).contains(&phone.len()) && phone.bytes().all(|b| b.is_ascii_digit())
    }
}

#[derive(Debug, Serialize)]
pub struct StaffAccountResponse {
    pub staff: Staff,
    pub account: AccountResponse,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(phone: &str) -> CreateStaff {
        CreateStaff {
            full_name: "Tran Van Lan".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            gender: "Nam".to_string(),
            phone: phone.to_string(),
            address: "12 Hai Ba Trung".to_string(),
            position: 2,
            username: "lan.tran".to_string(),
            email: None,
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn phone_must_be_ten_or_eleven_digits() {
        assert!(payload("0912345678").has_valid_phone());
        assert!(payload("09123456789").has_valid_phone());
        assert!(!payload("091234567").has_valid_phone());
        assert!(!payload("09123-45678").has_valid_phone());
    }

    #[test]
    fn missing_email_passes_validation() {
        assert!(payload("0912345678").validate().is_ok());

        let mut bad = payload("0912345678");
        bad.email = Some("not-an-email".to_string());
        assert!(bad.validate().is_err());
    }
}
