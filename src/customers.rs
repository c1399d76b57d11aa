use serde::Serialize;

/// Customer record linked to a user account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub code: String,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// Blank record created for an account on its first login.
    pub fn empty(code: String) -> Self {
        Self {
            code,
            full_name: None,
            gender: None,
            birth_date: None,
            address: None,
            phone: None,
        }
    }

    /// Whether the customer has filled in what is needed to place orders:
    /// name, address and phone.
    pub fn has_complete_profile(&self) -> bool {
        [&self.full_name, &self.address, &self.phone]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_customer_is_incomplete() {
        assert!(!Customer::empty("KH0001".to_string()).has_complete_profile());
    }

    #[test]
    fn complete_profile_needs_name_address_and_phone() {
        let mut customer = Customer {
            full_name: Some("Le Van C".to_string()),
            address: Some("12 Nguyen Trai".to_string()),
            phone: Some("0900000000".to_string()),
            ..Customer::empty("KH0002".to_string())
        };
        assert!(customer.has_complete_profile());

        customer.phone = Some("  ".to_string());
        assert!(!customer.has_complete_profile());
    }
}
