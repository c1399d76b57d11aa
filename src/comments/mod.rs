use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod handler;
pub mod pg;
pub mod service;
pub mod store;
pub mod tree;

/// Who wrote a comment. A comment has exactly one author kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Author {
    Customer(String),
    Staff(String),
}

impl Author {
    /// Builds an author from the nullable customer/staff id pair used at the
    /// storage and request boundaries. Blank ids count as absent.
    pub fn from_ids(customer_id: Option<&str>, staff_id: Option<&str>) -> Option<Self> {
        let customer_id = customer_id.map(str::trim).filter(|s| !s.is_empty());
        let staff_id = staff_id.map(str::trim).filter(|s| !s.is_empty());
        match (customer_id, staff_id) {
            (Some(id), None) => Some(Author::Customer(id.to_string())),
            (None, Some(id)) => Some(Author::Staff(id.to_string())),
            _ => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Author::Customer(id) | Author::Staff(id) => id,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Author::Staff(_))
    }

    pub fn customer_id(&self) -> Option<&str> {
        match self {
            Author::Customer(id) => Some(id),
            Author::Staff(_) => None,
        }
    }

    pub fn staff_id(&self) -> Option<&str> {
        match self {
            Author::Staff(id) => Some(id),
            Author::Customer(_) => None,
        }
    }
}

/// A comment as stored: flat, pointing at its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub product_id: String,
    pub author: Author,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<String>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Request payload for creating a comment or a reply
#[derive(Debug, Deserialize, Validate)]
pub struct CreateComment {
    pub product_id: String,
    pub customer_id: Option<String>,
    pub staff_id: Option<String>,
    #[validate(length(max = 10000, message = "Comment must be at most 10000 characters"))]
    pub body: String,
    pub parent_id: Option<String>, // set for replies
}

/// Request payload for updating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateComment {
    #[validate(length(max = 10000, message = "Comment must be at most 10000 characters"))]
    pub body: String,
}

/// Comment with resolved author name and its nested replies, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: String,
    pub product_id: String,
    pub author: Author,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<String>,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Unanswered,
    Answered,
}

impl AnswerStatus {
    /// Integer form used by the admin dashboard: 0 unanswered, 1 answered.
    pub fn code(self) -> u8 {
        match self {
            AnswerStatus::Unanswered => 0,
            AnswerStatus::Answered => 1,
        }
    }
}

/// A root thread together with its derived answer status
#[derive(Debug, Clone, Serialize)]
pub struct RootStatus {
    pub root: CommentView,
    pub status: AnswerStatus,
    pub status_code: u8,
}

impl RootStatus {
    pub fn new(root: CommentView, status: AnswerStatus) -> Self {
        Self {
            root,
            status,
            status_code: status.code(),
        }
    }
}
