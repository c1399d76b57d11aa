use std::collections::HashMap;

use async_trait::async_trait;

use super::Comment;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The parent already has a reply; raised by the one-reply-per-parent constraint.
    #[error("parent comment {0} already has a reply")]
    DuplicateReply(String),

    /// A reply to comment {0} appeared while its thread was being deleted.
    #[error("comment {0} gained a reply during deletion")]
    ThreadChanged(String),

    #[error("stored comment {0} has an invalid author")]
    InvalidAuthor(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence behind the comment service.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn comments_for_product(&self, product_id: &str) -> Result<Vec<Comment>, StoreError>;

    async fn all_comments(&self) -> Result<Vec<Comment>, StoreError>;

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, StoreError>;

    async fn root_comments_for_product(&self, product_id: &str)
        -> Result<Vec<Comment>, StoreError>;

    async fn insert(&self, comment: &Comment) -> Result<(), StoreError>;

    /// Replaces the body of comment `id`; returns the updated row if it exists.
    async fn update_body(&self, id: &str, body: &str) -> Result<Option<Comment>, StoreError>;

    /// Removes every listed comment, in order, as one unit. Nothing is removed
    /// when an unlisted reply still points at a listed comment.
    async fn delete_all(&self, ids: &[String]) -> Result<(), StoreError>;

    async fn customer_names(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError>;

    async fn staff_names(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError>;
}
