use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{
    store::{CommentStore, StoreError},
    tree::{self, NameMaps},
    AnswerStatus, Author, Comment, CommentView, CreateComment, RootStatus, UpdateComment,
};

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

const ALREADY_ANSWERED: &str = "This comment has already been answered";

fn comment_not_found() -> CommentError {
    CommentError::NotFound("Comment not found".to_string())
}

/// Comment threads for products: reads build views from the flat rows,
/// writes enforce author and reply rules.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    async fn names_for(&self, flat: &[Comment]) -> Result<NameMaps, CommentError> {
        let mut customer_ids: Vec<String> = flat
            .iter()
            .filter_map(|c| c.author.customer_id())
            .map(str::to_string)
            .collect();
        customer_ids.sort();
        customer_ids.dedup();

        let mut staff_ids: Vec<String> = flat
            .iter()
            .filter_map(|c| c.author.staff_id())
            .map(str::to_string)
            .collect();
        staff_ids.sort();
        staff_ids.dedup();

        Ok(NameMaps {
            customers: self.store.customer_names(&customer_ids).await?,
            staff: self.store.staff_names(&staff_ids).await?,
        })
    }

    async fn flat_view(&self, comment: &Comment) -> Result<CommentView, CommentError> {
        let names = self.names_for(std::slice::from_ref(comment)).await?;
        Ok(tree::to_flat_view(comment, &names))
    }

    pub async fn author_of(&self, comment_id: &str) -> Result<Author, CommentError> {
        self.store
            .comment_by_id(comment_id)
            .await?
            .map(|c| c.author)
            .ok_or_else(comment_not_found)
    }

    /// A comment and every reply below it.
    pub async fn get_tree(&self, comment_id: &str) -> Result<CommentView, CommentError> {
        let target = self
            .store
            .comment_by_id(comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        let flat = self.store.comments_for_product(&target.product_id).await?;
        let names = self.names_for(&flat).await?;

        // The target was just read, so missing here means it was deleted in between.
        tree::build_subtree(&flat, &target.id, &names).ok_or_else(comment_not_found)
    }

    /// All threads of a product, newest root first.
    pub async fn get_forest(&self, product_id: &str) -> Result<Vec<CommentView>, CommentError> {
        let flat = self.store.comments_for_product(product_id).await?;
        let names = self.names_for(&flat).await?;
        Ok(tree::build_forest(&flat, &names))
    }

    pub async fn get_roots(&self, product_id: &str) -> Result<Vec<CommentView>, CommentError> {
        let mut roots = self.store.root_comments_for_product(product_id).await?;
        roots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let flat = self.store.comments_for_product(product_id).await?;
        let names = self.names_for(&flat).await?;
        let index = tree::build_children_index(&flat);
        Ok(roots
            .iter()
            .map(|root| tree::to_view_recursive(root, &index, &names))
            .collect())
    }

    /// Threads of a product still waiting for a staff answer.
    pub async fn get_unanswered(&self, product_id: &str) -> Result<Vec<CommentView>, CommentError> {
        let flat = self.store.comments_for_product(product_id).await?;
        let names = self.names_for(&flat).await?;
        let index = tree::build_children_index(&flat);
        Ok(tree::roots_newest_first(&flat)
            .into_iter()
            .filter(|root| tree::derive_status(root, &index) == AnswerStatus::Unanswered)
            .map(|root| tree::to_view_recursive(root, &index, &names))
            .collect())
    }

    /// Every root across all products with its answer status.
    pub async fn get_global_root_statuses(&self) -> Result<Vec<RootStatus>, CommentError> {
        let flat = self.store.all_comments().await?;
        let names = self.names_for(&flat).await?;
        let index = tree::build_children_index(&flat);
        Ok(tree::roots_newest_first(&flat)
            .into_iter()
            .map(|root| {
                RootStatus::new(
                    tree::to_view_recursive(root, &index, &names),
                    tree::derive_status(root, &index),
                )
            })
            .collect())
    }

    pub async fn create(&self, payload: CreateComment) -> Result<CommentView, CommentError> {
        let product_id = payload.product_id.trim();
        if product_id.is_empty() {
            return Err(CommentError::Validation("product_id is required".to_string()));
        }
        if payload.body.trim().is_empty() {
            return Err(CommentError::Validation("body is required".to_string()));
        }
        let author = Author::from_ids(payload.customer_id.as_deref(), payload.staff_id.as_deref())
            .ok_or_else(|| {
                CommentError::Validation(
                    "Provide exactly one of customer_id or staff_id".to_string(),
                )
            })?;

        let parent_id = payload
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(parent_id) = &parent_id {
            let parent = self
                .store
                .comment_by_id(parent_id)
                .await?
                .ok_or_else(|| CommentError::NotFound("Parent comment not found".to_string()))?;
            if parent.product_id != product_id {
                return Err(CommentError::Validation(
                    "Parent comment belongs to a different product".to_string(),
                ));
            }
            let flat = self.store.comments_for_product(product_id).await?;
            if flat
                .iter()
                .any(|c| c.parent_id.as_deref() == Some(parent_id.as_str()))
            {
                return Err(CommentError::Conflict(ALREADY_ANSWERED.to_string()));
            }
        }

        let comment = Comment {
            id: new_comment_id(),
            product_id: product_id.to_string(),
            author,
            body: payload.body,
            created_at: Utc::now(),
            parent_id,
        };

        match self.store.insert(&comment).await {
            Ok(()) => {}
            // Lost a race with another reply to the same parent.
            Err(StoreError::DuplicateReply(_)) => {
                return Err(CommentError::Conflict(ALREADY_ANSWERED.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(comment_id = %comment.id, product_id = %comment.product_id, "comment created");
        self.flat_view(&comment).await
    }

    pub async fn update(
        &self,
        comment_id: &str,
        payload: UpdateComment,
    ) -> Result<CommentView, CommentError> {
        if payload.body.trim().is_empty() {
            return Err(CommentError::Validation("body is required".to_string()));
        }
        let comment = self
            .store
            .update_body(comment_id, &payload.body)
            .await?
            .ok_or_else(comment_not_found)?;
        self.flat_view(&comment).await
    }

    /// Deletes a comment together with every reply below it.
    pub async fn delete(&self, comment_id: &str) -> Result<(), CommentError> {
        let target = self
            .store
            .comment_by_id(comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        let flat = self.store.comments_for_product(&target.product_id).await?;
        let index = tree::build_children_index(&flat);

        let mut ids: Vec<String> = tree::collect_descendants(&index, &target.id)
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        ids.push(target.id.clone());

        match self.store.delete_all(&ids).await {
            Ok(()) => {}
            Err(StoreError::ThreadChanged(id)) => {
                tracing::info!(comment_id = %target.id, reply_to = %id, "thread changed during delete");
                return Err(CommentError::Conflict(
                    "The thread changed while it was being deleted, try again".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(comment_id = %target.id, removed = ids.len(), "comment thread deleted");
        Ok(())
    }
}

/// 20 hex characters of a random UUID.
fn new_comment_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(20);
    id
}
