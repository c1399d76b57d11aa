use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{
    store::{CommentStore, StoreError},
    Author, Comment,
};

const COMMENT_COLUMNS: &str = "id, product_id, customer_id, staff_id, body, created_at, parent_id";

const ONE_REPLY_PER_PARENT: &str = "comments_one_reply_per_parent";

/// Maps a failed insert; only the one-reply index means a duplicate reply.
fn insert_error(e: sqlx::Error, parent_id: Option<&String>) -> StoreError {
    let duplicate = matches!(
        &e,
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(ONE_REPLY_PER_PARENT)
    );
    match parent_id {
        Some(parent_id) if duplicate => StoreError::DuplicateReply(parent_id.clone()),
        _ => StoreError::Database(e),
    }
}

/// Maps a failed delete of comment `id`; a foreign key hit means a new reply arrived.
fn delete_error(e: sqlx::Error, id: &str) -> StoreError {
    let referenced = matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation());
    if referenced {
        StoreError::ThreadChanged(id.to_string())
    } else {
        StoreError::Database(e)
    }
}

/// Comment row as stored, with the author split over two nullable columns
#[derive(FromRow)]
struct CommentRow {
    id: String,
    product_id: String,
    customer_id: Option<String>,
    staff_id: Option<String>,
    body: String,
    created_at: chrono::DateTime<chrono::Utc>,
    parent_id: Option<String>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = StoreError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let author = Author::from_ids(row.customer_id.as_deref(), row.staff_id.as_deref())
            .ok_or_else(|| StoreError::InvalidAuthor(row.id.clone()))?;
        Ok(Comment {
            id: row.id,
            product_id: row.product_id,
            author,
            body: row.body,
            created_at: row.created_at,
            parent_id: row.parent_id,
        })
    }
}

fn into_comments(rows: Vec<CommentRow>) -> Result<Vec<Comment>, StoreError> {
    rows.into_iter().map(Comment::try_from).collect()
}

#[derive(FromRow)]
struct NameRow {
    code: String,
    full_name: Option<String>,
}

fn into_name_map(rows: Vec<NameRow>) -> HashMap<String, String> {
    rows.into_iter()
        .map(|r| {
            let name = r.full_name.unwrap_or_else(|| r.code.clone());
            (r.code, name)
        })
        .collect()
}

#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn comments_for_product(&self, product_id: &str) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        into_comments(rows)
    }

    async fn all_comments(&self) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!("SELECT {COMMENT_COLUMNS} FROM comments"))
            .fetch_all(&self.pool)
            .await?;
        into_comments(rows)
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Comment::try_from)
        .transpose()
    }

    async fn root_comments_for_product(
        &self,
        product_id: &str,
    ) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE product_id = $1 AND parent_id IS NULL ORDER BY created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        into_comments(rows)
    }

    async fn insert(&self, comment: &Comment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, product_id, customer_id, staff_id, body, created_at, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.product_id)
        .bind(comment.author.customer_id())
        .bind(comment.author.staff_id())
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(&comment.parent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, comment.parent_id.as_ref()))?;
        Ok(())
    }

    async fn update_body(&self, id: &str, body: &str) -> Result<Option<Comment>, StoreError> {
        sqlx::query_as::<_, CommentRow>(&format!(
            "UPDATE comments SET body = $1 WHERE id = $2 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(body)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Comment::try_from)
        .transpose()
    }

    async fn delete_all(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM comments WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| delete_error(e, id))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn customer_names(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, NameRow>(
            "SELECT code, full_name FROM customers WHERE code = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(into_name_map(rows))
    }

    async fn staff_names(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows =
            sqlx::query_as::<_, NameRow>("SELECT code, full_name FROM staff WHERE code = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(into_name_map(rows))
    }
}
