use sqlx::PgExecutor;

/// Kinds of human-readable sequential codes issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    Account,
    Customer,
    Staff,
}

impl CodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            CodeKind::Account => "TK",
            CodeKind::Customer => "KH",
            CodeKind::Staff => "NV",
        }
    }

    /// Formats `number` as prefix plus a zero-padded 4-digit suffix, e.g. `KH0007`.
    /// Numbers wider than 4 digits are kept as-is.
    pub fn format(self, number: i64) -> String {
        format!("{}{:04}", self.prefix(), number)
    }
}

/// Draws the next code of `kind` from the `code_sequences` counter table.
///
/// The increment is a single upsert, so concurrent callers never observe the same value.
pub async fn next_code<'e, E>(executor: E, kind: CodeKind) -> Result<String, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO code_sequences (prefix, value)
        VALUES ($1, 1)
        ON CONFLICT (prefix)
        DO UPDATE SET value = code_sequences.value + 1
        RETURNING value
        "#,
    )
    .bind(kind.prefix())
    .fetch_one(executor)
    .await?;

    Ok(kind.format(value))
}
