// Repository pattern - a post and its dependents are written in one transaction
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashSet;

use crate::db::models::{Answer, Interview, InterviewType, Payment, Post, StoredPost};
use crate::db::DbPool;
use crate::error::StoreResult;
use crate::sql::{BatchInsert, ParamStyle, Statement, SQLITE_MAX_PARAMS};

const STYLE: ParamStyle = ParamStyle::Sqlite;

/// Post persistence.
pub trait PostRepository: Send + Sync {
    /// Write the post with its interviews, answers, payments and asset
    /// links. Either everything is stored and the new post id returned, or
    /// nothing is.
    fn insert_post(&self, post: &Post) -> StoreResult<i64>;

    /// Load a post with all of its dependents.
    fn get_post(&self, post_id: i64) -> StoreResult<Option<StoredPost>>;

    /// Most recently published posts of a group.
    fn list_posts(&self, group_id: i64, limit: u32) -> StoreResult<Vec<StoredPost>>;
}

/// SQLite implementation
pub struct SqlitePostRepository {
    pool: DbPool,
}

impl SqlitePostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PostRepository for SqlitePostRepository {
    fn insert_post(&self, post: &Post) -> StoreResult<i64> {
        let mut conn = self.pool.get()?;

        // Rolled back on drop unless committed
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match write_post(&tx, post) {
            Ok(post_id) => {
                tx.commit()?;
                tracing::info!(
                    "Stored post {} for group {} ({} interviews, {} payments, {} photos, {} files)",
                    post_id,
                    post.group_id,
                    post.interviews.len(),
                    post.payments.len(),
                    post.photos.len(),
                    post.files.len()
                );
                Ok(post_id)
            }
            Err(e) => {
                tracing::warn!("Rolling back post for group {}: {}", post.group_id, e);
                Err(e)
            }
        }
    }

    fn get_post(&self, post_id: i64) -> StoreResult<Option<StoredPost>> {
        let conn = self.pool.get()?;
        load_post(&conn, post_id)
    }

    fn list_posts(&self, group_id: i64, limit: u32) -> StoreResult<Vec<StoredPost>> {
        let conn = self.pool.get()?;

        let ids: Vec<i64> = Statement::from_template(
            "SELECT id FROM posts WHERE group_id = ? ORDER BY publish_date DESC, id DESC LIMIT ?",
            STYLE,
            vec![Value::from(group_id), Value::from(i64::from(limit))],
        )
        .query_column(&conn)?;

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(post) = load_post(&conn, id)? {
                posts.push(post);
            }
        }
        Ok(posts)
    }
}

// --- Write steps, each running inside the caller's transaction ---

fn write_post(tx: &Transaction<'_>, post: &Post) -> StoreResult<i64> {
    let post_id = insert_root(tx, post)?;
    insert_interviews(tx, post_id, &post.interviews)?;
    insert_payments(tx, post_id, &post.payments)?;
    insert_links(tx, "post_photos", "photo_id", post_id, &post.photos)?;
    insert_links(tx, "post_files", "file_id", post_id, &post.files)?;
    Ok(post_id)
}

fn insert_root(tx: &Transaction<'_>, post: &Post) -> StoreResult<i64> {
    let post_id = Statement::from_template(
        "INSERT INTO posts (create_by, publish_date, group_id, text)
         VALUES (?, ?, ?, ?)
         RETURNING id",
        STYLE,
        vec![
            Value::from(post.created_by),
            Value::from(post.publish_date.to_rfc3339()),
            Value::from(post.group_id),
            Value::from(post.text.clone()),
        ],
    )
    .query_one(tx)?;

    Ok(post_id)
}

fn insert_interviews(
    tx: &Transaction<'_>,
    post_id: i64,
    interviews: &[Interview],
) -> StoreResult<()> {
    for interview in interviews {
        let interview_id: i64 = Statement::from_template(
            "INSERT INTO interviews (post_id, text, type)
             VALUES (?, ?, ?)
             RETURNING id",
            STYLE,
            vec![
                Value::from(post_id),
                Value::from(interview.text.clone()),
                Value::from(interview.kind.as_str().to_string()),
            ],
        )
        .query_one(tx)?;

        insert_answers(tx, interview_id, &interview.answers)?;
    }

    Ok(())
}

fn insert_answers(tx: &Transaction<'_>, interview_id: i64, answers: &[Answer]) -> StoreResult<()> {
    let mut batch = BatchInsert::new("answers", ["interview_id", "text"]);
    batch.extend(
        answers
            .iter()
            .map(|answer| [Value::from(interview_id), Value::from(answer.text.clone())]),
    );

    execute_batch(tx, batch)
}

fn insert_payments(tx: &Transaction<'_>, post_id: i64, payments: &[Payment]) -> StoreResult<()> {
    let mut batch = BatchInsert::new("payments", ["post_id", "cost", "currency_id"]);
    batch.extend(payments.iter().map(|payment| {
        [
            Value::from(post_id),
            Value::from(payment.cost),
            Value::from(payment.currency),
        ]
    }));

    execute_batch(tx, batch)
}

/// Link rows `(post_id, <column>)` into a join table. An id listed more
/// than once is linked once, at its first position.
fn insert_links(
    tx: &Transaction<'_>,
    table: &'static str,
    column: &'static str,
    post_id: i64,
    ids: &[i64],
) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut batch = BatchInsert::new(table, ["post_id", column]);
    batch.extend(
        ids.iter()
            .filter(|&&id| seen.insert(id))
            .map(|&id| [Value::from(post_id), Value::from(id)]),
    );

    execute_batch(tx, batch)
}

fn execute_batch<const N: usize>(tx: &Transaction<'_>, batch: BatchInsert<N>) -> StoreResult<()> {
    let (table, rows) = (batch.table(), batch.len());
    if rows == 0 {
        tracing::debug!("Skipping empty batch insert into {}", table);
        return Ok(());
    }

    let statements = batch.build_chunks(STYLE, SQLITE_MAX_PARAMS);
    tracing::debug!(
        "Batch insert of {} rows into {} ({} statements)",
        rows,
        table,
        statements.len()
    );
    for stmt in &statements {
        stmt.execute(tx)?;
    }
    Ok(())
}

// --- Read helpers ---

fn load_post(conn: &Connection, post_id: i64) -> StoreResult<Option<StoredPost>> {
    let root = conn
        .query_row(
            "SELECT create_by, publish_date, group_id, text FROM posts WHERE id = ?1",
            params![post_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    parse_timestamp(1, row.get(1)?)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((created_by, publish_date, group_id, text)) = root else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT id, text, type FROM interviews WHERE post_id = ?1 ORDER BY id")?;
    let interview_rows = stmt
        .query_map(params![post_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<(i64, String, InterviewType)>, _>>()?;

    let mut interviews = Vec::with_capacity(interview_rows.len());
    for (interview_id, text, kind) in interview_rows {
        let answers = Statement::from_template(
            "SELECT text FROM answers WHERE interview_id = ? ORDER BY id",
            STYLE,
            vec![Value::from(interview_id)],
        )
        .query_column::<String>(conn)?
        .into_iter()
        .map(|text| Answer { text })
        .collect();

        interviews.push(Interview {
            text,
            kind,
            answers,
        });
    }

    let mut stmt =
        conn.prepare("SELECT cost, currency_id FROM payments WHERE post_id = ?1 ORDER BY id")?;
    let payments = stmt
        .query_map(params![post_id], |row| {
            Ok(Payment {
                cost: row.get(0)?,
                currency: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let photos = linked_ids(conn, "post_photos", "photo_id", post_id)?;
    let files = linked_ids(conn, "post_files", "file_id", post_id)?;

    Ok(Some(StoredPost {
        id: post_id,
        post: Post {
            created_by,
            publish_date,
            group_id,
            text,
            interviews,
            payments,
            photos,
            files,
        },
    }))
}

fn linked_ids(
    conn: &Connection,
    table: &str,
    column: &str,
    post_id: i64,
) -> StoreResult<Vec<i64>> {
    let template = format!("SELECT {column} FROM {table} WHERE post_id = ? ORDER BY rowid");
    let ids = Statement::from_template(&template, STYLE, vec![Value::from(post_id)])
        .query_column(conn)?;
    Ok(ids)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
