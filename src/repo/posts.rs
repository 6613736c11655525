use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    model::{SortField, SortOrder},
    service::{
        cleanup::{CleanupStore, PostHeadline},
        generate::GenerationStore,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: i64,
    pub task: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub post_uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: String,
    pub difficulty: Option<String>,
    pub time_estimate: Option<String>,
    pub tags: Vec<String>,
    pub steps: Json<Vec<StepRecord>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct HeadlineRow {
    id: i64,
    title: String,
    created_at: DateTime<Utc>,
}

pub struct PostListArgs {
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
}

const POST_COLUMNS: &str = "id, post_uuid, title, description, content, category, difficulty, \
                            time_estimate, tags, steps, created_at";

/// Escape LIKE wildcards so user input is matched literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_search_filter(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = like_pattern(term);
        builder
            .push(" WHERE (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list_posts(
    pool: &PgPool,
    args: PostListArgs,
) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM library.posts"));
    push_search_filter(&mut query, args.search.as_deref());
    // column and direction come from closed enums, never from raw input
    query
        .push(format!(
            " ORDER BY {} {} NULLS LAST, id {}",
            args.sort.column(),
            args.order.keyword(),
            args.order.keyword()
        ))
        .push(" LIMIT ")
        .push_bind(args.limit)
        .push(" OFFSET ")
        .push_bind(args.offset);

    let rows = query.build_query_as::<PostRow>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM library.posts");
    push_search_filter(&mut count, args.search.as_deref());
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((rows, total))
}

pub async fn get_post_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM library.posts WHERE post_uuid = $1"
    ))
    .bind(uuid)
    .fetch_optional(pool)
    .await
}

pub async fn get_post_by_id(pool: &PgPool, id: i64) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM library.posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_headlines_newest_first(pool: &PgPool) -> Result<Vec<PostHeadline>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HeadlineRow>(
        r#"
        SELECT id, title, created_at
        FROM library.posts
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PostHeadline {
            id: row.id,
            title: row.title,
            created_at: row.created_at,
        })
        .collect())
}

pub async fn delete_posts(pool: &PgPool, ids: &[i64]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        DELETE FROM library.posts
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn recent_titles(pool: &PgPool, limit: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT title
        FROM library.posts
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn insert_post(pool: &PgPool, post: &NewPost) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO library.posts (title, content, category)
        VALUES ($1, $2, $3)
        RETURNING post_uuid
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.category)
    .fetch_one(pool)
    .await
}

/// Postgres-backed store handed to the offline jobs.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CleanupStore for PgPostStore {
    async fn fetch_headlines_newest_first(&self) -> anyhow::Result<Vec<PostHeadline>> {
        Ok(list_headlines_newest_first(&self.pool).await?)
    }

    async fn delete_posts(&self, ids: &[i64]) -> anyhow::Result<u64> {
        Ok(delete_posts(&self.pool, ids).await?)
    }
}

#[async_trait]
impl GenerationStore for PgPostStore {
    async fn recent_titles(&self, limit: i64) -> anyhow::Result<Vec<String>> {
        Ok(recent_titles(&self.pool, limit).await?)
    }

    async fn insert_post(&self, post: &NewPost) -> anyhow::Result<String> {
        Ok(insert_post(&self.pool, post).await?.to_string())
    }
}
