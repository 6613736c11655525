use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use crate::{
    config::ListingConfig,
    error::{AppError, AppResult},
    model::{
        progress::CompletionState, PageResp, PostDetailOut, PostDetailQuery, PostListQuery,
        PostSummaryOut, ResearchLinks, SortField, SortOrder, StepOut,
    },
    repo::{self, posts::PostRow},
    util::{markdown::render_markdown, time_estimate::short_time_label},
};

const CARD_TAGS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl ListParams {
    pub fn from_query(query: PostListQuery, listing: &ListingConfig) -> AppResult<Self> {
        let sort = match query.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse::<SortField>().map_err(AppError::BadRequest)?,
            None => SortField::default(),
        };
        let order = match query.order.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse::<SortOrder>().map_err(AppError::BadRequest)?,
            None => SortOrder::default(),
        };

        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query
            .page_size
            .unwrap_or(listing.page_size)
            .clamp(1, listing.max_page_size.max(1));

        Ok(Self {
            search,
            sort,
            order,
            page,
            page_size,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }
}

pub async fn list(
    pool: &PgPool,
    listing: &ListingConfig,
    query: PostListQuery,
) -> AppResult<PageResp<PostSummaryOut>> {
    let params = ListParams::from_query(query, listing)?;
    let offset = params.offset();

    let (rows, total) = repo::posts::list_posts(
        pool,
        repo::posts::PostListArgs {
            search: params.search.clone(),
            sort: params.sort,
            order: params.order,
            limit: params.page_size as i64,
            offset,
        },
    )
    .await?;

    tracing::debug!(
        page = params.page,
        page_size = params.page_size,
        total,
        search = ?params.search,
        "posts list queried"
    );

    let total = total.max(0) as u64;
    let has_more = (offset as u64) + (rows.len() as u64) < total;

    Ok(PageResp {
        page: params.page,
        page_size: params.page_size,
        total,
        has_more,
        items: rows.into_iter().map(summary_from_row).collect(),
    })
}

pub async fn detail_by_uuid(
    pool: &PgPool,
    raw_uuid: &str,
    query: PostDetailQuery,
) -> AppResult<PostDetailOut> {
    let uuid = Uuid::parse_str(raw_uuid.trim())
        .map_err(|_| AppError::NotFound(format!("no post {raw_uuid}")))?;
    let row = repo::posts::get_post_by_uuid(pool, uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no post {uuid}")))?;
    detail_from_row(row, &query)
}

pub async fn detail_by_id(
    pool: &PgPool,
    id: i64,
    query: PostDetailQuery,
) -> AppResult<PostDetailOut> {
    let row = repo::posts::get_post_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no post {id}")))?;
    detail_from_row(row, &query)
}

fn summary_from_row(row: PostRow) -> PostSummaryOut {
    PostSummaryOut {
        id: row.id,
        uuid: row.post_uuid.to_string(),
        time_label: short_time_label(row.time_estimate.as_deref()),
        title: row.title,
        description: row.description,
        category: row.category,
        difficulty: row.difficulty,
        time_estimate: row.time_estimate,
        tags: row.tags.into_iter().take(CARD_TAGS).collect(),
        created_at: row.created_at.to_rfc3339(),
    }
}

pub fn detail_from_row(row: PostRow, query: &PostDetailQuery) -> AppResult<PostDetailOut> {
    let completion = match query.completed.as_deref() {
        Some(raw) => CompletionState::parse_query(raw).map_err(AppError::BadRequest)?,
        None => CompletionState::default(),
    };

    let steps = row.steps.0;
    let progress_percent = completion.progress_percent(steps.len());
    let steps = steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| StepOut {
            index,
            number: index + 1,
            task: step.task,
            details_html: render_markdown(&step.details),
            completed: completion.is_completed(index),
        })
        .collect();

    Ok(PostDetailOut {
        id: row.id,
        uuid: row.post_uuid.to_string(),
        research_links: research_links(&row.title)?,
        time_label: short_time_label(row.time_estimate.as_deref()),
        content_html: render_markdown(row.content.as_deref().unwrap_or_default()),
        title: row.title,
        description: row.description,
        category: row.category,
        difficulty: row.difficulty,
        time_estimate: row.time_estimate,
        tags: row.tags,
        steps,
        progress_percent,
        created_at: row.created_at.to_rfc3339(),
    })
}

pub fn research_links(title: &str) -> anyhow::Result<ResearchLinks> {
    let tutorials = Url::parse_with_params(
        "https://www.google.com/search",
        &[("q", format!("how to master {title} tutorial factual"))],
    )?;
    let academic = Url::parse_with_params("https://scholar.google.com/scholar", &[("q", title)])?;

    Ok(ResearchLinks {
        tutorials: tutorials.to_string(),
        academic: academic.to_string(),
    })
}
