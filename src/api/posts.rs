use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{PageResp, PostDetailOut, PostDetailQuery, PostListQuery, PostSummaryOut},
    service,
};

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> AppResult<Json<PageResp<PostSummaryOut>>> {
    let page = service::posts::list(&state.pool, &state.listing, query).await?;
    Ok(Json(page))
}

pub async fn post_by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<PostDetailQuery>,
) -> AppResult<Json<PostDetailOut>> {
    let post = service::posts::detail_by_uuid(&state.pool, &uuid, query).await?;
    Ok(Json(post))
}

pub async fn post_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PostDetailQuery>,
) -> AppResult<Json<PostDetailOut>> {
    let post = service::posts::detail_by_id(&state.pool, id, query).await?;
    Ok(Json(post))
}
