use std::time::Duration;

use axum::{middleware, routing::get, Router};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api,
    config::{AppConfig, ListingConfig, RateLimitConfig, StudyHallConfig},
    middleware::{
        assign_request_id,
        rate_limit::{limit_by_ip, RateLimiter},
    },
    repo,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub listing: ListingConfig,
    pub study_hall: StudyHallConfig,
}

pub async fn connect_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.db.url)
        .await?;

    repo::migrations::ensure_schema(&pool).await?;
    Ok(pool)
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let pool = connect_pool(config).await?;

    let state = AppState {
        pool,
        listing: config.listing.clone(),
        study_hall: config.study_hall.clone(),
    };

    Ok(router(state, &config.rate_limit))
}

pub fn router(state: AppState, rate_limit: &RateLimitConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(assign_request_id));

    let mut posts: Router<AppState> = Router::new()
        .route("/posts", get(api::posts::list_posts))
        .route("/posts/by-id/:id", get(api::posts::post_by_id))
        .route("/posts/:uuid", get(api::posts::post_by_uuid));

    if rate_limit.enabled {
        let limiter = RateLimiter::new(rate_limit);
        posts = posts.route_layer(middleware::from_fn_with_state(limiter, limit_by_ip));
    }

    Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/study-hall", get(api::study_hall::study_hall))
        .merge(posts)
        .layer(middleware)
        .with_state(state)
}
