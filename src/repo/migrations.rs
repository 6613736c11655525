use sqlx::{Executor, PgPool};
use tracing::info;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    tx.execute(
        r#"
        CREATE SCHEMA IF NOT EXISTS library;
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS library.posts (
          id              BIGSERIAL PRIMARY KEY,
          post_uuid       UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
          title           TEXT NOT NULL,
          description     TEXT,
          content         TEXT,
          category        TEXT NOT NULL DEFAULT '',
          difficulty      TEXT,
          time_estimate   TEXT,
          tags            TEXT[] NOT NULL DEFAULT '{}',
          steps           JSONB NOT NULL DEFAULT '[]'::jsonb,
          created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_created_at ON library.posts(created_at DESC);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_title ON library.posts(title);
        "#,
    )
    .await?;

    tx.commit().await?;
    info!("library schema ready");
    Ok(())
}
