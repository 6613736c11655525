use anyhow::Context;

use library::{
    app, config, logging,
    repo::posts::PgPostStore,
    service::cleanup::{run_cleanup, CleanupOutcome},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    logging::setup_tracing(&config.logging, "cleanup")?;

    let extractor = config.dedup.extractor();
    let detector = config.dedup.detector()?;
    let pool = app::connect_pool(&config).await?;
    let store = PgPostStore::new(pool);

    let report = run_cleanup(&store, &extractor, &detector).await?;
    tracing::info!(
        scanned = report.scanned,
        flagged = report.flagged.len(),
        "library audit finished"
    );

    if let CleanupOutcome::DeleteFailed { error } = report.outcome {
        anyhow::bail!("failed to delete {} flagged posts: {error}", report.flagged.len());
    }

    Ok(())
}
