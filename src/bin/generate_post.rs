use anyhow::Context;

use library::{
    app, config, logging,
    repo::posts::PgPostStore,
    service::generate::{GenerationOutcome, PostGenerator},
    util::gemini::GeminiClient,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = ?err, "Error in generation");
        eprintln!("Error in generation: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    logging::setup_tracing(&config.logging, "generate_post")?;

    let extractor = config.dedup.extractor();
    let detector = config.dedup.detector()?;
    let gemini = GeminiClient::new(config.gemini.clone())?;
    let pool = app::connect_pool(&config).await?;
    let store = PgPostStore::new(pool);

    let generator = PostGenerator {
        categories: &config.gemini.categories,
        recent_limit: config.gemini.recent_titles,
        extractor: &extractor,
        detector: &detector,
    };

    match generator.run(&gemini, &store).await? {
        GenerationOutcome::Inserted { title, .. } => {
            tracing::info!(%title, "Success! New unique post added");
        }
        GenerationOutcome::SkippedDuplicate { title, matched } => {
            tracing::warn!(%title, %matched, "generated post was a paraphrase, nothing saved");
        }
    }

    Ok(())
}
