//! Library audit: removes posts whose titles paraphrase a newer post.
//!
//! Posts are walked newest first. A post whose keywords overlap an already retained post
//! at or above the detector threshold is marked for deletion and its keywords are not
//! remembered; everything else joins the retained pool. Comparison is only against
//! retained posts in walk order, so the result depends on that order.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::util::keywords::{DuplicateDetector, KeywordExtractor, KeywordSet};

#[derive(Debug, Clone, PartialEq)]
pub struct PostHeadline {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// The two round-trips the audit makes against the backing store.
#[async_trait]
pub trait CleanupStore: Send + Sync {
    /// All posts, most recent first.
    async fn fetch_headlines_newest_first(&self) -> anyhow::Result<Vec<PostHeadline>>;

    /// Bulk delete; returns the number of rows removed.
    async fn delete_posts(&self, ids: &[i64]) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanupOutcome {
    NothingToDelete,
    Deleted { count: u64 },
    DeleteFailed { error: String },
}

#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub scanned: usize,
    pub flagged: Vec<PostHeadline>,
    pub outcome: CleanupOutcome,
}

impl CleanupReport {
    pub fn flagged_ids(&self) -> Vec<i64> {
        self.flagged.iter().map(|post| post.id).collect()
    }
}

/// Posts (given in walk order) that paraphrase an earlier retained post.
pub fn find_paraphrases(
    posts: &[PostHeadline],
    extractor: &KeywordExtractor,
    detector: &DuplicateDetector,
) -> Vec<PostHeadline> {
    let mut seen: Vec<KeywordSet> = Vec::new();
    let mut flagged = Vec::new();

    for post in posts {
        let keywords = extractor.extract(&post.title);
        if detector.is_duplicate(&keywords, &seen) {
            info!(post_id = post.id, title = %post.title, "flagged as paraphrase");
            flagged.push(post.clone());
        } else {
            seen.push(keywords);
        }
    }

    flagged
}

/// Run one audit pass. A failed fetch aborts the run; a failed delete is logged and
/// reported in the outcome, and the next run recomputes from whatever is left.
pub async fn run_cleanup<S>(
    store: &S,
    extractor: &KeywordExtractor,
    detector: &DuplicateDetector,
) -> anyhow::Result<CleanupReport>
where
    S: CleanupStore + ?Sized,
{
    info!("starting library audit");
    let posts = store
        .fetch_headlines_newest_first()
        .await
        .context("failed to fetch posts for cleanup")?;

    let flagged = find_paraphrases(&posts, extractor, detector);

    let outcome = if flagged.is_empty() {
        info!("No paraphrased posts found.");
        CleanupOutcome::NothingToDelete
    } else {
        let ids: Vec<i64> = flagged.iter().map(|post| post.id).collect();
        info!(count = ids.len(), "Deleting {} paraphrased posts...", ids.len());
        match store.delete_posts(&ids).await {
            Ok(count) => {
                info!(deleted = count, "Cleanup complete!");
                CleanupOutcome::Deleted { count }
            }
            Err(err) => {
                error!(error = ?err, ids = ?ids, "Error deleting");
                CleanupOutcome::DeleteFailed {
                    error: format!("{err:#}"),
                }
            }
        }
    };

    Ok(CleanupReport {
        scanned: posts.len(),
        flagged,
        outcome,
    })
}
