use std::{
    io,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use library::{
    service::cleanup::{run_cleanup, CleanupOutcome, CleanupStore, PostHeadline},
    util::keywords::{DuplicateDetector, KeywordExtractor},
};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Default)]
struct MemoryStore {
    posts: Mutex<Vec<PostHeadline>>,
    fail_fetch: bool,
    fail_delete: bool,
    delete_calls: Mutex<Vec<Vec<i64>>>,
}

impl MemoryStore {
    fn with_titles(titles: &[&str]) -> Self {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let posts = titles
            .iter()
            .enumerate()
            .map(|(i, title)| PostHeadline {
                id: i as i64 + 1,
                title: title.to_string(),
                created_at: base - Duration::minutes(i as i64),
            })
            .collect();
        Self {
            posts: Mutex::new(posts),
            ..Self::default()
        }
    }

    fn remaining_ids(&self) -> Vec<i64> {
        self.posts.lock().unwrap().iter().map(|p| p.id).collect()
    }

    fn delete_calls(&self) -> Vec<Vec<i64>> {
        self.delete_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CleanupStore for MemoryStore {
    async fn fetch_headlines_newest_first(&self) -> anyhow::Result<Vec<PostHeadline>> {
        if self.fail_fetch {
            return Err(anyhow!("connection refused"));
        }
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn delete_posts(&self, ids: &[i64]) -> anyhow::Result<u64> {
        self.delete_calls.lock().unwrap().push(ids.to_vec());
        if self.fail_delete {
            return Err(anyhow!("permission denied for table posts"));
        }
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| !ids.contains(&p.id));
        Ok((before - posts.len()) as u64)
    }
}

/// Collects formatted log lines so a test can assert on what the job reported.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run one cleanup pass with a subscriber scoped to this thread; returns the outcome
/// and everything logged while it ran.
async fn run_logged(store: &MemoryStore) -> (CleanupOutcome, String) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (extractor, detector) = tools();
    let report = run_cleanup(store, &extractor, &detector).await.unwrap();
    (report.outcome, logs.contents())
}

fn tools() -> (KeywordExtractor, DuplicateDetector) {
    (KeywordExtractor::default(), DuplicateDetector::default())
}

#[tokio::test]
async fn deletes_paraphrase_and_keeps_distinct_topics() {
    let store = MemoryStore::with_titles(&[
        "Learning Woodworking Basics",
        "Woodworking For Beginners",
        "Astrophysics Observation",
    ]);
    let (extractor, detector) = tools();

    let report = run_cleanup(&store, &extractor, &detector).await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.flagged_ids(), vec![2]);
    assert_eq!(report.outcome, CleanupOutcome::Deleted { count: 1 });
    assert_eq!(store.delete_calls(), vec![vec![2]]);
    assert_eq!(store.remaining_ids(), vec![1, 3]);
}

#[tokio::test]
async fn no_duplicates_means_no_delete_call() {
    let store = MemoryStore::with_titles(&[
        "Bookbinding by Hand",
        "Astrophysics Observation",
        "The Guide",
    ]);
    let (extractor, detector) = tools();

    let report = run_cleanup(&store, &extractor, &detector).await.unwrap();

    assert_eq!(report.outcome, CleanupOutcome::NothingToDelete);
    assert!(report.flagged.is_empty());
    assert!(store.delete_calls().is_empty());
}

#[tokio::test]
async fn empty_store_is_a_no_op() {
    let store = MemoryStore::default();
    let (extractor, detector) = tools();

    let report = run_cleanup(&store, &extractor, &detector).await.unwrap();

    assert_eq!(report.scanned, 0);
    assert_eq!(report.outcome, CleanupOutcome::NothingToDelete);
    assert!(store.delete_calls().is_empty());
}

#[tokio::test]
async fn delete_failure_is_reported_not_propagated() {
    let mut store = MemoryStore::with_titles(&[
        "Learning Woodworking Basics",
        "Woodworking For Beginners",
    ]);
    store.fail_delete = true;
    let (extractor, detector) = tools();

    let report = run_cleanup(&store, &extractor, &detector).await.unwrap();

    match &report.outcome {
        CleanupOutcome::DeleteFailed { error } => assert!(error.contains("permission denied")),
        other => panic!("expected delete failure, got {other:?}"),
    }
    assert_eq!(report.flagged_ids(), vec![2]);
    assert_eq!(store.delete_calls().len(), 1, "delete is not retried");
    assert_eq!(store.remaining_ids(), vec![1, 2]);
}

#[tokio::test]
async fn fetch_failure_aborts_the_run() {
    let store = MemoryStore {
        fail_fetch: true,
        ..MemoryStore::default()
    };
    let (extractor, detector) = tools();

    let err = run_cleanup(&store, &extractor, &detector).await.unwrap_err();

    assert!(format!("{err:#}").contains("connection refused"));
    assert!(store.delete_calls().is_empty());
}

#[tokio::test]
async fn rerun_after_cleanup_finds_nothing() {
    let store = MemoryStore::with_titles(&[
        "Sourdough Starter",
        "Sourdough Starter Feeding",
        "Feeding a Sourdough Starter",
        "Tidepool Ecology",
        "Coastal Tidepools Explained",
    ]);
    let (extractor, detector) = tools();

    let first = run_cleanup(&store, &extractor, &detector).await.unwrap();
    assert_eq!(first.flagged_ids(), vec![2, 3]);

    let second = run_cleanup(&store, &extractor, &detector).await.unwrap();
    assert_eq!(second.outcome, CleanupOutcome::NothingToDelete);
    assert_eq!(store.remaining_ids(), vec![1, 4, 5]);
}

#[tokio::test]
async fn rerun_after_failed_delete_recomputes_same_list() {
    let mut store = MemoryStore::with_titles(&[
        "Sourdough Starter",
        "Sourdough Starter Feeding",
        "Tidepool Ecology",
    ]);
    store.fail_delete = true;
    let (extractor, detector) = tools();

    let first = run_cleanup(&store, &extractor, &detector).await.unwrap();
    store.fail_delete = false;
    let second = run_cleanup(&store, &extractor, &detector).await.unwrap();

    assert_eq!(first.flagged_ids(), second.flagged_ids());
    assert_eq!(second.outcome, CleanupOutcome::Deleted { count: 1 });
}

#[tokio::test]
async fn stricter_threshold_keeps_partial_overlaps() {
    let store = MemoryStore::with_titles(&["Woodworking Tools", "Woodworking For Beginners"]);
    let extractor = KeywordExtractor::default();

    let lenient = DuplicateDetector::new(0.5).unwrap();
    let strict = DuplicateDetector::new(0.75).unwrap();

    let report = run_cleanup(&store, &extractor, &strict).await.unwrap();
    assert_eq!(report.outcome, CleanupOutcome::NothingToDelete);

    let report = run_cleanup(&store, &extractor, &lenient).await.unwrap();
    assert_eq!(report.flagged_ids(), vec![2]);
}

#[tokio::test]
async fn logs_nothing_found_summary_for_distinct_titles() {
    let store = MemoryStore::with_titles(&["Bookbinding by Hand", "Astrophysics Observation"]);

    let (outcome, logs) = run_logged(&store).await;

    assert_eq!(outcome, CleanupOutcome::NothingToDelete);
    assert!(logs.contains("No paraphrased posts found."), "{logs}");
    assert!(!logs.contains("flagged as paraphrase"), "{logs}");
    assert!(!logs.contains("Deleting"), "{logs}");
    assert!(!logs.contains("Cleanup complete!"), "{logs}");
}

#[tokio::test]
async fn logs_each_flagged_title_then_completion() {
    let store = MemoryStore::with_titles(&[
        "Learning Woodworking Basics",
        "Woodworking For Beginners",
        "Astrophysics Observation",
    ]);

    let (outcome, logs) = run_logged(&store).await;

    assert_eq!(outcome, CleanupOutcome::Deleted { count: 1 });
    assert!(logs.contains("flagged as paraphrase"), "{logs}");
    assert!(logs.contains("title=Woodworking For Beginners"), "{logs}");
    assert!(!logs.contains("title=Astrophysics Observation"), "{logs}");
    assert!(logs.contains("Deleting 1 paraphrased posts..."), "{logs}");
    assert!(logs.contains("Cleanup complete!"), "{logs}");
    assert!(!logs.contains("No paraphrased posts found."), "{logs}");
}

#[tokio::test]
async fn failed_delete_logs_error_without_completion() {
    let mut store = MemoryStore::with_titles(&[
        "Learning Woodworking Basics",
        "Woodworking For Beginners",
    ]);
    store.fail_delete = true;

    let (outcome, logs) = run_logged(&store).await;

    assert!(matches!(outcome, CleanupOutcome::DeleteFailed { .. }));
    assert!(logs.contains("title=Woodworking For Beginners"), "{logs}");
    assert!(logs.contains("Deleting 1 paraphrased posts..."), "{logs}");
    let error_line = logs
        .lines()
        .find(|line| line.contains("Error deleting"))
        .unwrap_or_else(|| panic!("no delete error logged:\n{logs}"));
    assert!(error_line.contains("ERROR"), "{error_line}");
    assert!(error_line.contains("permission denied"), "{error_line}");
    assert!(!logs.contains("Cleanup complete!"), "{logs}");
}
