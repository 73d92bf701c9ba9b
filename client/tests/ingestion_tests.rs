//! PDF ingestion pipeline tests
//!
//! Drives the pipeline against an in-memory certificate service:
//! - Store growth and ordering for mixed outcomes
//! - Auth failure mid-batch
//! - Progress published before each service call

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use battery_health_client::config::BatchConfig;
use battery_health_client::services::{IngestionPipeline, UploadFile};
use battery_health_client::{AppError, CertificateStore, ProgressReporter, Session};
use common::{reference_table, FakeApi, Scripted};
use proptest::prelude::*;
use shared::Progress;

fn batch_config() -> BatchConfig {
    BatchConfig {
        upload_pause_ms: 0,
        generation_pause_ms: 0,
        max_upload_bytes: 64,
    }
}

fn pdf(name: &str) -> UploadFile {
    UploadFile::from_bytes(name, b"%PDF-1.7".to_vec())
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_mixed_batch_appends_successes_in_order() {
        let api = FakeApi::new()
            .extraction("d.pdf", Scripted::NoData)
            .extraction("e.pdf", Scripted::Fail("Corrupt PDF"));
        let config = batch_config();
        let progress = ProgressReporter::new();
        let mut session = Session::new().with_token("token-123");
        let mut store = CertificateStore::default();
        store.create();

        let files = vec![
            pdf("a.pdf"),
            pdf("notes.txt"),
            UploadFile::from_bytes("big.pdf", vec![0; 100]),
            pdf("d.pdf"),
            pdf("e.pdf"),
            pdf("f.PDF"),
        ];

        let summary = IngestionPipeline::new(&api, &config, &progress)
            .run(&mut session, &mut store, &reference_table(), files)
            .await
            .unwrap();

        // Rejected files never reach the service
        assert_eq!(api.calls(), vec!["a.pdf", "d.pdf", "e.pdf", "f.PDF"]);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.first_inserted, Some(1));
        let reasons: Vec<String> = summary.failures.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            reasons,
            vec![
                "notes.txt: Not a PDF file",
                "big.pdf: File too large (>16MB)",
                "d.pdf: No data extracted from PDF",
                "e.pdf: Corrupt PDF",
            ]
        );

        assert_eq!(store.len(), 3);
        assert_eq!(store.current_index(), 1);
        let added: Vec<_> = store.records()[1..]
            .iter()
            .map(|r| (r.source_pdf_name.clone().unwrap(), r.registration.clone()))
            .collect();
        assert_eq!(
            added,
            vec![
                ("a.pdf".to_string(), "REG-A".to_string()),
                ("f.PDF".to_string(), "REG-F".to_string()),
            ]
        );
        assert!(store.records()[1..].iter().all(|r| r.make == "Tesla"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_auth_failure_keeps_earlier_results_and_stops() {
        let api = FakeApi::new().extraction("3.pdf", Scripted::Auth);
        let config = batch_config();
        let progress = ProgressReporter::new();
        let expired = Arc::new(AtomicUsize::new(0));
        let counter = expired.clone();
        let mut session = Session::with_expiry_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .with_token("token-123");
        let mut store = CertificateStore::default();

        let files = (1..=5).map(|i| pdf(&format!("{i}.pdf"))).collect();
        let err = IngestionPipeline::new(&api, &config, &progress)
            .run(&mut session, &mut store, &reference_table(), files)
            .await
            .unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(api.calls(), vec!["1.pdf", "2.pdf", "3.pdf"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].registration, "REG-1");
        assert_eq!(store.records()[1].registration, "REG-2");
        assert!(!session.is_authenticated());
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert!(progress.snapshot().is_idle());
    }

    #[tokio::test]
    async fn test_progress_is_published_before_each_call() {
        let api = FakeApi::new();
        let config = batch_config();
        let progress = ProgressReporter::new();
        api.observe(progress.subscribe());
        let mut session = Session::new().with_token("token-123");
        let mut store = CertificateStore::default();

        let files = vec![pdf("one.pdf"), pdf("skip.doc"), pdf("three.pdf")];
        IngestionPipeline::new(&api, &config, &progress)
            .run(&mut session, &mut store, &reference_table(), files)
            .await
            .unwrap();

        assert_eq!(
            api.progress_seen(),
            vec![
                Progress::new(1, 3, "Processing one.pdf..."),
                Progress::new(3, 3, "Processing three.pdf..."),
            ]
        );
        assert!(progress.snapshot().is_idle());
    }

    #[tokio::test]
    async fn test_requires_login() {
        let api = FakeApi::new();
        let config = batch_config();
        let progress = ProgressReporter::new();
        let mut session = Session::new();
        let mut store = CertificateStore::default();

        let err = IngestionPipeline::new(&api, &config, &progress)
            .run(&mut session, &mut store, &reference_table(), vec![pdf("a.pdf")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAuthenticated));
        assert!(api.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_all_failures_leave_store_untouched() {
        let api = FakeApi::new().extraction("a.pdf", Scripted::Fail("Upload failed"));
        let config = batch_config();
        let progress = ProgressReporter::new();
        let mut session = Session::new().with_token("token-123");
        let mut store = CertificateStore::default();
        let existing = store.create();

        let summary = IngestionPipeline::new(&api, &config, &progress)
            .run(
                &mut session,
                &mut store,
                &reference_table(),
                vec![pdf("a.pdf"), pdf("b.png")],
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.first_inserted, None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.current().unwrap().id, existing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_are_paced() {
        let api = FakeApi::new();
        let config = BatchConfig {
            upload_pause_ms: 300,
            ..batch_config()
        };
        let progress = ProgressReporter::new();
        let mut session = Session::new().with_token("token-123");
        let mut store = CertificateStore::default();

        let start = tokio::time::Instant::now();
        let files = vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")];
        IngestionPipeline::new(&api, &config, &progress)
            .run(&mut session, &mut store, &reference_table(), files)
            .await
            .unwrap();

        assert_eq!(start.elapsed(), std::time::Duration::from_millis(600));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone)]
enum FileKind {
    Good,
    WrongType,
    Remote,
}

fn file_kind_strategy() -> impl Strategy<Value = FileKind> {
    prop_oneof![
        Just(FileKind::Good),
        Just(FileKind::WrongType),
        Just(FileKind::Remote),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// N files with K rejected locally and M failing remotely grow the
    /// store by exactly N - K - M, in input order
    #[test]
    fn prop_store_grows_by_successes(kinds in prop::collection::vec(file_kind_strategy(), 0..12)) {
        let mut api = FakeApi::new();
        let mut files = Vec::new();
        let mut expected = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            match kind {
                FileKind::Good => {
                    files.push(pdf(&format!("f{i}.pdf")));
                    expected.push(format!("REG-F{i}"));
                }
                FileKind::WrongType => files.push(pdf(&format!("f{i}.txt"))),
                FileKind::Remote => {
                    let name = format!("f{i}.pdf");
                    api = api.extraction(&name, Scripted::Fail("Upload failed"));
                    files.push(pdf(&name));
                }
            }
        }
        let remote = kinds.iter().filter(|k| !matches!(k, FileKind::WrongType)).count();

        let config = batch_config();
        let progress = ProgressReporter::new();
        let mut session = Session::new().with_token("token-123");
        let mut store = CertificateStore::default();

        let summary = tokio_test::block_on(
                IngestionPipeline::new(&api, &config, &progress)
                    .run(&mut session, &mut store, &reference_table(), files),
            )
            .unwrap();

        let registrations: Vec<String> =
            store.records().iter().map(|r| r.registration.clone()).collect();
        prop_assert_eq!(registrations, expected.clone());
        prop_assert_eq!(summary.succeeded + summary.failed(), kinds.len());
        prop_assert_eq!(api.calls().len(), remote);
    }
}
