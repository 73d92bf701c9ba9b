//! PDF ingestion pipeline
//!
//! Uploads PDFs to the extraction service one at a time and turns each
//! successful extraction into a certificate. Extracted certificates are held
//! back and appended to the store in one step when the batch ends, so the
//! store never shows a half-finished batch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use shared::{check_upload, CertificateRecord, FailedItem, ReferenceTable};

use super::runner::{BatchRunner, BatchTask, ItemError};
use crate::config::BatchConfig;
use crate::error::AppResult;
use crate::external::CertificateApi;
use crate::progress::ProgressReporter;
use crate::session::Session;
use crate::store::CertificateStore;

/// Failures listed individually in the summary message
pub const MAX_LISTED_FAILURES: usize = 5;

/// Where an upload's bytes come from
#[derive(Debug, Clone)]
enum UploadContent {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// A PDF selected for extraction
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub size_bytes: u64,
    content: UploadContent,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            content: UploadContent::Memory(bytes),
        }
    }

    /// Reference a file on disk; its bytes are read only when it is submitted
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            content: UploadContent::Path(path.to_path_buf()),
        })
    }

    async fn read(self) -> std::io::Result<Vec<u8>> {
        match self.content {
            UploadContent::Memory(bytes) => Ok(bytes),
            UploadContent::Path(path) => tokio::fs::read(path).await,
        }
    }
}

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionSummary {
    pub succeeded: usize,
    pub failures: Vec<FailedItem>,
    /// Store index of the first certificate added by this batch
    pub first_inserted: Option<usize>,
}

impl IngestionSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Consolidated report for the operator
    pub fn message(&self) -> String {
        let mut message = String::new();

        if self.succeeded > 0 {
            let s = plural(self.succeeded);
            message.push_str(&format!(
                "Successfully processed {} PDF{s}!\n\n{} certificate{s} added to your list.\n\
                 Please review the extracted data and complete any missing fields.",
                self.succeeded, self.succeeded
            ));
        }

        if !self.failures.is_empty() {
            message.push_str(&format!(
                "\n\nFailed: {} PDF{}",
                self.failed(),
                plural(self.failed())
            ));
            if self.failures.len() <= MAX_LISTED_FAILURES {
                message.push_str("\n\nReasons:");
            } else {
                message.push_str(&format!("\n\nShowing first {MAX_LISTED_FAILURES} errors:"));
            }
            for failure in self.failures.iter().take(MAX_LISTED_FAILURES) {
                message.push_str(&format!("\n• {failure}"));
            }
            if self.failures.len() > MAX_LISTED_FAILURES {
                message.push_str(&format!(
                    "\n... and {} more",
                    self.failures.len() - MAX_LISTED_FAILURES
                ));
            }
        }

        message.trim_start().to_string()
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

struct ExtractTask<'a> {
    api: &'a dyn CertificateApi,
    token: &'a str,
    table: &'a ReferenceTable,
    max_upload_bytes: u64,
    today: NaiveDate,
}

#[async_trait]
impl<'a> BatchTask for ExtractTask<'a> {
    type Item = UploadFile;
    type Output = CertificateRecord;

    fn label(&self, file: &UploadFile) -> String {
        file.name.clone()
    }

    fn describe(&self, _index: usize, _total: usize, file: &UploadFile) -> String {
        format!("Processing {}...", file.name)
    }

    fn precheck(&self, file: &UploadFile) -> Result<(), String> {
        check_upload(&file.name, file.size_bytes, self.max_upload_bytes).map_err(|r| r.to_string())
    }

    async fn submit(&self, file: UploadFile) -> Result<CertificateRecord, ItemError> {
        let name = file.name.clone();
        let bytes = file.read().await?;
        let fields = self.api.extract(self.token, &name, &bytes).await?;
        Ok(CertificateRecord::from_extraction(
            fields, self.table, name, self.today,
        ))
    }
}

/// Batch PDF extraction into the certificate store
pub struct IngestionPipeline<'a> {
    api: &'a dyn CertificateApi,
    config: &'a BatchConfig,
    progress: &'a ProgressReporter,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(
        api: &'a dyn CertificateApi,
        config: &'a BatchConfig,
        progress: &'a ProgressReporter,
    ) -> Self {
        Self {
            api,
            config,
            progress,
        }
    }

    /// Extract every file and append the results to `store`
    ///
    /// Per-file failures are collected in the summary. An auth failure stops
    /// the batch: certificates extracted before it are still appended, the
    /// session is expired and the auth error is returned.
    pub async fn run(
        &self,
        session: &mut Session,
        store: &mut CertificateStore,
        table: &ReferenceTable,
        files: Vec<UploadFile>,
    ) -> AppResult<IngestionSummary> {
        let token = session.token()?.to_string();
        if files.is_empty() {
            return Ok(IngestionSummary::default());
        }

        tracing::info!(files = files.len(), "Starting PDF ingestion");

        let task = ExtractTask {
            api: self.api,
            token: &token,
            table,
            max_upload_bytes: self.config.max_upload_bytes,
            today: Utc::now().date_naive(),
        };
        let run = BatchRunner::new(self.config.upload_pause(), self.progress)
            .run(&task, files)
            .await;

        let succeeded = run.succeeded.len();
        let first_inserted = store.append(run.succeeded);
        if let Some(first) = first_inserted {
            store.select(first);
        }

        if let Some(err) = run.aborted {
            session.expire();
            return Err(err.into());
        }

        let summary = IngestionSummary {
            succeeded,
            failures: run.failed,
            first_inserted,
        };
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "PDF ingestion finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures(count: usize) -> Vec<FailedItem> {
        (1..=count)
            .map(|i| FailedItem::new(format!("file{i}.pdf"), "Upload failed"))
            .collect()
    }

    #[test]
    fn test_message_success_only() {
        let summary = IngestionSummary {
            succeeded: 1,
            ..Default::default()
        };
        assert_eq!(
            summary.message(),
            "Successfully processed 1 PDF!\n\n1 certificate added to your list.\n\
             Please review the extracted data and complete any missing fields."
        );
    }

    #[test]
    fn test_message_lists_up_to_five_reasons() {
        let summary = IngestionSummary {
            succeeded: 2,
            failures: failures(2),
            first_inserted: Some(0),
        };
        let message = summary.message();
        assert!(message.starts_with("Successfully processed 2 PDFs!"));
        assert!(message.contains("2 certificates added"));
        assert!(message.ends_with(
            "Failed: 2 PDFs\n\nReasons:\n• file1.pdf: Upload failed\n• file2.pdf: Upload failed"
        ));
    }

    #[test]
    fn test_message_truncates_after_five() {
        let summary = IngestionSummary {
            succeeded: 0,
            failures: failures(8),
            first_inserted: None,
        };
        let message = summary.message();
        assert!(message.starts_with("Failed: 8 PDFs\n\nShowing first 5 errors:"));
        assert_eq!(message.matches('•').count(), 5);
        assert!(message.contains("file5.pdf"));
        assert!(!message.contains("file6.pdf"));
        assert!(message.ends_with("\n... and 3 more"));
    }

    #[test]
    fn test_message_exactly_five_is_not_truncated() {
        let summary = IngestionSummary {
            failures: failures(5),
            ..Default::default()
        };
        let message = summary.message();
        assert!(message.contains("Reasons:"));
        assert!(!message.contains("more"));
    }

    #[tokio::test]
    async fn test_upload_from_path_reads_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.PDF");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "scan.PDF");
        assert_eq!(file.size_bytes, 8);
        assert_eq!(file.read().await.unwrap(), b"%PDF-1.7");
    }
}
