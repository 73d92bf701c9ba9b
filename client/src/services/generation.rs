//! Certificate generation pipeline
//!
//! Sends certificates to the rendering service one at a time and saves each
//! returned PDF as soon as it arrives. Generation only reads the store.

use async_trait::async_trait;
use shared::{validate_certificate, CertificateRecord, FailedItem};

use super::artifacts::ArtifactSink;
use super::runner::{BatchRunner, BatchTask, ItemError};
use crate::config::BatchConfig;
use crate::error::{AppError, AppResult};
use crate::external::CertificateApi;
use crate::progress::ProgressReporter;
use crate::session::Session;
use crate::store::CertificateStore;

/// Outcome of one generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSummary {
    pub succeeded: usize,
    pub failures: Vec<FailedItem>,
    /// Invalid certificates left out of a "generate all" run
    pub skipped_invalid: usize,
}

impl GenerationSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn message(&self) -> String {
        let mut message = format!(
            "Successfully generated {} certificate(s)!",
            self.succeeded
        );
        if self.failed() > 0 {
            message.push_str(&format!("\n\nFailed: {} certificate(s)", self.failed()));
        }
        if self.skipped_invalid > 0 {
            message.push_str(&format!(
                "\n\nSkipped: {} certificate(s) with validation errors",
                self.skipped_invalid
            ));
        }
        message
    }
}

struct RenderTask<'a> {
    api: &'a dyn CertificateApi,
    token: &'a str,
    sink: &'a dyn ArtifactSink,
}

#[async_trait]
impl<'a> BatchTask for RenderTask<'a> {
    type Item = CertificateRecord;
    type Output = std::path::PathBuf;

    fn label(&self, record: &CertificateRecord) -> String {
        record.registration.clone()
    }

    fn describe(&self, index: usize, total: usize, record: &CertificateRecord) -> String {
        if total == 1 {
            format!("Generating certificate {}...", record.registration)
        } else {
            format!(
                "Generating certificate {index} of {total} ({})...",
                record.registration
            )
        }
    }

    async fn submit(&self, record: CertificateRecord) -> Result<std::path::PathBuf, ItemError> {
        let bytes = self.api.render(self.token, &record).await?;
        let path = self.sink.save(&record.artifact_file_name(), &bytes).await?;
        Ok(path)
    }
}

/// Batch certificate rendering
pub struct GenerationPipeline<'a> {
    api: &'a dyn CertificateApi,
    config: &'a BatchConfig,
    progress: &'a ProgressReporter,
    sink: &'a dyn ArtifactSink,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(
        api: &'a dyn CertificateApi,
        config: &'a BatchConfig,
        progress: &'a ProgressReporter,
        sink: &'a dyn ArtifactSink,
    ) -> Self {
        Self {
            api,
            config,
            progress,
            sink,
        }
    }

    /// Generate the certificate under the store's cursor
    ///
    /// The record is re-validated first and refused with its validation
    /// errors if it is incomplete.
    pub async fn generate_current(
        &self,
        session: &mut Session,
        store: &CertificateStore,
    ) -> AppResult<GenerationSummary> {
        let record = store.current().ok_or(AppError::NoCertificates)?;

        let outcome = validate_certificate(record);
        if !outcome.is_valid {
            return Err(AppError::ValidationFailed(outcome.errors));
        }

        self.render(session, vec![record.clone()], 0).await
    }

    /// Generate every certificate that is valid right now, in store order
    ///
    /// Validity is recomputed here rather than read from cached flags.
    /// Invalid certificates are skipped and counted. The operator confirms
    /// the run before the service is contacted.
    pub async fn generate_all(
        &self,
        session: &mut Session,
        store: &CertificateStore,
    ) -> AppResult<GenerationSummary> {
        let valid: Vec<CertificateRecord> = store
            .records()
            .iter()
            .filter(|record| validate_certificate(record).is_valid)
            .cloned()
            .collect();

        if valid.is_empty() {
            return Err(AppError::NoValidCertificates);
        }
        session.token()?;

        let skipped = store.len() - valid.len();
        let mut prompt = format!("Generate {} certificate(s)?", valid.len());
        if skipped > 0 {
            prompt.push_str(&format!(
                "\n\n{skipped} certificate(s) will be skipped due to validation errors."
            ));
        }
        if !store.confirm(&prompt) {
            return Err(AppError::Cancelled);
        }

        self.render(session, valid, skipped).await
    }

    async fn render(
        &self,
        session: &mut Session,
        records: Vec<CertificateRecord>,
        skipped_invalid: usize,
    ) -> AppResult<GenerationSummary> {
        let token = session.token()?.to_string();

        tracing::info!(
            certificates = records.len(),
            skipped = skipped_invalid,
            "Starting certificate generation"
        );

        let task = RenderTask {
            api: self.api,
            token: &token,
            sink: self.sink,
        };
        let run = BatchRunner::new(self.config.generation_pause(), self.progress)
            .run(&task, records)
            .await;

        if let Some(err) = run.aborted {
            session.expire();
            return Err(err.into());
        }

        let summary = GenerationSummary {
            succeeded: run.succeeded.len(),
            failures: run.failed,
            skipped_invalid,
        };
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "Certificate generation finished"
        );
        Ok(summary)
    }
}
