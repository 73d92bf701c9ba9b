//! Application state for one operator session
//!
//! Ties the session, the certificate store and the reference table to the
//! remote service, and exposes the operator-level actions.

use std::sync::Arc;

use shared::ReferenceTable;

use crate::config::Config;
use crate::error::AppResult;
use crate::external::CertificateApi;
use crate::progress::ProgressReporter;
use crate::services::{
    ArtifactSink, GenerationPipeline, GenerationSummary, IngestionPipeline, IngestionSummary,
    UploadFile,
};
use crate::session::Session;
use crate::store::CertificateStore;

pub struct App {
    pub config: Arc<Config>,
    pub session: Session,
    pub store: CertificateStore,
    pub reference_table: ReferenceTable,
    pub progress: ProgressReporter,
    api: Box<dyn CertificateApi>,
}

impl App {
    pub fn new(
        config: Arc<Config>,
        api: Box<dyn CertificateApi>,
        session: Session,
        store: CertificateStore,
    ) -> Self {
        Self {
            config,
            session,
            store,
            reference_table: ReferenceTable::default(),
            progress: ProgressReporter::new(),
            api,
        }
    }

    /// Log in and load the make/model reference table
    ///
    /// The table only feeds make suggestions, so a table failure other than
    /// an auth failure leaves the operator logged in with an empty table.
    pub async fn login(&mut self, password: &str) -> AppResult<()> {
        self.session.login(self.api.as_ref(), password).await?;

        match self.load_reference_table().await {
            Err(e) if !e.is_session_expired() => {
                tracing::warn!(error = %e, "Reference table unavailable, continuing without it");
                self.reference_table = ReferenceTable::default();
                Ok(())
            }
            other => other,
        }
    }

    pub async fn load_reference_table(&mut self) -> AppResult<()> {
        let token = self.session.token()?.to_string();
        let result = self.api.fetch_reference_table(&token).await;
        self.reference_table = self.session.guard(result)?;
        tracing::info!(makes = self.reference_table.len(), "Reference table loaded");
        Ok(())
    }

    /// Operator logout: drops the token, the certificates and the reference table
    pub fn logout(&mut self) {
        self.session.logout();
        self.store.discard_all();
        self.reference_table = ReferenceTable::default();
    }

    pub async fn ingest(&mut self, files: Vec<UploadFile>) -> AppResult<IngestionSummary> {
        IngestionPipeline::new(self.api.as_ref(), &self.config.batch, &self.progress)
            .run(
                &mut self.session,
                &mut self.store,
                &self.reference_table,
                files,
            )
            .await
    }

    pub async fn generate_current(
        &mut self,
        sink: &dyn ArtifactSink,
    ) -> AppResult<GenerationSummary> {
        GenerationPipeline::new(self.api.as_ref(), &self.config.batch, &self.progress, sink)
            .generate_current(&mut self.session, &self.store)
            .await
    }

    pub async fn generate_all(&mut self, sink: &dyn ArtifactSink) -> AppResult<GenerationSummary> {
        GenerationPipeline::new(self.api.as_ref(), &self.config.batch, &self.progress, sink)
            .generate_all(&mut self.session, &self.store)
            .await
    }
}
