//! Batch pipelines for the Battery Health certificate client

pub mod artifacts;
pub mod generation;
pub mod ingestion;
pub mod runner;

pub use artifacts::{ArtifactSink, DirectorySink};
pub use generation::{GenerationPipeline, GenerationSummary};
pub use ingestion::{IngestionPipeline, IngestionSummary, UploadFile};
pub use runner::{BatchRun, BatchRunner, BatchTask, ItemError};
