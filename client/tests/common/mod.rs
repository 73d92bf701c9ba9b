//! Test doubles shared by the client integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use battery_health_client::services::ArtifactSink;
use battery_health_client::{ApiError, CertificateApi};
use reqwest::StatusCode;
use serde_json::json;
use shared::{CertificatePatch, CertificateRecord, ExtractedFields, Progress, ReferenceTable};
use tokio::sync::watch;

/// Scripted response of the fake service for one item
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok,
    NoData,
    Fail(&'static str),
    Auth,
}

impl Scripted {
    fn into_result<T>(self, value: T) -> Result<T, ApiError> {
        match self {
            Scripted::Ok => Ok(value),
            Scripted::NoData => Err(ApiError::NoData),
            Scripted::Fail(message) => Err(ApiError::Rejected {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: message.to_string(),
            }),
            Scripted::Auth => Err(ApiError::SessionExpired),
        }
    }
}

/// In-memory certificate service
///
/// Extraction outcomes are keyed by file name, render outcomes by
/// registration; anything unscripted succeeds.
#[derive(Default)]
pub struct FakeApi {
    pub extractions: HashMap<String, Scripted>,
    pub renders: HashMap<String, Scripted>,
    pub reference: ReferenceOutcome,
    pub calls: Mutex<Vec<String>>,
    pub progress_at_call: Mutex<Vec<Progress>>,
    pub observer: Mutex<Option<watch::Receiver<Progress>>>,
}

/// Reference-table outcome; separate type so `Default` is success
#[derive(Debug, Clone, Default)]
pub enum ReferenceOutcome {
    #[default]
    Ok,
    Fail(&'static str),
    Auth,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extraction(mut self, file: &str, outcome: Scripted) -> Self {
        self.extractions.insert(file.to_string(), outcome);
        self
    }

    pub fn render_outcome(mut self, registration: &str, outcome: Scripted) -> Self {
        self.renders.insert(registration.to_string(), outcome);
        self
    }

    pub fn observe(&self, rx: watch::Receiver<Progress>) {
        *self.observer.lock().unwrap() = Some(rx);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn progress_seen(&self) -> Vec<Progress> {
        self.progress_at_call.lock().unwrap().clone()
    }

    fn record_call(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            self.progress_at_call
                .lock()
                .unwrap()
                .push(rx.borrow().clone());
        }
    }
}

#[async_trait]
impl CertificateApi for FakeApi {
    async fn login(&self, password: &str) -> Result<String, ApiError> {
        if password == "secret" {
            Ok("token-123".to_string())
        } else {
            Err(ApiError::LoginFailed("Invalid password".to_string()))
        }
    }

    async fn fetch_reference_table(&self, _token: &str) -> Result<ReferenceTable, ApiError> {
        match self.reference {
            ReferenceOutcome::Ok => Ok(reference_table()),
            ReferenceOutcome::Fail(message) => Err(ApiError::Rejected {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: message.to_string(),
            }),
            ReferenceOutcome::Auth => Err(ApiError::SessionExpired),
        }
    }

    async fn extract(
        &self,
        _token: &str,
        file_name: &str,
        _bytes: &[u8],
    ) -> Result<ExtractedFields, ApiError> {
        self.record_call(file_name);
        let outcome = self
            .extractions
            .get(file_name)
            .cloned()
            .unwrap_or(Scripted::Ok);
        outcome.into_result(extracted_for(file_name))
    }

    async fn render(&self, _token: &str, record: &CertificateRecord) -> Result<Vec<u8>, ApiError> {
        self.record_call(&record.registration);
        let outcome = self
            .renders
            .get(&record.registration)
            .cloned()
            .unwrap_or(Scripted::Ok);
        outcome.into_result(format!("%PDF {}", record.registration).into_bytes())
    }
}

/// Sink that keeps saved artifacts in memory
#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn names(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

pub fn reference_table() -> ReferenceTable {
    [
        ("Tesla", vec!["Model 3", "Model Y"]),
        ("Nissan", vec!["Leaf"]),
    ]
    .into_iter()
    .collect()
}

/// Extraction result derived from the file name, so each record is traceable
pub fn extracted_for(file_name: &str) -> ExtractedFields {
    let stem = file_name.split('.').next().unwrap_or_default();
    serde_json::from_value(json!({
        "tested_by": "Inspector",
        "make": "tesla",
        "model": "Model 3",
        "registration": format!("reg-{stem}"),
        "battery_capacity": "75",
        "state_of_health": 87
    }))
    .unwrap()
}

/// A patch that makes any certificate valid
pub fn complete(registration: &str) -> CertificatePatch {
    CertificatePatch {
        tested_by: Some("Sam".into()),
        make: Some("Nissan".into()),
        model: Some("Leaf".into()),
        registration: Some(registration.into()),
        battery_capacity_kwh: Some("40".into()),
        ..Default::default()
    }
}
