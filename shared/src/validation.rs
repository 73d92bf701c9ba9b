//! Validation rules for battery health certificates
//!
//! Covers the required-field check that gates generation and the pre-checks
//! applied to uploaded files before they reach the extraction service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CertificateRecord;

/// Largest PDF the extraction service accepts (16 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

// ============================================================================
// Certificate Validation
// ============================================================================

/// Fields a certificate cannot be generated without, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    TestedBy,
    Make,
    Model,
    Registration,
    BatteryCapacity,
}

impl RequiredField {
    pub const ALL: [RequiredField; 5] = [
        RequiredField::TestedBy,
        RequiredField::Make,
        RequiredField::Model,
        RequiredField::Registration,
        RequiredField::BatteryCapacity,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            RequiredField::TestedBy => "Tested By is required",
            RequiredField::Make => "Make is required",
            RequiredField::Model => "Model is required",
            RequiredField::Registration => "Registration is required",
            RequiredField::BatteryCapacity => "Battery Capacity is required",
        }
    }

    fn value<'a>(&self, record: &'a CertificateRecord) -> &'a str {
        match self {
            RequiredField::TestedBy => &record.tested_by,
            RequiredField::Make => &record.make,
            RequiredField::Model => &record.model,
            RequiredField::Registration => &record.registration,
            RequiredField::BatteryCapacity => &record.battery_capacity_kwh,
        }
    }
}

/// Result of validating one certificate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check that every required field is non-blank
///
/// Pure: the caller writes the outcome back onto the record.
pub fn validate_certificate(record: &CertificateRecord) -> ValidationOutcome {
    let errors: Vec<String> = RequiredField::ALL
        .iter()
        .filter(|field| field.value(record).trim().is_empty())
        .map(|field| field.message().to_string())
        .collect();

    ValidationOutcome {
        is_valid: errors.is_empty(),
        errors,
    }
}

// ============================================================================
// Upload Pre-checks
// ============================================================================

/// Reason an uploaded file is refused without contacting the service
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FileRejection {
    #[error("Not a PDF file")]
    NotPdf,

    #[error("File too large (>16MB)")]
    TooLarge,
}

/// Check an upload's name and size against the service's limits
pub fn check_upload(file_name: &str, size_bytes: u64, max_bytes: u64) -> Result<(), FileRejection> {
    if !file_name.to_lowercase().ends_with(".pdf") {
        return Err(FileRejection::NotPdf);
    }
    if size_bytes > max_bytes {
        return Err(FileRejection::TooLarge);
    }
    Ok(())
}
