//! Certificate models

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::battery::{clamp_state_of_health, BatteryStatus, DEFAULT_STATE_OF_HEALTH};
use crate::reference::ReferenceTable;
use crate::validation::validate_certificate;

/// Date formats accepted from the extraction service, tried in order
const EXTRACTED_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Opaque certificate identifier, unique for the lifetime of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(Uuid);

impl CertificateId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CertificateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cert_{}", self.0.simple())
    }
}

/// A battery health test certificate
///
/// `is_valid` and `validation_errors` are derived: they are written only by
/// [`CertificateRecord::revalidate`], which every mutating method calls.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CertificateRecord {
    pub id: CertificateId,
    pub test_date: NaiveDate,
    pub tested_by: String,
    pub make: String,
    pub model: String,
    pub registration: String,
    pub first_registered: Option<NaiveDate>,
    pub vin: String,
    pub mileage: String,
    #[serde(rename = "battery_capacity")]
    pub battery_capacity_kwh: String,
    #[serde(rename = "state_of_health")]
    pub state_of_health_percent: u8,
    /// `None` means download only, no delivery
    pub recipient_email: Option<String>,
    /// Name of the PDF this record was extracted from
    #[serde(rename = "source_pdf", skip_serializing_if = "Option::is_none")]
    pub source_pdf_name: Option<String>,
    is_valid: bool,
    validation_errors: Vec<String>,
}

impl CertificateRecord {
    /// Create a blank certificate dated `today`
    pub fn blank(today: NaiveDate) -> Self {
        let mut record = Self {
            id: CertificateId::new(),
            test_date: today,
            tested_by: String::new(),
            make: String::new(),
            model: String::new(),
            registration: String::new(),
            first_registered: None,
            vin: String::new(),
            mileage: String::new(),
            battery_capacity_kwh: String::new(),
            state_of_health_percent: DEFAULT_STATE_OF_HEALTH,
            recipient_email: None,
            source_pdf_name: None,
            is_valid: false,
            validation_errors: Vec::new(),
        };
        record.revalidate();
        record
    }

    /// Create a certificate pre-filled from an extraction result
    ///
    /// Fields the extraction did not provide keep their blank defaults. The
    /// extracted make is normalized against `table`.
    pub fn from_extraction(
        fields: ExtractedFields,
        table: &ReferenceTable,
        source_pdf_name: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        let mut record = Self::blank(today);
        record.source_pdf_name = Some(source_pdf_name.into());
        record.apply(fields.into_patch(table));
        record
    }

    /// Clone this certificate for another vehicle of the same kind
    ///
    /// The copy gets a new id and loses every vehicle-identifying field.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self {
            id: CertificateId::new(),
            registration: String::new(),
            vin: String::new(),
            mileage: String::new(),
            recipient_email: None,
            is_valid: false,
            ..self.clone()
        };
        copy.revalidate();
        copy
    }

    /// Merge the fields present in `patch`, then re-validate
    pub fn apply(&mut self, patch: CertificatePatch) {
        if let Some(test_date) = patch.test_date {
            self.test_date = test_date;
        }
        if let Some(tested_by) = patch.tested_by {
            self.tested_by = tested_by;
        }
        if let Some(make) = patch.make {
            self.make = make;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(registration) = patch.registration {
            self.registration = registration.to_uppercase();
        }
        if let Some(first_registered) = patch.first_registered {
            self.first_registered = first_registered;
        }
        if let Some(vin) = patch.vin {
            self.vin = vin.to_uppercase();
        }
        if let Some(mileage) = patch.mileage {
            self.mileage = mileage;
        }
        if let Some(capacity) = patch.battery_capacity_kwh {
            self.battery_capacity_kwh = capacity;
        }
        if let Some(percent) = patch.state_of_health_percent {
            self.state_of_health_percent = clamp_state_of_health(percent);
        }
        if let Some(email) = patch.recipient_email {
            self.recipient_email = if email.trim().is_empty() {
                None
            } else {
                Some(email)
            };
        }
        self.revalidate();
    }

    /// Recompute `is_valid` and `validation_errors` together
    pub fn revalidate(&mut self) {
        let outcome = validate_certificate(self);
        self.is_valid = outcome.is_valid;
        self.validation_errors = outcome.errors;
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    pub fn battery_status(&self) -> BatteryStatus {
        BatteryStatus::from_state_of_health(self.state_of_health_percent)
    }

    /// File name the generated PDF is saved under
    pub fn artifact_file_name(&self) -> String {
        format!("{}.pdf", self.registration)
    }
}

/// Partial update of a certificate; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CertificatePatch {
    pub test_date: Option<NaiveDate>,
    pub tested_by: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub registration: Option<String>,
    /// `Some(None)` clears the date
    #[serde(
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_registered: Option<Option<NaiveDate>>,
    pub vin: Option<String>,
    pub mileage: Option<String>,
    #[serde(rename = "battery_capacity")]
    pub battery_capacity_kwh: Option<String>,
    /// Clamped to 0..=100 when applied
    #[serde(rename = "state_of_health")]
    pub state_of_health_percent: Option<i64>,
    /// An empty string clears the recipient
    pub recipient_email: Option<String>,
}

impl CertificatePatch {
    /// Pick a different make; the model no longer applies and is cleared
    pub fn change_make(make: impl Into<String>) -> Self {
        Self {
            make: Some(make.into()),
            model: Some(String::new()),
            ..Default::default()
        }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Fields returned by the extraction service; every field may be absent
///
/// Values are kept loose: the service may send a registration or a mileage
/// as a number, and a stray type must not cost the whole extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractedFields {
    pub test_date: Option<Value>,
    pub tested_by: Option<Value>,
    pub make: Option<Value>,
    pub model: Option<Value>,
    pub registration: Option<Value>,
    pub first_registered: Option<Value>,
    pub vin: Option<Value>,
    pub mileage: Option<Value>,
    pub battery_capacity: Option<Value>,
    pub state_of_health: Option<Value>,
}

impl ExtractedFields {
    /// Convert into a patch, normalizing the make against `table`
    pub fn into_patch(self, table: &ReferenceTable) -> CertificatePatch {
        let make = self.make.and_then(value_text).unwrap_or_default();

        CertificatePatch {
            test_date: self.test_date.and_then(|v| extracted_date("test_date", v)),
            tested_by: self.tested_by.and_then(value_text),
            make: Some(table.normalize_make(&make)),
            model: self.model.and_then(value_text),
            registration: self.registration.and_then(value_text),
            first_registered: self
                .first_registered
                .and_then(|v| extracted_date("first_registered", v))
                .map(Some),
            vin: self.vin.and_then(value_text),
            mileage: self.mileage.and_then(value_text),
            battery_capacity_kwh: self.battery_capacity.and_then(value_text),
            state_of_health_percent: self.state_of_health.and_then(value_percent),
            recipient_email: None,
        }
    }
}

/// Parse an extracted date field; an unrecognised value is dropped so the
/// record keeps its default
fn extracted_date(field: &'static str, value: Value) -> Option<NaiveDate> {
    let raw = value_text(value)?;
    let parsed = parse_extracted_date(&raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        tracing::debug!(field, raw = %raw, "Unrecognised extracted date, keeping default");
    }
    parsed
}

/// Parse a date in any of the formats the extraction service emits
pub fn parse_extracted_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    EXTRACTED_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn value_percent(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .map(|f| f.round() as i64),
        _ => None,
    }
}
