//! WebAssembly module for the Battery Health certificate tool
//!
//! Provides in-browser checks so the form can react without a round trip:
//! - Certificate validation
//! - Make normalization against the reference table
//! - Upload pre-checks
//! - Battery status banding

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::reference::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&JsValue::from_str("battery-health-wasm loaded"));
}

/// Validate certificate form data
///
/// Takes the form fields as JSON and returns `{ is_valid, errors }` as JSON.
#[wasm_bindgen]
pub fn validate_certificate(form_json: &str) -> Result<String, JsValue> {
    validate_form(form_json, today()).map_err(|e| {
        #[cfg(target_arch = "wasm32")]
        web_sys::console::warn_1(&JsValue::from_str(&e));
        JsValue::from_str(&e)
    })
}

/// Resolve an extracted make to its canonical reference-table spelling
#[wasm_bindgen]
pub fn normalize_make(make: &str, table_json: &str) -> Result<String, JsValue> {
    normalize_with_table(make, table_json).map_err(|e| JsValue::from_str(&e))
}

/// Reason a file would be rejected before upload, if any
#[wasm_bindgen]
pub fn check_upload(file_name: &str, size_bytes: f64) -> Option<String> {
    let size = if size_bytes.is_finite() && size_bytes > 0.0 {
        size_bytes as u64
    } else {
        0
    };
    shared::check_upload(file_name, size, MAX_UPLOAD_BYTES)
        .err()
        .map(|rejection| rejection.to_string())
}

/// Battery status band for a state-of-health percentage
#[wasm_bindgen]
pub fn battery_status(state_of_health: i32) -> String {
    BatteryStatus::from_state_of_health(clamp_state_of_health(state_of_health.into())).to_string()
}

fn validate_form(form_json: &str, today: NaiveDate) -> Result<String, String> {
    let patch: CertificatePatch =
        serde_json::from_str(form_json).map_err(|e| format!("Invalid certificate JSON: {}", e))?;

    let mut record = CertificateRecord::blank(today);
    record.apply(patch);

    serde_json::to_string(&shared::validate_certificate(&record))
        .map_err(|e| format!("Failed to encode validation result: {}", e))
}

fn normalize_with_table(make: &str, table_json: &str) -> Result<String, String> {
    let table: ReferenceTable = serde_json::from_str(table_json)
        .map_err(|e| format!("Invalid reference table JSON: {}", e))?;
    Ok(table.normalize_make(make))
}

/// Browser-local date; chrono has no clock on wasm32-unknown-unknown
#[cfg(target_arch = "wasm32")]
fn today() -> NaiveDate {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
