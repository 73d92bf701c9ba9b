//! Vehicle make/model reference table
//!
//! The table is supplied by the service after login. It drives the make and
//! model suggestions and the make normalization of extracted certificates;
//! it never causes a certificate to be rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from vehicle make to its known models
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ReferenceTable(BTreeMap<String, Vec<String>>);

impl ReferenceTable {
    pub fn new(makes: BTreeMap<String, Vec<String>>) -> Self {
        Self(makes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Known makes, sorted for display
    pub fn makes(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Models listed for exactly `make`; empty when the make is unknown
    pub fn models_for(&self, make: &str) -> &[String] {
        self.0.get(make).map(Vec::as_slice).unwrap_or_default()
    }

    /// Canonical spelling of `make` if the table knows it, ignoring case
    pub fn canonical_make(&self, make: &str) -> Option<&str> {
        let wanted = make.to_lowercase();
        self.0
            .keys()
            .find(|known| known.to_lowercase() == wanted)
            .map(String::as_str)
    }

    /// Reconcile a free-text make with the table
    ///
    /// Returns the table's spelling on a case-insensitive match. A make the
    /// table does not know is kept unchanged.
    pub fn normalize_make(&self, extracted: &str) -> String {
        normalize_make(extracted, self)
    }
}

impl<K, M> FromIterator<(K, Vec<M>)> for ReferenceTable
where
    K: Into<String>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Vec<M>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(make, models)| (make.into(), models.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

/// Reconcile a free-text make against `table`
pub fn normalize_make(extracted: &str, table: &ReferenceTable) -> String {
    if extracted.is_empty() {
        return String::new();
    }
    table
        .canonical_make(extracted)
        .map(str::to_string)
        .unwrap_or_else(|| extracted.to_string())
}
