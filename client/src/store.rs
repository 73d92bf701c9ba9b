//! In-memory certificate store
//!
//! The store is the only mutator of the certificate list. Every structural
//! change re-validates the whole list; field updates re-validate the edited
//! record. Nothing here survives the process.

use chrono::Utc;
use shared::{CertificateId, CertificatePatch, CertificateRecord};

/// Operator confirmation for destructive actions
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Confirms every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Which surface the operator is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Form,
    List,
}

pub struct CertificateStore {
    records: Vec<CertificateRecord>,
    current_index: usize,
    view: ActiveView,
    confirm: Box<dyn Confirm>,
}

impl CertificateStore {
    pub fn new(confirm: impl Confirm + 'static) -> Self {
        Self {
            records: Vec::new(),
            current_index: 0,
            view: ActiveView::Form,
            confirm: Box::new(confirm),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn records(&self) -> &[CertificateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: CertificateId) -> Option<&CertificateRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn position(&self, id: CertificateId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Record under the cursor; `None` when the store is empty
    pub fn current(&self) -> Option<&CertificateRecord> {
        self.records.get(self.current_index)
    }

    pub fn view(&self) -> ActiveView {
        self.view
    }

    pub fn set_view(&mut self, view: ActiveView) {
        self.view = view;
    }

    pub fn valid_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// Ask the injected confirmation capability
    pub fn confirm(&self, message: &str) -> bool {
        self.confirm.confirm(message)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a blank certificate dated today and move the cursor to it
    pub fn create(&mut self) -> CertificateId {
        let record = CertificateRecord::blank(Utc::now().date_naive());
        let id = record.id;
        self.records.push(record);
        self.revalidate_all();
        self.focus(self.records.len() - 1);
        tracing::debug!(%id, "Created certificate");
        id
    }

    /// Append a copy of `id` with vehicle-identifying fields cleared
    pub fn duplicate(&mut self, id: CertificateId) -> Option<CertificateId> {
        let copy = self.get(id)?.duplicate();
        let new_id = copy.id;
        self.records.push(copy);
        self.revalidate_all();
        self.focus(self.records.len() - 1);
        tracing::debug!(source = %id, %new_id, "Duplicated certificate");
        Some(new_id)
    }

    /// Merge `patch` into the record with `id`; returns false for an unknown id
    pub fn update(&mut self, id: CertificateId, patch: CertificatePatch) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Remove the record with `id` after confirmation
    pub fn delete(&mut self, id: CertificateId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if !self.confirm("Delete this certificate?") {
            return false;
        }

        self.records.remove(index);
        if self.current_index >= self.records.len() {
            self.current_index = self.records.len().saturating_sub(1);
        }
        self.revalidate_all();
        tracing::debug!(%id, "Deleted certificate");
        true
    }

    /// Remove every record after confirmation
    pub fn clear_all(&mut self) -> bool {
        if !self.confirm("Clear all certificates? This cannot be undone.") {
            return false;
        }
        self.discard_all();
        true
    }

    /// Move the cursor; out-of-range indexes are ignored
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.records.len() {
            return false;
        }
        self.focus(index);
        true
    }

    /// Append a batch of records in order
    ///
    /// Returns the index of the first appended record, or `None` for an
    /// empty batch. The cursor is left where it was.
    pub fn append(&mut self, records: Vec<CertificateRecord>) -> Option<usize> {
        if records.is_empty() {
            return None;
        }

        let first = self.records.len();
        for mut record in records {
            while self.get(record.id).is_some() {
                record.id = CertificateId::new();
            }
            self.records.push(record);
        }
        self.revalidate_all();
        Some(first)
    }

    /// Empty the store without asking, as on logout
    pub(crate) fn discard_all(&mut self) {
        self.records.clear();
        self.current_index = 0;
    }

    fn focus(&mut self, index: usize) {
        self.current_index = index;
        self.view = ActiveView::Form;
    }

    fn revalidate_all(&mut self) {
        for record in &mut self.records {
            record.revalidate();
        }
    }
}

impl Default for CertificateStore {
    fn default() -> Self {
        Self::new(AlwaysConfirm)
    }
}
