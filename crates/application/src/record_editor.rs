use clinipay_core::{AppError, AppResult};
use clinipay_domain::{PayrollField, PayrollRecord, parse_currency};

/// Synchronous edit session over a working copy of a payroll record.
///
/// The editor never performs I/O: edits apply to the local copy and the
/// registered change listener is told about each committed change. A
/// fetch failing elsewhere cannot disturb an edit in progress.
pub struct RecordEditor {
    record: PayrollRecord,
    pending: Option<PayrollField>,
    listener: Option<Box<dyn Fn(&PayrollRecord) + Send>>,
}

impl RecordEditor {
    /// Starts a session over a record.
    #[must_use]
    pub fn new(record: PayrollRecord) -> Self {
        Self {
            record,
            pending: None,
            listener: None,
        }
    }

    /// Registers the listener invoked after every committed edit.
    pub fn on_change(&mut self, listener: impl Fn(&PayrollRecord) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Returns the current working copy.
    #[must_use]
    pub fn record(&self) -> &PayrollRecord {
        &self.record
    }

    /// Opens an edit on a field and returns the raw numeric string that
    /// seeds the input, unformatted.
    pub fn begin_edit(&mut self, field: PayrollField) -> AppResult<String> {
        let value = self.record.amount(field).ok_or_else(|| {
            AppError::Validation(format!("field {field} is not present on this record"))
        })?;
        self.pending = Some(field);
        Ok(value.to_string())
    }

    /// Parses the entered text and commits it to the pending field.
    ///
    /// Empty or non-numeric input commits as zero. The write happens on
    /// a fresh copy; only a fully successful write replaces the working
    /// record and notifies the listener.
    pub fn commit(&mut self, raw_text: &str) -> AppResult<()> {
        let field = self.pending.take().ok_or_else(|| {
            AppError::Validation("no edit in progress".to_owned())
        })?;

        let mut updated = self.record.clone();
        updated.set_amount(field, parse_currency(raw_text))?;
        self.record = updated;
        if let Some(listener) = &self.listener {
            listener(&self.record);
        }
        Ok(())
    }

    /// Abandons the pending edit. The record is exactly the pre-edit
    /// state; no listener fires.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
