use async_trait::async_trait;
use clinipay_application::PayrollLedger;
use clinipay_core::{AppResult, ClinicId, MemberId};
use clinipay_domain::PayrollRecord;
use tokio::sync::RwLock;

/// One sent payroll held by the in-memory ledger.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// Clinic the payroll belongs to.
    pub clinic_id: ClinicId,
    /// Member the payroll was for.
    pub member_id: MemberId,
    /// The record as it was sent.
    pub record: PayrollRecord,
    /// Staff notes attached at send time.
    pub notes: String,
}

/// In-memory ledger of sent payroll records.
#[derive(Debug, Default)]
pub struct InMemoryPayrollLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryPayrollLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything appended so far.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl PayrollLedger for InMemoryPayrollLedger {
    async fn append(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        record: &PayrollRecord,
        notes: &str,
    ) -> AppResult<()> {
        self.entries.write().await.push(LedgerEntry {
            clinic_id,
            member_id,
            record: record.clone(),
            notes: notes.to_owned(),
        });
        Ok(())
    }
}
