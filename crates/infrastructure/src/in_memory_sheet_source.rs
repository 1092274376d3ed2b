use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use clinipay_application::{CommissionSource, CommissionSummary, TimesheetEntry, TimesheetSource};
use clinipay_core::{AppResult, ClinicId, MemberId};
use tokio::sync::RwLock;

/// In-memory timesheet and commission source for tests and local
/// development.
#[derive(Debug, Default)]
pub struct InMemorySheetSource {
    hours: RwLock<HashMap<(ClinicId, MemberId), Vec<TimesheetEntry>>>,
    commissions: RwLock<HashMap<(ClinicId, MemberId), CommissionSummary>>,
}

impl InMemorySheetSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records hours for a member.
    pub async fn add_hours(&self, clinic_id: ClinicId, member_id: MemberId, entry: TimesheetEntry) {
        let mut hours = self.hours.write().await;
        hours.entry((clinic_id, member_id)).or_default().push(entry);
    }

    /// Sets the commission figures reported for a member.
    pub async fn set_commission(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        summary: CommissionSummary,
    ) {
        let mut commissions = self.commissions.write().await;
        commissions.insert((clinic_id, member_id), summary);
    }
}

#[async_trait]
impl TimesheetSource for InMemorySheetSource {
    async fn daily_hours(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<TimesheetEntry>> {
        let hours = self.hours.read().await;
        Ok(hours
            .get(&(clinic_id, member_id))
            .map(|entries| {
                entries
                    .iter()
                    .copied()
                    .filter(|entry| entry.date >= start && entry.date <= end)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommissionSource for InMemorySheetSource {
    async fn commission_summary(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> AppResult<Option<CommissionSummary>> {
        let commissions = self.commissions.read().await;
        Ok(commissions.get(&(clinic_id, member_id)).copied())
    }
}
