//! Timesheet and commission figures fetched from the spreadsheet
//! service over HTTP.

use async_trait::async_trait;
use chrono::NaiveDate;
use clinipay_application::{CommissionSource, CommissionSummary, TimesheetEntry, TimesheetSource};
use clinipay_core::{AppError, AppResult, ClinicId, MemberId};
use reqwest::StatusCode;

/// HTTP client for the spreadsheet service holding recorded hours and
/// billed commission figures.
#[derive(Clone)]
pub struct HttpSheetSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSheetSource {
    /// Creates a source against a spreadsheet-service base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn member_url(&self, clinic_id: ClinicId, member_id: MemberId, resource: &str) -> String {
        format!(
            "{}/clinics/{clinic_id}/members/{member_id}/{resource}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TimesheetSource for HttpSheetSource {
    async fn daily_hours(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<TimesheetEntry>> {
        let response = self
            .client
            .get(self.member_url(clinic_id, member_id, "hours"))
            .query(&[("start", start.to_string()), ("end", end.to_string())])
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("timesheet request failed: {error}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = response.error_for_status().map_err(|error| {
            AppError::Internal(format!("timesheet service rejected request: {error}"))
        })?;

        response
            .json::<Vec<TimesheetEntry>>()
            .await
            .map_err(|error| AppError::Internal(format!("invalid timesheet payload: {error}")))
    }
}

#[async_trait]
impl CommissionSource for HttpSheetSource {
    async fn commission_summary(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Option<CommissionSummary>> {
        let response = self
            .client
            .get(self.member_url(clinic_id, member_id, "commissions"))
            .query(&[("start", start.to_string()), ("end", end.to_string())])
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("commission request failed: {error}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().map_err(|error| {
            AppError::Internal(format!("commission service rejected request: {error}"))
        })?;

        let summary = response
            .json::<CommissionSummary>()
            .await
            .map_err(|error| AppError::Internal(format!("invalid commission payload: {error}")))?;
        Ok(Some(summary))
    }
}
