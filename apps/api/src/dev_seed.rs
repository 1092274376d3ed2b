//! Demo data for the in-memory storage provider.
//!
//! Identifiers are fixed so a local frontend can be pointed at the seeded
//! clinic without reading them out of the logs first.

use chrono::{Datelike, Duration, Utc, Weekday};
use clinipay_application::{
    CommissionSummary, MemberProfile, PayAssignment, SettingsRepository, TimesheetEntry,
    YtdFigures,
};
use clinipay_core::{AppResult, ClinicId, MemberId};
use clinipay_domain::{PayFrequency, PaySchedule, SiteSettings, TaxBracket};
use clinipay_infrastructure::{
    InMemoryMemberRepository, InMemorySettingsRepository, InMemorySheetSource,
};
use tracing::info;
use uuid::Uuid;

const DEMO_CLINIC: u128 = 0x1111_1111_1111_1111_1111_1111_1111_1111;
const DEMO_HOURLY_MEMBER: u128 = 0x2222_2222_2222_2222_2222_2222_2222_2222;
const DEMO_COMMISSION_MEMBER: u128 = 0x3333_3333_3333_3333_3333_3333_3333_3333;

/// Seeds one demo clinic with an hourly and a commission member, recent
/// hours and commission figures, and a usable settings singleton.
pub async fn seed(
    members: &InMemoryMemberRepository,
    sheets: &InMemorySheetSource,
    settings: &InMemorySettingsRepository,
) -> AppResult<()> {
    let clinic_id = ClinicId::from_uuid(Uuid::from_u128(DEMO_CLINIC));
    let hourly_id = MemberId::from_uuid(Uuid::from_u128(DEMO_HOURLY_MEMBER));
    let commission_id = MemberId::from_uuid(Uuid::from_u128(DEMO_COMMISSION_MEMBER));

    members
        .upsert(MemberProfile {
            member_id: hourly_id,
            clinic_id,
            display_name: "Jordan Blake".to_owned(),
            email: Some("jordan.blake@example.com".to_owned()),
            ytd: YtdFigures::default(),
            pay: Some(PayAssignment {
                role_type: "Hourly Employee".parse()?,
                hourly_wage: Some(32.0),
                commission_rate: None,
                schedule: PaySchedule::Cadence(PayFrequency::BiWeekly),
            }),
            monthly_rent: None,
            revenue_share_income: 0.0,
            revenue_share_deduction: 0.0,
        })
        .await;

    members
        .upsert(MemberProfile {
            member_id: commission_id,
            clinic_id,
            display_name: "Riley Chen".to_owned(),
            email: Some("riley.chen@example.com".to_owned()),
            ytd: YtdFigures {
                ytd_pay: 18_500.0,
                ytd_deduction: 4_100.0,
                cpp_contrib: 900.0,
                ei_contrib: 280.0,
            },
            pay: Some(PayAssignment {
                role_type: "Commission Employee".parse()?,
                hourly_wage: None,
                commission_rate: Some(0.45),
                schedule: PaySchedule::Cadence(PayFrequency::SemiMonthly),
            }),
            monthly_rent: Some(850.0),
            revenue_share_income: 0.0,
            revenue_share_deduction: 0.0,
        })
        .await;

    // Weekday hours covering the last four full weeks.
    let today = Utc::now().date_naive();
    for days_back in 1..=28 {
        let date = today - Duration::days(days_back);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        sheets
            .add_hours(
                clinic_id,
                hourly_id,
                TimesheetEntry { date, hours: 8.0 },
            )
            .await;
    }

    sheets
        .set_commission(
            clinic_id,
            commission_id,
            CommissionSummary {
                adjusted_total: 6_200.0,
                tax_gst: 310.0,
                pos_fees: 86.4,
            },
        )
        .await;

    settings.insert(default_settings()).await?;

    info!(%clinic_id, %hourly_id, %commission_id, "seeded demo clinic");
    Ok(())
}

fn default_settings() -> SiteSettings {
    SiteSettings {
        id: None,
        federal_tax_brackets: vec![
            bracket(0.15, 0.0, 55_867.0),
            bracket(0.205, 55_867.0, 111_733.0),
            bracket(0.26, 111_733.0, 173_205.0),
            bracket(0.29, 173_205.0, 246_752.0),
            bracket(0.33, 246_752.0, 10_000_000.0),
        ],
        provincial_tax_brackets: vec![
            bracket(0.0506, 0.0, 47_937.0),
            bracket(0.077, 47_937.0, 95_875.0),
            bracket(0.105, 95_875.0, 10_000_000.0),
        ],
        cpp: 0.0595,
        cpp_exemption: 3_500.0,
        cpp_cap: 3_867.5,
        ei_ee: 0.0166,
        ei_er: 0.02324,
        ei_cap: 1_049.12,
        vacation_pay_rate: 0.04,
        overtime_pay_rate: 1.5,
    }
}

fn bracket(tax_rate: f64, min_income: f64, max_income: f64) -> TaxBracket {
    TaxBracket {
        tax_rate,
        min_income,
        max_income,
    }
}
