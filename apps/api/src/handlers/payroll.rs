use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use clinipay_core::{ClinicId, MemberId, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    GeneratePayrollRequest, IntervalsQuery, MemberQuery, PayIntervalResponse, PayrollRecordDto,
    SendPayrollRequest, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/payroll/{member_id}/get_user/`
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(member_id): Path<Uuid>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Json<UserResponse>> {
    let member = state
        .payroll_service
        .member_for_payroll(
            &user,
            ClinicId::from_uuid(query.clinic_id),
            MemberId::from_uuid(member_id),
        )
        .await?;

    Ok(Json(UserResponse::from(member)))
}

/// `GET /api/payroll/{member_id}/intervals/`
pub async fn intervals(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(member_id): Path<Uuid>,
    Query(query): Query<IntervalsQuery>,
) -> ApiResult<Json<Vec<PayIntervalResponse>>> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let intervals = state
        .payroll_service
        .pay_intervals(
            &user,
            ClinicId::from_uuid(query.clinic_id),
            MemberId::from_uuid(member_id),
            today,
        )
        .await?;

    Ok(Json(
        intervals.into_iter().map(PayIntervalResponse::from).collect(),
    ))
}

/// `POST /api/payroll/{member_id}/generate_payroll/`
pub async fn generate_payroll(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(member_id): Path<Uuid>,
    Json(payload): Json<GeneratePayrollRequest>,
) -> ApiResult<Json<PayrollRecordDto>> {
    let record = state
        .payroll_service
        .generate_payroll(
            &user,
            ClinicId::from_uuid(payload.clinic_id),
            MemberId::from_uuid(member_id),
            payload.start_date,
            payload.end_date,
        )
        .await?;

    Ok(Json(PayrollRecordDto::from(&record)))
}

/// `POST /api/payroll/{member_id}/send_payroll/`
pub async fn send_payroll(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(member_id): Path<Uuid>,
    Json(payload): Json<SendPayrollRequest>,
) -> ApiResult<StatusCode> {
    let record = payload.record.into_record()?;
    state
        .payroll_service
        .send_payroll(
            &user,
            ClinicId::from_uuid(payload.clinic_id),
            MemberId::from_uuid(member_id),
            &record,
            &payload.notes,
        )
        .await?;

    Ok(StatusCode::OK)
}
