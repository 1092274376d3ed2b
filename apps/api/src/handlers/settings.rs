use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use clinipay_core::{AppError, UserIdentity};
use uuid::Uuid;

use crate::dto::SiteSettingsDto;
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/site-settings/`
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<SiteSettingsDto>> {
    let settings = state.settings_service.get(&user).await?;
    Ok(Json(SiteSettingsDto::from(settings)))
}

/// `POST /api/site-settings/`
pub async fn create_settings(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SiteSettingsDto>,
) -> ApiResult<(StatusCode, Json<SiteSettingsDto>)> {
    let mut settings = payload.into_settings()?;
    settings.id = None;
    let saved = state.settings_service.save(&user, settings).await?;

    Ok((StatusCode::CREATED, Json(SiteSettingsDto::from(saved))))
}

/// `PUT /api/site-settings/{id}/`
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SiteSettingsDto>,
) -> ApiResult<Json<SiteSettingsDto>> {
    let mut settings = payload.into_settings()?;
    if settings.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::Validation(
            "settings id in the body does not match the path".to_owned(),
        )
        .into());
    }
    settings.id = Some(id);
    let saved = state.settings_service.save(&user, settings).await?;

    Ok(Json(SiteSettingsDto::from(saved)))
}
