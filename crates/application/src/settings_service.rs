use std::sync::Arc;

use clinipay_core::{AppError, AppResult, UserIdentity};
use clinipay_domain::SiteSettings;
use tracing::info;

use crate::payroll_ports::SettingsRepository;

#[cfg(test)]
mod tests;

/// Application service for the clinic-wide settings singleton.
#[derive(Clone)]
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    /// Creates the service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self { repository }
    }

    /// Returns the stored settings. Staff only.
    pub async fn get(&self, actor: &UserIdentity) -> AppResult<SiteSettings> {
        require_staff(actor)?;
        self.repository
            .load()
            .await?
            .ok_or_else(|| AppError::NotFound("site settings".to_owned()))
    }

    /// Validates and stores settings. Staff only.
    ///
    /// Validation runs before the repository is touched, so an invalid
    /// payload can never clobber a working configuration. Settings with
    /// an identifier update the stored row; settings without one create
    /// it.
    pub async fn save(&self, actor: &UserIdentity, settings: SiteSettings) -> AppResult<SiteSettings> {
        require_staff(actor)?;
        settings.validate()?;

        let saved = if settings.id.is_some() {
            self.repository.update(settings).await?
        } else {
            self.repository.insert(settings).await?
        };
        info!(subject = actor.subject(), "site settings saved");
        Ok(saved)
    }
}

fn require_staff(actor: &UserIdentity) -> AppResult<()> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "site settings require staff access".to_owned(),
        ))
    }
}
